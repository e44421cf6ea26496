//! Document loader: raw feed bytes → namespace-resolved element tree.
//!
//! Uses `quick-xml`'s namespace-aware reader to build a small owned tree. The
//! extractor never touches `quick-xml` directly; it navigates through
//! [`FeedNode`].

use quick_xml::{
  NsReader,
  events::{BytesStart, Event},
  name::{Namespace as XmlNamespace, ResolveResult},
};

use crate::error::{EntityPath, Error, Result};

// ─── Namespaces ──────────────────────────────────────────────────────────────

pub const NS_FEED: &str = "http://www.aec.gov.au/xml/schema/mediafeed";
pub const NS_EML: &str = "urn:oasis:names:tc:evs:schema:eml";

/// The two vocabularies a results feed mixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
  /// Results-feed elements: `Results`, `Contest`, `Votes`, …
  Feed,
  /// Election Markup Language elements: identifiers and names.
  Eml,
}

impl Namespace {
  pub fn uri(self) -> &'static str {
    match self {
      Namespace::Feed => NS_FEED,
      Namespace::Eml => NS_EML,
    }
  }
}

// ─── Navigation ──────────────────────────────────────────────────────────────

/// The lookups the extractor needs from a document tree.
pub trait FeedNode {
  /// Local name of the element.
  fn tag(&self) -> &str;

  /// First direct child element with the given namespace and local name.
  fn child(&self, ns: Namespace, tag: &str) -> Option<&Self>;

  /// Every element below this one (not including it) with the given namespace
  /// and local name, in document order.
  fn descendants(&self, ns: Namespace, tag: &str) -> Vec<&Self>;

  /// Value of an unprefixed attribute. Prefixed attributes are never
  /// returned, whatever their local name.
  fn attribute(&self, name: &str) -> Option<&str>;

  /// Text before the first child element, trimmed and unescaped. Empty if
  /// there is none.
  fn text(&self) -> &str;
}

// ─── Tree ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
  namespace:  Option<String>,
  name:       String,
  attributes: Vec<(String, String)>,
  text:       String,
  children:   Vec<Element>,
}

impl Element {
  fn open(namespace: Option<String>, start: &BytesStart<'_>) -> Result<Self> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
      let attr = attr.map_err(quick_xml::Error::from)?;
      // Namespace declarations and prefixed attributes are not looked up.
      let key = attr.key;
      if key.as_namespace_binding().is_some() || key.prefix().is_some() {
        continue;
      }
      let key = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
      let value = attr.unescape_value()?.into_owned();
      attributes.push((key, value));
    }

    Ok(Element {
      namespace,
      name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
      attributes,
      text: String::new(),
      children: Vec::new(),
    })
  }

  fn is(&self, ns: Namespace, tag: &str) -> bool {
    self.name == tag && self.namespace.as_deref() == Some(ns.uri())
  }

  pub fn namespace(&self) -> Option<&str> { self.namespace.as_deref() }
}

impl FeedNode for Element {
  fn tag(&self) -> &str { &self.name }

  fn child(&self, ns: Namespace, tag: &str) -> Option<&Self> {
    self.children.iter().find(|c| c.is(ns, tag))
  }

  fn descendants(&self, ns: Namespace, tag: &str) -> Vec<&Self> {
    let mut found = Vec::new();
    let mut stack: Vec<&Element> = self.children.iter().rev().collect();
    while let Some(el) = stack.pop() {
      if el.is(ns, tag) {
        found.push(el);
      }
      stack.extend(el.children.iter().rev());
    }
    found
  }

  fn attribute(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v.as_str())
  }

  fn text(&self) -> &str { &self.text }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A parsed feed document.
#[derive(Debug, Clone)]
pub struct Document {
  root: Element,
}

impl Document {
  /// Parse one complete XML document.
  pub fn parse(xml: &[u8]) -> Result<Self> {
    let top = EntityPath::default();
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
      let (resolved, event) = reader.read_resolved_event()?;
      match event {
        Event::Start(ref e) => {
          open.push(Element::open(resolve(resolved, &top)?, e)?);
        }
        Event::Empty(ref e) => {
          let el = Element::open(resolve(resolved, &top)?, e)?;
          attach(&mut open, &mut root, el)?;
        }
        Event::End(_) => {
          let el = open
            .pop()
            .ok_or_else(|| Error::malformed(&top, "unbalanced end tag"))?;
          attach(&mut open, &mut root, el)?;
        }
        Event::Text(ref t) => {
          let text = t.unescape()?;
          push_text(&mut open, &text, &top)?;
        }
        Event::CData(ref c) => {
          push_text(&mut open, String::from_utf8_lossy(c).trim(), &top)?;
        }
        Event::Eof => break,
        _ => {}
      }
    }

    if let Some(el) = open.last() {
      return Err(Error::malformed(
        &top,
        format!("unclosed element <{}>", el.name),
      ));
    }
    let root =
      root.ok_or_else(|| Error::malformed(&top, "document has no root element"))?;
    Ok(Document { root })
  }

  pub fn root(&self) -> &Element { &self.root }
}

fn resolve(resolved: ResolveResult<'_>, path: &EntityPath) -> Result<Option<String>> {
  match resolved {
    ResolveResult::Bound(XmlNamespace(uri)) => {
      Ok(Some(String::from_utf8_lossy(uri).into_owned()))
    }
    ResolveResult::Unbound => Ok(None),
    ResolveResult::Unknown(prefix) => Err(Error::malformed(
      path,
      format!(
        "unknown namespace prefix `{}`",
        String::from_utf8_lossy(&prefix)
      ),
    )),
  }
}

/// Only the text before an element's first child is kept.
fn push_text(open: &mut [Element], text: &str, path: &EntityPath) -> Result<()> {
  match open.last_mut() {
    Some(el) if el.children.is_empty() => el.text.push_str(text),
    Some(_) => {}
    None if text.is_empty() => {}
    None => return Err(Error::malformed(path, "text outside the root element")),
  }
  Ok(())
}

fn attach(
  open: &mut [Element],
  root: &mut Option<Element>,
  el: Element,
) -> Result<()> {
  if let Some(parent) = open.last_mut() {
    parent.children.push(el);
  } else if root.is_none() {
    *root = Some(el);
  } else {
    return Err(Error::malformed(
      &EntityPath::default(),
      "more than one root element",
    ));
  }
  Ok(())
}

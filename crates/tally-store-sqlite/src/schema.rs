//! SQL schema for the results store.
//!
//! Executed once at connection startup. Tables are `STRICT`, so a value of
//! the wrong type is rejected instead of silently coerced. Every `UNIQUE`
//! tuple is the upsert key the extractor declares for that table.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS event (
    id    TEXT PRIMARY KEY,
    name  TEXT NOT NULL
) STRICT;

CREATE TABLE IF NOT EXISTS election (
    event_id  TEXT NOT NULL REFERENCES event(id),
    id        TEXT NOT NULL,
    name      TEXT NOT NULL,
    category  TEXT NOT NULL,   -- 'House' | 'Senate'
    UNIQUE (event_id, id)
) STRICT;

CREATE TABLE IF NOT EXISTS contest (
    event_id     TEXT NOT NULL,
    election_id  TEXT NOT NULL,
    id           TEXT NOT NULL,
    name         TEXT NOT NULL,
    enrolment    INTEGER NOT NULL CHECK (enrolment >= 0),
    UNIQUE (event_id, election_id, id),
    FOREIGN KEY (event_id, election_id) REFERENCES election(event_id, id)
) STRICT;

-- Candidate identity is global, not per contest.
CREATE TABLE IF NOT EXISTS candidate (
    id    TEXT PRIMARY KEY,
    name  TEXT NOT NULL
) STRICT;

CREATE TABLE IF NOT EXISTS party (
    id    TEXT PRIMARY KEY,
    code  TEXT,
    name  TEXT NOT NULL
) STRICT;

-- elected / incumbent: 1, 0, or NULL when the feed flag was not recognised.
CREATE TABLE IF NOT EXISTS first_preferences (
    event_id      TEXT NOT NULL,
    election_id   TEXT NOT NULL,
    contest_id    TEXT NOT NULL,
    candidate_id  TEXT NOT NULL REFERENCES candidate(id),
    party_id      TEXT REFERENCES party(id),
    elected       INTEGER CHECK (elected IN (0, 1)),
    incumbent     INTEGER CHECK (incumbent IN (0, 1)),
    votes         INTEGER NOT NULL CHECK (votes >= 0),
    UNIQUE (event_id, election_id, contest_id, candidate_id),
    FOREIGN KEY (event_id, election_id, contest_id)
        REFERENCES contest(event_id, election_id, id)
) STRICT;

CREATE TABLE IF NOT EXISTS two_candidate_preferred (
    event_id      TEXT NOT NULL,
    election_id   TEXT NOT NULL,
    contest_id    TEXT NOT NULL,
    candidate_id  TEXT NOT NULL REFERENCES candidate(id),
    party_id      TEXT REFERENCES party(id),
    elected       INTEGER CHECK (elected IN (0, 1)),
    incumbent     INTEGER CHECK (incumbent IN (0, 1)),
    votes         INTEGER NOT NULL CHECK (votes >= 0),
    UNIQUE (event_id, election_id, contest_id, candidate_id),
    FOREIGN KEY (event_id, election_id, contest_id)
        REFERENCES contest(event_id, election_id, id)
) STRICT;

CREATE INDEX IF NOT EXISTS first_preferences_candidate_idx
    ON first_preferences(candidate_id);
CREATE INDEX IF NOT EXISTS two_candidate_preferred_candidate_idx
    ON two_candidate_preferred(candidate_id);

PRAGMA user_version = 1;
";

//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS incident_types (
    incident_type_id TEXT PRIMARY KEY,
    name             TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS sanction_types (
    sanction_type_id TEXT PRIMARY KEY,
    name             TEXT NOT NULL UNIQUE,
    severity         TEXT NOT NULL    -- 'mild' | 'moderate' | 'severe'
);

-- Core fields are written once. The only UPDATEs ever issued set the
-- resolution columns or successor_group_id, each guarded by IS NULL.
-- There is no status column: status is derived on read.
CREATE TABLE IF NOT EXISTS incident_groups (
    group_id               TEXT PRIMARY KEY,
    incident_type_id       TEXT NOT NULL REFERENCES incident_types(incident_type_id),
    occurred_on            TEXT NOT NULL,   -- YYYY-MM-DD
    description            TEXT NOT NULL,
    observations           TEXT,
    reported_at            TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    predecessor_group_id   TEXT UNIQUE REFERENCES incident_groups(group_id),
    successor_group_id     TEXT UNIQUE REFERENCES incident_groups(group_id),
    resolution_description TEXT,
    resolution_recorded_at TEXT,
    CHECK (predecessor_group_id IS NULL OR predecessor_group_id != group_id),
    CHECK (successor_group_id   IS NULL OR successor_group_id   != group_id),
    CHECK ((resolution_description IS NULL) = (resolution_recorded_at IS NULL))
);

-- Never modified after the group row is inserted.
CREATE TABLE IF NOT EXISTS involved_employees (
    group_id    TEXT NOT NULL REFERENCES incident_groups(group_id),
    employee_id TEXT NOT NULL REFERENCES employees(employee_id),
    PRIMARY KEY (group_id, employee_id)
);

CREATE TABLE IF NOT EXISTS defense_statements (
    statement_id       TEXT PRIMARY KEY,
    group_id           TEXT NOT NULL REFERENCES incident_groups(group_id),
    author_employee_id TEXT NOT NULL REFERENCES employees(employee_id),
    content            TEXT NOT NULL,
    attachment_ref     TEXT,
    submitted_at       TEXT NOT NULL,
    UNIQUE (group_id, author_employee_id)
);

CREATE TABLE IF NOT EXISTS sanctions (
    sanction_id      TEXT PRIMARY KEY,
    employee_id      TEXT NOT NULL REFERENCES employees(employee_id),
    sanction_type_id TEXT NOT NULL REFERENCES sanction_types(sanction_type_id),
    reason           TEXT NOT NULL,
    start_date       TEXT NOT NULL,
    end_date         TEXT,
    source_group_id  TEXT REFERENCES incident_groups(group_id),
    recorded_at      TEXT NOT NULL,
    CHECK (end_date IS NULL OR end_date >= start_date)
);

-- At most one workflow sanction per employee per group.
CREATE UNIQUE INDEX IF NOT EXISTS sanctions_source_employee_uq
    ON sanctions(source_group_id, employee_id)
    WHERE source_group_id IS NOT NULL;

CREATE INDEX IF NOT EXISTS involved_employee_idx ON involved_employees(employee_id);
CREATE INDEX IF NOT EXISTS statements_group_idx  ON defense_statements(group_id);
CREATE INDEX IF NOT EXISTS sanctions_employee_idx ON sanctions(employee_id);

PRAGMA user_version = 1;
";

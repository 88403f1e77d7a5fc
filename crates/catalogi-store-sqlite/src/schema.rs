//! SQL schema for the Catalogi SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Message raised by the overlap triggers; matched when mapping errors.
pub const OVERLAP_MESSAGE: &str = "validity overlap";

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS catalogs (
    catalog_id  TEXT PRIMARY KEY,
    domain      TEXT NOT NULL,
    rsin        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS versioned_types (
    type_id        TEXT PRIMARY KEY,
    kind           TEXT NOT NULL,   -- 'case_type' | 'decision_type' | 'document_type'
    catalog_id     TEXT NOT NULL REFERENCES catalogs(catalog_id),
    identity       TEXT NOT NULL,
    draft          INTEGER NOT NULL DEFAULT 1,
    begin_validity TEXT NOT NULL,   -- YYYY-MM-DD, inclusive
    end_validity   TEXT,            -- YYYY-MM-DD, exclusive; NULL is open-ended
    details_json   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS versioned_types_identity_idx
    ON versioned_types(kind, catalog_id, identity);

-- Versions of one identity never share a day, whatever their draft state.
CREATE TRIGGER IF NOT EXISTS versioned_types_overlap_insert
BEFORE INSERT ON versioned_types
WHEN EXISTS (
    SELECT 1 FROM versioned_types o
    WHERE o.kind = NEW.kind
      AND o.catalog_id = NEW.catalog_id
      AND o.identity = NEW.identity
      AND o.begin_validity < coalesce(NEW.end_validity, '9999-12-31')
      AND NEW.begin_validity < coalesce(o.end_validity, '9999-12-31')
)
BEGIN
    SELECT RAISE(ABORT, 'validity overlap');
END;

CREATE TRIGGER IF NOT EXISTS versioned_types_overlap_update
BEFORE UPDATE OF identity, begin_validity, end_validity ON versioned_types
WHEN EXISTS (
    SELECT 1 FROM versioned_types o
    WHERE o.type_id <> NEW.type_id
      AND o.kind = NEW.kind
      AND o.catalog_id = NEW.catalog_id
      AND o.identity = NEW.identity
      AND o.begin_validity < coalesce(NEW.end_validity, '9999-12-31')
      AND NEW.begin_validity < coalesce(o.end_validity, '9999-12-31')
)
BEGIN
    SELECT RAISE(ABORT, 'validity overlap');
END;

-- Symmetric links, stored once with left_id < right_id.
CREATE TABLE IF NOT EXISTS type_links (
    left_id   TEXT NOT NULL REFERENCES versioned_types(type_id) ON DELETE CASCADE,
    right_id  TEXT NOT NULL REFERENCES versioned_types(type_id) ON DELETE CASCADE,
    PRIMARY KEY (left_id, right_id),
    CHECK (left_id < right_id)
);

CREATE INDEX IF NOT EXISTS type_links_right_idx ON type_links(right_id);

CREATE TABLE IF NOT EXISTS subcase_types (
    case_type_id    TEXT NOT NULL REFERENCES versioned_types(type_id) ON DELETE CASCADE,
    subcase_type_id TEXT NOT NULL REFERENCES versioned_types(type_id) ON DELETE CASCADE,
    PRIMARY KEY (case_type_id, subcase_type_id)
);

-- Result, status and role types; each belongs to exactly one case type.
CREATE TABLE IF NOT EXISTS case_type_children (
    child_id     TEXT PRIMARY KEY,
    case_type_id TEXT NOT NULL REFERENCES versioned_types(type_id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,   -- 'result_type' | 'status_type' | 'role_type'
    description  TEXT NOT NULL,
    details_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS case_type_children_parent_idx
    ON case_type_children(case_type_id);

CREATE UNIQUE INDEX IF NOT EXISTS result_type_description_idx
    ON case_type_children(case_type_id, description)
    WHERE kind = 'result_type';

CREATE TABLE IF NOT EXISTS case_type_document_types (
    link_id          TEXT PRIMARY KEY,
    case_type_id     TEXT NOT NULL REFERENCES versioned_types(type_id) ON DELETE CASCADE,
    document_type_id TEXT NOT NULL REFERENCES versioned_types(type_id) ON DELETE CASCADE,
    sequence_number  INTEGER NOT NULL,
    direction        TEXT NOT NULL,   -- 'inkomend' | 'intern' | 'uitgaand'
    status_type_id   TEXT REFERENCES case_type_children(child_id) ON DELETE SET NULL
);

PRAGMA user_version = 1;
";

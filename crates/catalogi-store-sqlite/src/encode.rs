//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339, calendar dates are `YYYY-MM-DD` (so that text
//! comparison orders them), kind-specific payloads are compact JSON and
//! UUIDs are hyphenated lowercase strings.

use std::str::FromStr;

use catalogi_core::types::{
  CaseTypeDocumentType, Catalog, ChildDetails, ChildType, TypeDetails,
  VersionedType,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::Decode(e.to_string()))
}

/// Decode a strum-backed enum column.
pub fn decode_enum<T: FromStr>(s: &str, what: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for a catalog, in [`RawCatalog::from_row`] order.
pub const CATALOG_COLUMNS: &str = "catalog_id, domain, rsin, created_at";

pub struct RawCatalog {
  pub catalog_id: String,
  pub domain:     String,
  pub rsin:       String,
  pub created_at: String,
}

impl RawCatalog {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      catalog_id: row.get(0)?,
      domain:     row.get(1)?,
      rsin:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_catalog(self) -> Result<Catalog> {
    Ok(Catalog {
      catalog_id: decode_uuid(&self.catalog_id)?,
      domain:     self.domain,
      rsin:       self.rsin,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Columns selected for a versioned type aliased as `t`.
pub const TYPE_COLUMNS: &str = "t.type_id, t.catalog_id, t.identity, t.draft, \
                                t.begin_validity, t.end_validity, t.details_json";

pub struct RawType {
  pub type_id:        String,
  pub catalog_id:     String,
  pub identity:       String,
  pub draft:          bool,
  pub begin_validity: String,
  pub end_validity:   Option<String>,
  pub details_json:   String,
}

impl RawType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      type_id:        row.get(0)?,
      catalog_id:     row.get(1)?,
      identity:       row.get(2)?,
      draft:          row.get(3)?,
      begin_validity: row.get(4)?,
      end_validity:   row.get(5)?,
      details_json:   row.get(6)?,
    })
  }

  pub fn into_type(self) -> Result<VersionedType> {
    let details: TypeDetails = serde_json::from_str(&self.details_json)?;
    Ok(VersionedType {
      type_id: decode_uuid(&self.type_id)?,
      catalog_id: decode_uuid(&self.catalog_id)?,
      identity: self.identity,
      draft: self.draft,
      begin_validity: decode_date(&self.begin_validity)?,
      end_validity: self.end_validity.as_deref().map(decode_date).transpose()?,
      details,
    })
  }
}

/// Columns selected for a case type child aliased as `c`.
pub const CHILD_COLUMNS: &str = "c.child_id, c.case_type_id, c.details_json";

pub struct RawChild {
  pub child_id:     String,
  pub case_type_id: String,
  pub details_json: String,
}

impl RawChild {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      child_id:     row.get(0)?,
      case_type_id: row.get(1)?,
      details_json: row.get(2)?,
    })
  }

  pub fn into_child(self) -> Result<ChildType> {
    let details: ChildDetails = serde_json::from_str(&self.details_json)?;
    Ok(ChildType {
      child_id: decode_uuid(&self.child_id)?,
      case_type_id: decode_uuid(&self.case_type_id)?,
      details,
    })
  }
}

/// Columns selected for a case type ↔ document type record aliased as `d`.
pub const DOCUMENT_LINK_COLUMNS: &str = "d.link_id, d.case_type_id, \
                                         d.document_type_id, d.sequence_number, \
                                         d.direction, d.status_type_id";

pub struct RawDocumentLink {
  pub link_id:          String,
  pub case_type_id:     String,
  pub document_type_id: String,
  pub sequence_number:  u32,
  pub direction:        String,
  pub status_type_id:   Option<String>,
}

impl RawDocumentLink {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      link_id:          row.get(0)?,
      case_type_id:     row.get(1)?,
      document_type_id: row.get(2)?,
      sequence_number:  row.get(3)?,
      direction:        row.get(4)?,
      status_type_id:   row.get(5)?,
    })
  }

  pub fn into_link(self) -> Result<CaseTypeDocumentType> {
    Ok(CaseTypeDocumentType {
      link_id:          decode_uuid(&self.link_id)?,
      case_type_id:     decode_uuid(&self.case_type_id)?,
      document_type_id: decode_uuid(&self.document_type_id)?,
      sequence_number:  self.sequence_number,
      direction:        decode_enum(&self.direction, "direction")?,
      status_type_id:   self
        .status_type_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
    })
  }
}

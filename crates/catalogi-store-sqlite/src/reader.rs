//! Row-level queries, and the [`TxReader`] that exposes them to the
//! validators inside a write transaction.

use catalogi_core::{
  store::{CatalogReader, ChildQuery, DocumentLinkQuery},
  types::{
    CaseTypeDocumentType, Catalog, ChildType, RelationField, TypeKind,
    TypeRelations, TypeView, VersionedType,
  },
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    CATALOG_COLUMNS, CHILD_COLUMNS, DOCUMENT_LINK_COLUMNS, RawCatalog, RawChild,
    RawDocumentLink, RawType, TYPE_COLUMNS, encode_uuid,
  },
};

// ─── Catalogs ────────────────────────────────────────────────────────────────

pub fn catalog(conn: &Connection, catalog_id: Uuid) -> Result<Option<Catalog>> {
  conn
    .query_row(
      &format!("SELECT {CATALOG_COLUMNS} FROM catalogs WHERE catalog_id = ?1"),
      params![encode_uuid(catalog_id)],
      RawCatalog::from_row,
    )
    .optional()?
    .map(RawCatalog::into_catalog)
    .transpose()
}

pub fn catalogs(conn: &Connection) -> Result<Vec<Catalog>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CATALOG_COLUMNS} FROM catalogs ORDER BY created_at"
  ))?;
  let raws = stmt
    .query_map([], RawCatalog::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawCatalog::into_catalog).collect()
}

// ─── Versioned types ─────────────────────────────────────────────────────────

fn query_types(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Result<Vec<VersionedType>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, RawType::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawType::into_type).collect()
}

pub fn versioned_type(conn: &Connection, type_id: Uuid) -> Result<Option<VersionedType>> {
  conn
    .query_row(
      &format!("SELECT {TYPE_COLUMNS} FROM versioned_types t WHERE t.type_id = ?1"),
      params![encode_uuid(type_id)],
      RawType::from_row,
    )
    .optional()?
    .map(RawType::into_type)
    .transpose()
}

/// Types of `kind`, optionally narrowed to a catalog and identity.
pub fn types_where(
  conn: &Connection,
  kind: TypeKind,
  catalog_id: Option<Uuid>,
  identity: Option<&str>,
) -> Result<Vec<VersionedType>> {
  query_types(
    conn,
    &format!(
      "SELECT {TYPE_COLUMNS} FROM versioned_types t
       WHERE t.kind = ?1
         AND (?2 IS NULL OR t.catalog_id = ?2)
         AND (?3 IS NULL OR t.identity = ?3)
       ORDER BY t.identity, t.begin_validity"
    ),
    params![kind.as_ref(), catalog_id.map(encode_uuid), identity],
  )
}

/// Types linked to `owner` through `field`. Case type ↔ document type links
/// come from both `type_links` and the `case_type_document_types` records.
pub fn linked_types(
  conn: &Connection,
  owner: Uuid,
  field: RelationField,
) -> Result<Vec<VersionedType>> {
  query_types(
    conn,
    &format!(
      "SELECT {TYPE_COLUMNS} FROM versioned_types t
       WHERE t.kind = ?2
         AND t.type_id IN (
           SELECT CASE WHEN l.left_id = ?1 THEN l.right_id ELSE l.left_id END
           FROM type_links l
           WHERE l.left_id = ?1 OR l.right_id = ?1
           UNION
           SELECT d.document_type_id FROM case_type_document_types d
           WHERE d.case_type_id = ?1
           UNION
           SELECT d.case_type_id FROM case_type_document_types d
           WHERE d.document_type_id = ?1
         )
       ORDER BY t.identity, t.begin_validity"
    ),
    params![encode_uuid(owner), field.target_kind().as_ref()],
  )
}

pub fn subcase_types(conn: &Connection, case_type_id: Uuid) -> Result<Vec<VersionedType>> {
  query_types(
    conn,
    &format!(
      "SELECT {TYPE_COLUMNS} FROM subcase_types s
       JOIN versioned_types t ON t.type_id = s.subcase_type_id
       WHERE s.case_type_id = ?1
       ORDER BY t.identity, t.begin_validity"
    ),
    params![encode_uuid(case_type_id)],
  )
}

/// Materialise the outgoing links of `ty`.
pub fn relations(conn: &Connection, ty: &VersionedType) -> Result<TypeRelations> {
  let ids = |field: RelationField| -> Result<Vec<Uuid>> {
    if !ty.kind().relation_fields().contains(&field) {
      return Ok(Vec::new());
    }
    Ok(
      linked_types(conn, ty.type_id, field)?
        .into_iter()
        .map(|t| t.type_id)
        .collect(),
    )
  };
  let subcase_types = if ty.kind() == TypeKind::CaseType {
    subcase_types(conn, ty.type_id)?
      .into_iter()
      .map(|t| t.type_id)
      .collect()
  } else {
    Vec::new()
  };
  Ok(TypeRelations {
    case_types: ids(RelationField::CaseTypes)?,
    decision_types: ids(RelationField::DecisionTypes)?,
    document_types: ids(RelationField::DocumentTypes)?,
    subcase_types,
  })
}

pub fn view(conn: &Connection, versioned: VersionedType) -> Result<TypeView> {
  let relations = relations(conn, &versioned)?;
  Ok(TypeView { versioned, relations })
}

// ─── Case type children ──────────────────────────────────────────────────────

fn query_children(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Result<Vec<ChildType>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, RawChild::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawChild::into_child).collect()
}

pub fn child(conn: &Connection, child_id: Uuid) -> Result<Option<ChildType>> {
  conn
    .query_row(
      &format!("SELECT {CHILD_COLUMNS} FROM case_type_children c WHERE c.child_id = ?1"),
      params![encode_uuid(child_id)],
      RawChild::from_row,
    )
    .optional()?
    .map(RawChild::into_child)
    .transpose()
}

pub fn children_of(conn: &Connection, case_type_id: Uuid) -> Result<Vec<ChildType>> {
  query_children(
    conn,
    &format!(
      "SELECT {CHILD_COLUMNS} FROM case_type_children c
       WHERE c.case_type_id = ?1
       ORDER BY c.kind, c.description"
    ),
    params![encode_uuid(case_type_id)],
  )
}

/// Children matching `query`; the status filter applies to the parent.
pub fn children(conn: &Connection, query: &ChildQuery) -> Result<Vec<ChildType>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CHILD_COLUMNS}, t.draft FROM case_type_children c
     JOIN versioned_types t ON t.type_id = c.case_type_id
     WHERE (?1 IS NULL OR c.kind = ?1)
       AND (?2 IS NULL OR c.case_type_id = ?2)
     ORDER BY c.case_type_id, c.kind, c.description"
  ))?;
  let rows = stmt
    .query_map(
      params![
        query.kind.map(|k| k.as_ref().to_owned()),
        query.case_type_id.map(encode_uuid),
      ],
      |row| Ok((RawChild::from_row(row)?, row.get::<_, bool>(3)?)),
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  rows
    .into_iter()
    .filter(|(_, draft)| query.status.admits(*draft))
    .map(|(raw, _)| raw.into_child())
    .collect()
}

// ─── Case type ↔ document type records ───────────────────────────────────────

pub fn document_link(conn: &Connection, link_id: Uuid) -> Result<Option<CaseTypeDocumentType>> {
  conn
    .query_row(
      &format!(
        "SELECT {DOCUMENT_LINK_COLUMNS} FROM case_type_document_types d
         WHERE d.link_id = ?1"
      ),
      params![encode_uuid(link_id)],
      RawDocumentLink::from_row,
    )
    .optional()?
    .map(RawDocumentLink::into_link)
    .transpose()
}

pub fn document_links(
  conn: &Connection,
  query: &DocumentLinkQuery,
) -> Result<Vec<CaseTypeDocumentType>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {DOCUMENT_LINK_COLUMNS} FROM case_type_document_types d
     WHERE (?1 IS NULL OR d.case_type_id = ?1)
       AND (?2 IS NULL OR d.document_type_id = ?2)
     ORDER BY d.case_type_id, d.sequence_number"
  ))?;
  let raws = stmt
    .query_map(
      params![
        query.case_type_id.map(encode_uuid),
        query.document_type_id.map(encode_uuid),
      ],
      RawDocumentLink::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawDocumentLink::into_link).collect()
}

// ─── Reader ──────────────────────────────────────────────────────────────────

/// A [`CatalogReader`] over a connection, typically an open transaction.
pub struct TxReader<'c> {
  conn: &'c Connection,
}

impl<'c> TxReader<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }
}

fn storage(err: Error) -> catalogi_core::Error { catalogi_core::Error::storage(err) }

impl CatalogReader for TxReader<'_> {
  fn catalog(&self, catalog_id: Uuid) -> catalogi_core::Result<Option<Catalog>> {
    catalog(self.conn, catalog_id).map_err(storage)
  }

  fn versioned_type(&self, type_id: Uuid) -> catalogi_core::Result<Option<VersionedType>> {
    versioned_type(self.conn, type_id).map_err(storage)
  }

  fn versions_of(
    &self,
    kind: TypeKind,
    catalog_id: Uuid,
    identity: &str,
  ) -> catalogi_core::Result<Vec<VersionedType>> {
    types_where(self.conn, kind, Some(catalog_id), Some(identity)).map_err(storage)
  }

  fn linked_types(
    &self,
    owner: Uuid,
    field: RelationField,
  ) -> catalogi_core::Result<Vec<VersionedType>> {
    linked_types(self.conn, owner, field).map_err(storage)
  }

  fn subcase_types(&self, case_type_id: Uuid) -> catalogi_core::Result<Vec<VersionedType>> {
    subcase_types(self.conn, case_type_id).map_err(storage)
  }

  fn child(&self, child_id: Uuid) -> catalogi_core::Result<Option<ChildType>> {
    child(self.conn, child_id).map_err(storage)
  }

  fn children_of(&self, case_type_id: Uuid) -> catalogi_core::Result<Vec<ChildType>> {
    children_of(self.conn, case_type_id).map_err(storage)
  }
}

//! [`SqliteStore`], the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use catalogi_core::{
  ErrorCode, Scopes, ValidationError,
  store::{
    CatalogReader as _, CatalogStore, ChildQuery, DocumentLinkQuery, TypeQuery,
  },
  types::{
    CaseTypeDocumentType, CaseTypeDocumentTypePatch, Catalog, ChildPatch,
    ChildType, NewCaseTypeDocumentType, NewCatalog, NewChildType,
    NewVersionedType, RelationField, TypeKind, TypePatch, TypeView,
    VersionedType,
  },
  validate::{
    RequestContext, publish, validate_create, validate_delete, validate_update,
  },
};
use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{encode_date, encode_dt, encode_uuid},
  reader::{self, TxReader},
  schema::{OVERLAP_MESSAGE, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread.
  async fn run<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── Write helpers ───────────────────────────────────────────────────────────

/// Writers take the lock up front so the validators read the state the
/// write commits on top of.
fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
  Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Translate schema backstops into the errors the validators would raise.
fn backstop(err: rusqlite::Error) -> Error {
  let violated = |needle: &str| {
    matches!(
      &err,
      rusqlite::Error::SqliteFailure(e, Some(msg))
        if e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains(needle)
    )
  };
  if violated(OVERLAP_MESSAGE) {
    tracing::warn!("overlap trigger fired after validation passed");
    return Error::Core(
      ValidationError::new(
        "begin_validity",
        ErrorCode::Overlap,
        "another version of this type is valid within the given period",
      )
      .into(),
    );
  }
  if violated("case_type_children.description") {
    return Error::Core(
      ValidationError::non_field(
        ErrorCode::Unique,
        "the case type already has a result type with this description",
      )
      .into(),
    );
  }
  Error::Sqlite(err)
}

fn not_found(entity: &'static str, id: Uuid) -> Error {
  Error::Core(catalogi_core::Error::NotFound { entity, id })
}

fn write_type(tx: &Transaction<'_>, ty: &VersionedType, insert: bool) -> Result<()> {
  let sql = if insert {
    "INSERT INTO versioned_types (
       type_id, kind, catalog_id, identity, draft,
       begin_validity, end_validity, details_json
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
  } else {
    "UPDATE versioned_types
     SET kind = ?2, catalog_id = ?3, identity = ?4, draft = ?5,
         begin_validity = ?6, end_validity = ?7, details_json = ?8
     WHERE type_id = ?1"
  };
  tx.execute(
    sql,
    params![
      encode_uuid(ty.type_id),
      ty.kind().as_ref(),
      encode_uuid(ty.catalog_id),
      ty.identity,
      ty.draft,
      encode_date(ty.begin_validity),
      ty.end_validity.map(encode_date),
      serde_json::to_string(&ty.details)?,
    ],
  )
  .map_err(backstop)?;
  Ok(())
}

/// Replace the links of `owner` on `field` with `targets`.
fn replace_links(
  tx: &Transaction<'_>,
  owner: Uuid,
  field: RelationField,
  targets: &[Uuid],
) -> Result<()> {
  let owner_str = encode_uuid(owner);
  tx.execute(
    "DELETE FROM type_links
     WHERE (left_id = ?1 AND right_id IN (SELECT type_id FROM versioned_types WHERE kind = ?2))
        OR (right_id = ?1 AND left_id IN (SELECT type_id FROM versioned_types WHERE kind = ?2))",
    params![owner_str, field.target_kind().as_ref()],
  )?;
  let mut stmt =
    tx.prepare("INSERT OR IGNORE INTO type_links (left_id, right_id) VALUES (?1, ?2)")?;
  for target in targets {
    let target_str = encode_uuid(*target);
    let (left, right) = if owner_str < target_str {
      (&owner_str, &target_str)
    } else {
      (&target_str, &owner_str)
    };
    stmt.execute(params![left, right])?;
  }
  Ok(())
}

fn replace_subcases(tx: &Transaction<'_>, owner: Uuid, targets: &[Uuid]) -> Result<()> {
  let owner_str = encode_uuid(owner);
  tx.execute(
    "DELETE FROM subcase_types WHERE case_type_id = ?1",
    params![owner_str],
  )?;
  let mut stmt = tx.prepare(
    "INSERT OR IGNORE INTO subcase_types (case_type_id, subcase_type_id) VALUES (?1, ?2)",
  )?;
  for target in targets {
    stmt.execute(params![owner_str, encode_uuid(*target)])?;
  }
  Ok(())
}

fn write_child(tx: &Transaction<'_>, child: &ChildType, insert: bool) -> Result<()> {
  let sql = if insert {
    "INSERT INTO case_type_children (child_id, case_type_id, kind, description, details_json)
     VALUES (?1, ?2, ?3, ?4, ?5)"
  } else {
    "UPDATE case_type_children
     SET case_type_id = ?2, kind = ?3, description = ?4, details_json = ?5
     WHERE child_id = ?1"
  };
  tx.execute(
    sql,
    params![
      encode_uuid(child.child_id),
      encode_uuid(child.case_type_id),
      child.kind().as_ref(),
      child.details.description(),
      serde_json::to_string(&child.details)?,
    ],
  )
  .map_err(backstop)?;
  Ok(())
}

fn write_document_link(
  tx: &Transaction<'_>,
  link: &CaseTypeDocumentType,
  insert: bool,
) -> Result<()> {
  let sql = if insert {
    "INSERT INTO case_type_document_types (
       link_id, case_type_id, document_type_id, sequence_number, direction, status_type_id
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
  } else {
    "UPDATE case_type_document_types
     SET case_type_id = ?2, document_type_id = ?3, sequence_number = ?4,
         direction = ?5, status_type_id = ?6
     WHERE link_id = ?1"
  };
  tx.execute(
    sql,
    params![
      encode_uuid(link.link_id),
      encode_uuid(link.case_type_id),
      encode_uuid(link.document_type_id),
      link.sequence_number,
      link.direction.as_ref(),
      link.status_type_id.map(encode_uuid),
    ],
  )?;
  Ok(())
}

/// Give a new document type version the case type records of the other
/// versions of its identity, for every case type valid on the new version's
/// first day. Returns the number of records created.
fn inherit_document_links(tx: &Transaction<'_>, doc: &VersionedType) -> Result<usize> {
  let inherited = {
    let mut stmt = tx.prepare(
      "SELECT DISTINCT d.case_type_id, d.sequence_number, d.direction, d.status_type_id
       FROM case_type_document_types d
       JOIN versioned_types o ON o.type_id = d.document_type_id
       JOIN versioned_types c ON c.type_id = d.case_type_id
       WHERE o.kind = ?1
         AND o.catalog_id = ?2
         AND o.identity = ?3
         AND o.type_id <> ?4
         AND c.begin_validity <= ?5
         AND (c.end_validity IS NULL OR ?5 < c.end_validity)",
    )?;
    stmt
      .query_map(
        params![
          TypeKind::DocumentType.as_ref(),
          encode_uuid(doc.catalog_id),
          doc.identity,
          encode_uuid(doc.type_id),
          encode_date(doc.begin_validity),
        ],
        |row| {
          Ok((
            row.get::<_, String>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
          ))
        },
      )?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  for (case_type_id, sequence_number, direction, status_type_id) in &inherited {
    tx.execute(
      "INSERT INTO case_type_document_types (
         link_id, case_type_id, document_type_id, sequence_number, direction, status_type_id
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(Uuid::new_v4()),
        case_type_id,
        encode_uuid(doc.type_id),
        sequence_number,
        direction,
        status_type_id,
      ],
    )?;
  }
  Ok(inherited.len())
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Catalogs ──────────────────────────────────────────────────────────────

  async fn create_catalog(&self, input: NewCatalog) -> Result<Catalog> {
    let catalog = Catalog {
      catalog_id: Uuid::new_v4(),
      domain:     input.domain,
      rsin:       input.rsin,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(catalog.catalog_id);
    let at_str = encode_dt(catalog.created_at);
    let domain = catalog.domain.clone();
    let rsin   = catalog.rsin.clone();

    self
      .run(move |conn| {
        conn.execute(
          "INSERT INTO catalogs (catalog_id, domain, rsin, created_at) VALUES (?1, ?2, ?3, ?4)",
          params![id_str, domain, rsin, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(catalog_id = %catalog.catalog_id, "created catalog");
    Ok(catalog)
  }

  async fn get_catalog(&self, catalog_id: Uuid) -> Result<Option<Catalog>> {
    self.run(move |conn| reader::catalog(conn, catalog_id)).await
  }

  async fn list_catalogs(&self) -> Result<Vec<Catalog>> {
    self.run(|conn| reader::catalogs(conn)).await
  }

  // ── Versioned types ───────────────────────────────────────────────────────

  async fn create_type(
    &self,
    input: NewVersionedType,
    ctx: RequestContext,
  ) -> Result<TypeView> {
    let (view, inherited) = self
      .run(move |conn| {
        let tx = begin(conn)?;
        validate_create::<VersionedType, _>(&TxReader::new(&tx), &input, &ctx)?;

        let ty = VersionedType {
          type_id:        Uuid::new_v4(),
          catalog_id:     input.catalog_id,
          identity:       input.identity.clone(),
          draft:          true,
          begin_validity: input.begin_validity,
          end_validity:   input.end_validity,
          details:        input.details.clone(),
        };
        write_type(&tx, &ty, true)?;
        for &field in ty.kind().relation_fields() {
          replace_links(&tx, ty.type_id, field, input.relations.field(field))?;
        }
        let inherited = match ty.kind() {
          TypeKind::CaseType => {
            replace_subcases(&tx, ty.type_id, &input.relations.subcase_types)?;
            0
          }
          TypeKind::DocumentType => inherit_document_links(&tx, &ty)?,
          TypeKind::DecisionType => 0,
        };

        let view = reader::view(&tx, ty)?;
        tx.commit()?;
        Ok((view, inherited))
      })
      .await?;

    tracing::info!(
      type_id = %view.versioned.type_id,
      kind = %view.versioned.kind(),
      identity = %view.versioned.identity,
      inherited,
      "created versioned type"
    );
    Ok(view)
  }

  async fn update_type(
    &self,
    type_id: Uuid,
    patch: TypePatch,
    partial: bool,
    ctx: RequestContext,
  ) -> Result<TypeView> {
    let view = self
      .run(move |conn| {
        let tx = begin(conn)?;
        let reader = TxReader::new(&tx);
        let current = reader
          .versioned_type(type_id)?
          .ok_or_else(|| not_found("versioned type", type_id))?;
        validate_update(&reader, &current, &patch, &ctx, partial)?;

        let updated = patch.apply(&current);
        write_type(&tx, &updated, false)?;
        for &field in updated.kind().relation_fields() {
          if let Some(targets) = patch.relations.field(field) {
            replace_links(&tx, type_id, field, targets)?;
          }
        }
        if let Some(targets) = &patch.relations.subcase_types {
          replace_subcases(&tx, type_id, targets)?;
        }

        let view = reader::view(&tx, updated)?;
        tx.commit()?;
        Ok(view)
      })
      .await?;

    tracing::info!(%type_id, partial, "updated versioned type");
    Ok(view)
  }

  async fn delete_type(&self, type_id: Uuid, scopes: Scopes) -> Result<()> {
    self
      .run(move |conn| {
        let tx = begin(conn)?;
        let reader = TxReader::new(&tx);
        let current = reader
          .versioned_type(type_id)?
          .ok_or_else(|| not_found("versioned type", type_id))?;
        validate_delete(&reader, &current, &scopes)?;

        tx.execute(
          "DELETE FROM versioned_types WHERE type_id = ?1",
          params![encode_uuid(type_id)],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(%type_id, "deleted versioned type");
    Ok(())
  }

  async fn publish_type(&self, type_id: Uuid, scopes: Scopes) -> Result<TypeView> {
    let view = self
      .run(move |conn| {
        let tx = begin(conn)?;
        let reader = TxReader::new(&tx);
        let current = reader
          .versioned_type(type_id)?
          .ok_or_else(|| not_found("versioned type", type_id))?;
        let published = publish(&reader, &current, &scopes)?;

        tx.execute(
          "UPDATE versioned_types SET draft = 0 WHERE type_id = ?1",
          params![encode_uuid(type_id)],
        )?;
        let view = reader::view(&tx, published)?;
        tx.commit()?;
        Ok(view)
      })
      .await?;

    tracing::info!(%type_id, kind = %view.versioned.kind(), "published versioned type");
    Ok(view)
  }

  async fn get_type(&self, type_id: Uuid) -> Result<Option<TypeView>> {
    self
      .run(move |conn| {
        let conn: &Connection = conn;
        reader::versioned_type(conn, type_id)?
          .map(|ty| reader::view(conn, ty))
          .transpose()
      })
      .await
  }

  async fn list_types(&self, query: &TypeQuery) -> Result<Vec<TypeView>> {
    let query = query.clone();
    self
      .run(move |conn| {
        let conn: &Connection = conn;
        reader::types_where(
          conn,
          query.kind,
          query.catalog_id,
          query.identity.as_deref(),
        )?
        .into_iter()
        .filter(|ty| query.matches(ty))
        .map(|ty| reader::view(conn, ty))
        .collect()
      })
      .await
  }

  // ── Case type children ────────────────────────────────────────────────────

  async fn create_child(&self, input: NewChildType, ctx: RequestContext) -> Result<ChildType> {
    let child = self
      .run(move |conn| {
        let tx = begin(conn)?;
        validate_create::<ChildType, _>(&TxReader::new(&tx), &input, &ctx)?;

        let child = ChildType {
          child_id:     Uuid::new_v4(),
          case_type_id: input.case_type_id,
          details:      input.details,
        };
        write_child(&tx, &child, true)?;
        tx.commit()?;
        Ok(child)
      })
      .await?;

    tracing::info!(child_id = %child.child_id, kind = %child.kind(), "created case type child");
    Ok(child)
  }

  async fn update_child(
    &self,
    child_id: Uuid,
    patch: ChildPatch,
    partial: bool,
    ctx: RequestContext,
  ) -> Result<ChildType> {
    self
      .run(move |conn| {
        let tx = begin(conn)?;
        let reader = TxReader::new(&tx);
        let current = reader
          .child(child_id)?
          .ok_or_else(|| not_found("case type child", child_id))?;
        validate_update(&reader, &current, &patch, &ctx, partial)?;

        let updated = patch.apply(&current);
        write_child(&tx, &updated, false)?;
        tx.commit()?;
        Ok(updated)
      })
      .await
  }

  async fn delete_child(&self, child_id: Uuid, scopes: Scopes) -> Result<()> {
    self
      .run(move |conn| {
        let tx = begin(conn)?;
        let reader = TxReader::new(&tx);
        let current = reader
          .child(child_id)?
          .ok_or_else(|| not_found("case type child", child_id))?;
        validate_delete(&reader, &current, &scopes)?;

        tx.execute(
          "DELETE FROM case_type_children WHERE child_id = ?1",
          params![encode_uuid(child_id)],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await
  }

  async fn get_child(&self, child_id: Uuid) -> Result<Option<ChildType>> {
    self.run(move |conn| reader::child(conn, child_id)).await
  }

  async fn list_children(&self, query: &ChildQuery) -> Result<Vec<ChildType>> {
    let query = query.clone();
    self.run(move |conn| reader::children(conn, &query)).await
  }

  // ── Case type ↔ document type records ─────────────────────────────────────

  async fn create_document_link(
    &self,
    input: NewCaseTypeDocumentType,
    ctx: RequestContext,
  ) -> Result<CaseTypeDocumentType> {
    self
      .run(move |conn| {
        let tx = begin(conn)?;
        validate_create::<CaseTypeDocumentType, _>(&TxReader::new(&tx), &input, &ctx)?;

        let link = CaseTypeDocumentType {
          link_id:          Uuid::new_v4(),
          case_type_id:     input.case_type_id,
          document_type_id: input.document_type_id,
          sequence_number:  input.sequence_number,
          direction:        input.direction,
          status_type_id:   input.status_type_id,
        };
        write_document_link(&tx, &link, true)?;
        tx.commit()?;
        Ok(link)
      })
      .await
  }

  async fn update_document_link(
    &self,
    link_id: Uuid,
    patch: CaseTypeDocumentTypePatch,
    partial: bool,
    ctx: RequestContext,
  ) -> Result<CaseTypeDocumentType> {
    self
      .run(move |conn| {
        let tx = begin(conn)?;
        let current = reader::document_link(&tx, link_id)?
          .ok_or_else(|| not_found("case type document type", link_id))?;
        validate_update(&TxReader::new(&tx), &current, &patch, &ctx, partial)?;

        let updated = patch.apply(&current);
        write_document_link(&tx, &updated, false)?;
        tx.commit()?;
        Ok(updated)
      })
      .await
  }

  async fn delete_document_link(&self, link_id: Uuid, scopes: Scopes) -> Result<()> {
    self
      .run(move |conn| {
        let tx = begin(conn)?;
        let current = reader::document_link(&tx, link_id)?
          .ok_or_else(|| not_found("case type document type", link_id))?;
        validate_delete(&TxReader::new(&tx), &current, &scopes)?;

        tx.execute(
          "DELETE FROM case_type_document_types WHERE link_id = ?1",
          params![encode_uuid(link_id)],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await
  }

  async fn get_document_link(&self, link_id: Uuid) -> Result<Option<CaseTypeDocumentType>> {
    self.run(move |conn| reader::document_link(conn, link_id)).await
  }

  async fn list_document_links(
    &self,
    query: &DocumentLinkQuery,
  ) -> Result<Vec<CaseTypeDocumentType>> {
    let query = query.clone();
    self.run(move |conn| reader::document_links(conn, &query)).await
  }
}

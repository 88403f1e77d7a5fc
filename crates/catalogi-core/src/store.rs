//! Storage abstractions: the synchronous [`CatalogReader`] the validators
//! consult, and the async [`CatalogStore`] the HTTP layer drives.
//!
//! Backends (e.g. `catalogi-store-sqlite`) implement both. Writes run the
//! validators against a reader bound to the write transaction, so the checks
//! see the state the write will commit on top of.

use std::future::Future;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Result,
  error::ValidationError,
  scope::Scopes,
  types::{
    CaseTypeDocumentType, CaseTypeDocumentTypePatch, Catalog, ChildKind,
    ChildPatch, ChildType, NewCaseTypeDocumentType, NewCatalog, NewChildType,
    NewVersionedType, RelationField, TypeKind, TypePatch, TypeView,
    VersionedType,
  },
  validate::RequestContext,
};

// ─── Reader ──────────────────────────────────────────────────────────────────

/// Read-only snapshot access used by the validators.
pub trait CatalogReader {
  fn catalog(&self, catalog_id: Uuid) -> Result<Option<Catalog>>;

  fn versioned_type(&self, type_id: Uuid) -> Result<Option<VersionedType>>;

  /// Every version sharing `(kind, catalog_id, identity)`, drafts included.
  fn versions_of(
    &self,
    kind: TypeKind,
    catalog_id: Uuid,
    identity: &str,
  ) -> Result<Vec<VersionedType>>;

  /// Types currently linked to `owner` through `field`.
  fn linked_types(
    &self,
    owner: Uuid,
    field: RelationField,
  ) -> Result<Vec<VersionedType>>;

  fn subcase_types(&self, case_type_id: Uuid) -> Result<Vec<VersionedType>>;

  fn child(&self, child_id: Uuid) -> Result<Option<ChildType>>;

  fn children_of(&self, case_type_id: Uuid) -> Result<Vec<ChildType>>;
}

/// Resolve `id` to a type of `kind`, reporting `does-not-exist` on `field`
/// when it is missing or of another kind.
pub fn require_type<R: CatalogReader + ?Sized>(
  reader: &R,
  id: Uuid,
  kind: TypeKind,
  field: &str,
) -> Result<VersionedType> {
  match reader.versioned_type(id)? {
    Some(ty) if ty.kind() == kind => Ok(ty),
    _ => Err(ValidationError::does_not_exist(field, id).into()),
  }
}

/// [`require_type`] over a list of ids.
pub fn require_types<R: CatalogReader + ?Sized>(
  reader: &R,
  ids: &[Uuid],
  kind: TypeKind,
  field: &str,
) -> Result<Vec<VersionedType>> {
  ids
    .iter()
    .map(|id| require_type(reader, *id, kind, field))
    .collect()
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Publication-state filter for listings. Defaults to published only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
  Alles,
  Concept,
  #[default]
  Definitief,
}

impl StatusFilter {
  pub fn admits(self, draft: bool) -> bool {
    match self {
      Self::Alles => true,
      Self::Concept => draft,
      Self::Definitief => !draft,
    }
  }
}

/// Parameters for [`CatalogStore::list_types`].
#[derive(Debug, Clone)]
pub struct TypeQuery {
  pub kind:       TypeKind,
  pub catalog_id: Option<Uuid>,
  pub identity:   Option<String>,
  pub status:     StatusFilter,
  /// Only versions whose validity window contains this date.
  pub valid_on:   Option<NaiveDate>,
}

impl TypeQuery {
  pub fn new(kind: TypeKind) -> Self {
    Self {
      kind,
      catalog_id: None,
      identity: None,
      status: StatusFilter::default(),
      valid_on: None,
    }
  }

  pub fn matches(&self, ty: &VersionedType) -> bool {
    ty.kind() == self.kind
      && self.catalog_id.is_none_or(|c| c == ty.catalog_id)
      && self.identity.as_deref().is_none_or(|i| i == ty.identity)
      && self.status.admits(ty.draft)
      && self.valid_on.is_none_or(|d| ty.validity().contains(d))
  }
}

/// Parameters for [`CatalogStore::list_children`]. `status` applies to the
/// owning case type.
#[derive(Debug, Clone, Default)]
pub struct ChildQuery {
  pub kind:         Option<ChildKind>,
  pub case_type_id: Option<Uuid>,
  pub status:       StatusFilter,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentLinkQuery {
  pub case_type_id:     Option<Uuid>,
  pub document_type_id: Option<Uuid>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Errors from a [`CatalogStore`] must expose any business-rule failure they
/// wrap, so the HTTP layer can map it to a status code.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

/// Abstraction over a catalog store backend.
///
/// Every mutation validates and writes inside one transaction; a rejected
/// mutation leaves no trace. All methods return `Send` futures so the trait
/// can be used from `axum` handlers.
pub trait CatalogStore: Send + Sync {
  type Error: StoreError;

  // ── Catalogs ──────────────────────────────────────────────────────────

  fn create_catalog(
    &self,
    input: NewCatalog,
  ) -> impl Future<Output = Result<Catalog, Self::Error>> + Send + '_;

  fn get_catalog(
    &self,
    catalog_id: Uuid,
  ) -> impl Future<Output = Result<Option<Catalog>, Self::Error>> + Send + '_;

  fn list_catalogs(
    &self,
  ) -> impl Future<Output = Result<Vec<Catalog>, Self::Error>> + Send + '_;

  // ── Versioned types ───────────────────────────────────────────────────

  /// Create a draft version together with its links.
  fn create_type(
    &self,
    input: NewVersionedType,
    ctx: RequestContext,
  ) -> impl Future<Output = Result<TypeView, Self::Error>> + Send + '_;

  /// Apply `patch`; `partial` selects PATCH semantics over PUT.
  fn update_type(
    &self,
    type_id: Uuid,
    patch: TypePatch,
    partial: bool,
    ctx: RequestContext,
  ) -> impl Future<Output = Result<TypeView, Self::Error>> + Send + '_;

  fn delete_type(
    &self,
    type_id: Uuid,
    scopes: Scopes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Flip `draft` to `false` once every dependency is published.
  fn publish_type(
    &self,
    type_id: Uuid,
    scopes: Scopes,
  ) -> impl Future<Output = Result<TypeView, Self::Error>> + Send + '_;

  fn get_type(
    &self,
    type_id: Uuid,
  ) -> impl Future<Output = Result<Option<TypeView>, Self::Error>> + Send + '_;

  fn list_types<'a>(
    &'a self,
    query: &'a TypeQuery,
  ) -> impl Future<Output = Result<Vec<TypeView>, Self::Error>> + Send + 'a;

  // ── Case type children ────────────────────────────────────────────────

  fn create_child(
    &self,
    input: NewChildType,
    ctx: RequestContext,
  ) -> impl Future<Output = Result<ChildType, Self::Error>> + Send + '_;

  fn update_child(
    &self,
    child_id: Uuid,
    patch: ChildPatch,
    partial: bool,
    ctx: RequestContext,
  ) -> impl Future<Output = Result<ChildType, Self::Error>> + Send + '_;

  fn delete_child(
    &self,
    child_id: Uuid,
    scopes: Scopes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_child(
    &self,
    child_id: Uuid,
  ) -> impl Future<Output = Result<Option<ChildType>, Self::Error>> + Send + '_;

  fn list_children<'a>(
    &'a self,
    query: &'a ChildQuery,
  ) -> impl Future<Output = Result<Vec<ChildType>, Self::Error>> + Send + 'a;

  // ── Case type ↔ document type records ─────────────────────────────────

  fn create_document_link(
    &self,
    input: NewCaseTypeDocumentType,
    ctx: RequestContext,
  ) -> impl Future<Output = Result<CaseTypeDocumentType, Self::Error>> + Send + '_;

  fn update_document_link(
    &self,
    link_id: Uuid,
    patch: CaseTypeDocumentTypePatch,
    partial: bool,
    ctx: RequestContext,
  ) -> impl Future<Output = Result<CaseTypeDocumentType, Self::Error>> + Send + '_;

  fn delete_document_link(
    &self,
    link_id: Uuid,
    scopes: Scopes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_document_link(
    &self,
    link_id: Uuid,
  ) -> impl Future<Output = Result<Option<CaseTypeDocumentType>, Self::Error>>
  + Send
  + '_;

  fn list_document_links<'a>(
    &'a self,
    query: &'a DocumentLinkQuery,
  ) -> impl Future<Output = Result<Vec<CaseTypeDocumentType>, Self::Error>>
  + Send
  + 'a;
}

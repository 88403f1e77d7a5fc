//! Business rules for mutations of catalog entities.
//!
//! Each entity implements [`CatalogEntity`]; the free functions
//! [`validate_create`], [`validate_update`] and [`validate_delete`] dispatch
//! to it. Validators never write: they read snapshots through a
//! [`CatalogReader`] and either return `Ok(())` or the first violation.

mod children;
pub mod concept;
mod document_links;
pub mod publication;
pub mod relations;
pub mod temporal;
mod versioned;

#[cfg(test)]
pub(crate) mod fixtures;

pub use publication::publish;

use crate::{
  Result, classification::ResolvedClassifications, scope::Scopes,
  store::CatalogReader,
};

/// What a mutation needs to know about the caller and the outside world.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
  pub scopes:          Scopes,
  /// Selection-list lookups resolved before the transaction started.
  pub classifications: ResolvedClassifications,
}

impl RequestContext {
  pub fn new(scopes: Scopes) -> Self {
    Self {
      scopes,
      classifications: ResolvedClassifications::default(),
    }
  }
}

/// A mutable record in the catalog.
pub trait CatalogEntity: Sized {
  /// Creation input.
  type New;
  /// Update input.
  type Patch;

  fn validate_create<R: CatalogReader + ?Sized>(
    reader: &R,
    input: &Self::New,
    ctx: &RequestContext,
  ) -> Result<()>;

  fn validate_update<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    patch: &Self::Patch,
    ctx: &RequestContext,
    partial: bool,
  ) -> Result<()>;

  fn validate_delete<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    scopes: &Scopes,
  ) -> Result<()>;
}

pub fn validate_create<E, R>(reader: &R, input: &E::New, ctx: &RequestContext) -> Result<()>
where
  E: CatalogEntity,
  R: CatalogReader + ?Sized,
{
  E::validate_create(reader, input, ctx)
}

pub fn validate_update<E, R>(
  reader: &R,
  instance: &E,
  patch: &E::Patch,
  ctx: &RequestContext,
  partial: bool,
) -> Result<()>
where
  E: CatalogEntity,
  R: CatalogReader + ?Sized,
{
  instance.validate_update(reader, patch, ctx, partial)
}

pub fn validate_delete<E, R>(reader: &R, instance: &E, scopes: &Scopes) -> Result<()>
where
  E: CatalogEntity,
  R: CatalogReader + ?Sized,
{
  instance.validate_delete(reader, scopes)
}

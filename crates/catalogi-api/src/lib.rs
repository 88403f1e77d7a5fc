//! JSON REST API for the Catalogi service.
//!
//! Exposes an axum [`Router`] backed by any [`CatalogStore`], resolving
//! selection-list classifications through any [`ClassificationClient`].
//! Authentication is the caller's responsibility; the authenticated scopes
//! arrive in the [`scopes::SCOPES_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", catalogi_api::api_router(store, selectielijst))
//! ```

pub mod catalogs;
pub mod children;
pub mod document_links;
pub mod error;
pub mod etag;
pub mod scopes;
pub mod versioned;


use std::sync::Arc;

use axum::{
  Extension, Router,
  routing::{get, post},
};
use catalogi_core::{
  classification::ClassificationClient,
  store::CatalogStore,
  types::{ChildKind, TypeKind},
};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S, C> {
  pub store:      Arc<S>,
  pub classifier: Arc<C>,
}

impl<S, C> Clone for ApiState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      classifier: Arc::clone(&self.classifier),
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(store: Arc<S>, classifier: Arc<C>) -> Router<()>
where
  S: CatalogStore + 'static,
  C: ClassificationClient + 'static,
{
  Router::new()
    // Catalogs
    .route(
      "/catalogussen",
      get(catalogs::list::<S, C>).post(catalogs::create::<S, C>),
    )
    .route("/catalogussen/{id}", get(catalogs::get_one::<S, C>))
    // Versioned types
    .merge(versioned_routes::<S, C>("/zaaktypen", TypeKind::CaseType))
    .merge(versioned_routes::<S, C>("/besluittypen", TypeKind::DecisionType))
    .merge(versioned_routes::<S, C>(
      "/informatieobjecttypen",
      TypeKind::DocumentType,
    ))
    // Case type children
    .merge(child_routes::<S, C>("/resultaattypen", ChildKind::ResultType))
    .merge(child_routes::<S, C>("/statustypen", ChildKind::StatusType))
    .merge(child_routes::<S, C>("/roltypen", ChildKind::RoleType))
    // Case type ↔ document type records
    .route(
      "/zaaktype-informatieobjecttypen",
      get(document_links::list::<S, C>).post(document_links::create::<S, C>),
    )
    .route(
      "/zaaktype-informatieobjecttypen/{id}",
      get(document_links::get_one::<S, C>)
        .put(document_links::replace::<S, C>)
        .patch(document_links::patch::<S, C>)
        .delete(document_links::delete::<S, C>),
    )
    .with_state(ApiState { store, classifier })
}

fn versioned_routes<S, C>(path: &str, kind: TypeKind) -> Router<ApiState<S, C>>
where
  S: CatalogStore + 'static,
  C: ClassificationClient + 'static,
{
  Router::new()
    .route(
      path,
      get(versioned::list::<S, C>).post(versioned::create::<S, C>),
    )
    .route(
      &format!("{path}/{{id}}"),
      get(versioned::get_one::<S, C>)
        .put(versioned::replace::<S, C>)
        .patch(versioned::patch::<S, C>)
        .delete(versioned::delete::<S, C>),
    )
    .route(
      &format!("{path}/{{id}}/publish"),
      post(versioned::publish::<S, C>),
    )
    .layer(Extension(kind))
}

fn child_routes<S, C>(path: &str, kind: ChildKind) -> Router<ApiState<S, C>>
where
  S: CatalogStore + 'static,
  C: ClassificationClient + 'static,
{
  Router::new()
    .route(
      path,
      get(children::list::<S, C>).post(children::create::<S, C>),
    )
    .route(
      &format!("{path}/{{id}}"),
      get(children::get_one::<S, C>)
        .put(children::replace::<S, C>)
        .patch(children::patch::<S, C>)
        .delete(children::delete::<S, C>),
    )
    .layer(Extension(kind))
}

//! Handlers for the case type children: `/resultaattypen`, `/statustypen` and
//! `/roltypen`. The route layer supplies the [`ChildKind`].
//!
//! Result types reference a selection-list classification; its URL is
//! resolved here, before the store opens its transaction.

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use catalogi_core::{
  ErrorCode, Scopes, ValidationError,
  classification::ClassificationClient,
  store::{CatalogStore, ChildQuery, StatusFilter},
  types::{ChildDetails, ChildKind, ChildPatch, ChildType, NewChildType},
  validate::RequestContext,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  etag,
  scopes::{self, CallerScopes},
};

async fn load<S, C>(
  state: &ApiState<S, C>,
  kind: ChildKind,
  id: Uuid,
) -> Result<ChildType, ApiError>
where
  S: CatalogStore,
{
  state
    .store
    .get_child(id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|child| child.kind() == kind)
    .ok_or_else(|| ApiError::NotFound(format!("{kind} {id} not found")))
}

fn check_kind(kind: ChildKind, details: &ChildDetails) -> Result<(), ApiError> {
  if details.kind() == kind {
    return Ok(());
  }
  Err(
    ValidationError::new(
      "details",
      ErrorCode::Invalid,
      format!("expected {kind} details, got {}", details.kind()),
    )
    .into(),
  )
}

/// Resolve the classification a result type points at.
async fn context<C>(
  classifier: &C,
  scopes: Scopes,
  details: &ChildDetails,
) -> RequestContext
where
  C: ClassificationClient,
{
  let mut ctx = RequestContext::new(scopes);
  if let ChildDetails::ResultType(result) = details {
    ctx
      .classifications
      .prefetch(classifier, &result.selection_list_class)
      .await;
  }
  ctx
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Applies to the owning case type.
  #[serde(default)]
  pub status:    StatusFilter,
  pub case_type: Option<Uuid>,
}

/// `GET /{kind}`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<ChildKind>,
  caller: CallerScopes,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ChildType>>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::READ)?;
  let query = ChildQuery {
    kind:         Some(kind),
    case_type_id: params.case_type,
    status:       params.status,
  };
  let children = state
    .store
    .list_children(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(children))
}

/// `GET /{kind}/{id}`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<ChildKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::READ)?;
  let child = load(&state, kind, id).await?;
  etag::conditional(&headers, &child)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /{kind}`
pub async fn create<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<ChildKind>,
  caller: CallerScopes,
  Json(body): Json<NewChildType>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::CREATE)?;
  check_kind(kind, &body.details)?;

  let ctx = context(state.classifier.as_ref(), caller.into_inner(), &body.details).await;
  let child = state
    .store
    .create_child(body, ctx)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(child)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

async fn update<S, C>(
  state: ApiState<S, C>,
  kind: ChildKind,
  id: Uuid,
  caller: CallerScopes,
  patch: ChildPatch,
  partial: bool,
) -> Result<Json<ChildType>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::UPDATE)?;
  let current = load(&state, kind, id).await?;
  if let Some(details) = &patch.details {
    check_kind(kind, details)?;
  }

  let updated = patch.apply(&current);
  let ctx = context(state.classifier.as_ref(), caller.into_inner(), &updated.details).await;
  let child = state
    .store
    .update_child(id, patch, partial, ctx)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(child))
}

/// `PUT /{kind}/{id}`
pub async fn replace<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<ChildKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  Json(patch): Json<ChildPatch>,
) -> Result<Json<ChildType>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  update(state, kind, id, caller, patch, false).await
}

/// `PATCH /{kind}/{id}`
pub async fn patch<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<ChildKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  Json(patch): Json<ChildPatch>,
) -> Result<Json<ChildType>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  update(state, kind, id, caller, patch, true).await
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /{kind}/{id}`
pub async fn delete<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<ChildKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::DELETE)?;
  load(&state, kind, id).await?;
  state
    .store
    .delete_child(id, caller.into_inner())
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

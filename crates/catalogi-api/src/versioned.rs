//! Handlers for the versioned resources: `/zaaktypen`, `/besluittypen` and
//! `/informatieobjecttypen`. The route layer supplies the [`TypeKind`].
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/{kind}` | `?status=alles\|concept\|definitief`, `catalog`, `identity`, `valid_on` |
//! | `POST`   | `/{kind}` | Body: [`NewVersionedType`]; always a draft; 201 |
//! | `GET`    | `/{kind}/{id}` | With `ETag` |
//! | `PUT`    | `/{kind}/{id}` | Body: [`TypePatch`] |
//! | `PATCH`  | `/{kind}/{id}` | Body: [`TypePatch`]; closing `end_validity` needs no force |
//! | `DELETE` | `/{kind}/{id}` | 204 |
//! | `POST`   | `/{kind}/{id}/publish` | Draft → published |

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use catalogi_core::{
  ErrorCode, ValidationError,
  classification::ClassificationClient,
  store::{CatalogStore, StatusFilter, TypeQuery},
  types::{NewVersionedType, TypeKind, TypePatch, TypeView},
  validate::RequestContext,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  etag,
  scopes::{self, CallerScopes},
};

/// Fetch `id`, treating a type of another kind as missing.
async fn load<S, C>(
  state: &ApiState<S, C>,
  kind: TypeKind,
  id: Uuid,
) -> Result<TypeView, ApiError>
where
  S: CatalogStore,
{
  state
    .store
    .get_type(id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|view| view.versioned.kind() == kind)
    .ok_or_else(|| ApiError::NotFound(format!("{} {id} not found", kind.resource_name())))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub status:   StatusFilter,
  pub catalog:  Option<Uuid>,
  pub identity: Option<String>,
  /// Only versions valid on this date.
  pub valid_on: Option<NaiveDate>,
}

/// `GET /{kind}`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<TypeKind>,
  caller: CallerScopes,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<TypeView>>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::READ)?;
  let query = TypeQuery {
    kind,
    catalog_id: params.catalog,
    identity: params.identity,
    status: params.status,
    valid_on: params.valid_on,
  };
  let views = state
    .store
    .list_types(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(views))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /{kind}/{id}`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<TypeKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::READ)?;
  let view = load(&state, kind, id).await?;
  etag::conditional(&headers, &view)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /{kind}`
pub async fn create<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<TypeKind>,
  caller: CallerScopes,
  Json(body): Json<NewVersionedType>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::CREATE)?;
  if body.kind() != kind {
    return Err(
      ValidationError::new(
        "details",
        ErrorCode::Invalid,
        format!("expected {kind} details, got {}", body.kind()),
      )
      .into(),
    );
  }

  let ctx = RequestContext::new(caller.into_inner());
  let view = state
    .store
    .create_type(body, ctx)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

async fn update<S, C>(
  state: ApiState<S, C>,
  kind: TypeKind,
  id: Uuid,
  caller: CallerScopes,
  patch: TypePatch,
  partial: bool,
) -> Result<Json<TypeView>, ApiError>
where
  S: CatalogStore,
{
  caller.require(scopes::UPDATE)?;
  load(&state, kind, id).await?;

  let ctx = RequestContext::new(caller.into_inner());
  let view = state
    .store
    .update_type(id, patch, partial, ctx)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(view))
}

/// `PUT /{kind}/{id}`
pub async fn replace<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<TypeKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  Json(patch): Json<TypePatch>,
) -> Result<Json<TypeView>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  update(state, kind, id, caller, patch, false).await
}

/// `PATCH /{kind}/{id}`
pub async fn patch<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<TypeKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  Json(patch): Json<TypePatch>,
) -> Result<Json<TypeView>, ApiError>
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
  Extension(kind): Extension<TypeKind>,
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
    .delete_type(id, caller.into_inner())
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Publish ─────────────────────────────────────────────────────────────────

/// `POST /{kind}/{id}/publish`
pub async fn publish<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(kind): Extension<TypeKind>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
) -> Result<Json<TypeView>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  load(&state, kind, id).await?;
  let view = state
    .store
    .publish_type(id, caller.into_inner())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(view))
}

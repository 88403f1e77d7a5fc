//! Handlers for `/catalogussen`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/catalogussen` | All catalogs |
//! | `POST` | `/catalogussen` | Body: [`NewCatalog`]; returns 201 |
//! | `GET`  | `/catalogussen/{id}` | With `ETag` |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use catalogi_core::{
  classification::ClassificationClient,
  store::CatalogStore,
  types::{Catalog, NewCatalog},
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  etag,
  scopes::{self, CallerScopes},
};

/// `GET /catalogussen`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: CallerScopes,
) -> Result<Json<Vec<Catalog>>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::READ)?;
  let catalogs = state
    .store
    .list_catalogs()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(catalogs))
}

/// `POST /catalogussen`
pub async fn create<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: CallerScopes,
  Json(body): Json<NewCatalog>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::CREATE)?;
  let catalog = state
    .store
    .create_catalog(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(catalog)))
}

/// `GET /catalogussen/{id}`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::READ)?;
  let catalog = state
    .store
    .get_catalog(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("catalog {id} not found")))?;
  etag::conditional(&headers, &catalog)
}

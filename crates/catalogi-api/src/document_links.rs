//! Handlers for `/zaaktype-informatieobjecttypen`, the explicit records
//! linking a case type to a document type.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use catalogi_core::{
  classification::ClassificationClient,
  store::{CatalogStore, DocumentLinkQuery},
  types::{CaseTypeDocumentType, CaseTypeDocumentTypePatch, NewCaseTypeDocumentType},
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

async fn load<S, C>(state: &ApiState<S, C>, id: Uuid) -> Result<CaseTypeDocumentType, ApiError>
where
  S: CatalogStore,
{
  state
    .store
    .get_document_link(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("zaaktype-informatieobjecttype {id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub case_type:     Option<Uuid>,
  pub document_type: Option<Uuid>,
}

/// `GET /zaaktype-informatieobjecttypen`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: CallerScopes,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CaseTypeDocumentType>>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::READ)?;
  let query = DocumentLinkQuery {
    case_type_id:     params.case_type,
    document_type_id: params.document_type,
  };
  let links = state
    .store
    .list_document_links(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(links))
}

/// `GET /zaaktype-informatieobjecttypen/{id}`
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
  let link = load(&state, id).await?;
  etag::conditional(&headers, &link)
}

/// `POST /zaaktype-informatieobjecttypen`
pub async fn create<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: CallerScopes,
  Json(body): Json<NewCaseTypeDocumentType>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::CREATE)?;
  let link = state
    .store
    .create_document_link(body, RequestContext::new(caller.into_inner()))
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(link)))
}

async fn update<S, C>(
  state: ApiState<S, C>,
  id: Uuid,
  caller: CallerScopes,
  patch: CaseTypeDocumentTypePatch,
  partial: bool,
) -> Result<Json<CaseTypeDocumentType>, ApiError>
where
  S: CatalogStore,
{
  caller.require(scopes::UPDATE)?;
  let link = state
    .store
    .update_document_link(id, patch, partial, RequestContext::new(caller.into_inner()))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(link))
}

/// `PUT /zaaktype-informatieobjecttypen/{id}`
pub async fn replace<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  Json(patch): Json<CaseTypeDocumentTypePatch>,
) -> Result<Json<CaseTypeDocumentType>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  update(state, id, caller, patch, false).await
}

/// `PATCH /zaaktype-informatieobjecttypen/{id}`
pub async fn patch<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
  Json(patch): Json<CaseTypeDocumentTypePatch>,
) -> Result<Json<CaseTypeDocumentType>, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  update(state, id, caller, patch, true).await
}

/// `DELETE /zaaktype-informatieobjecttypen/{id}`
pub async fn delete<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(id): Path<Uuid>,
  caller: CallerScopes,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore,
  C: ClassificationClient,
{
  caller.require(scopes::DELETE)?;
  state
    .store
    .delete_document_link(id, caller.into_inner())
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

use std::slice;

use uuid::Uuid;

use crate::{
  Result,
  error::{ErrorCode, ValidationError},
  scope::Scopes,
  store::{CatalogReader, require_type},
  types::{
    CaseTypeDocumentType, CaseTypeDocumentTypePatch, ChildKind,
    NewCaseTypeDocumentType, TypeKind, VersionedType,
  },
  validate::{CatalogEntity, RequestContext, relations},
};

fn endpoints<R: CatalogReader + ?Sized>(
  reader: &R,
  case_type_id: Uuid,
  document_type_id: Uuid,
) -> Result<(VersionedType, VersionedType)> {
  Ok((
    require_type(reader, case_type_id, TypeKind::CaseType, "case_type_id")?,
    require_type(
      reader,
      document_type_id,
      TypeKind::DocumentType,
      "document_type_id",
    )?,
  ))
}

/// The optional status type must be a status type of the same case type.
fn check_status_type<R: CatalogReader + ?Sized>(
  reader: &R,
  case_type: &VersionedType,
  status_type_id: Option<Uuid>,
) -> Result<()> {
  let Some(id) = status_type_id else {
    return Ok(());
  };
  match reader.child(id)? {
    Some(child)
      if child.kind() == ChildKind::StatusType
        && child.case_type_id == case_type.type_id =>
    {
      Ok(())
    }
    Some(_) => Err(
      ValidationError::new(
        "status_type_id",
        ErrorCode::Invalid,
        format!(
          "{id} is not a status type of zaaktype {:?}",
          case_type.identity
        ),
      )
      .into(),
    ),
    None => Err(ValidationError::does_not_exist("status_type_id", id).into()),
  }
}

fn check_new_endpoints<R: CatalogReader + ?Sized>(
  reader: &R,
  link: &CaseTypeDocumentType,
  forced: bool,
) -> Result<()> {
  let (case_type, document_type) =
    endpoints(reader, link.case_type_id, link.document_type_id)?;
  relations::check_catalog_match(case_type.catalog_id, slice::from_ref(&document_type))?;
  relations::check_link_endpoints(&case_type, &document_type, forced)?;
  check_status_type(reader, &case_type, link.status_type_id)
}

impl CatalogEntity for CaseTypeDocumentType {
  type New = NewCaseTypeDocumentType;
  type Patch = CaseTypeDocumentTypePatch;

  fn validate_create<R: CatalogReader + ?Sized>(
    reader: &R,
    input: &NewCaseTypeDocumentType,
    ctx: &RequestContext,
  ) -> Result<()> {
    let candidate = CaseTypeDocumentType {
      link_id:          Uuid::nil(),
      case_type_id:     input.case_type_id,
      document_type_id: input.document_type_id,
      sequence_number:  input.sequence_number,
      direction:        input.direction,
      status_type_id:   input.status_type_id,
    };
    check_new_endpoints(reader, &candidate, ctx.scopes.forced_write())
  }

  fn validate_update<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    patch: &CaseTypeDocumentTypePatch,
    ctx: &RequestContext,
    _partial: bool,
  ) -> Result<()> {
    let forced = ctx.scopes.forced_write();
    let (case_type, document_type) =
      endpoints(reader, self.case_type_id, self.document_type_id)?;
    relations::check_link_endpoints(&case_type, &document_type, forced)?;
    check_new_endpoints(reader, &patch.apply(self), forced)
  }

  fn validate_delete<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    scopes: &Scopes,
  ) -> Result<()> {
    let (case_type, document_type) =
      endpoints(reader, self.case_type_id, self.document_type_id)?;
    relations::check_link_endpoints(&case_type, &document_type, scopes.forced_delete())?;
    Ok(())
  }
}

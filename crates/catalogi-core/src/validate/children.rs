use uuid::Uuid;

use crate::{
  Result, archival,
  error::{ErrorCode, ValidationError},
  scope::Scopes,
  store::{CatalogReader, require_type},
  types::{
    ChildDetails, ChildKind, ChildPatch, ChildType, NewChildType, TypeKind,
    VersionedType,
  },
  validate::{CatalogEntity, RequestContext, concept},
};

const SELECTION_LIST_CLASS: &str = "selection_list_class";

/// Checks specific to result types, run after the parent checks.
fn check_result_type<R: CatalogReader + ?Sized>(
  reader: &R,
  case_type: &VersionedType,
  details: &ChildDetails,
  exclude: Option<Uuid>,
  ctx: &RequestContext,
) -> Result<()> {
  let ChildDetails::ResultType(result) = details else {
    return Ok(());
  };

  let taken = reader.children_of(case_type.type_id)?.iter().any(|c| {
    Some(c.child_id) != exclude
      && c.kind() == ChildKind::ResultType
      && c.details.description() == result.description
  });
  if taken {
    return Err(
      ValidationError::non_field(
        ErrorCode::Unique,
        format!(
          "zaaktype {:?} already has a result type {:?}",
          case_type.identity, result.description
        ),
      )
      .into(),
    );
  }

  let classification = ctx
    .classifications
    .get(&result.selection_list_class, SELECTION_LIST_CLASS)?;
  archival::validate_process_type(classification, case_type.details.process_type())?;
  if let Some(procedure) = &result.archival_procedure {
    archival::validate_process_term(procedure.derivation_method, classification)?;
    procedure.validate_fields()?;
  }
  Ok(())
}

fn parent<R: CatalogReader + ?Sized>(reader: &R, case_type_id: Uuid) -> Result<VersionedType> {
  require_type(reader, case_type_id, TypeKind::CaseType, "case_type_id")
}

impl CatalogEntity for ChildType {
  type New = NewChildType;
  type Patch = ChildPatch;

  fn validate_create<R: CatalogReader + ?Sized>(
    reader: &R,
    input: &NewChildType,
    ctx: &RequestContext,
  ) -> Result<()> {
    let case_type = parent(reader, input.case_type_id)?;
    concept::check_parent(&case_type, ctx.scopes.forced_write())?;
    check_result_type(reader, &case_type, &input.details, None, ctx)
  }

  fn validate_update<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    patch: &ChildPatch,
    ctx: &RequestContext,
    _partial: bool,
  ) -> Result<()> {
    if patch.details.as_ref().is_some_and(|d| d.kind() != self.kind()) {
      return Err(
        ValidationError::new(
          "details",
          ErrorCode::Invalid,
          format!("a {} cannot change its kind", self.kind()),
        )
        .into(),
      );
    }

    let forced = ctx.scopes.forced_write();
    let current = parent(reader, self.case_type_id)?;
    concept::check_parent(&current, forced)?;
    let case_type = match patch.case_type_id {
      Some(id) if id != self.case_type_id => {
        let reassigned = parent(reader, id)?;
        concept::check_parent(&reassigned, forced)?;
        reassigned
      }
      _ => current,
    };

    let updated = patch.apply(self);
    check_result_type(reader, &case_type, &updated.details, Some(self.child_id), ctx)
  }

  fn validate_delete<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    scopes: &Scopes,
  ) -> Result<()> {
    let case_type = parent(reader, self.case_type_id)?;
    concept::check_parent(&case_type, scopes.forced_delete())?;
    Ok(())
  }
}

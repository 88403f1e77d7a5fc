//! Consistency of links between versioned types.
//!
//! All checks report the first violation. Callers run them in a fixed order
//! (catalog match, single draft, concept guards) so precedence is stable.

use uuid::Uuid;

use crate::{
  error::{ErrorCode, ValidationError},
  types::{RelationField, VersionedType},
};

/// Resolved targets of one link field.
pub type LinkSet = (RelationField, Vec<VersionedType>);

/// Every related type must live in `catalog_id`.
pub fn check_catalog_match(
  catalog_id: Uuid,
  related: &[VersionedType],
) -> Result<(), ValidationError> {
  match related.iter().find(|t| t.catalog_id != catalog_id) {
    None => Ok(()),
    Some(stray) => Err(ValidationError::non_field(
      ErrorCode::RelationsIncorrectCatalogus,
      format!(
        "{} {:?} belongs to another catalog",
        stray.kind().resource_name(),
        stray.identity
      ),
    )),
  }
}

/// Reject when any of `linked` is published, unless `forced`.
pub fn check_all_drafts(
  field: &str,
  linked: &[VersionedType],
  forced: bool,
) -> Result<(), ValidationError> {
  if forced {
    return Ok(());
  }
  match linked.iter().find(|t| !t.draft) {
    None => Ok(()),
    Some(published) => Err(ValidationError::new(
      field,
      ErrorCode::NonConceptRelation,
      format!(
        "relations to published {} {:?} cannot be changed",
        published.kind().resource_name(),
        published.identity
      ),
    )),
  }
}

/// Create path: supplied link targets must all be drafts.
pub fn check_m2m_create(supplied: &[LinkSet], forced: bool) -> Result<(), ValidationError> {
  supplied
    .iter()
    .try_for_each(|(field, linked)| check_all_drafts(field.as_ref(), linked, forced))
}

/// Update path: both the current and the newly supplied link targets must be
/// drafts, unless the update only closes the validity window.
pub fn check_m2m_update(
  current: &[LinkSet],
  supplied: &[LinkSet],
  closes_validity_only: bool,
  forced: bool,
) -> Result<(), ValidationError> {
  if closes_validity_only {
    return Ok(());
  }
  check_m2m_create(current, forced)?;
  check_m2m_create(supplied, forced)
}

/// An explicit case type ↔ document type record may not be created, changed
/// or removed while both endpoints are published, unless `forced`.
pub fn check_link_endpoints(
  case_type: &VersionedType,
  document_type: &VersionedType,
  forced: bool,
) -> Result<(), ValidationError> {
  if forced || case_type.draft || document_type.draft {
    return Ok(());
  }
  Err(ValidationError::non_field(
    ErrorCode::NonConceptRelation,
    format!(
      "zaaktype {:?} and informatieobjecttype {:?} are both published",
      case_type.identity, document_type.identity
    ),
  ))
}

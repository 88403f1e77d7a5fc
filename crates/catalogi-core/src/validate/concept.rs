//! Draft/published state of versioned types.

use crate::{
  error::{ErrorCode, ValidationError},
  types::VersionedType,
};

/// The two states a versioned type can be in. `Draft → Published` is the only
/// transition, and only [`publish`](crate::validate::publish) takes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptState {
  Draft,
  Published,
}

impl ConceptState {
  pub fn of(ty: &VersionedType) -> Self {
    if ty.draft { Self::Draft } else { Self::Published }
  }

  /// `None` when already published.
  pub fn publish(self) -> Option<Self> {
    match self {
      Self::Draft => Some(Self::Published),
      Self::Published => None,
    }
  }
}

/// Update or delete of `ty` itself. `allowed` carries the forced scope and
/// any exemption the caller established.
pub fn check_mutable(ty: &VersionedType, allowed: bool) -> Result<(), ValidationError> {
  if allowed || ConceptState::of(ty) == ConceptState::Draft {
    return Ok(());
  }
  Err(ValidationError::non_field(
    ErrorCode::NonConceptObject,
    format!(
      "{} {:?} is published and cannot be changed",
      ty.kind().resource_name(),
      ty.identity
    ),
  ))
}

/// Mutation of a record owned by `parent` through a foreign key.
pub fn check_parent(parent: &VersionedType, forced: bool) -> Result<(), ValidationError> {
  if forced || ConceptState::of(parent) == ConceptState::Draft {
    return Ok(());
  }
  let kind = parent.kind();
  Err(ValidationError::non_field(
    ErrorCode::NonConceptParent(kind),
    format!(
      "objects related to a published {} cannot be changed",
      kind.resource_name()
    ),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    types::TypeKind,
    validate::fixtures::{MemoryReader, date},
  };

  #[test]
  fn publishing_twice_has_no_transition() {
    assert_eq!(ConceptState::Draft.publish(), Some(ConceptState::Published));
    assert_eq!(ConceptState::Published.publish(), None);
  }

  #[test]
  fn published_types_need_an_allowance() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let published =
      reader.add_case_type(catalog, "ZT-1", false, date(2018, 1, 1), None);

    let err = check_mutable(&published, false).unwrap_err();
    assert_eq!(err.code, ErrorCode::NonConceptObject);
    assert!(check_mutable(&published, true).is_ok());
  }

  #[test]
  fn parent_errors_name_the_parent_kind() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let parent = reader.quick(TypeKind::CaseType, catalog, false);

    let err = check_parent(&parent, false).unwrap_err();
    assert_eq!(err.code.as_str(), "non-concept-zaaktype");
    assert!(check_parent(&parent, true).is_ok());
  }
}

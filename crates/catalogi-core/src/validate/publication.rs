//! Publishing a draft version.

use crate::{
  Result,
  error::PermissionError,
  scope::{Scope, Scopes},
  store::CatalogReader,
  types::VersionedType,
  validate::concept::ConceptState,
};

/// Take `instance` from draft to published.
///
/// Requires the write scope. Every type reachable through the kind's
/// publication dependencies must already be published; otherwise the call
/// fails with a [`PermissionError`], never a validation error. Returns the
/// published snapshot for the caller to persist.
pub fn publish<R: CatalogReader + ?Sized>(
  reader: &R,
  instance: &VersionedType,
  scopes: &Scopes,
) -> Result<VersionedType> {
  scopes.require_any(&[Scope::Write])?;

  let kind = instance.kind();
  if ConceptState::of(instance).publish().is_none() {
    return Err(
      PermissionError::AlreadyPublished {
        kind,
        id: instance.type_id,
      }
      .into(),
    );
  }

  for &field in kind.publication_dependencies() {
    let linked = reader.linked_types(instance.type_id, field)?;
    if let Some(draft) = linked.iter().find(|t| t.draft) {
      return Err(
        PermissionError::RelatedNotPublished {
          field,
          id: draft.type_id,
        }
        .into(),
      );
    }
  }

  Ok(VersionedType {
    draft: false,
    ..instance.clone()
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    Error,
    types::{RelationField, TypeKind},
    validate::fixtures::MemoryReader,
  };

  fn writer() -> Scopes { Scopes::new([Scope::Write]) }

  #[test]
  fn publishes_a_draft_without_dependencies() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::CaseType, catalog, true);

    let published = publish(&reader, &ty, &writer()).unwrap();
    assert!(!published.draft);
    assert_eq!(published.type_id, ty.type_id);
  }

  #[test]
  fn second_publish_is_rejected() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::DocumentType, catalog, false);

    let err = publish(&reader, &ty, &writer()).unwrap_err();
    assert!(matches!(
      err,
      Error::Permission(PermissionError::AlreadyPublished { .. })
    ));
  }

  #[test]
  fn draft_dependencies_block_publication() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let case_type = reader.quick(TypeKind::CaseType, catalog, true);
    let document_type = reader.quick(TypeKind::DocumentType, catalog, true);
    reader.link(&case_type, &document_type);

    let err = publish(&reader, &case_type, &writer()).unwrap_err();
    match err {
      Error::Permission(PermissionError::RelatedNotPublished { field, id }) => {
        assert_eq!(field, RelationField::DocumentTypes);
        assert_eq!(id, document_type.type_id);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn back_edges_do_not_block_publication() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let case_type = reader.quick(TypeKind::CaseType, catalog, true);
    let decision_type = reader.quick(TypeKind::DecisionType, catalog, true);
    reader.link(&case_type, &decision_type);

    assert!(publish(&reader, &decision_type, &writer()).is_ok());
  }

  #[test]
  fn write_scope_is_required() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::DecisionType, catalog, true);

    let err =
      publish(&reader, &ty, &Scopes::new([Scope::Read, Scope::ForcedWrite])).unwrap_err();
    assert!(matches!(err, Error::Permission(PermissionError::MissingScope(_))));
  }
}

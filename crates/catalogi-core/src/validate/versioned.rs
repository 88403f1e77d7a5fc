use crate::{
  Result,
  error::{ErrorCode, ValidationError},
  scope::Scopes,
  store::{CatalogReader, require_types},
  types::{
    NewVersionedType, RelationField, SUBCASE_TYPES, TypeKind, TypePatch,
    VersionedType,
  },
  validate::{
    CatalogEntity, RequestContext, concept,
    relations::{self, LinkSet},
    temporal::{self, IdentityKey},
  },
};

const ALL_FIELDS: [RelationField; 3] = [
  RelationField::CaseTypes,
  RelationField::DecisionTypes,
  RelationField::DocumentTypes,
];

/// Reject link fields a kind does not carry.
fn reject_foreign_fields(
  kind: TypeKind,
  supplied: impl Fn(RelationField) -> bool,
  subcases_supplied: bool,
) -> Result<(), ValidationError> {
  let foreign = ALL_FIELDS
    .into_iter()
    .filter(|f| !kind.relation_fields().contains(f))
    .find(|f| supplied(*f));
  if let Some(field) = foreign {
    return Err(ValidationError::new(
      field.as_ref(),
      ErrorCode::Invalid,
      format!("a {} has no {field}", kind.resource_name()),
    ));
  }
  if subcases_supplied && kind != TypeKind::CaseType {
    return Err(ValidationError::new(
      SUBCASE_TYPES,
      ErrorCode::Invalid,
      format!("a {} has no {SUBCASE_TYPES}", kind.resource_name()),
    ));
  }
  Ok(())
}

fn resolve_links<R: CatalogReader + ?Sized>(
  reader: &R,
  field: RelationField,
  ids: &[uuid::Uuid],
) -> Result<Vec<VersionedType>> {
  require_types(reader, ids, field.target_kind(), field.as_ref())
}

fn resolve_subcases<R: CatalogReader + ?Sized>(
  reader: &R,
  ids: &[uuid::Uuid],
) -> Result<Vec<VersionedType>> {
  require_types(reader, ids, TypeKind::CaseType, SUBCASE_TYPES)
}

impl CatalogEntity for VersionedType {
  type New = NewVersionedType;
  type Patch = TypePatch;

  fn validate_create<R: CatalogReader + ?Sized>(
    reader: &R,
    input: &NewVersionedType,
    ctx: &RequestContext,
  ) -> Result<()> {
    let kind = input.kind();
    if reader.catalog(input.catalog_id)?.is_none() {
      return Err(ValidationError::does_not_exist("catalog_id", input.catalog_id).into());
    }
    reject_foreign_fields(
      kind,
      |f| !input.relations.field(f).is_empty(),
      !input.relations.subcase_types.is_empty(),
    )?;

    let mut supplied: Vec<LinkSet> = Vec::new();
    for &field in kind.relation_fields() {
      supplied.push((field, resolve_links(reader, field, input.relations.field(field))?));
    }
    let subcases = resolve_subcases(reader, &input.relations.subcase_types)?;

    for (_, linked) in &supplied {
      relations::check_catalog_match(input.catalog_id, linked)?;
    }
    relations::check_catalog_match(input.catalog_id, &subcases)?;

    let key = IdentityKey {
      kind,
      catalog_id: input.catalog_id,
      identity: &input.identity,
    };
    temporal::check_single_draft(reader, key)?;
    relations::check_m2m_create(&supplied, ctx.scopes.forced_write())?;
    temporal::check_overlap(reader, key, input.validity(), None, false)
  }

  fn validate_update<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    patch: &TypePatch,
    ctx: &RequestContext,
    partial: bool,
  ) -> Result<()> {
    let kind = self.kind();
    if patch.details.as_ref().is_some_and(|d| d.kind() != kind) {
      return Err(
        ValidationError::new(
          "details",
          ErrorCode::Invalid,
          format!("a {} cannot change its kind", kind.resource_name()),
        )
        .into(),
      );
    }
    reject_foreign_fields(
      kind,
      |f| patch.relations.field(f).is_some_and(|ids| !ids.is_empty()),
      patch
        .relations
        .subcase_types
        .as_ref()
        .is_some_and(|ids| !ids.is_empty()),
    )?;

    let forced = ctx.scopes.forced_write();
    let closes_validity = partial && patch.closes_validity_only();
    let end_validity_only = partial && patch.touches_end_validity_only();

    let mut current: Vec<LinkSet> = Vec::new();
    let mut supplied: Vec<LinkSet> = Vec::new();
    for &field in kind.relation_fields() {
      current.push((field, reader.linked_types(self.type_id, field)?));
      if let Some(ids) = patch.relations.field(field) {
        supplied.push((field, resolve_links(reader, field, ids)?));
      }
    }
    let subcases = match &patch.relations.subcase_types {
      Some(ids) => resolve_subcases(reader, ids)?,
      None if kind == TypeKind::CaseType => reader.subcase_types(self.type_id)?,
      None => Vec::new(),
    };

    // Omitted fields keep their current targets.
    for (field, linked) in &current {
      let effective = supplied
        .iter()
        .find(|(f, _)| f == field)
        .map_or(linked, |(_, new)| new);
      relations::check_catalog_match(self.catalog_id, effective)?;
    }
    relations::check_catalog_match(self.catalog_id, &subcases)?;

    relations::check_m2m_update(&current, &supplied, closes_validity, forced)?;
    concept::check_mutable(self, forced || end_validity_only)?;

    let updated = patch.apply(self);
    temporal::check_overlap(
      reader,
      IdentityKey::of(&updated),
      updated.validity(),
      Some(self.type_id),
      partial,
    )
  }

  fn validate_delete<R: CatalogReader + ?Sized>(
    &self,
    reader: &R,
    scopes: &Scopes,
  ) -> Result<()> {
    let forced = scopes.forced_delete();
    concept::check_mutable(self, forced)?;
    for &field in self.kind().relation_fields() {
      let linked = reader.linked_types(self.type_id, field)?;
      relations::check_all_drafts(field.as_ref(), &linked, forced)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    Error,
    scope::Scope,
    types::TypeRelations,
    validate::{
      fixtures::{MemoryReader, ctx, date, details},
      validate_create, validate_delete, validate_update,
    },
  };

  fn new_case_type(catalog_id: Uuid, identity: &str) -> NewVersionedType {
    NewVersionedType {
      catalog_id,
      identity: identity.into(),
      begin_validity: date(2019, 1, 1),
      end_validity: None,
      details: details(TypeKind::CaseType),
      relations: TypeRelations::default(),
    }
  }

  fn code(err: Error) -> (String, ErrorCode) {
    match err {
      Error::Validation(v) => (v.field_path, v.code),
      other => panic!("expected a validation error, got {other}"),
    }
  }

  #[test]
  fn create_with_draft_links_in_one_catalog_succeeds() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let decision = reader.quick(TypeKind::DecisionType, catalog, true);
    let subcase = reader.quick(TypeKind::CaseType, catalog, false);

    let mut input = new_case_type(catalog, "ZT-NEW");
    input.relations.decision_types = vec![decision.type_id];
    input.relations.subcase_types = vec![subcase.type_id];
    validate_create::<VersionedType, _>(&reader, &input, &ctx(&[Scope::Write]))
      .unwrap();
  }

  #[test]
  fn unknown_catalog_does_not_exist() {
    let reader = MemoryReader::default();
    let input = new_case_type(Uuid::new_v4(), "ZT-NEW");
    let err = validate_create::<VersionedType, _>(&reader, &input, &ctx(&[]))
      .unwrap_err();
    assert_eq!(code(err), ("catalog_id".into(), ErrorCode::DoesNotExist));
  }

  #[test]
  fn catalog_mismatch_wins_over_concept_checks() {
    let mut reader = MemoryReader::default();
    let home = reader.add_catalog();
    let away = reader.add_catalog();
    let published_elsewhere = reader.quick(TypeKind::DocumentType, away, false);

    let mut input = new_case_type(home, "ZT-NEW");
    input.relations.document_types = vec![published_elsewhere.type_id];
    let err = validate_create::<VersionedType, _>(
      &reader,
      &input,
      &ctx(&[Scope::ForcedWrite]),
    )
    .unwrap_err();
    assert_eq!(code(err).1, ErrorCode::RelationsIncorrectCatalogus);
  }

  #[test]
  fn subcases_from_another_catalog_are_rejected() {
    let mut reader = MemoryReader::default();
    let home = reader.add_catalog();
    let away = reader.add_catalog();
    let subcase = reader.quick(TypeKind::CaseType, away, true);

    let mut input = new_case_type(home, "ZT-NEW");
    input.relations.subcase_types = vec![subcase.type_id];
    let err = validate_create::<VersionedType, _>(&reader, &input, &ctx(&[]))
      .unwrap_err();
    assert_eq!(code(err).1, ErrorCode::RelationsIncorrectCatalogus);
  }

  #[test]
  fn published_link_targets_need_the_forced_scope() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let published = reader.quick(TypeKind::DecisionType, catalog, false);

    let mut input = new_case_type(catalog, "ZT-NEW");
    input.relations.decision_types = vec![published.type_id];
    let err = validate_create::<VersionedType, _>(&reader, &input, &ctx(&[Scope::Write]))
      .unwrap_err();
    assert_eq!(code(err), ("decision_types".into(), ErrorCode::NonConceptRelation));

    validate_create::<VersionedType, _>(
      &reader,
      &input,
      &ctx(&[Scope::Write, Scope::ForcedWrite]),
    )
    .unwrap();
  }

  #[test]
  fn second_draft_is_caught_before_overlap() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    reader.add_case_type(catalog, "ZT-1", true, date(2018, 1, 1), None);

    let err = validate_create::<VersionedType, _>(
      &reader,
      &new_case_type(catalog, "ZT-1"),
      &ctx(&[]),
    )
    .unwrap_err();
    assert_eq!(code(err), ("draft".into(), ErrorCode::Overlap));
  }

  #[test]
  fn new_version_after_a_closed_one_is_accepted() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    reader.add_case_type(catalog, "ZT-1", false, date(2018, 1, 1), Some(date(2019, 1, 1)));

    validate_create::<VersionedType, _>(&reader, &new_case_type(catalog, "ZT-1"), &ctx(&[]))
      .unwrap();
  }

  #[test]
  fn overlapping_new_version_is_rejected() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    reader.add_case_type(catalog, "ZT-1", false, date(2018, 1, 1), None);

    let err = validate_create::<VersionedType, _>(
      &reader,
      &new_case_type(catalog, "ZT-1"),
      &ctx(&[]),
    )
    .unwrap_err();
    assert_eq!(code(err), ("begin_validity".into(), ErrorCode::Overlap));
  }

  #[test]
  fn decision_types_cannot_carry_subcases() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let case_type = reader.quick(TypeKind::CaseType, catalog, true);

    let input = NewVersionedType {
      details: details(TypeKind::DecisionType),
      relations: TypeRelations {
        subcase_types: vec![case_type.type_id],
        ..TypeRelations::default()
      },
      ..new_case_type(catalog, "BT-1")
    };
    let err = validate_create::<VersionedType, _>(&reader, &input, &ctx(&[]))
      .unwrap_err();
    assert_eq!(code(err), (SUBCASE_TYPES.into(), ErrorCode::Invalid));
  }

  #[test]
  fn closing_validity_of_a_published_linked_type_is_always_allowed() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::CaseType, catalog, false);
    let decision = reader.quick(TypeKind::DecisionType, catalog, false);
    reader.link(&ty, &decision);

    let patch = TypePatch {
      end_validity: Some(Some(date(2025, 1, 1))),
      ..TypePatch::default()
    };
    validate_update(&reader, &ty, &patch, &ctx(&[Scope::Write]), true).unwrap();
  }

  #[test]
  fn reopening_validity_only_needs_no_force_but_keeps_the_relation_guard() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::CaseType, catalog, false);
    let reopen = TypePatch {
      end_validity: Some(None),
      ..TypePatch::default()
    };
    validate_update(&reader, &ty, &reopen, &ctx(&[Scope::Write]), true).unwrap();

    let decision = reader.quick(TypeKind::DecisionType, catalog, false);
    reader.link(&ty, &decision);
    let err = validate_update(&reader, &ty, &reopen, &ctx(&[Scope::Write]), true)
      .unwrap_err();
    assert_eq!(code(err).1, ErrorCode::NonConceptRelation);
  }

  #[test]
  fn closing_validity_via_put_is_not_exempt() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::CaseType, catalog, false);

    let patch = TypePatch {
      end_validity: Some(Some(date(2025, 1, 1))),
      ..TypePatch::default()
    };
    let err = validate_update(&reader, &ty, &patch, &ctx(&[Scope::Write]), false)
      .unwrap_err();
    assert_eq!(code(err).1, ErrorCode::NonConceptObject);
  }

  #[test]
  fn published_types_need_forced_write_for_other_changes() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::DocumentType, catalog, false);

    let patch = TypePatch {
      identity: Some("renamed".into()),
      ..TypePatch::default()
    };
    let err = validate_update(&reader, &ty, &patch, &ctx(&[Scope::Write]), true)
      .unwrap_err();
    assert_eq!(code(err).1, ErrorCode::NonConceptObject);

    validate_update(&reader, &ty, &patch, &ctx(&[Scope::ForcedWrite]), true).unwrap();
  }

  #[test]
  fn currently_linked_published_types_block_updates() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::CaseType, catalog, true);
    let document = reader.quick(TypeKind::DocumentType, catalog, false);
    reader.link(&ty, &document);

    let patch = TypePatch {
      begin_validity: Some(date(2018, 6, 1)),
      ..TypePatch::default()
    };
    let err = validate_update(&reader, &ty, &patch, &ctx(&[Scope::Write]), true)
      .unwrap_err();
    assert_eq!(code(err), ("document_types".into(), ErrorCode::NonConceptRelation));
  }

  #[test]
  fn update_overlap_is_reported_on_end_validity_when_partial() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    reader.add_case_type(catalog, "ZT-1", false, date(2018, 1, 1), Some(date(2019, 1, 1)));
    let draft =
      reader.add_case_type(catalog, "ZT-1", true, date(2019, 1, 1), None);

    let patch = TypePatch {
      begin_validity: Some(date(2018, 6, 1)),
      ..TypePatch::default()
    };
    let err = validate_update(&reader, &draft, &patch, &ctx(&[]), true).unwrap_err();
    assert_eq!(code(err), ("end_validity".into(), ErrorCode::Overlap));
    let err = validate_update(&reader, &draft, &patch, &ctx(&[]), false).unwrap_err();
    assert_eq!(code(err), ("begin_validity".into(), ErrorCode::Overlap));
  }

  #[test]
  fn kind_cannot_change() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::CaseType, catalog, true);
    let patch = TypePatch {
      details: Some(details(TypeKind::DocumentType)),
      ..TypePatch::default()
    };
    let err = validate_update(&reader, &ty, &patch, &ctx(&[]), true).unwrap_err();
    assert_eq!(code(err), ("details".into(), ErrorCode::Invalid));
  }

  #[test]
  fn deleting_published_types_needs_forced_delete() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::DecisionType, catalog, false);

    let err = validate_delete(&reader, &ty, &Scopes::new([Scope::Write])).unwrap_err();
    assert_eq!(code(err).1, ErrorCode::NonConceptObject);
    validate_delete(&reader, &ty, &Scopes::new([Scope::ForcedDelete])).unwrap();
  }

  #[test]
  fn deleting_a_draft_linked_to_a_published_type_needs_forced_delete() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.quick(TypeKind::DocumentType, catalog, true);
    let case_type = reader.quick(TypeKind::CaseType, catalog, false);
    reader.link(&case_type, &ty);

    let err = validate_delete(&reader, &ty, &Scopes::new([Scope::Write])).unwrap_err();
    assert_eq!(code(err), ("case_types".into(), ErrorCode::NonConceptRelation));
    validate_delete(&reader, &ty, &Scopes::new([Scope::ForcedDelete])).unwrap();
  }
}

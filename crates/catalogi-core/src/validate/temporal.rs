//! Validity-window overlap and the single-draft rule.

use uuid::Uuid;

use crate::{
  Result,
  error::{ErrorCode, ValidationError},
  store::CatalogReader,
  types::{TypeKind, Validity, VersionedType},
};

/// Everything that identifies a versioned type across its versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityKey<'a> {
  pub kind:       TypeKind,
  pub catalog_id: Uuid,
  pub identity:   &'a str,
}

impl<'a> IdentityKey<'a> {
  pub fn of(ty: &'a VersionedType) -> Self {
    Self {
      kind:       ty.kind(),
      catalog_id: ty.catalog_id,
      identity:   &ty.identity,
    }
  }
}

/// Versions of `key` whose window intersects `window`, skipping `exclude`.
pub fn find_overlapping<R: CatalogReader + ?Sized>(
  reader: &R,
  key: IdentityKey<'_>,
  window: Validity,
  exclude: Option<Uuid>,
) -> Result<Vec<VersionedType>> {
  Ok(
    reader
      .versions_of(key.kind, key.catalog_id, key.identity)?
      .into_iter()
      .filter(|v| Some(v.type_id) != exclude && v.validity().overlaps(&window))
      .collect(),
  )
}

/// Reject `window` if another version of `key` overlaps it. Partial updates
/// report on `end_validity`, everything else on `begin_validity`.
pub fn check_overlap<R: CatalogReader + ?Sized>(
  reader: &R,
  key: IdentityKey<'_>,
  window: Validity,
  exclude: Option<Uuid>,
  partial: bool,
) -> Result<()> {
  if find_overlapping(reader, key, window, exclude)?.is_empty() {
    return Ok(());
  }
  let field = if partial { "end_validity" } else { "begin_validity" };
  Err(
    ValidationError::new(
      field,
      ErrorCode::Overlap,
      format!(
        "{} {:?} already exists in this catalog within the given validity period",
        key.kind.resource_name(),
        key.identity
      ),
    )
    .into(),
  )
}

/// At most one draft per identity may exist at a time.
pub fn check_single_draft<R: CatalogReader + ?Sized>(
  reader: &R,
  key: IdentityKey<'_>,
) -> Result<()> {
  let has_draft = reader
    .versions_of(key.kind, key.catalog_id, key.identity)?
    .iter()
    .any(|v| v.draft);
  if !has_draft {
    return Ok(());
  }
  Err(
    ValidationError::new(
      "draft",
      ErrorCode::Overlap,
      format!(
        "a draft of {} {:?} already exists in this catalog",
        key.kind.resource_name(),
        key.identity
      ),
    )
    .into(),
  )
}

#[cfg(test)]
mod tests {
  use chrono::{Days, NaiveDate};
  use proptest::prelude::*;

  use super::*;
  use crate::validate::fixtures::{MemoryReader, date};

  fn day(offset: u64) -> NaiveDate {
    date(2020, 1, 1) + Days::new(offset)
  }

  fn window(begin: u64, len: Option<u64>) -> Validity {
    Validity::new(day(begin), len.map(|l| day(begin + l)))
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn overlap_matches_shared_days(
      b1 in 0u64..40, l1 in proptest::option::of(0u64..20),
      b2 in 0u64..40, l2 in proptest::option::of(0u64..20),
    ) {
      let (a, b) = (window(b1, l1), window(b2, l2));
      let shared = (0..100).map(day).any(|d| a.contains(d) && b.contains(d));
      prop_assert_eq!(a.overlaps(&b), shared);
      prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }
  }

  #[test]
  fn consecutive_versions_are_accepted() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let first = reader.add_case_type(
      catalog,
      "ZT-1",
      false,
      date(2018, 1, 1),
      Some(date(2018, 12, 31)),
    );

    let key = IdentityKey::of(&first);
    let next = Validity::new(date(2018, 12, 31), None);
    assert!(check_overlap(&reader, key, next, None, false).is_ok());
  }

  #[test]
  fn overlap_is_reported_on_begin_validity_for_full_writes() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let first =
      reader.add_case_type(catalog, "ZT-1", false, date(2018, 1, 1), None);

    let key = IdentityKey::of(&first);
    let err = check_overlap(&reader, key, Validity::new(date(2019, 1, 1), None), None, false)
      .unwrap_err();
    let err = match err {
      crate::Error::Validation(v) => v,
      other => panic!("unexpected error: {other}"),
    };
    assert_eq!(err.code, ErrorCode::Overlap);
    assert_eq!(err.field_path, "begin_validity");

    let err = check_overlap(&reader, key, Validity::new(date(2019, 1, 1), None), None, true)
      .unwrap_err();
    assert!(matches!(err, crate::Error::Validation(v) if v.field_path == "end_validity"));
  }

  #[test]
  fn the_instance_being_updated_is_excluded() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let ty = reader.add_case_type(catalog, "ZT-1", true, date(2018, 1, 1), None);
    let key = IdentityKey::of(&ty);
    assert!(check_overlap(&reader, key, ty.validity(), Some(ty.type_id), true).is_ok());
  }

  #[test]
  fn other_catalogs_and_identities_do_not_collide() {
    let mut reader = MemoryReader::default();
    let first_catalog = reader.add_catalog();
    let second_catalog = reader.add_catalog();
    reader.add_case_type(first_catalog, "ZT-1", false, date(2018, 1, 1), None);
    reader.add_case_type(first_catalog, "ZT-2", false, date(2018, 1, 1), None);

    let key = IdentityKey {
      kind:       TypeKind::CaseType,
      catalog_id: second_catalog,
      identity:   "ZT-1",
    };
    let found =
      find_overlapping(&reader, key, Validity::new(date(2018, 6, 1), None), None)
        .unwrap();
    assert!(found.is_empty());
  }

  #[test]
  fn a_second_draft_is_rejected_on_the_draft_field() {
    let mut reader = MemoryReader::default();
    let catalog = reader.add_catalog();
    let draft = reader.add_case_type(
      catalog,
      "ZT-1",
      true,
      date(2018, 1, 1),
      Some(date(2019, 1, 1)),
    );

    let err = check_single_draft(&reader, IdentityKey::of(&draft)).unwrap_err();
    assert!(matches!(
      err,
      crate::Error::Validation(v) if v.field_path == "draft" && v.code == ErrorCode::Overlap
    ));
  }
}

//! Catalog entities: catalogs, the three versioned type kinds, and the
//! records that hang off a case type.
//!
//! A versioned type is identified across its versions by
//! `(kind, catalog_id, identity)`. Each version carries a half-open validity
//! window `[begin_validity, end_validity)` and a `draft` flag; published
//! versions are frozen unless the caller holds a forced scope.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::archival::ArchivalProcedure;

/// Distinguishes "field absent" (`None`) from "field explicitly null"
/// (`Some(None)`) in patch bodies.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Container scoping all versioned types. Types never move between catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
  pub catalog_id: Uuid,
  pub domain:     String,
  pub rsin:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCatalog {
  pub domain: String,
  pub rsin:   String,
}

// ─── Kinds and relation fields ───────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TypeKind {
  CaseType,
  DecisionType,
  DocumentType,
}

impl TypeKind {
  /// Resource name as used by the public API and in error codes.
  pub fn resource_name(self) -> &'static str {
    match self {
      Self::CaseType => "zaaktype",
      Self::DecisionType => "besluittype",
      Self::DocumentType => "informatieobjecttype",
    }
  }

  /// The many-to-many fields a type of this kind may carry. Both fields are
  /// subject to the concept guards on create, update and delete.
  pub fn relation_fields(self) -> &'static [RelationField] {
    match self {
      Self::CaseType => &[RelationField::DecisionTypes, RelationField::DocumentTypes],
      Self::DecisionType => &[RelationField::CaseTypes, RelationField::DocumentTypes],
      Self::DocumentType => &[RelationField::CaseTypes, RelationField::DecisionTypes],
    }
  }

  /// Fields whose targets must be published before a type of this kind may
  /// be. The graph is acyclic: case → decision → document.
  pub fn publication_dependencies(self) -> &'static [RelationField] {
    match self {
      Self::CaseType => &[RelationField::DecisionTypes, RelationField::DocumentTypes],
      Self::DecisionType => &[RelationField::DocumentTypes],
      Self::DocumentType => &[],
    }
  }
}

/// A symmetric many-to-many relation, named from the owner's point of view.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationField {
  CaseTypes,
  DecisionTypes,
  DocumentTypes,
}

impl RelationField {
  pub fn target_kind(self) -> TypeKind {
    match self {
      Self::CaseTypes => TypeKind::CaseType,
      Self::DecisionTypes => TypeKind::DecisionType,
      Self::DocumentTypes => TypeKind::DocumentType,
    }
  }

  pub fn for_target(kind: TypeKind) -> Self {
    match kind {
      TypeKind::CaseType => Self::CaseTypes,
      TypeKind::DecisionType => Self::DecisionTypes,
      TypeKind::DocumentType => Self::DocumentTypes,
    }
  }
}

/// Field name used for a case type's subcase types.
pub const SUBCASE_TYPES: &str = "subcase_types";

// ─── Validity ────────────────────────────────────────────────────────────────

/// Half-open interval `[begin, end)`; `end = None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
  pub begin: NaiveDate,
  pub end:   Option<NaiveDate>,
}

impl Validity {
  pub fn new(begin: NaiveDate, end: Option<NaiveDate>) -> Self {
    Self { begin, end }
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.begin <= date && self.end.is_none_or(|end| date < end)
  }

  /// `true` if the two windows share at least one day.
  pub fn overlaps(&self, other: &Validity) -> bool {
    let starts_before =
      |begin: NaiveDate, end: Option<NaiveDate>| end.is_none_or(|e| begin < e);
    starts_before(self.begin, other.end) && starts_before(other.begin, self.end)
  }
}

// ─── Versioned types ─────────────────────────────────────────────────────────

/// Kind-specific payload. The tag doubles as the type's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDetails {
  CaseType(CaseTypeDetails),
  DecisionType(DecisionTypeDetails),
  DocumentType(DocumentTypeDetails),
}

impl TypeDetails {
  pub fn kind(&self) -> TypeKind {
    match self {
      Self::CaseType(_) => TypeKind::CaseType,
      Self::DecisionType(_) => TypeKind::DecisionType,
      Self::DocumentType(_) => TypeKind::DocumentType,
    }
  }

  /// Process type a case type is bound to in the selection list.
  pub fn process_type(&self) -> Option<&str> {
    match self {
      Self::CaseType(d) => d.process_type.as_deref(),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTypeDetails {
  pub description:     String,
  #[serde(default)]
  pub process_type:    Option<String>,
  #[serde(default)]
  pub confidentiality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTypeDetails {
  #[serde(default)]
  pub category:             Option<String>,
  #[serde(default)]
  pub publication_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeDetails {
  pub confidentiality: String,
}

/// One version of a case, decision or document type.
///
/// `identity` is the case type identification, or the description for
/// decision and document types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedType {
  pub type_id:        Uuid,
  pub catalog_id:     Uuid,
  pub identity:       String,
  pub draft:          bool,
  pub begin_validity: NaiveDate,
  pub end_validity:   Option<NaiveDate>,
  pub details:        TypeDetails,
}

impl VersionedType {
  pub fn kind(&self) -> TypeKind { self.details.kind() }

  pub fn validity(&self) -> Validity {
    Validity::new(self.begin_validity, self.end_validity)
  }
}

/// Outgoing links of a versioned type, by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRelations {
  #[serde(default)]
  pub case_types:     Vec<Uuid>,
  #[serde(default)]
  pub decision_types: Vec<Uuid>,
  #[serde(default)]
  pub document_types: Vec<Uuid>,
  #[serde(default)]
  pub subcase_types:  Vec<Uuid>,
}

impl TypeRelations {
  pub fn field(&self, field: RelationField) -> &[Uuid] {
    match field {
      RelationField::CaseTypes => &self.case_types,
      RelationField::DecisionTypes => &self.decision_types,
      RelationField::DocumentTypes => &self.document_types,
    }
  }
}

/// A versioned type together with its links, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeView {
  #[serde(flatten)]
  pub versioned: VersionedType,
  #[serde(flatten)]
  pub relations: TypeRelations,
}

/// Input for creating a versioned type. New types always start as drafts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVersionedType {
  pub catalog_id:     Uuid,
  pub identity:       String,
  pub begin_validity: NaiveDate,
  #[serde(default)]
  pub end_validity:   Option<NaiveDate>,
  pub details:        TypeDetails,
  #[serde(flatten)]
  pub relations:      TypeRelations,
}

impl NewVersionedType {
  pub fn kind(&self) -> TypeKind { self.details.kind() }

  pub fn validity(&self) -> Validity {
    Validity::new(self.begin_validity, self.end_validity)
  }
}

/// Replacement link sets; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationsPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub case_types:     Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub decision_types: Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub document_types: Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subcase_types:  Option<Vec<Uuid>>,
}

impl RelationsPatch {
  pub fn field(&self, field: RelationField) -> Option<&[Uuid]> {
    match field {
      RelationField::CaseTypes => self.case_types.as_deref(),
      RelationField::DecisionTypes => self.decision_types.as_deref(),
      RelationField::DocumentTypes => self.document_types.as_deref(),
    }
  }
}

/// Attributes supplied on update. The catalog is immutable and has no slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub identity:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub begin_validity: Option<NaiveDate>,
  #[serde(
    default,
    deserialize_with = "present",
    skip_serializing_if = "Option::is_none"
  )]
  pub end_validity:   Option<Option<NaiveDate>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details:        Option<TypeDetails>,
  #[serde(flatten)]
  pub relations:      RelationsPatch,
}

impl TypePatch {
  /// Names of the attributes this patch supplies.
  pub fn supplied_fields(&self) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if self.identity.is_some() {
      fields.push("identity");
    }
    if self.begin_validity.is_some() {
      fields.push("begin_validity");
    }
    if self.end_validity.is_some() {
      fields.push("end_validity");
    }
    if self.details.is_some() {
      fields.push("details");
    }
    if self.relations.case_types.is_some() {
      fields.push("case_types");
    }
    if self.relations.decision_types.is_some() {
      fields.push("decision_types");
    }
    if self.relations.document_types.is_some() {
      fields.push("document_types");
    }
    if self.relations.subcase_types.is_some() {
      fields.push("subcase_types");
    }
    fields
  }

  /// The patch supplies `end_validity`, possibly null, and nothing else.
  pub fn touches_end_validity_only(&self) -> bool {
    self.supplied_fields() == ["end_validity"]
  }

  /// The patch sets `end_validity` to a date and touches nothing else.
  pub fn closes_validity_only(&self) -> bool {
    matches!(self.end_validity, Some(Some(_))) && self.touches_end_validity_only()
  }

  /// The version that results from applying this patch to `current`.
  pub fn apply(&self, current: &VersionedType) -> VersionedType {
    VersionedType {
      type_id:        current.type_id,
      catalog_id:     current.catalog_id,
      identity:       self
        .identity
        .clone()
        .unwrap_or_else(|| current.identity.clone()),
      draft:          current.draft,
      begin_validity: self.begin_validity.unwrap_or(current.begin_validity),
      end_validity:   self.end_validity.unwrap_or(current.end_validity),
      details:        self
        .details
        .clone()
        .unwrap_or_else(|| current.details.clone()),
    }
  }
}

// ─── Case type children ──────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChildKind {
  ResultType,
  StatusType,
  RoleType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChildDetails {
  ResultType(ResultTypeDetails),
  StatusType(StatusTypeDetails),
  RoleType(RoleTypeDetails),
}

impl ChildDetails {
  pub fn kind(&self) -> ChildKind {
    match self {
      Self::ResultType(_) => ChildKind::ResultType,
      Self::StatusType(_) => ChildKind::StatusType,
      Self::RoleType(_) => ChildKind::RoleType,
    }
  }

  pub fn description(&self) -> &str {
    match self {
      Self::ResultType(d) => &d.description,
      Self::StatusType(d) => &d.description,
      Self::RoleType(d) => &d.description,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveNomination {
  #[serde(rename = "blijvend_bewaren")]
  Retain,
  #[serde(rename = "vernietigen")]
  Destroy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTypeDetails {
  pub description:           String,
  /// URL of the classification in the external selection list.
  pub selection_list_class:  String,
  pub archive_nomination:    ArchiveNomination,
  /// ISO 8601 duration, e.g. `P10Y`.
  #[serde(default)]
  pub archive_action_period: Option<String>,
  #[serde(default)]
  pub archival_procedure:    Option<ArchivalProcedure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTypeDetails {
  pub description:     String,
  pub sequence_number: u32,
  #[serde(default)]
  pub status_text:     Option<String>,
  #[serde(default)]
  pub informs:         bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTypeDetails {
  pub description:         String,
  pub generic_description: String,
}

/// A result, status or role type owned by exactly one case type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildType {
  pub child_id:     Uuid,
  pub case_type_id: Uuid,
  pub details:      ChildDetails,
}

impl ChildType {
  pub fn kind(&self) -> ChildKind { self.details.kind() }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChildType {
  pub case_type_id: Uuid,
  pub details:      ChildDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub case_type_id: Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details:      Option<ChildDetails>,
}

impl ChildPatch {
  pub fn apply(&self, current: &ChildType) -> ChildType {
    ChildType {
      child_id:     current.child_id,
      case_type_id: self.case_type_id.unwrap_or(current.case_type_id),
      details:      self
        .details
        .clone()
        .unwrap_or_else(|| current.details.clone()),
    }
  }
}

// ─── Case type ↔ document type records ───────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum Direction {
  #[serde(rename = "inkomend")]
  #[strum(serialize = "inkomend")]
  Incoming,
  #[serde(rename = "intern")]
  #[strum(serialize = "intern")]
  Internal,
  #[serde(rename = "uitgaand")]
  #[strum(serialize = "uitgaand")]
  Outgoing,
}

/// Explicit association record between a case type and a document type,
/// carrying its own attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTypeDocumentType {
  pub link_id:          Uuid,
  pub case_type_id:     Uuid,
  pub document_type_id: Uuid,
  pub sequence_number:  u32,
  pub direction:        Direction,
  pub status_type_id:   Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCaseTypeDocumentType {
  pub case_type_id:     Uuid,
  pub document_type_id: Uuid,
  pub sequence_number:  u32,
  pub direction:        Direction,
  #[serde(default)]
  pub status_type_id:   Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseTypeDocumentTypePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub case_type_id:     Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub document_type_id: Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sequence_number:  Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub direction:        Option<Direction>,
  #[serde(
    default,
    deserialize_with = "present",
    skip_serializing_if = "Option::is_none"
  )]
  pub status_type_id:   Option<Option<Uuid>>,
}

impl CaseTypeDocumentTypePatch {
  pub fn apply(&self, current: &CaseTypeDocumentType) -> CaseTypeDocumentType {
    CaseTypeDocumentType {
      link_id:          current.link_id,
      case_type_id:     self.case_type_id.unwrap_or(current.case_type_id),
      document_type_id: self
        .document_type_id
        .unwrap_or(current.document_type_id),
      sequence_number:  self.sequence_number.unwrap_or(current.sequence_number),
      direction:        self.direction.unwrap_or(current.direction),
      status_type_id:   self.status_type_id.unwrap_or(current.status_type_id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn adjacent_windows_do_not_overlap() {
    let first = Validity::new(date(2018, 1, 1), Some(date(2018, 12, 31)));
    let second = Validity::new(date(2018, 12, 31), None);
    assert!(!first.overlaps(&second));
    assert!(!second.overlaps(&first));
  }

  #[test]
  fn open_ended_windows_overlap_anything_later() {
    let open = Validity::new(date(2018, 1, 1), None);
    let later = Validity::new(date(2030, 6, 1), Some(date(2031, 1, 1)));
    assert!(open.overlaps(&later));
    assert!(open.contains(date(2099, 1, 1)));
    assert!(!open.contains(date(2017, 12, 31)));
  }

  #[test]
  fn patch_distinguishes_null_from_absent_end_validity() {
    let absent: TypePatch = serde_json::from_str("{}").unwrap();
    assert_eq!(absent.end_validity, None);

    let null: TypePatch =
      serde_json::from_str(r#"{"end_validity": null}"#).unwrap();
    assert_eq!(null.end_validity, Some(None));
    assert!(null.touches_end_validity_only());
    assert!(!null.closes_validity_only());

    let closing: TypePatch =
      serde_json::from_str(r#"{"end_validity": "2019-01-01"}"#).unwrap();
    assert!(closing.closes_validity_only());
  }

  #[test]
  fn closing_with_other_fields_is_not_exempt() {
    let patch: TypePatch = serde_json::from_str(
      r#"{"end_validity": "2019-01-01", "decision_types": []}"#,
    )
    .unwrap();
    assert_eq!(patch.supplied_fields(), ["end_validity", "decision_types"]);
    assert!(!patch.closes_validity_only());
  }

  #[test]
  fn details_tag_carries_the_kind() {
    let details: TypeDetails = serde_json::from_str(
      r#"{"kind": "document_type", "confidentiality": "openbaar"}"#,
    )
    .unwrap();
    assert_eq!(details.kind(), TypeKind::DocumentType);
    assert_eq!(TypeKind::DocumentType.resource_name(), "informatieobjecttype");
  }

  #[test]
  fn publication_graph_has_no_back_edges() {
    for kind in [TypeKind::CaseType, TypeKind::DecisionType, TypeKind::DocumentType]
    {
      for field in kind.publication_dependencies() {
        let target = field.target_kind();
        assert!(
          !target
            .publication_dependencies()
            .contains(&RelationField::for_target(kind)),
          "{kind} and {target} depend on each other"
        );
      }
    }
  }
}

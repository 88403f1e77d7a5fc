//! In-memory [`CatalogReader`] for validator tests.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  Result,
  classification::{Classification, ResolvedClassifications},
  scope::{Scope, Scopes},
  store::CatalogReader,
  types::{
    ArchiveNomination, CaseTypeDetails, Catalog, ChildDetails, ChildType,
    DecisionTypeDetails, DocumentTypeDetails, RelationField,
    ResultTypeDetails, StatusTypeDetails, TypeDetails, TypeKind, VersionedType,
  },
  validate::RequestContext,
};

pub const PROCESS_TYPE: &str = "https://selectielijst.example/procestypen/1";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ctx(scopes: &[Scope]) -> RequestContext {
  RequestContext::new(Scopes::new(scopes.iter().copied()))
}

pub fn details(kind: TypeKind) -> TypeDetails {
  match kind {
    TypeKind::CaseType => TypeDetails::CaseType(CaseTypeDetails {
      description:     "Vergunning".into(),
      process_type:    Some(PROCESS_TYPE.into()),
      confidentiality: None,
    }),
    TypeKind::DecisionType => {
      TypeDetails::DecisionType(DecisionTypeDetails::default())
    }
    TypeKind::DocumentType => TypeDetails::DocumentType(DocumentTypeDetails {
      confidentiality: "openbaar".into(),
    }),
  }
}

pub fn classification(url: &str, term: &str) -> Classification {
  Classification {
    url:          url.into(),
    process_type: PROCESS_TYPE.into(),
    process_term: term.into(),
  }
}

pub fn with_classification(
  mut ctx: RequestContext,
  classification: Classification,
) -> RequestContext {
  let mut resolved = ResolvedClassifications::new();
  resolved.insert(classification);
  ctx.classifications = resolved;
  ctx
}

pub fn result_details(description: &str, url: &str) -> ChildDetails {
  ChildDetails::ResultType(ResultTypeDetails {
    description:           description.into(),
    selection_list_class:  url.into(),
    archive_nomination:    ArchiveNomination::Destroy,
    archive_action_period: Some("P10Y".into()),
    archival_procedure:    None,
  })
}

pub fn status_details(sequence_number: u32) -> ChildDetails {
  ChildDetails::StatusType(StatusTypeDetails {
    description: format!("status {sequence_number}"),
    sequence_number,
    status_text: None,
    informs: false,
  })
}

#[derive(Debug, Default)]
pub struct MemoryReader {
  pub catalogs: Vec<Catalog>,
  pub types:    Vec<VersionedType>,
  pub links:    Vec<(Uuid, Uuid)>,
  pub subcases: Vec<(Uuid, Uuid)>,
  pub children: Vec<ChildType>,
}

impl MemoryReader {
  pub fn add_catalog(&mut self) -> Uuid {
    let catalog_id = Uuid::new_v4();
    self.catalogs.push(Catalog {
      catalog_id,
      domain: "ABCDE".into(),
      rsin: "000000001".into(),
      created_at: Utc::now(),
    });
    catalog_id
  }

  pub fn add_type(
    &mut self,
    kind: TypeKind,
    catalog_id: Uuid,
    identity: &str,
    draft: bool,
    begin: NaiveDate,
    end: Option<NaiveDate>,
  ) -> VersionedType {
    let ty = VersionedType {
      type_id: Uuid::new_v4(),
      catalog_id,
      identity: identity.into(),
      draft,
      begin_validity: begin,
      end_validity: end,
      details: details(kind),
    };
    self.types.push(ty.clone());
    ty
  }

  pub fn add_case_type(
    &mut self,
    catalog_id: Uuid,
    identity: &str,
    draft: bool,
    begin: NaiveDate,
    end: Option<NaiveDate>,
  ) -> VersionedType {
    self.add_type(TypeKind::CaseType, catalog_id, identity, draft, begin, end)
  }

  /// A type of `kind` valid from 2018 onwards with a fresh identity.
  pub fn quick(
    &mut self,
    kind: TypeKind,
    catalog_id: Uuid,
    draft: bool,
  ) -> VersionedType {
    let identity = Uuid::new_v4().to_string();
    self.add_type(kind, catalog_id, &identity, draft, date(2018, 1, 1), None)
  }

  pub fn link(&mut self, a: &VersionedType, b: &VersionedType) {
    self.links.push((a.type_id, b.type_id));
  }

  pub fn add_child(&mut self, case_type: &VersionedType, details: ChildDetails) -> ChildType {
    let child = ChildType {
      child_id: Uuid::new_v4(),
      case_type_id: case_type.type_id,
      details,
    };
    self.children.push(child.clone());
    child
  }

  fn find(&self, id: Uuid) -> Option<&VersionedType> {
    self.types.iter().find(|t| t.type_id == id)
  }
}

impl CatalogReader for MemoryReader {
  fn catalog(&self, catalog_id: Uuid) -> Result<Option<Catalog>> {
    Ok(self.catalogs.iter().find(|c| c.catalog_id == catalog_id).cloned())
  }

  fn versioned_type(&self, type_id: Uuid) -> Result<Option<VersionedType>> {
    Ok(self.find(type_id).cloned())
  }

  fn versions_of(
    &self,
    kind: TypeKind,
    catalog_id: Uuid,
    identity: &str,
  ) -> Result<Vec<VersionedType>> {
    Ok(
      self
        .types
        .iter()
        .filter(|t| {
          t.kind() == kind && t.catalog_id == catalog_id && t.identity == identity
        })
        .cloned()
        .collect(),
    )
  }

  fn linked_types(
    &self,
    owner: Uuid,
    field: RelationField,
  ) -> Result<Vec<VersionedType>> {
    Ok(
      self
        .links
        .iter()
        .filter_map(|&(a, b)| match (a == owner, b == owner) {
          (true, _) => Some(b),
          (_, true) => Some(a),
          _ => None,
        })
        .filter_map(|id| self.find(id))
        .filter(|t| t.kind() == field.target_kind())
        .cloned()
        .collect(),
    )
  }

  fn subcase_types(&self, case_type_id: Uuid) -> Result<Vec<VersionedType>> {
    Ok(
      self
        .subcases
        .iter()
        .filter(|(owner, _)| *owner == case_type_id)
        .filter_map(|(_, sub)| self.find(*sub))
        .cloned()
        .collect(),
    )
  }

  fn child(&self, child_id: Uuid) -> Result<Option<ChildType>> {
    Ok(self.children.iter().find(|c| c.child_id == child_id).cloned())
  }

  fn children_of(&self, case_type_id: Uuid) -> Result<Vec<ChildType>> {
    Ok(
      self
        .children
        .iter()
        .filter(|c| c.case_type_id == case_type_id)
        .cloned()
        .collect(),
    )
  }
}

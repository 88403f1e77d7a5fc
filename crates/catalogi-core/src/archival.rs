//! Archival procedure consistency for result types.
//!
//! A result type's archival procedure names a derivation method for the
//! archival reference date. Each method dictates which supporting attributes
//! must be present and which must stay empty, and the method must agree with
//! the process term of the selection-list classification.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  classification::{Classification, PROCESS_TERM_CASE_CLOSED, PROCESS_TERM_ESTIMATED_LIFETIME},
  error::{ErrorCode, ValidationError},
};

/// How the archival reference date (brondatum) is derived.
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
  EnumIter,
)]
pub enum DerivationMethod {
  #[serde(rename = "afgehandeld")]
  #[strum(serialize = "afgehandeld")]
  CaseClosed,
  #[serde(rename = "ander_datumkenmerk")]
  #[strum(serialize = "ander_datumkenmerk")]
  OtherDateAttribute,
  #[serde(rename = "eigenschap")]
  #[strum(serialize = "eigenschap")]
  Property,
  #[serde(rename = "gerelateerde_zaak")]
  #[strum(serialize = "gerelateerde_zaak")]
  RelatedCase,
  #[serde(rename = "hoofdzaak")]
  #[strum(serialize = "hoofdzaak")]
  MainCase,
  #[serde(rename = "ingangsdatum_besluit")]
  #[strum(serialize = "ingangsdatum_besluit")]
  DecisionStartDate,
  #[serde(rename = "termijn")]
  #[strum(serialize = "termijn")]
  Term,
  #[serde(rename = "vervaldatum_besluit")]
  #[strum(serialize = "vervaldatum_besluit")]
  DecisionExpiryDate,
  #[serde(rename = "zaakobject")]
  #[strum(serialize = "zaakobject")]
  CaseObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivalProcedure {
  pub derivation_method: DerivationMethod,
  #[serde(default)]
  pub date_attribute:    String,
  #[serde(default)]
  pub object_type:       String,
  #[serde(default)]
  pub registration:      String,
  /// ISO 8601 duration.
  #[serde(default)]
  pub process_term:      Option<String>,
  #[serde(default)]
  pub end_date_known:    bool,
}

// ─── Field table ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
  Required,
  Forbidden,
  Optional,
}

/// Per-attribute rules for one derivation method, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRules {
  pub date_attribute: FieldRule,
  pub object_type:    FieldRule,
  pub registration:   FieldRule,
  pub process_term:   FieldRule,
  pub end_date_known: FieldRule,
}

impl DerivationMethod {
  pub fn field_rules(self) -> FieldRules {
    use FieldRule::{Forbidden as F, Optional as O, Required as R};
    let rules = |date_attribute, object_type, registration, process_term, end_date_known| {
      FieldRules {
        date_attribute,
        object_type,
        registration,
        process_term,
        end_date_known,
      }
    };
    match self {
      Self::CaseClosed => rules(F, F, F, F, F),
      Self::OtherDateAttribute => rules(R, R, R, F, O),
      Self::Property => rules(R, F, F, F, O),
      Self::RelatedCase => rules(F, F, F, F, O),
      Self::MainCase => rules(F, F, F, F, O),
      Self::DecisionStartDate => rules(F, F, F, F, O),
      Self::Term => rules(F, F, F, R, F),
      Self::DecisionExpiryDate => rules(F, F, F, F, O),
      Self::CaseObject => rules(R, F, F, F, O),
    }
  }
}

impl ArchivalProcedure {
  /// Presence of each attribute, paired with its name, in reporting order.
  fn presence(&self) -> [(&'static str, bool); 5] {
    [
      ("date_attribute", !self.date_attribute.is_empty()),
      ("object_type", !self.object_type.is_empty()),
      ("registration", !self.registration.is_empty()),
      (
        "process_term",
        self.process_term.as_deref().is_some_and(|t| !t.is_empty()),
      ),
      ("end_date_known", self.end_date_known),
    ]
  }

  /// Check the attributes against the derivation method's field table.
  /// Reports the first violation, on `archival_procedure.<field>`.
  pub fn validate_fields(&self) -> Result<(), ValidationError> {
    let rules = self.derivation_method.field_rules();
    let table = [
      rules.date_attribute,
      rules.object_type,
      rules.registration,
      rules.process_term,
      rules.end_date_known,
    ];
    for ((field, present), rule) in self.presence().into_iter().zip(table) {
      let path = format!("archival_procedure.{field}");
      match (rule, present) {
        (FieldRule::Required, false) => {
          return Err(ValidationError::new(
            path,
            ErrorCode::Required,
            format!(
              "{field} is required when the derivation method is {}",
              self.derivation_method
            ),
          ));
        }
        (FieldRule::Forbidden, true) => {
          return Err(ValidationError::new(
            path,
            ErrorCode::Empty,
            format!(
              "{field} must be empty when the derivation method is {}",
              self.derivation_method
            ),
          ));
        }
        _ => {}
      }
    }
    Ok(())
  }
}

// ─── Classification consistency ──────────────────────────────────────────────

/// The derivation method must agree with the classification's process term.
/// An empty process term is compatible with every method.
pub fn validate_process_term(
  method: DerivationMethod,
  classification: &Classification,
) -> Result<(), ValidationError> {
  let term = classification.process_term.as_str();
  let consistent = match method {
    DerivationMethod::CaseClosed => {
      term.is_empty() || term == PROCESS_TERM_CASE_CLOSED
    }
    DerivationMethod::Term => {
      term.is_empty() || term == PROCESS_TERM_ESTIMATED_LIFETIME
    }
    _ => term != PROCESS_TERM_CASE_CLOSED && term != PROCESS_TERM_ESTIMATED_LIFETIME,
  };
  if consistent {
    Ok(())
  } else {
    Err(ValidationError::non_field(
      ErrorCode::InvalidDerivationForProcessTerm,
      format!(
        "derivation method {method} is invalid for process term {term:?} of {}",
        classification.url
      ),
    ))
  }
}

/// The classification's process type must equal the owning case type's.
pub fn validate_process_type(
  classification: &Classification,
  case_process_type: Option<&str>,
) -> Result<(), ValidationError> {
  if case_process_type == Some(classification.process_type.as_str()) {
    Ok(())
  } else {
    Err(ValidationError::non_field(
      ErrorCode::ProcessTypeMismatch,
      format!(
        "the selection list class {} belongs to process type {}, not to the case type's {}",
        classification.url,
        classification.process_type,
        case_process_type.unwrap_or("(none)"),
      ),
    ))
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  fn procedure(method: DerivationMethod) -> ArchivalProcedure {
    ArchivalProcedure {
      derivation_method: method,
      date_attribute:    String::new(),
      object_type:       String::new(),
      registration:      String::new(),
      process_term:      None,
      end_date_known:    false,
    }
  }

  fn classification(term: &str) -> Classification {
    Classification {
      url:          "https://selectielijst.example/resultaten/1".into(),
      process_type: "https://selectielijst.example/procestypen/1".into(),
      process_term: term.into(),
    }
  }

  #[test]
  fn case_closed_with_nothing_set_is_valid() {
    assert!(procedure(DerivationMethod::CaseClosed).validate_fields().is_ok());
  }

  #[test]
  fn case_closed_rejects_a_date_attribute() {
    let mut p = procedure(DerivationMethod::CaseClosed);
    p.date_attribute = "einddatum".into();
    let err = p.validate_fields().unwrap_err();
    assert_eq!(err.field_path, "archival_procedure.date_attribute");
    assert_eq!(err.code, ErrorCode::Empty);
  }

  #[test]
  fn other_date_attribute_requires_its_three_markers() {
    let mut p = procedure(DerivationMethod::OtherDateAttribute);
    let err = p.validate_fields().unwrap_err();
    assert_eq!(err.field_path, "archival_procedure.date_attribute");
    assert_eq!(err.code, ErrorCode::Required);

    p.date_attribute = "identificatie".into();
    let err = p.validate_fields().unwrap_err();
    assert_eq!(err.field_path, "archival_procedure.object_type");
    assert_eq!(err.code, ErrorCode::Required);

    p.object_type = "pand".into();
    p.registration = "test".into();
    p.end_date_known = true;
    assert!(p.validate_fields().is_ok());
  }

  #[test]
  fn term_requires_a_process_term_and_forbids_end_date_known() {
    let mut p = procedure(DerivationMethod::Term);
    let err = p.validate_fields().unwrap_err();
    assert_eq!(err.field_path, "archival_procedure.process_term");
    assert_eq!(err.code, ErrorCode::Required);

    p.process_term = Some("P5Y".into());
    p.end_date_known = true;
    let err = p.validate_fields().unwrap_err();
    assert_eq!(err.field_path, "archival_procedure.end_date_known");
    assert_eq!(err.code, ErrorCode::Empty);
  }

  #[test]
  fn case_object_requires_date_attribute_but_forbids_object_type() {
    let mut p = procedure(DerivationMethod::CaseObject);
    p.date_attribute = "datum".into();
    p.object_type = "adres".into();
    let err = p.validate_fields().unwrap_err();
    assert_eq!(err.field_path, "archival_procedure.object_type");
    assert_eq!(err.code, ErrorCode::Empty);
  }

  #[test]
  fn only_case_closed_and_term_forbid_end_date_known() {
    for method in DerivationMethod::iter() {
      let expected = match method {
        DerivationMethod::CaseClosed | DerivationMethod::Term => FieldRule::Forbidden,
        _ => FieldRule::Optional,
      };
      assert_eq!(method.field_rules().end_date_known, expected, "{method}");
    }
  }

  #[test]
  fn nihil_is_only_valid_for_case_closed() {
    let nihil = classification(PROCESS_TERM_CASE_CLOSED);
    assert!(validate_process_term(DerivationMethod::CaseClosed, &nihil).is_ok());
    let err =
      validate_process_term(DerivationMethod::MainCase, &nihil).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidDerivationForProcessTerm);
  }

  #[test]
  fn estimated_lifetime_is_only_valid_for_term() {
    let estimated = classification(PROCESS_TERM_ESTIMATED_LIFETIME);
    assert!(validate_process_term(DerivationMethod::Term, &estimated).is_ok());
    assert!(validate_process_term(DerivationMethod::CaseClosed, &estimated).is_err());
    assert!(
      validate_process_term(DerivationMethod::CaseClosed, &classification("nihil")).is_ok()
    );
  }

  #[test]
  fn empty_process_term_accepts_every_method() {
    let empty = classification("");
    for method in DerivationMethod::iter() {
      assert!(validate_process_term(method, &empty).is_ok(), "{method}");
    }
  }

  #[test]
  fn process_type_must_match_the_case_type() {
    let c = classification("");
    assert!(validate_process_type(&c, Some(&c.process_type)).is_ok());
    let err = validate_process_type(&c, Some("https://elders")).unwrap_err();
    assert_eq!(err.code, ErrorCode::ProcessTypeMismatch);
    assert!(validate_process_type(&c, None).is_err());
  }
}

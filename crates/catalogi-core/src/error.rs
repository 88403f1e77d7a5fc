//! Error types for `catalogi-core`.
//!
//! Business-rule failures come in two flavours: [`ValidationError`] (the
//! request is malformed for the current state, 400-class) and
//! [`PermissionError`] (the request is well-formed but forbidden by scope or
//! publication state, 403-class). Both travel inside [`Error`].

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  scope::Scope,
  types::{RelationField, TypeKind},
};

/// Field path used for errors that are not tied to a single attribute.
pub const NON_FIELD_ERRORS: &str = "nonFieldErrors";

// ─── Error codes ─────────────────────────────────────────────────────────────

/// Machine-readable validation error kind, rendered as a kebab-case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
  /// Temporal overlap, or a second concurrent draft of one identity.
  Overlap,
  /// Mutation of a published record without the forced scope.
  NonConceptObject,
  /// Mutation through a published parent, e.g. `non-concept-zaaktype`.
  NonConceptParent(TypeKind),
  /// Many-to-many link touching a published record.
  NonConceptRelation,
  RelationsIncorrectCatalogus,
  Required,
  Empty,
  InvalidDerivationForProcessTerm,
  ProcessTypeMismatch,
  /// The reference-data lookup failed or returned garbage.
  InvalidResource,
  Unique,
  DoesNotExist,
  Invalid,
}

impl ErrorCode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Overlap => "overlap",
      Self::NonConceptObject => "non-concept-object",
      Self::NonConceptParent(TypeKind::CaseType) => "non-concept-zaaktype",
      Self::NonConceptParent(TypeKind::DecisionType) => "non-concept-besluittype",
      Self::NonConceptParent(TypeKind::DocumentType) => {
        "non-concept-informatieobjecttype"
      }
      Self::NonConceptRelation => "non-concept-relation",
      Self::RelationsIncorrectCatalogus => "relations-incorrect-catalogus",
      Self::Required => "required",
      Self::Empty => "empty",
      Self::InvalidDerivationForProcessTerm => {
        "invalid-afleidingswijze-for-procestermijn"
      }
      Self::ProcessTypeMismatch => "procestype-mismatch",
      Self::InvalidResource => "invalid-resource",
      Self::Unique => "unique",
      Self::DoesNotExist => "does-not-exist",
      Self::Invalid => "invalid",
    }
  }
}

impl fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for ErrorCode {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

// ─── Validation error ────────────────────────────────────────────────────────

/// A single rejected attribute. `field_path` is dotted for nested records,
/// e.g. `archival_procedure.date_attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field_path}: {message} ({code})")]
pub struct ValidationError {
  pub field_path: String,
  pub code:       ErrorCode,
  pub message:    String,
}

impl ValidationError {
  pub fn new(
    field_path: impl Into<String>,
    code: ErrorCode,
    message: impl Into<String>,
  ) -> Self {
    Self {
      field_path: field_path.into(),
      code,
      message: message.into(),
    }
  }

  pub fn non_field(code: ErrorCode, message: impl Into<String>) -> Self {
    Self::new(NON_FIELD_ERRORS, code, message)
  }

  pub fn does_not_exist(field_path: impl Into<String>, id: Uuid) -> Self {
    Self::new(
      field_path,
      ErrorCode::DoesNotExist,
      format!("object {id} does not exist"),
    )
  }
}

// ─── Permission error ────────────────────────────────────────────────────────

/// An authorization-style rejection, surfaced separately from validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
  #[error("one of the scopes {0:?} is required for this action")]
  MissingScope(Vec<Scope>),

  #[error("all related resources should be published first ({field} {id} is a concept)")]
  RelatedNotPublished { field: RelationField, id: Uuid },

  #[error("{kind} {id} is already published")]
  AlreadyPublished { kind: TypeKind, id: Uuid },
}

// ─── Crate error ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("permission denied: {0}")]
  Permission(#[from] PermissionError),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(err))
  }

  /// The validation code, if this is a validation failure.
  pub fn code(&self) -> Option<ErrorCode> {
    match self {
      Self::Validation(v) => Some(v.code),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parent_codes_name_the_related_resource() {
    assert_eq!(
      ErrorCode::NonConceptParent(TypeKind::CaseType).as_str(),
      "non-concept-zaaktype"
    );
    assert_eq!(
      ErrorCode::NonConceptParent(TypeKind::DocumentType).to_string(),
      "non-concept-informatieobjecttype"
    );
  }

  #[test]
  fn validation_error_serializes_code_as_string() {
    let err = ValidationError::non_field(ErrorCode::Overlap, "clash");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["code"], "overlap");
    assert_eq!(json["field_path"], NON_FIELD_ERRORS);
  }
}

//! Authorization scopes carried by a request.
//!
//! Scopes are opaque capabilities asserted by whatever authenticates the
//! caller; this crate only tests membership.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::PermissionError;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum Scope {
  #[serde(rename = "catalogi.lezen")]
  #[strum(serialize = "catalogi.lezen")]
  Read,
  #[serde(rename = "catalogi.schrijven")]
  #[strum(serialize = "catalogi.schrijven")]
  Write,
  /// Permits updates of published records.
  #[serde(rename = "catalogi.geforceerd-schrijven")]
  #[strum(serialize = "catalogi.geforceerd-schrijven")]
  ForcedWrite,
  /// Permits deletion of published records and their links.
  #[serde(rename = "catalogi.geforceerd-verwijderen")]
  #[strum(serialize = "catalogi.geforceerd-verwijderen")]
  ForcedDelete,
}

/// The set of scopes held by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes(BTreeSet<Scope>);

impl Scopes {
  pub fn new(scopes: impl IntoIterator<Item = Scope>) -> Self {
    Self(scopes.into_iter().collect())
  }

  /// Parse a comma- or whitespace-separated list. Unknown names are ignored.
  pub fn parse(raw: &str) -> Self {
    raw
      .split(|c: char| c == ',' || c.is_whitespace())
      .filter_map(|name| name.parse::<Scope>().ok())
      .collect()
  }

  pub fn contains(&self, scope: Scope) -> bool { self.0.contains(&scope) }

  pub fn forced_write(&self) -> bool { self.contains(Scope::ForcedWrite) }

  pub fn forced_delete(&self) -> bool { self.contains(Scope::ForcedDelete) }

  /// Succeeds when at least one of `scopes` is held.
  pub fn require_any(&self, scopes: &[Scope]) -> Result<(), PermissionError> {
    if scopes.iter().any(|s| self.contains(*s)) {
      Ok(())
    } else {
      Err(PermissionError::MissingScope(scopes.to_vec()))
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
    self.0.iter().copied()
  }
}

impl FromIterator<Scope> for Scopes {
  fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

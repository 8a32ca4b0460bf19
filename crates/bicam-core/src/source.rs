//! The two upstream origins and the provenance recorded on canonical rows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which staging store a row came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  /// The legislative-metadata API (bills, actions, members, meetings, ...).
  Legislative,
  /// The document-repository API (packages, granules, published text).
  Document,
}

impl Source {
  pub const ALL: [Source; 2] = [Source::Legislative, Source::Document];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Legislative => "legislative",
      Self::Document => "document",
    }
  }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Source {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "legislative" => Ok(Self::Legislative),
      "document" => Ok(Self::Document),
      other => Err(format!("unknown source: {other:?}")),
    }
  }
}

/// Where a canonical row's existence comes from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  Legislative,
  Document,
  Both,
  /// Created by a correction; no staged row backs it.
  Backfill,
  /// Seeded reference data.
  Static,
}

impl Provenance {
  pub fn from_presence(legislative: bool, document: bool) -> Option<Self> {
    match (legislative, document) {
      (true, true) => Some(Self::Both),
      (true, false) => Some(Self::Legislative),
      (false, true) => Some(Self::Document),
      (false, false) => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Legislative => "legislative",
      Self::Document => "document",
      Self::Both => "both",
      Self::Backfill => "backfill",
      Self::Static => "static",
    }
  }
}

impl std::str::FromStr for Provenance {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "legislative" => Ok(Self::Legislative),
      "document" => Ok(Self::Document),
      "both" => Ok(Self::Both),
      "backfill" => Ok(Self::Backfill),
      "static" => Ok(Self::Static),
      other => Err(format!("unknown provenance: {other:?}")),
    }
  }
}

//! Error types for `bicam-core`.

use thiserror::Error;

use crate::store::IntegrityFailure;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown table: {0:?}")]
  UnknownTable(String),

  #[error("table {table:?} has no column {column:?}")]
  UnknownColumn { table: String, column: String },

  #[error("invalid catalog entry for {table}.{column}: {reason}")]
  InvalidRule {
    table:  String,
    column: String,
    reason: String,
  },

  #[error("invalid foreign key on {table}: {reason}")]
  InvalidForeignKey { table: String, reason: String },

  #[error("dependency cycle between tables: {}", .0.join(" -> "))]
  DependencyCycle(Vec<String>),

  #[error("cannot read {value:?} as {expected} for {table}.{column}")]
  Coerce {
    table:    String,
    column:   String,
    value:    String,
    expected: &'static str,
  },

  #[error("invalid correction for {table}: {reason}")]
  InvalidCorrection { table: String, reason: String },

  #[error("{0}")]
  Integrity(IntegrityFailure),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

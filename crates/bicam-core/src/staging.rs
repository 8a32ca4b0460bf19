//! Append-only staging logs and their latest-wins snapshots.
//!
//! Each source has its own log. Rows are never updated: a changed upstream
//! record is a new row with a later insertion time. The merge only ever reads
//! a [`Snapshot`], which keeps the latest row per (table, natural key).

use std::collections::{BTreeMap, btree_map::Entry};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{source::Source, value::Row};

/// A row as handed to the staging store. The store assigns the insertion time
/// and sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStagedRow {
  /// Staging table name (e.g. `bills`, `bill_collections`).
  pub table:       String,
  /// The source's native identifier for the record.
  pub natural_key: String,
  #[serde(default)]
  pub fields:      Row,
}

impl NewStagedRow {
  pub fn new(
    table: impl Into<String>,
    natural_key: impl Into<String>,
    fields: Row,
  ) -> Self {
    Self {
      table: table.into(),
      natural_key: natural_key.into(),
      fields,
    }
  }

  /// Hex SHA-256 over the natural key and the serialised fields. Restaging an
  /// identical record yields the same hash, which the store uses to ignore it.
  pub fn content_hash(&self) -> crate::Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(self.natural_key.as_bytes());
    hasher.update([0]);
    hasher.update(serde_json::to_vec(&self.fields)?);
    Ok(hex::encode(hasher.finalize()))
  }
}

/// A persisted staging row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRow {
  /// Store-assigned, strictly increasing within a source.
  pub sequence:    i64,
  pub source:      Source,
  pub table:       String,
  pub natural_key: String,
  pub fields:      Row,
  pub inserted_at: DateTime<Utc>,
}

impl StagedRow {
  fn is_newer_than(&self, other: &StagedRow) -> bool {
    (self.inserted_at, self.sequence) > (other.inserted_at, other.sequence)
  }
}

/// Every staged row from one source, in no particular order.
#[derive(Debug, Clone)]
pub struct StagingLog {
  source: Source,
  rows:   Vec<StagedRow>,
}

impl StagingLog {
  pub fn new(source: Source, rows: Vec<StagedRow>) -> Self {
    Self { source, rows }
  }

  pub fn source(&self) -> Source { self.source }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Reduce the log to the latest row per (table, natural key).
  pub fn snapshot(&self) -> Snapshot {
    let mut tables: BTreeMap<String, BTreeMap<String, StagedRow>> = BTreeMap::new();
    for row in self.rows.iter().filter(|r| r.source == self.source) {
      let slot = tables
        .entry(row.table.clone())
        .or_default()
        .entry(row.natural_key.clone());
      match slot {
        Entry::Vacant(v) => {
          v.insert(row.clone());
        }
        Entry::Occupied(mut o) => {
          if row.is_newer_than(o.get()) {
            o.insert(row.clone());
          }
        }
      }
    }
    Snapshot { source: self.source, tables }
  }
}

/// The latest-wins view of one source's staging log.
#[derive(Debug, Clone)]
pub struct Snapshot {
  source: Source,
  tables: BTreeMap<String, BTreeMap<String, StagedRow>>,
}

impl Snapshot {
  pub fn source(&self) -> Source { self.source }

  /// Rows of one staging table, in natural-key order.
  pub fn rows<'a>(&'a self, table: &str) -> impl Iterator<Item = &'a StagedRow> + 'a {
    self.tables.get(table).into_iter().flat_map(|rows| rows.values())
  }

  pub fn get(&self, table: &str, natural_key: &str) -> Option<&StagedRow> {
    self.tables.get(table)?.get(natural_key)
  }

  pub fn len(&self) -> usize { self.tables.values().map(BTreeMap::len).sum() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

//! The canonical row set: the full content of the canonical schema, as the
//! reconciler produces it and the store reads it back.

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

use crate::{
  source::Provenance,
  value::{Key, Row},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRow {
  pub values:     Row,
  pub provenance: Provenance,
}

/// Table name → rows by natural key. Both levels are ordered maps, so
/// iteration and [`CanonicalSet::to_json`] are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalSet {
  tables: BTreeMap<String, BTreeMap<Key, CanonicalRow>>,
}

impl CanonicalSet {
  pub fn new() -> Self { Self::default() }

  /// Make sure `table` is present even if it ends up with no rows.
  pub fn ensure_table(&mut self, table: &str) {
    self.tables.entry(table.to_owned()).or_default();
  }

  pub fn insert(&mut self, table: &str, key: Key, row: CanonicalRow) -> Option<CanonicalRow> {
    self.tables.entry(table.to_owned()).or_default().insert(key, row)
  }

  pub fn get(&self, table: &str, key: &Key) -> Option<&CanonicalRow> {
    self.tables.get(table)?.get(key)
  }

  pub fn table(&self, table: &str) -> Option<&BTreeMap<Key, CanonicalRow>> {
    self.tables.get(table)
  }

  pub fn tables(&self) -> btree_map::Iter<'_, String, BTreeMap<Key, CanonicalRow>> {
    self.tables.iter()
  }

  pub fn row_count(&self) -> usize { self.tables.values().map(BTreeMap::len).sum() }

  /// Every table as a list of `{key, provenance, values}` objects in key
  /// order. Keys are lists, so the rows cannot be a JSON object.
  pub fn to_json(&self) -> serde_json::Value {
    let tables = self
      .tables
      .iter()
      .map(|(name, rows)| {
        let rows = rows
          .iter()
          .map(|(key, row)| {
            serde_json::json!({
              "key": key,
              "provenance": row.provenance,
              "values": row.values,
            })
          })
          .collect();
        (name.clone(), serde_json::Value::Array(rows))
      })
      .collect();
    serde_json::Value::Object(tables)
  }
}

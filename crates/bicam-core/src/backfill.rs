//! Narrow corrections applied directly to the canonical schema.
//!
//! A correction names a table, a natural key, the source it speaks for and
//! the fields to override. It goes through the same precedence rules as the
//! merge, applied against the row already present, so applying a correction
//! twice leaves the schema as applying it once.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
  Error, Result,
  canonical::{CanonicalRow, CanonicalSet},
  catalog::{Catalog, TableDef, Tier},
  merge,
  source::{Provenance, Source},
  value::{Key, Row, Value},
};

/// A correction as supplied by a caller (usually read from a JSON file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
  pub table:  String,
  /// Values for every key column of `table`.
  pub key:    Row,
  pub source: Source,
  pub fields: Row,
}

impl Correction {
  /// Hex SHA-256 of the correction's JSON form. Identical corrections share
  /// an id, which keeps the correction log free of repeats.
  pub fn id(&self) -> Result<String> {
    let bytes = serde_json::to_vec(self)?;
    Ok(hex::encode(Sha256::digest(bytes)))
  }
}

/// A correction checked against the catalog, with values coerced to their
/// column types.
#[derive(Debug, Clone)]
pub struct PreparedCorrection {
  pub id:         String,
  pub table:      &'static TableDef,
  pub key:        Key,
  /// The key as canonical column → value.
  pub key_row:    Row,
  pub source:     Source,
  pub fields:     Row,
  pub correction: Correction,
}

/// Validate a correction against the catalog.
pub fn prepare(catalog: Catalog, correction: &Correction) -> Result<PreparedCorrection> {
  let table = catalog.table(&correction.table)?;
  let invalid = |reason: String| Error::InvalidCorrection {
    table: table.name.to_owned(),
    reason,
  };

  if table.tier == Tier::Reference {
    return Err(invalid("reference tables are static".into()));
  }

  let key_row = merge::coerce_canonical(table, &correction.key)?;
  for name in key_row.keys() {
    if !table.column(name).is_some_and(|c| c.is_key()) {
      return Err(invalid(format!("{name} is not a key column")));
    }
  }
  let key = table.key_of(&key_row);
  if key.has_null() {
    return Err(invalid(format!("key {key} is incomplete")));
  }

  let fields = merge::coerce_canonical(table, &correction.fields)?;
  for name in fields.keys() {
    let Some(rule) = table.column(name).and_then(|c| c.rule()) else {
      return Err(invalid(format!("{name} is a key column")));
    };
    if let Some(owner) = rule.exclusive_to()
      && owner != correction.source
    {
      return Err(invalid(format!(
        "{name} is only ever supplied by the {owner} source"
      )));
    }
  }

  Ok(PreparedCorrection {
    id: correction.id()?,
    table,
    key,
    key_row,
    source: correction.source,
    fields,
    correction: correction.clone(),
  })
}

/// The row a correction leaves behind, given the row currently stored under
/// its key. A missing row is created with [`Provenance::Backfill`].
pub fn apply(prepared: &PreparedCorrection, existing: Option<&CanonicalRow>) -> CanonicalRow {
  let table = prepared.table;
  let mut row = match existing {
    Some(existing) => existing.clone(),
    None => {
      let mut values = prepared.key_row.clone();
      for column in table.field_columns() {
        values.insert(column.name.to_owned(), Value::Null);
      }
      CanonicalRow { values, provenance: Provenance::Backfill }
    }
  };

  for (name, value) in &prepared.fields {
    let Some(rule) = table.column(name).and_then(|c| c.rule()) else {
      continue;
    };
    let current = row.values.get(name).unwrap_or(&Value::Null);
    let corrected = rule.correct(current, value, prepared.source);
    row.values.insert(name.clone(), corrected);
  }
  row
}

/// Apply corrections in order to an in-memory canonical set. Returns how many
/// rows changed.
pub fn apply_all(set: &mut CanonicalSet, prepared: &[PreparedCorrection]) -> usize {
  let mut changed = 0;
  for correction in prepared {
    let existing = set.get(correction.table.name, &correction.key);
    let updated = apply(correction, existing);
    if existing != Some(&updated) {
      set.insert(correction.table.name, correction.key.clone(), updated);
      changed += 1;
    }
  }
  changed
}

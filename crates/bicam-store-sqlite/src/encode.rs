//! Encoding and decoding helpers between BICAM types and SQLite values.
//!
//! Timestamps are stored as RFC 3339 strings, booleans as 0/1 integers,
//! staged field payloads and corrections as compact JSON. Canonical values are
//! decoded by their catalog column type, inside the connection closure, so
//! failures surface as `rusqlite` conversion errors.

use std::str::FromStr;

use bicam_core::{
  backfill::Correction,
  source::{Provenance, Source},
  staging::StagedRow,
  store::{RunKind, RunRecord, RunStatus},
  value::{ColumnType, Value},
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value as SqlValue};
use uuid::Uuid;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed width, so text order is time order.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

fn decode_tag<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownTag { kind, value: s.to_owned() })
}

pub fn decode_source(s: &str) -> Result<Source> { decode_tag("source", s) }

pub fn decode_run_kind(s: &str) -> Result<RunKind> {
  match s {
    "reconcile" => Ok(RunKind::Reconcile),
    "backfill" => Ok(RunKind::Backfill),
    other => Err(Error::UnknownTag { kind: "run kind", value: other.to_owned() }),
  }
}

pub fn decode_run_status(s: &str) -> Result<RunStatus> {
  match s {
    "succeeded" => Ok(RunStatus::Succeeded),
    "failed" => Ok(RunStatus::Failed),
    other => Err(Error::UnknownTag { kind: "run status", value: other.to_owned() }),
  }
}

// ─── Canonical values ────────────────────────────────────────────────────────

pub fn encode_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Int(n) => SqlValue::Integer(*n),
    Value::Text(s) => SqlValue::Text(s.clone()),
    Value::Timestamp(t) => SqlValue::Text(encode_dt(*t)),
  }
}

/// Decode column `idx` of a canonical row by its declared type.
pub fn decode_value(idx: usize, raw: SqlValue, ty: ColumnType) -> rusqlite::Result<Value> {
  let mismatch = |found: Type| {
    rusqlite::Error::InvalidColumnType(idx, ty.name().to_owned(), found)
  };
  match (raw, ty) {
    (SqlValue::Null, _) => Ok(Value::Null),
    (SqlValue::Integer(n), ColumnType::Bool) => Ok(Value::Bool(n != 0)),
    (SqlValue::Integer(n), ColumnType::Int) => Ok(Value::Int(n)),
    (SqlValue::Text(s), ColumnType::Timestamp) => DateTime::parse_from_rfc3339(&s)
      .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
      .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    (
      SqlValue::Text(s),
      ColumnType::Text | ColumnType::Id | ColumnType::Chamber | ColumnType::Code,
    ) => Ok(Value::Text(s)),
    (SqlValue::Integer(_), _) => Err(mismatch(Type::Integer)),
    (SqlValue::Text(_), _) => Err(mismatch(Type::Text)),
    (SqlValue::Real(_), _) => Err(mismatch(Type::Real)),
    (SqlValue::Blob(_), _) => Err(mismatch(Type::Blob)),
  }
}

pub fn decode_provenance(idx: usize, raw: SqlValue) -> rusqlite::Result<Provenance> {
  match raw {
    SqlValue::Text(s) => Provenance::from_str(&s).map_err(|e| {
      rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    }),
    other => Err(rusqlite::Error::InvalidColumnType(
      idx,
      "provenance".to_owned(),
      other.data_type(),
    )),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `staging_rows` row.
pub struct RawStagedRow {
  pub sequence:      i64,
  pub source:        String,
  pub staging_table: String,
  pub natural_key:   String,
  pub fields_json:   String,
  pub inserted_at:   String,
}

impl RawStagedRow {
  pub fn into_staged(self) -> Result<StagedRow> {
    Ok(StagedRow {
      sequence:    self.sequence,
      source:      decode_source(&self.source)?,
      table:       self.staging_table,
      natural_key: self.natural_key,
      fields:      serde_json::from_str(&self.fields_json)?,
      inserted_at: decode_dt(&self.inserted_at)?,
    })
  }
}

/// Raw strings read directly from a `reconcile_runs` row.
pub struct RawRun {
  pub run_id:       String,
  pub kind:         String,
  pub started_at:   String,
  pub finished_at:  String,
  pub status:       String,
  pub rows_written: i64,
  pub detail:       Option<String>,
}

impl RawRun {
  pub fn into_run(self) -> Result<RunRecord> {
    Ok(RunRecord {
      id:           Uuid::parse_str(&self.run_id)?,
      kind:         decode_run_kind(&self.kind)?,
      started_at:   decode_dt(&self.started_at)?,
      finished_at:  decode_dt(&self.finished_at)?,
      status:       decode_run_status(&self.status)?,
      rows_written: usize::try_from(self.rows_written).unwrap_or_default(),
      detail:       self.detail,
    })
  }
}

pub fn decode_correction(json: &str) -> Result<Correction> {
  Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn values_decode_by_column_type() {
    let at = Value::from("2021-06-01").coerce(ColumnType::Timestamp).unwrap();
    for (value, ty) in [
      (Value::Bool(true), ColumnType::Bool),
      (Value::Int(118), ColumnType::Int),
      (Value::from("house"), ColumnType::Chamber),
      (at, ColumnType::Timestamp),
      (Value::Null, ColumnType::Text),
    ] {
      let decoded = decode_value(0, encode_value(&value), ty).unwrap();
      assert_eq!(decoded, value);
    }
  }

  #[test]
  fn text_in_an_integer_column_is_rejected() {
    let err = decode_value(3, SqlValue::Text("x".into()), ColumnType::Int);
    assert!(matches!(err, Err(rusqlite::Error::InvalidColumnType(3, ..))));
  }
}

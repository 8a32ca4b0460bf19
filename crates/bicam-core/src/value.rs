//! Scalar values, rows and natural keys.
//!
//! Staged rows arrive loosely typed (everything the scrapers wrote is a JSON
//! scalar). Every canonical column declares a [`ColumnType`], and values are
//! coerced into it before any precedence rule runs, so two sources that spell
//! the same value differently still compare equal.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

/// Marker the scrapers write for "field not present in the API response".
const MISSING_SENTINEL: &str = "-99";

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single column value. The derived ordering is total and stable, which is
/// what makes `Max` and key ordering deterministic.
///
/// There is no float variant: JSON numbers with a zero fraction deserialize
/// as [`Value::Int`], any other float as its decimal text.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Text(String),
  Timestamp(DateTime<Utc>),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Return `self` unless it is null, in which case return `other`.
  pub fn or(self, other: Value) -> Value {
    if self.is_null() { other } else { self }
  }

  /// Convert into `ty`. Returns `None` when the value cannot represent that
  /// type at all; unrecognised but harmless spellings become [`Value::Null`].
  pub fn coerce(&self, ty: ColumnType) -> Option<Value> {
    if let Self::Text(s) = self {
      let trimmed = s.trim();
      if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
        return Some(Self::Null);
      }
    }

    match (ty, self) {
      (_, Self::Null) => Some(Self::Null),

      (ColumnType::Text, Self::Text(s)) => Some(Self::Text(s.trim().to_owned())),
      (ColumnType::Text, Self::Int(n)) => Some(Self::Text(n.to_string())),
      (ColumnType::Text, Self::Bool(b)) => Some(Self::Text(b.to_string())),
      (ColumnType::Text, Self::Timestamp(t)) => Some(Self::Text(t.to_rfc3339())),

      (ColumnType::Id, Self::Text(s)) => {
        Some(Self::Text(s.trim().to_ascii_lowercase()))
      }
      (ColumnType::Id, Self::Int(n)) => Some(Self::Text(n.to_string())),
      (ColumnType::Id, _) => None,

      (ColumnType::Int, Self::Int(n)) => Some(Self::Int(*n)),
      (ColumnType::Int, Self::Bool(b)) => Some(Self::Int(i64::from(*b))),
      (ColumnType::Int, Self::Text(s)) => parse_int(s.trim()).map(Self::Int),
      (ColumnType::Int, Self::Timestamp(_)) => None,

      (ColumnType::Bool, Self::Bool(b)) => Some(Self::Bool(*b)),
      (ColumnType::Bool, Self::Int(n)) => Some(match n {
        0 => Self::Bool(false),
        1 => Self::Bool(true),
        _ => Self::Null,
      }),
      (ColumnType::Bool, Self::Text(s)) => {
        Some(match s.trim().to_ascii_lowercase().as_str() {
          "true" | "t" | "yes" | "y" | "1" => Self::Bool(true),
          "false" | "f" | "no" | "n" | "0" => Self::Bool(false),
          _ => Self::Null,
        })
      }
      (ColumnType::Bool, Self::Timestamp(_)) => None,

      (ColumnType::Timestamp, Self::Timestamp(t)) => Some(Self::Timestamp(*t)),
      (ColumnType::Timestamp, Self::Text(s)) => {
        parse_timestamp(s.trim()).map(Self::Timestamp)
      }
      (ColumnType::Timestamp, _) => None,

      (ColumnType::Chamber, Self::Text(s)) => Some(normalize_chamber(s)),
      (ColumnType::Chamber, _) => None,

      (ColumnType::Code, Self::Text(s)) => {
        Some(Self::Text(s.trim().to_ascii_uppercase()))
      }
      (ColumnType::Code, Self::Int(n)) => Some(Self::Text(n.to_string())),
      (ColumnType::Code, _) => None,
    }
  }
}

impl<'de> Deserialize<'de> for Value {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    Ok(match serde_json::Value::deserialize(d)? {
      serde_json::Value::Null => Self::Null,
      serde_json::Value::Bool(b) => Self::Bool(b),
      serde_json::Value::Number(n) => n
        .as_i64()
        .or_else(|| n.as_f64().and_then(integral))
        .map_or_else(|| Self::Text(n.to_string()), Self::Int),
      serde_json::Value::String(s) => Self::Text(s),
      other => {
        return Err(de::Error::custom(format!("expected a scalar, got {other}")));
      }
    })
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("NULL"),
      Self::Bool(b) => write!(f, "{b}"),
      Self::Int(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
      Self::Timestamp(t) => f.write_str(&t.to_rfc3339()),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self { Self::Int(n) }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<DateTime<Utc>> for Value {
  fn from(t: DateTime<Utc>) -> Self { Self::Timestamp(t) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

/// `f` as an `i64` when it is finite, has no fractional part and fits.
fn integral(f: f64) -> Option<i64> {
  // 2^63 is exactly representable; anything at or above it overflows.
  const LIMIT: f64 = 9_223_372_036_854_775_808.0;
  (f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f))
    .then_some(f as i64)
}

/// Integers as the scrapers spell them: plain (`-5`), with a zero fraction
/// (`118.0`), or as an ordinal (`118th`). Anything else is unparseable.
fn parse_int(s: &str) -> Option<i64> {
  if let Ok(n) = s.parse::<i64>() {
    return Some(n);
  }
  if let Some(n) = s.parse::<f64>().ok().and_then(integral) {
    return Some(n);
  }
  let lower = s.to_ascii_lowercase();
  let digits = ["st", "nd", "rd", "th"]
    .iter()
    .find_map(|suffix| lower.strip_suffix(suffix))?;
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  digits.parse().ok()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

fn normalize_chamber(s: &str) -> Value {
  match s.trim().to_ascii_lowercase().as_str() {
    "house" | "house of representatives" | "h" => Value::Text("house".into()),
    "senate" | "s" => Value::Text("senate".into()),
    "joint" | "j" => Value::Text("joint".into()),
    _ => Value::Null,
  }
}

// ─── Column types ────────────────────────────────────────────────────────────

/// Declared type of a canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Text,
  /// Entity identifier (`hr1-118`). Trimmed and lower-cased so that ids
  /// spelled by either source, or derived from a package id, compare equal.
  Id,
  Int,
  Bool,
  Timestamp,
  /// Lower-case `house` / `senate` / `joint`; anything else is null.
  Chamber,
  /// Upper-case categorical code (bill version codes and the like).
  Code,
}

impl ColumnType {
  pub fn name(self) -> &'static str {
    match self {
      Self::Text => "text",
      Self::Id => "identifier",
      Self::Int => "integer",
      Self::Bool => "boolean",
      Self::Timestamp => "timestamp",
      Self::Chamber => "chamber",
      Self::Code => "code",
    }
  }

  /// Whether `Max` has a meaningful ordering for this type.
  pub fn is_ordered(self) -> bool {
    matches!(self, Self::Int | Self::Timestamp)
  }
}

// ─── Rows and keys ───────────────────────────────────────────────────────────

/// A row as a column-name → value map. `BTreeMap` keeps iteration order, and
/// therefore serialised output, stable.
pub type Row = BTreeMap<String, Value>;

/// Build a row from literal pairs.
pub fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
  pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

/// A canonical natural key: the values of a table's key columns, in
/// declaration order.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Key(pub Vec<Value>);

impl Key {
  pub fn single(v: impl Into<Value>) -> Self { Self(vec![v.into()]) }

  pub fn has_null(&self) -> bool { self.0.iter().any(Value::is_null) }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, v) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("|")?;
      }
      write!(f, "{v}")?;
    }
    Ok(())
  }
}

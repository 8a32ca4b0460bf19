//! Field-level precedence rules.
//!
//! Every non-key canonical column carries exactly one [`Precedence`]. The same
//! rule is used in three places: merging the two sources, collapsing several
//! staged rows from one source onto the same canonical key, and combining a
//! backfill correction with the row already in the canonical schema.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{source::Source, value::Value};

/// Separator used when a `Union` rule joins text values.
pub const UNION_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
  /// Only the legislative source may supply this field.
  Legislative,
  /// Only the document source may supply this field.
  Document,
  /// Legislative value if non-null, otherwise the document value.
  PreferLegislative,
  /// Document value if non-null, otherwise the legislative value.
  PreferDocument,
  /// Greatest non-null value (last-modified timestamps).
  Max,
  /// Set union: text is split on [`UNION_SEPARATOR`] and rejoined sorted,
  /// integers take the larger count, booleans are OR-ed.
  Union,
}

impl Precedence {
  pub fn name(self) -> &'static str {
    match self {
      Self::Legislative => "legislative",
      Self::Document => "document",
      Self::PreferLegislative => "prefer_legislative",
      Self::PreferDocument => "prefer_document",
      Self::Max => "max",
      Self::Union => "union",
    }
  }

  /// The one source allowed to write this field, for strict rules.
  pub fn exclusive_to(self) -> Option<Source> {
    match self {
      Self::Legislative => Some(Source::Legislative),
      Self::Document => Some(Source::Document),
      _ => None,
    }
  }

  /// The source whose non-null value wins a disagreement, if the rule names
  /// one.
  pub fn preferred(self) -> Option<Source> {
    match self {
      Self::Legislative | Self::PreferLegislative => Some(Source::Legislative),
      Self::Document | Self::PreferDocument => Some(Source::Document),
      Self::Max | Self::Union => None,
    }
  }

  /// Resolve one field from the two sources' (already coerced) values.
  pub fn merge(self, legislative: &Value, document: &Value) -> Value {
    match self {
      Self::Legislative => legislative.clone(),
      Self::Document => document.clone(),
      Self::PreferLegislative => legislative.clone().or(document.clone()),
      Self::PreferDocument => document.clone().or(legislative.clone()),
      Self::Max => max(legislative, document),
      Self::Union => union(legislative, document),
    }
  }

  /// Fold two staged rows from the same source that resolve to the same
  /// canonical key. `later` comes after `earlier` in staging-key order.
  pub fn collapse(self, earlier: &Value, later: &Value) -> Value {
    match self {
      Self::Max => max(earlier, later),
      Self::Union => union(earlier, later),
      _ => later.clone().or(earlier.clone()),
    }
  }

  /// Combine a correction value supplied on behalf of `source` with the value
  /// already in the canonical row. Callers reject strict rules owned by the
  /// other source before getting here.
  ///
  /// A null correction never erases an existing value, so applying the same
  /// correction twice is the same as applying it once.
  pub fn correct(self, existing: &Value, value: &Value, source: Source) -> Value {
    match self {
      Self::Max => max(existing, value),
      Self::Union => union(existing, value),
      rule if rule.preferred() == Some(source) => {
        value.clone().or(existing.clone())
      }
      _ => existing.clone().or(value.clone()),
    }
  }
}

fn max(a: &Value, b: &Value) -> Value {
  match (a.is_null(), b.is_null()) {
    (true, _) => b.clone(),
    (_, true) => a.clone(),
    _ => a.max(b).clone(),
  }
}

fn union(a: &Value, b: &Value) -> Value {
  match (a, b) {
    (Value::Null, Value::Null) => Value::Null,
    (Value::Bool(x), Value::Bool(y)) => Value::Bool(*x || *y),
    (Value::Bool(_), Value::Null) | (Value::Null, Value::Bool(_)) => {
      a.clone().or(b.clone())
    }
    (Value::Text(_), _) | (_, Value::Text(_)) => {
      let parts: BTreeSet<&str> = [a, b]
        .into_iter()
        .filter_map(Value::as_text)
        .flat_map(|s| s.split(UNION_SEPARATOR.trim()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
      if parts.is_empty() {
        Value::Null
      } else {
        Value::Text(parts.into_iter().collect::<Vec<_>>().join(UNION_SEPARATOR))
      }
    }
    _ => max(a, b),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn t(s: &str) -> Value { Value::from(s) }

  #[test]
  fn prefer_document_falls_back_to_legislative() {
    let rule = Precedence::PreferDocument;
    assert_eq!(rule.merge(&t("x"), &Value::Null), t("x"));
    assert_eq!(rule.merge(&t("x"), &t("y")), t("y"));
    assert_eq!(rule.merge(&Value::Null, &Value::Null), Value::Null);
  }

  #[test]
  fn strict_rules_ignore_the_other_source() {
    assert_eq!(Precedence::Legislative.merge(&Value::Null, &t("y")), Value::Null);
    assert_eq!(Precedence::Document.merge(&t("x"), &t("y")), t("y"));
  }

  #[test]
  fn max_picks_latest_timestamp() {
    let a = t("2020-01-01").coerce(crate::value::ColumnType::Timestamp).unwrap();
    let b = t("2021-06-01").coerce(crate::value::ColumnType::Timestamp).unwrap();
    assert_eq!(Precedence::Max.merge(&a, &b), b);
    assert_eq!(Precedence::Max.merge(&b, &a), b);
    assert_eq!(Precedence::Max.merge(&a, &Value::Null), a);
  }

  #[test]
  fn union_of_text_is_sorted_and_deduplicated() {
    let merged = Precedence::Union.merge(&t("Taxation; Health"), &t("Health; Energy"));
    assert_eq!(merged, t("Energy; Health; Taxation"));
  }

  #[test]
  fn union_of_counts_keeps_the_larger() {
    let merged = Precedence::Union.merge(&Value::Int(3), &Value::Int(5));
    assert_eq!(merged, Value::Int(5));
  }

  #[test]
  fn collapse_lets_later_non_null_win() {
    let rule = Precedence::PreferLegislative;
    assert_eq!(rule.collapse(&t("old"), &t("new")), t("new"));
    assert_eq!(rule.collapse(&t("old"), &Value::Null), t("old"));
  }

  #[test]
  fn correction_is_idempotent() {
    for rule in [
      Precedence::PreferLegislative,
      Precedence::PreferDocument,
      Precedence::Legislative,
      Precedence::Max,
      Precedence::Union,
    ] {
      let once = rule.correct(&t("a"), &t("b"), Source::Legislative);
      let twice = rule.correct(&once, &t("b"), Source::Legislative);
      assert_eq!(once, twice, "{} is not idempotent", rule.name());
    }
  }

  #[test]
  fn correction_respects_preferred_source() {
    let rule = Precedence::PreferDocument;
    assert_eq!(rule.correct(&t("kept"), &t("ignored"), Source::Legislative), t("kept"));
    assert_eq!(rule.correct(&Value::Null, &t("filled"), Source::Legislative), t("filled"));
    assert_eq!(rule.correct(&t("old"), &t("new"), Source::Document), t("new"));
  }
}

//! The generic merge. Every table goes through the same three steps, driven
//! entirely by its catalog entry:
//!
//! 1. [`project`] a staged row onto the canonical columns its source supplies,
//!    coercing each value to the column's declared type;
//! 2. [`collapse`] the projected rows one source produced for the same
//!    canonical key;
//! 3. [`merge`] the two sources' rows field by field.

use crate::{
  Error, Result,
  catalog::{ColumnDef, TableDef},
  source::Source,
  value::{Key, Row, Value},
};

/// The canonical fields `source` supplies for `table`, read out of a staged
/// row. Columns the source does not map are absent from the result; columns
/// it maps but the row lacks are null unless the column declares a
/// derivation that recognises the row.
pub fn project(table: &TableDef, source: Source, staged: &Row) -> Result<Row> {
  let mut out = Row::new();
  for column in table.field_columns() {
    let Some(staged_name) = column.source_column(source) else {
      continue;
    };
    let raw = staged.get(staged_name).unwrap_or(&Value::Null);
    let mut value = coerce(table, column, raw)?;
    if value.is_null()
      && let Some(derived) = column.derived.and_then(|d| d.apply(staged))
    {
      value = coerce(table, column, &derived)?;
    }
    out.insert(column.name.to_owned(), value);
  }
  Ok(out)
}

fn coerce(table: &TableDef, column: &ColumnDef, raw: &Value) -> Result<Value> {
  raw.coerce(column.ty).ok_or_else(|| Error::Coerce {
    table:    table.name.to_owned(),
    column:   column.name.to_owned(),
    value:    raw.to_string(),
    expected: column.ty.name(),
  })
}

/// Coerce a row already expressed in canonical column names (seed rows and
/// correction payloads).
pub fn coerce_canonical(table: &TableDef, row: &Row) -> Result<Row> {
  let mut out = Row::new();
  for (name, raw) in row {
    let column = table.column(name).ok_or_else(|| Error::UnknownColumn {
      table:  table.name.to_owned(),
      column: name.clone(),
    })?;
    out.insert(name.clone(), coerce(table, column, raw)?);
  }
  Ok(out)
}

/// Fold rows from one source that resolve to the same canonical key. `rows`
/// must be in staging natural-key order; each field folds with its rule's
/// collapse, so later non-null values win except under `Max` and `Union`.
///
/// For package-derived keys the staging natural key is the package id, so
/// the fold order is lexical, not the order the document stages were
/// published: `BILLS-118hr1ih` sorts after `BILLS-118hr1enr` and its
/// non-null fields win.
pub fn collapse(table: &TableDef, rows: impl IntoIterator<Item = Row>) -> Option<Row> {
  let mut rows = rows.into_iter();
  let mut acc = rows.next()?;
  for row in rows {
    for column in table.field_columns() {
      let Some(rule) = column.rule() else { continue };
      let Some(later) = row.get(column.name) else { continue };
      let earlier = acc.get(column.name).unwrap_or(&Value::Null);
      let folded = rule.collapse(earlier, later);
      acc.insert(column.name.to_owned(), folded);
    }
  }
  Some(acc)
}

/// Build the canonical row for `key` from each source's collapsed row.
pub fn merge(
  table: &TableDef,
  key: &Key,
  legislative: Option<&Row>,
  document: Option<&Row>,
) -> Row {
  let mut out = Row::new();
  for (column, value) in table.key_columns().zip(&key.0) {
    out.insert(column.name.to_owned(), value.clone());
  }
  for column in table.field_columns() {
    let Some(rule) = column.rule() else { continue };
    let l = legislative.and_then(|r| r.get(column.name)).unwrap_or(&Value::Null);
    let d = document.and_then(|r| r.get(column.name)).unwrap_or(&Value::Null);
    out.insert(column.name.to_owned(), rule.merge(l, d));
  }
  out
}

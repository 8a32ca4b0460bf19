//! SQL schema for the BICAM SQLite store.
//!
//! Staging, bridge, correction and run tables are fixed DDL. Canonical tables
//! are generated from the catalog: composite primary keys on the natural key,
//! and every foreign key `DEFERRABLE INITIALLY DEFERRED` so the write order
//! only matters for readability and the check happens once at commit.

use std::fmt::Write as _;

use bicam_core::{
  catalog::{Catalog, TableDef},
  value::ColumnType,
};

/// Fixed DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Staged rows are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
-- A row is skipped only when it matches the latest version of its key, so
-- the same content may appear again after a different version (A, B, A).
CREATE TABLE IF NOT EXISTS staging_rows (
    sequence      INTEGER PRIMARY KEY AUTOINCREMENT,
    source        TEXT NOT NULL,   -- 'legislative' | 'document'
    staging_table TEXT NOT NULL,
    natural_key   TEXT NOT NULL,
    content_hash  TEXT NOT NULL,   -- hex sha256 of natural key + fields
    fields_json   TEXT NOT NULL,
    inserted_at   TEXT NOT NULL    -- RFC 3339 UTC; store-assigned
);

CREATE INDEX IF NOT EXISTS staging_rows_key_idx
    ON staging_rows(source, staging_table, natural_key);

-- Scraped package/granule -> entity associations.
CREATE TABLE IF NOT EXISTS staging_bridges (
    package_id  TEXT NOT NULL,
    granule_id  TEXT NOT NULL,
    entity_key  TEXT NOT NULL,
    inserted_at TEXT NOT NULL,
    PRIMARY KEY (package_id, granule_id, entity_key)
);

-- Every correction ever applied, re-applied after each reconciliation.
CREATE TABLE IF NOT EXISTS corrections (
    sequence        INTEGER PRIMARY KEY AUTOINCREMENT,
    correction_id   TEXT NOT NULL UNIQUE,
    correction_json TEXT NOT NULL,
    applied_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reconcile_runs (
    run_id       TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,    -- 'reconcile' | 'backfill'
    started_at   TEXT NOT NULL,
    finished_at  TEXT NOT NULL,
    status       TEXT NOT NULL,    -- 'succeeded' | 'failed'
    rows_written INTEGER NOT NULL,
    detail       TEXT
);

PRAGMA user_version = 1;
";

/// Name of the provenance column appended to every canonical table.
pub const PROVENANCE: &str = "provenance";

pub fn quote(ident: &str) -> String { format!("\"{}\"", ident.replace('"', "\"\"")) }

fn sql_type(ty: ColumnType) -> &'static str {
  match ty {
    ColumnType::Int | ColumnType::Bool => "INTEGER",
    ColumnType::Text
    | ColumnType::Id
    | ColumnType::Timestamp
    | ColumnType::Chamber
    | ColumnType::Code => "TEXT",
  }
}

fn column_list(table: &TableDef) -> String {
  table
    .columns
    .iter()
    .map(|c| quote(c.name))
    .chain([quote(PROVENANCE)])
    .collect::<Vec<_>>()
    .join(", ")
}

fn key_list(table: &TableDef) -> String {
  table.key_columns().map(|c| quote(c.name)).collect::<Vec<_>>().join(", ")
}

/// `CREATE TABLE` statements for every canonical table.
pub fn canonical_ddl(catalog: Catalog) -> String {
  let mut ddl = String::new();
  for table in catalog.tables() {
    let _ = writeln!(ddl, "CREATE TABLE IF NOT EXISTS {} (", quote(table.name));
    for column in table.columns {
      let not_null = if column.is_key() { " NOT NULL" } else { "" };
      let _ = writeln!(ddl, "    {} {}{not_null},", quote(column.name), sql_type(column.ty));
    }
    let _ = write!(ddl, "    {} TEXT NOT NULL,\n    PRIMARY KEY ({})", quote(PROVENANCE), key_list(table));

    for fk in table.foreign_keys {
      let Ok(target) = catalog.table(fk.references) else { continue };
      let columns = fk.columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
      let _ = write!(
        ddl,
        ",\n    FOREIGN KEY ({columns}) REFERENCES {} ({}) DEFERRABLE INITIALLY DEFERRED",
        quote(target.name),
        key_list(target)
      );
    }
    ddl.push_str("\n);\n\n");
  }
  ddl
}

pub fn select_all(table: &TableDef) -> String {
  format!(
    "SELECT {} FROM {} ORDER BY {}",
    column_list(table),
    quote(table.name),
    key_list(table)
  )
}

pub fn select_by_key(table: &TableDef) -> String {
  let predicate = table
    .key_columns()
    .enumerate()
    .map(|(i, c)| format!("{} = ?{}", quote(c.name), i + 1))
    .collect::<Vec<_>>()
    .join(" AND ");
  format!("SELECT {} FROM {} WHERE {predicate}", column_list(table), quote(table.name))
}

pub fn select_by_rowid(table: &TableDef) -> String {
  format!("SELECT {} FROM {} WHERE rowid = ?1", column_list(table), quote(table.name))
}

fn placeholders(table: &TableDef) -> String {
  (1..=table.columns.len() + 1)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

pub fn insert(table: &TableDef) -> String {
  format!(
    "INSERT INTO {} ({}) VALUES ({})",
    quote(table.name),
    column_list(table),
    placeholders(table)
  )
}

/// Insert, or overwrite every non-key column of the row with the same key.
pub fn upsert(table: &TableDef) -> String {
  let updates = table
    .field_columns()
    .map(|c| c.name)
    .chain([PROVENANCE])
    .map(|name| format!("{0} = excluded.{0}", quote(name)))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "{} ON CONFLICT ({}) DO UPDATE SET {updates}",
    insert(table),
    key_list(table)
  )
}

pub fn delete_all(table: &TableDef) -> String { format!("DELETE FROM {}", quote(table.name)) }

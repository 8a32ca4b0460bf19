//! The SQLite implementation of [`BicamStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value as SqlValue};
use tracing::{debug, warn};

use bicam_core::{
  backfill::{self, Correction, PreparedCorrection},
  canonical::{CanonicalRow, CanonicalSet},
  catalog::{Catalog, TableDef},
  resolve::BridgeLink,
  source::Source,
  staging::{NewStagedRow, StagingLog},
  store::{
    BicamStore, IntegrityFailure, RunRecord, StageSummary, Violation, WriteOutcome,
    WriteSummary,
  },
  value::{Key, Row, Value},
};

use crate::{
  encode::{
    RawRun, RawStagedRow, decode_correction, decode_provenance, decode_value, encode_dt,
    encode_value,
  },
  schema::{self, SCHEMA},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A BICAM store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  catalog: Catalog,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with the BICAM catalog.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_catalog(path, Catalog::bicam()).await
  }

  pub async fn open_with_catalog(path: impl AsRef<Path>, catalog: Catalog) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, catalog };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, catalog: Catalog::bicam() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self.catalog.validate()?;
    let canonical = schema::canonical_ddl(self.catalog);
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(&canonical)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Column values in `table.columns` order, provenance last.
fn encode_row(table: &TableDef, row: &CanonicalRow) -> Vec<SqlValue> {
  table
    .columns
    .iter()
    .map(|c| row.values.get(c.name).map_or(SqlValue::Null, encode_value))
    .chain([SqlValue::Text(row.provenance.as_str().to_owned())])
    .collect()
}

fn decode_row(table: &TableDef, r: &rusqlite::Row<'_>) -> rusqlite::Result<CanonicalRow> {
  let mut values = Row::new();
  for (idx, column) in table.columns.iter().enumerate() {
    values.insert(column.name.to_owned(), decode_value(idx, r.get(idx)?, column.ty)?);
  }
  let last = table.columns.len();
  let provenance = decode_provenance(last, r.get(last)?)?;
  Ok(CanonicalRow { values, provenance })
}

/// Every outstanding foreign-key violation, with the offending row.
///
/// Runs inside the writing transaction, before commit. Deferred constraints
/// are only enforced at commit, so this is where failures get their detail.
fn foreign_key_violations(
  conn: &rusqlite::Connection,
  catalog: Catalog,
) -> rusqlite::Result<Vec<Violation>> {
  let failures = conn
    .prepare("PRAGMA foreign_key_check")?
    .query_map([], |r| {
      Ok((
        r.get::<_, String>(0)?,
        r.get::<_, Option<i64>>(1)?,
        r.get::<_, String>(2)?,
        r.get::<_, i64>(3)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut violations = Vec::with_capacity(failures.len());
  for (table_name, rowid, referenced_table, fk_id) in failures {
    let Ok(table) = catalog.table(&table_name) else {
      continue;
    };

    let columns = conn
      .prepare(
        "SELECT \"from\" FROM pragma_foreign_key_list(?1) WHERE id = ?2 ORDER BY seq",
      )?
      .query_map(rusqlite::params![table_name, fk_id], |r| r.get::<_, String>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let row = match rowid {
      Some(rowid) => conn
        .query_row(&schema::select_by_rowid(table), [rowid], |r| decode_row(table, r))
        .optional()?
        .map(|r| r.values)
        .unwrap_or_default(),
      None => Row::new(),
    };
    let missing = Key(
      columns.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Null)).collect(),
    );

    violations.push(Violation {
      table: table_name,
      row,
      columns,
      referenced_table,
      missing,
    });
  }
  Ok(violations)
}

/// Commit `tx` if the foreign keys hold, otherwise roll it back.
fn finish(
  tx: rusqlite::Transaction<'_>,
  catalog: Catalog,
  summary: WriteSummary,
) -> rusqlite::Result<WriteOutcome> {
  let violations = foreign_key_violations(&tx, catalog)?;
  if violations.is_empty() {
    tx.commit()?;
    Ok(WriteOutcome::Committed(summary))
  } else {
    tx.rollback()?;
    Ok(WriteOutcome::Rejected(IntegrityFailure { violations }))
  }
}

// ─── BicamStore impl ─────────────────────────────────────────────────────────

impl BicamStore for SqliteStore {
  type Error = Error;

  fn catalog(&self) -> Catalog { self.catalog }

  // ── Staging ───────────────────────────────────────────────────────────────

  async fn stage(&self, source: Source, rows: Vec<NewStagedRow>) -> Result<StageSummary> {
    let source_str = source.as_str();
    let inserted_at = encode_dt(Utc::now());
    let encoded = rows
      .iter()
      .map(|r| -> Result<_> {
        Ok((
          r.table.clone(),
          r.natural_key.clone(),
          r.content_hash()?,
          serde_json::to_string(&r.fields)?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut summary = StageSummary::default();
        {
          let mut latest = tx.prepare(
            "SELECT content_hash FROM staging_rows
             WHERE source = ?1 AND staging_table = ?2 AND natural_key = ?3
             ORDER BY inserted_at DESC, sequence DESC
             LIMIT 1",
          )?;
          let mut insert = tx.prepare(
            "INSERT INTO staging_rows
             (source, staging_table, natural_key, content_hash, fields_json, inserted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;

          for (table, natural_key, hash, fields_json) in &encoded {
            let current: Option<String> = latest
              .query_row(rusqlite::params![source_str, table, natural_key], |r| r.get(0))
              .optional()?;
            if current.as_deref() == Some(hash.as_str()) {
              summary.ignored += 1;
              continue;
            }
            summary.inserted += insert.execute(rusqlite::params![
              source_str,
              table,
              natural_key,
              hash,
              fields_json,
              inserted_at
            ])?;
          }
        }
        tx.commit()?;
        Ok(summary)
      })
      .await?;

    debug!(
      source = source_str,
      inserted = summary.inserted,
      ignored = summary.ignored,
      "staged rows"
    );
    Ok(summary)
  }

  async fn record_bridges(&self, links: Vec<BridgeLink>) -> Result<usize> {
    let inserted_at = encode_dt(Utc::now());
    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut added = 0;
        {
          let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO staging_bridges
             (package_id, granule_id, entity_key, inserted_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for link in &links {
            added += insert.execute(rusqlite::params![
              link.package_id,
              link.granule_id,
              link.entity_key,
              inserted_at
            ])?;
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;
    Ok(added)
  }

  async fn staging_log(&self, source: Source) -> Result<StagingLog> {
    let source_str = source.as_str();
    let raws: Vec<RawStagedRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT sequence, source, staging_table, natural_key, fields_json, inserted_at
           FROM staging_rows
           WHERE source = ?1
           ORDER BY sequence",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![source_str], |r| {
            Ok(RawStagedRow {
              sequence:      r.get(0)?,
              source:        r.get(1)?,
              staging_table: r.get(2)?,
              natural_key:   r.get(3)?,
              fields_json:   r.get(4)?,
              inserted_at:   r.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let rows = raws
      .into_iter()
      .map(RawStagedRow::into_staged)
      .collect::<Result<Vec<_>>>()?;
    Ok(StagingLog::new(source, rows))
  }

  async fn bridge_links(&self) -> Result<Vec<BridgeLink>> {
    let links = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT package_id, granule_id, entity_key FROM staging_bridges
           ORDER BY package_id, granule_id, entity_key",
        )?;
        let links = stmt
          .query_map([], |r| {
            Ok(BridgeLink {
              package_id: r.get(0)?,
              granule_id: r.get(1)?,
              entity_key: r.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
      })
      .await?;
    Ok(links)
  }

  // ── Canonical schema ──────────────────────────────────────────────────────

  async fn replace_canonical(&self, set: CanonicalSet) -> Result<WriteOutcome> {
    let catalog = self.catalog;
    if let Some((name, _)) = set.tables().find(|(name, _)| catalog.table(name).is_err()) {
      return Err(bicam_core::Error::UnknownTable(name.clone()).into());
    }

    let batches: Vec<(&'static TableDef, Vec<Vec<SqlValue>>)> = catalog
      .write_order()?
      .into_iter()
      .map(|table| {
        let rows = set
          .table(table.name)
          .map(|rows| rows.values().map(|r| encode_row(table, r)).collect())
          .unwrap_or_default();
        (table, rows)
      })
      .collect();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (table, _) in batches.iter().rev() {
          tx.execute(&schema::delete_all(table), [])?;
        }

        let mut rows_written = 0;
        for (table, rows) in &batches {
          let mut insert = tx.prepare(&schema::insert(table))?;
          for row in rows {
            rows_written += insert.execute(params_from_iter(row.iter()))?;
          }
        }

        Ok(finish(tx, catalog, WriteSummary { rows_written, corrections: 0 })?)
      })
      .await?;

    if let WriteOutcome::Rejected(failure) = &outcome {
      warn!(violations = failure.violations.len(), "canonical write rolled back");
    }
    Ok(outcome)
  }

  async fn read_canonical(&self) -> Result<CanonicalSet> {
    let catalog = self.catalog;
    let set = self
      .conn
      .call(move |conn| {
        let mut set = CanonicalSet::new();
        for table in catalog.tables() {
          set.ensure_table(table.name);
          let mut stmt = conn.prepare(&schema::select_all(table))?;
          let rows = stmt
            .query_map([], |r| decode_row(table, r))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          for row in rows {
            set.insert(table.name, table.key_of(&row.values), row);
          }
        }
        Ok(set)
      })
      .await?;
    Ok(set)
  }

  // ── Backfill ──────────────────────────────────────────────────────────────

  async fn corrections(&self) -> Result<Vec<Correction>> {
    let jsons: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT correction_json FROM corrections ORDER BY sequence")?;
        let jsons = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(jsons)
      })
      .await?;

    jsons.iter().map(|j| decode_correction(j)).collect()
  }

  async fn apply_backfill(&self, corrections: Vec<PreparedCorrection>) -> Result<WriteOutcome> {
    let catalog = self.catalog;
    let applied_at = encode_dt(Utc::now());
    let jsons = corrections
      .iter()
      .map(|c| serde_json::to_string(&c.correction))
      .collect::<serde_json::Result<Vec<_>>>()?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut summary = WriteSummary::default();

        for (correction, json) in corrections.iter().zip(&jsons) {
          let table = correction.table;
          let key: Vec<SqlValue> = correction.key.0.iter().map(encode_value).collect();
          let existing = tx
            .query_row(&schema::select_by_key(table), params_from_iter(key.iter()), |r| {
              decode_row(table, r)
            })
            .optional()?;

          let updated = backfill::apply(correction, existing.as_ref());
          if existing.as_ref() != Some(&updated) {
            summary.rows_written += tx.execute(
              &schema::upsert(table),
              params_from_iter(encode_row(table, &updated)),
            )?;
          }

          summary.corrections += tx.execute(
            "INSERT OR IGNORE INTO corrections (correction_id, correction_json, applied_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![correction.id, json, applied_at],
          )?;
        }

        Ok(finish(tx, catalog, summary)?)
      })
      .await?;
    Ok(outcome)
  }

  // ── Runs ──────────────────────────────────────────────────────────────────

  async fn record_run(&self, run: RunRecord) -> Result<()> {
    let rows_written = i64::try_from(run.rows_written).unwrap_or(i64::MAX);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO reconcile_runs
           (run_id, kind, started_at, finished_at, status, rows_written, detail)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            run.id.to_string(),
            run.kind.as_str(),
            encode_dt(run.started_at),
            encode_dt(run.finished_at),
            run.status.as_str(),
            rows_written,
            run.detail,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let raws: Vec<RawRun> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT run_id, kind, started_at, finished_at, status, rows_written, detail
           FROM reconcile_runs
           ORDER BY started_at DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |r| {
            Ok(RawRun {
              run_id:       r.get(0)?,
              kind:         r.get(1)?,
              started_at:   r.get(2)?,
              finished_at:  r.get(3)?,
              status:       r.get(4)?,
              rows_written: r.get(5)?,
              detail:       r.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRun::into_run).collect()
  }
}

//! The `BicamStore` trait and the types it exchanges.
//!
//! The trait is implemented by storage backends (e.g. `bicam-store-sqlite`).
//! The pipeline and the `bicam` binary depend on this abstraction, not on a
//! concrete backend.

use std::{fmt, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  backfill::{Correction, PreparedCorrection},
  canonical::CanonicalSet,
  catalog::Catalog,
  resolve::BridgeLink,
  source::Source,
  staging::{NewStagedRow, StagingLog},
  value::{Key, Row},
};

// ─── Write results ───────────────────────────────────────────────────────────

/// One row that references a key the referenced table does not contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
  /// The referencing table.
  pub table:            String,
  /// The referencing row.
  pub row:              Row,
  /// The referencing columns.
  pub columns:          Vec<String>,
  pub referenced_table: String,
  /// The key that was not found.
  pub missing:          Key,
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}({}) = {} references missing {}",
      self.table,
      self.columns.join(", "),
      self.missing,
      self.referenced_table
    )
  }
}

/// Deferred foreign-key checks failed; nothing was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityFailure {
  pub violations: Vec<Violation>,
}

impl fmt::Display for IntegrityFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    const SHOWN: usize = 5;
    write!(f, "{} foreign key violation(s)", self.violations.len())?;
    for v in self.violations.iter().take(SHOWN) {
      write!(f, "; {v}")?;
    }
    if self.violations.len() > SHOWN {
      write!(f, "; ...")?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
  pub rows_written: usize,
  /// Newly logged corrections (backfill writes only).
  pub corrections:  usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
  Committed(WriteSummary),
  /// The transaction was rolled back.
  Rejected(IntegrityFailure),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageSummary {
  pub inserted: usize,
  /// Rows identical to one already staged.
  pub ignored:  usize,
}

// ─── Run bookkeeping ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
  Reconcile,
  Backfill,
}

impl RunKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Reconcile => "reconcile",
      Self::Backfill => "backfill",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Succeeded,
  Failed,
}

impl RunStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Succeeded => "succeeded",
      Self::Failed => "failed",
    }
  }
}

/// One reconciliation or backfill attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
  pub id:           Uuid,
  pub kind:         RunKind,
  pub started_at:   DateTime<Utc>,
  pub finished_at:  DateTime<Utc>,
  pub status:       RunStatus,
  pub rows_written: usize,
  /// Failure detail, or a short summary on success.
  pub detail:       Option<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a BICAM storage backend.
///
/// Staging is append-only. The canonical schema is only ever written inside
/// one transaction per call, with foreign keys checked once before commit, so
/// readers never see a partial write.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait BicamStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The catalog the canonical schema was created from.
  fn catalog(&self) -> Catalog;

  // ── Staging ───────────────────────────────────────────────────────────

  /// Append rows to `source`'s staging log. Rows identical to an already
  /// staged row (same table, natural key and content) are ignored.
  fn stage(
    &self,
    source: Source,
    rows: Vec<NewStagedRow>,
  ) -> impl Future<Output = Result<StageSummary, Self::Error>> + Send + '_;

  /// Record scraped (package, granule) → entity associations. Returns how
  /// many were new.
  fn record_bridges(
    &self,
    links: Vec<BridgeLink>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The full staging log for one source.
  fn staging_log(
    &self,
    source: Source,
  ) -> impl Future<Output = Result<StagingLog, Self::Error>> + Send + '_;

  fn bridge_links(
    &self,
  ) -> impl Future<Output = Result<Vec<BridgeLink>, Self::Error>> + Send + '_;

  // ── Canonical schema ──────────────────────────────────────────────────

  /// Replace the content of every catalog table with `set`, in write order,
  /// inside a single transaction.
  fn replace_canonical(
    &self,
    set: CanonicalSet,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  fn read_canonical(
    &self,
  ) -> impl Future<Output = Result<CanonicalSet, Self::Error>> + Send + '_;

  // ── Backfill ──────────────────────────────────────────────────────────

  /// Every logged correction, oldest first.
  fn corrections(
    &self,
  ) -> impl Future<Output = Result<Vec<Correction>, Self::Error>> + Send + '_;

  /// Upsert the corrected rows and log the corrections in one transaction.
  fn apply_backfill(
    &self,
    corrections: Vec<PreparedCorrection>,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  // ── Runs ──────────────────────────────────────────────────────────────

  fn record_run(
    &self,
    run: RunRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Recorded runs, most recent first.
  fn runs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RunRecord>, Self::Error>> + Send + '_;
}

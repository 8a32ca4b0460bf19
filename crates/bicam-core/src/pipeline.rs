//! End-to-end runs over a [`BicamStore`].

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  Error,
  backfill::{self, Correction},
  reconcile::{ReconcileReport, Reconciler},
  resolve::BridgeTable,
  source::Source,
  store::{BicamStore, RunKind, RunRecord, RunStatus, WriteOutcome, WriteSummary},
};

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
  pub run_id:     Uuid,
  pub report:     ReconcileReport,
  pub summary:    WriteSummary,
  /// Logged corrections re-applied on top of the merge.
  pub reapplied:  usize,
}

#[derive(Debug, Clone)]
pub struct BackfillOutcome {
  pub run_id:  Uuid,
  pub summary: WriteSummary,
}

/// Rebuild the canonical schema from both staging logs.
///
/// Logged corrections are re-applied to the merged rows before the write, so a
/// full rerun keeps every earlier backfill. On an integrity failure nothing is
/// written, the run is recorded as failed and [`Error::Integrity`] is
/// returned.
pub async fn reconcile<S>(store: &S) -> Result<ReconcileOutcome, S::Error>
where
  S: BicamStore,
  S::Error: From<Error>,
{
  let catalog = store.catalog();
  let run_id = Uuid::new_v4();
  let started_at = Utc::now();
  info!(%run_id, "starting reconciliation");

  let result = async {
    catalog.validate()?;

    let legislative = store.staging_log(Source::Legislative).await?.snapshot();
    let document = store.staging_log(Source::Document).await?.snapshot();
    let bridges: BridgeTable = store.bridge_links().await?.into_iter().collect();
    info!(
      legislative = legislative.len(),
      document = document.len(),
      bridges = bridges.len(),
      "loaded staging snapshots"
    );

    let (mut set, report) =
      Reconciler::new(catalog, &legislative, &document, &bridges).run()?;

    let corrections = store
      .corrections()
      .await?
      .iter()
      .map(|c| backfill::prepare(catalog, c))
      .collect::<Result<Vec<_>, _>>()?;
    let reapplied = backfill::apply_all(&mut set, &corrections);

    let outcome = store.replace_canonical(set).await?;
    Ok::<_, S::Error>((report, reapplied, outcome))
  }
  .await;

  let mut run = RunRecord {
    id: run_id,
    kind: RunKind::Reconcile,
    started_at,
    finished_at: Utc::now(),
    status: RunStatus::Failed,
    rows_written: 0,
    detail: None,
  };

  match result {
    Ok((report, reapplied, WriteOutcome::Committed(summary))) => {
      run.status = RunStatus::Succeeded;
      run.rows_written = summary.rows_written;
      run.detail = Some(format!(
        "{} unresolved staged rows, {reapplied} corrections re-applied",
        report.unresolved()
      ));
      store.record_run(run).await?;
      info!(%run_id, rows = summary.rows_written, "reconciliation committed");
      Ok(ReconcileOutcome { run_id, report, summary, reapplied })
    }
    Ok((_, _, WriteOutcome::Rejected(failure))) => {
      error!(%run_id, %failure, "reconciliation rolled back");
      run.detail = Some(failure.to_string());
      store.record_run(run).await?;
      Err(Error::Integrity(failure).into())
    }
    Err(err) => {
      error!(%run_id, %err, "reconciliation failed");
      run.detail = Some(err.to_string());
      if let Err(record_err) = store.record_run(run).await {
        warn!(%run_id, %record_err, "could not record failed run");
      }
      Err(err)
    }
  }
}

/// Apply a batch of corrections to the canonical schema in one transaction.
/// Every correction is validated before anything is written.
pub async fn backfill<S>(
  store: &S,
  corrections: &[Correction],
) -> Result<BackfillOutcome, S::Error>
where
  S: BicamStore,
  S::Error: From<Error>,
{
  let catalog = store.catalog();
  let run_id = Uuid::new_v4();
  let started_at = Utc::now();

  let prepared = corrections
    .iter()
    .map(|c| backfill::prepare(catalog, c))
    .collect::<Result<Vec<_>, _>>()?;
  info!(%run_id, corrections = prepared.len(), "applying backfill");

  let outcome = store.apply_backfill(prepared).await?;
  let mut run = RunRecord {
    id: run_id,
    kind: RunKind::Backfill,
    started_at,
    finished_at: Utc::now(),
    status: RunStatus::Failed,
    rows_written: 0,
    detail: None,
  };

  match outcome {
    WriteOutcome::Committed(summary) => {
      run.status = RunStatus::Succeeded;
      run.rows_written = summary.rows_written;
      run.detail = Some(format!("{} new corrections logged", summary.corrections));
      store.record_run(run).await?;
      info!(%run_id, rows = summary.rows_written, "backfill committed");
      Ok(BackfillOutcome { run_id, summary })
    }
    WriteOutcome::Rejected(failure) => {
      error!(%run_id, %failure, "backfill rolled back");
      run.detail = Some(failure.to_string());
      store.record_run(run).await?;
      Err(Error::Integrity(failure).into())
    }
  }
}

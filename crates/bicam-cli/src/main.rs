//! `bicam`: stage, reconcile and backfill the BICAM canonical schema.
//!
//! # Usage
//!
//! ```text
//! bicam stage --source legislative bills.jsonl
//! bicam bridge directory-links.jsonl
//! bicam reconcile
//! bicam backfill fixes.jsonl
//! bicam dump bills
//! ```
//!
//! Input files hold one JSON object per line (or any sequence of
//! whitespace-separated JSON objects). The store location comes from
//! `bicam.toml` (or `--config`) and `BICAM_STORE_PATH`.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use bicam_core::{
  backfill::Correction,
  pipeline,
  resolve::BridgeLink,
  source::Source,
  staging::NewStagedRow,
  store::BicamStore,
};
use bicam_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "BICAM reconciliation engine")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "bicam.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Append staged rows for one source.
  Stage {
    #[arg(long)]
    source: Source,
    file:   PathBuf,
  },
  /// Record (package, granule) → entity associations.
  Bridge { file: PathBuf },
  /// Rebuild the canonical schema from both staging logs.
  Reconcile,
  /// Apply corrections to the canonical schema.
  Backfill { file: PathBuf },
  /// Print the canonical tables in write order.
  Order,
  /// Print one canonical table as JSON.
  Dump { table: String },
  /// Show recent runs.
  Runs {
    #[arg(long, default_value_t = 20)]
    limit: usize,
  },
}

#[derive(Debug, Deserialize)]
struct CliConfig {
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("bicam.sqlite3") }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BICAM"))
    .build()
    .context("failed to read config file")?;
  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Stage { source, file } => {
      let rows: Vec<NewStagedRow> = read_records(&file)?;
      let summary = store.stage(source, rows).await.context("staging failed")?;
      info!(%source, inserted = summary.inserted, ignored = summary.ignored, "staged");
    }
    Command::Bridge { file } => {
      let links: Vec<BridgeLink> = read_records(&file)?;
      let added = store.record_bridges(links).await.context("recording bridges failed")?;
      info!(added, "recorded bridge links");
    }
    Command::Reconcile => {
      let outcome = pipeline::reconcile(&store).await.context("reconciliation failed")?;
      for table in &outcome.report.tables {
        println!(
          "{:<32} rows={:<7} both={:<7} legislative={:<7} document={:<7} unresolved={}",
          table.table,
          table.rows,
          table.both,
          table.legislative_only,
          table.document_only,
          table.unresolved
        );
      }
      info!(
        run_id = %outcome.run_id,
        rows = outcome.summary.rows_written,
        reapplied = outcome.reapplied,
        "reconciled"
      );
    }
    Command::Backfill { file } => {
      let corrections: Vec<Correction> = read_records(&file)?;
      let outcome = pipeline::backfill(&store, &corrections)
        .await
        .context("backfill failed")?;
      info!(
        run_id = %outcome.run_id,
        rows = outcome.summary.rows_written,
        corrections = outcome.summary.corrections,
        "backfilled"
      );
    }
    Command::Order => {
      for table in store.catalog().write_order()? {
        println!("{:?}\t{}", table.tier, table.name);
      }
    }
    Command::Dump { table } => {
      store.catalog().table(&table)?;
      let set = store.read_canonical().await.context("reading canonical schema failed")?;
      let mut json = set.to_json();
      let rows = json.get_mut(&table).map(serde_json::Value::take).unwrap_or_default();
      println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Command::Runs { limit } => {
      for run in store.runs(limit).await.context("reading runs failed")? {
        println!(
          "{}  {}  {:<9}  {:<9}  rows={}  {}",
          run.started_at.to_rfc3339(),
          run.id,
          run.kind.as_str(),
          run.status.as_str(),
          run.rows_written,
          run.detail.unwrap_or_default()
        );
      }
    }
  }

  Ok(())
}

/// Read a sequence of JSON records from `path`.
fn read_records<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  let records = serde_json::Deserializer::from_str(&raw)
    .into_iter::<T>()
    .collect::<Result<Vec<_>, _>>()
    .with_context(|| format!("parsing {}", path.display()))?;
  if records.is_empty() {
    bail!("{} holds no records", path.display());
  }
  Ok(records)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

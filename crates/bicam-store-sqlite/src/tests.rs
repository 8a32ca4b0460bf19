//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use bicam_core::{
  backfill::Correction,
  pipeline,
  resolve::BridgeLink,
  source::{Provenance, Source},
  staging::NewStagedRow,
  store::{BicamStore, RunKind, RunStatus},
  value::{Key, Row, Value, row},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn staged(table: &str, natural_key: &str, fields: Row) -> NewStagedRow {
  NewStagedRow::new(table, natural_key, fields)
}

fn bill(id: &str, title: &str) -> NewStagedRow {
  staged("bills", id, row([("bill_id", id.into()), ("title", title.into())]))
}

async fn title_of(s: &SqliteStore, table: &str, id: &str) -> Value {
  let set = s.read_canonical().await.unwrap();
  set.get(table, &Key::single(id)).unwrap().values["title"].clone()
}

// ─── Staging ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn restaging_identical_rows_is_ignored() {
  let s = store().await;

  let first = s.stage(Source::Legislative, vec![bill("hr1-118", "A")]).await.unwrap();
  assert_eq!((first.inserted, first.ignored), (1, 0));

  let again = s.stage(Source::Legislative, vec![bill("hr1-118", "A")]).await.unwrap();
  assert_eq!((again.inserted, again.ignored), (0, 1));

  let log = s.staging_log(Source::Legislative).await.unwrap();
  assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn latest_staged_version_wins() {
  let s = store().await;
  s.stage(Source::Legislative, vec![bill("hr1-118", "A")]).await.unwrap();
  tokio::time::sleep(Duration::from_millis(2)).await;
  s.stage(Source::Legislative, vec![bill("hr1-118", "B")]).await.unwrap();

  let snapshot = s.staging_log(Source::Legislative).await.unwrap().snapshot();
  let latest = snapshot.get("bills", "hr1-118").unwrap();
  assert_eq!(latest.fields["title"], Value::from("B"));

  // Reverting to earlier content is a new version, not a duplicate.
  tokio::time::sleep(Duration::from_millis(2)).await;
  let revert = s.stage(Source::Legislative, vec![bill("hr1-118", "A")]).await.unwrap();
  assert_eq!(revert.inserted, 1);

  let snapshot = s.staging_log(Source::Legislative).await.unwrap().snapshot();
  assert_eq!(snapshot.get("bills", "hr1-118").unwrap().fields["title"], Value::from("A"));
  assert_eq!(s.staging_log(Source::Legislative).await.unwrap().len(), 3);
}

#[tokio::test]
async fn one_batch_keeps_every_version_of_a_key() {
  let s = store().await;
  let batch = vec![bill("hr1-118", "A"), bill("hr1-118", "B"), bill("hr1-118", "A")];
  let summary = s.stage(Source::Legislative, batch).await.unwrap();
  assert_eq!((summary.inserted, summary.ignored), (3, 0));

  let log = s.staging_log(Source::Legislative).await.unwrap();
  assert_eq!(log.len(), 3);
  let latest = log.snapshot().get("bills", "hr1-118").unwrap().fields["title"].clone();
  assert_eq!(latest, Value::from("A"));

  // a repeat of the latest version is still skipped inside a batch
  let again = s
    .stage(Source::Legislative, vec![bill("hr1-118", "C"), bill("hr1-118", "C")])
    .await
    .unwrap();
  assert_eq!((again.inserted, again.ignored), (1, 1));
}

#[tokio::test]
async fn staging_logs_are_kept_per_source() {
  let s = store().await;
  s.stage(Source::Legislative, vec![bill("hr1-118", "A")]).await.unwrap();

  let document = s.staging_log(Source::Document).await.unwrap();
  assert!(document.is_empty());
  assert_eq!(document.source(), Source::Document);
}

#[tokio::test]
async fn bridges_are_deduplicated() {
  let s = store().await;
  let link = BridgeLink {
    package_id: "CDIR-2022-10-26".into(),
    granule_id: "CDIR-2022-10-26-AL-H-1".into(),
    entity_key: "C001055".into(),
  };
  assert_eq!(s.record_bridges(vec![link.clone(), link.clone()]).await.unwrap(), 1);
  assert_eq!(s.record_bridges(vec![link.clone()]).await.unwrap(), 0);
  assert_eq!(s.bridge_links().await.unwrap(), vec![link]);
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_writes_the_union_of_both_sources() {
  let s = store().await;
  s.stage(Source::Legislative, vec![bill("hr1-118", "Legislative title")])
    .await
    .unwrap();
  s.stage(Source::Document, vec![
    staged("bill_collections", "BILLS-118hr1ih", row([
      ("package_id", "BILLS-118hr1ih".into()),
      ("title", "Document title".into()),
    ])),
    staged("bill_collections", "BILLS-118hr2ih", row([
      ("package_id", "BILLS-118hr2ih".into()),
      ("title", "Only in documents".into()),
    ])),
  ])
  .await
  .unwrap();

  let outcome = pipeline::reconcile(&s).await.unwrap();
  let bills = outcome.report.table("bills").unwrap();
  assert_eq!((bills.rows, bills.both, bills.document_only), (2, 1, 1));

  let set = s.read_canonical().await.unwrap();
  let hr1 = set.get("bills", &Key::single("hr1-118")).unwrap();
  assert_eq!(hr1.provenance, Provenance::Both);
  assert_eq!(hr1.values["title"], Value::from("Legislative title"));
  assert_eq!(title_of(&s, "bills", "hr2-118").await, Value::from("Only in documents"));

  // reference tables are always seeded
  assert!(set.get("ref_bill_version_codes", &Key::single("IH")).is_some());
  assert_eq!(set.table("bills_metadata").unwrap().len(), 2);
}

#[tokio::test]
async fn prefer_document_and_timestamp_max() {
  let s = store().await;
  s.stage(Source::Legislative, vec![
    staged("hearings", "hhrg1-118", row([
      ("hearing_id", "hhrg1-118".into()),
      ("title", "From the legislative API".into()),
      ("updated_at", "2023-03-01".into()),
    ])),
  ])
  .await
  .unwrap();
  s.stage(Source::Document, vec![staged(
    "congressional_hearings",
    "CHRG-118hhrg1",
    row([
      ("package_id", "CHRG-118hhrg1".into()),
      ("title", "From the document repository".into()),
      ("last_modified", "2022-01-15".into()),
    ]),
  )])
  .await
  .unwrap();

  pipeline::reconcile(&s).await.unwrap();
  let set = s.read_canonical().await.unwrap();
  let hearing = set.get("hearings", &Key::single("hhrg1-118")).unwrap();
  assert_eq!(hearing.values["title"], Value::from("From the document repository"));

  let expected = Value::from("2023-03-01")
    .coerce(bicam_core::value::ColumnType::Timestamp)
    .unwrap();
  assert_eq!(hearing.values["updated_at"], expected);
}

#[tokio::test]
async fn child_rows_from_both_sources_are_deduplicated() {
  let s = store().await;
  let action = |id: &str| {
    staged(
      "bill_actions",
      &format!("hr1-118/{id}"),
      row([("bill_id", "hr1-118".into()), ("action_id", id.into())]),
    )
  };
  s.stage(Source::Legislative, vec![bill("hr1-118", "A"), action("A1")])
    .await
    .unwrap();
  s.stage(Source::Document, vec![action("A1"), action("A2")]).await.unwrap();

  pipeline::reconcile(&s).await.unwrap();
  let set = s.read_canonical().await.unwrap();
  assert_eq!(set.table("bill_actions").unwrap().len(), 2);
}

#[tokio::test]
async fn mixed_case_ids_merge_into_one_bill() {
  let s = store().await;
  s.stage(Source::Legislative, vec![
    bill("HR1-118", "Legislative title"),
    staged("bill_actions", "HR1-118/A1", row([
      ("bill_id", "HR1-118".into()),
      ("action_id", "A1".into()),
    ])),
  ])
  .await
  .unwrap();
  s.stage(Source::Document, vec![staged(
    "bill_collections",
    "BILLS-118hr1ih",
    row([("package_id", "BILLS-118hr1ih".into())]),
  )])
  .await
  .unwrap();

  let outcome = pipeline::reconcile(&s).await.unwrap();
  let bills = outcome.report.table("bills").unwrap();
  assert_eq!((bills.rows, bills.both), (1, 1));

  let set = s.read_canonical().await.unwrap();
  assert_eq!(set.get("bills", &Key::single("hr1-118")).unwrap().provenance, Provenance::Both);
  let metadata = Key(vec!["hr1-118".into(), "BILLS-118hr1ih".into()]);
  let metadata = set.get("bills_metadata", &metadata).unwrap();
  assert_eq!(metadata.values["bill_version"], Value::from("IH"));
  assert_eq!(set.table("bill_actions").unwrap().len(), 1);
}

#[tokio::test]
async fn law_notes_and_votes_hang_off_their_bill() {
  let s = store().await;
  s.stage(Source::Legislative, vec![
    staged("congresses", "118", row([("congress", "118".into())])),
    bill("hr1-118", "A"),
    staged("bill_actions", "hr1-118/A1", row([
      ("bill_id", "hr1-118".into()),
      ("action_id", "A1".into()),
    ])),
    staged("bills_laws", "hr1-118/118-5", row([
      ("bill_id", "HR1-118".into()),
      ("law_number", "118-5".into()),
      ("law_type", "Public Law".into()),
    ])),
    staged("bills_notes", "hr1-118/1", row([
      ("bill_id", "hr1-118".into()),
      ("note_number", Value::Int(1)),
      ("note_text", "See also".into()),
    ])),
    staged("bills_notes_links", "hr1-118/1/1", row([
      ("bill_id", "hr1-118".into()),
      ("note_number", "1".into()),
      ("link_number", "1".into()),
      ("link_url", "https://example.test/n1".into()),
    ])),
    staged("bill_actions_recorded_votes", "hr1-118/A1/101", row([
      ("bill_id", "hr1-118".into()),
      ("action_id", "A1".into()),
      ("roll_number", "101".into()),
      ("congress", "118.0".into()),
      ("chamber", "House".into()),
    ])),
  ])
  .await
  .unwrap();

  let outcome = pipeline::reconcile(&s).await.unwrap();
  assert_eq!(outcome.report.unresolved(), 0);

  let set = s.read_canonical().await.unwrap();
  let law = Key(vec!["hr1-118".into(), "118-5".into()]);
  assert_eq!(set.get("bills_laws", &law).unwrap().values["law_id"], Value::from("PL118-5"));
  assert_eq!(set.table("bills_notes_links").unwrap().len(), 1);

  let vote = Key(vec!["hr1-118".into(), "A1".into(), Value::Int(101)]);
  let vote = set.get("bill_actions_recorded_votes", &vote).unwrap();
  assert_eq!(vote.values["congress"], Value::Int(118));
  assert_eq!(vote.values["chamber"], Value::from("house"));
}

#[tokio::test]
async fn votes_for_unknown_actions_roll_back() {
  let s = store().await;
  s.stage(Source::Legislative, vec![
    bill("hr1-118", "A"),
    staged("bill_actions_recorded_votes", "hr1-118/A9/7", row([
      ("bill_id", "hr1-118".into()),
      ("action_id", "A9".into()),
      ("roll_number", "7".into()),
    ])),
  ])
  .await
  .unwrap();

  let err = pipeline::reconcile(&s).await.unwrap_err();
  let Error::Core(bicam_core::Error::Integrity(failure)) = err else {
    panic!("expected an integrity failure, got {err}");
  };
  let violation = &failure.violations[0];
  assert_eq!(violation.referenced_table, "bill_actions");
  assert_eq!(violation.columns, vec!["bill_id".to_owned(), "action_id".to_owned()]);
  assert_eq!(violation.missing, Key(vec!["hr1-118".into(), "A9".into()]));
}

#[tokio::test]
async fn reconcile_is_idempotent() {
  let s = store().await;
  s.stage(Source::Legislative, vec![staged(
    "bills",
    "hr1-118",
    row([("bill_id", "hr1-118".into()), ("legislative_subjects", "Taxation".into())]),
  )])
  .await
  .unwrap();
  s.stage(Source::Document, vec![staged(
    "bill_collections",
    "BILLS-118hr1ih",
    row([("package_id", "BILLS-118hr1ih".into()), ("subjects", "Energy".into())]),
  )])
  .await
  .unwrap();

  pipeline::reconcile(&s).await.unwrap();
  let first = serde_json::to_string(&s.read_canonical().await.unwrap().to_json()).unwrap();
  pipeline::reconcile(&s).await.unwrap();
  let second = serde_json::to_string(&s.read_canonical().await.unwrap().to_json()).unwrap();
  assert_eq!(first, second);

  let runs = s.runs(10).await.unwrap();
  assert_eq!(runs.len(), 2);
  assert!(runs.iter().all(|r| r.kind == RunKind::Reconcile));
  assert!(runs.iter().all(|r| r.status == RunStatus::Succeeded));
}

#[tokio::test]
async fn bridged_granules_resolve_to_members() {
  let s = store().await;
  s.stage(Source::Document, vec![staged(
    "congressional_directory_granules",
    "CDIR-2022-10-26-AL-H-1",
    row([
      ("package_id", "CDIR-2022-10-26".into()),
      ("granule_id", "CDIR-2022-10-26-AL-H-1".into()),
      ("biography", "Representative from Alabama".into()),
    ]),
  )])
  .await
  .unwrap();

  let outcome = pipeline::reconcile(&s).await.unwrap();
  assert_eq!(outcome.report.table("members").unwrap().unresolved, 1);

  s.record_bridges(vec![BridgeLink {
    package_id: "CDIR-2022-10-26".into(),
    granule_id: "CDIR-2022-10-26-AL-H-1".into(),
    entity_key: "C001055".into(),
  }])
  .await
  .unwrap();

  pipeline::reconcile(&s).await.unwrap();
  let set = s.read_canonical().await.unwrap();
  let member = set.get("members", &Key::single("C001055")).unwrap();
  assert_eq!(member.values["biography"], Value::from("Representative from Alabama"));
}

// ─── Integrity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn dangling_references_roll_back_the_whole_write() {
  let s = store().await;
  s.stage(Source::Legislative, vec![bill("hr1-118", "Kept")]).await.unwrap();
  pipeline::reconcile(&s).await.unwrap();

  s.stage(Source::Legislative, vec![
    bill("hr2-118", "Never visible"),
    staged("committeemeetings", "M1", row([("meeting_id", "M1".into())])),
    staged(
      "committeemeetings_associated_bills",
      "M1/hr9-118",
      row([("meeting_id", "M1".into()), ("bill_id", "hr9-118".into())]),
    ),
  ])
  .await
  .unwrap();

  let err = pipeline::reconcile(&s).await.unwrap_err();
  let Error::Core(bicam_core::Error::Integrity(failure)) = err else {
    panic!("expected an integrity failure, got {err}");
  };
  assert_eq!(failure.violations.len(), 1);
  let violation = &failure.violations[0];
  assert_eq!(violation.table, "committeemeeting_bills");
  assert_eq!(violation.referenced_table, "bills");
  assert_eq!(violation.columns, vec!["bill_id".to_owned()]);
  assert_eq!(violation.missing, Key::single("hr9-118"));

  // the previous canonical state is untouched
  let set = s.read_canonical().await.unwrap();
  assert!(set.get("bills", &Key::single("hr1-118")).is_some());
  assert!(set.get("bills", &Key::single("hr2-118")).is_none());
  assert!(set.table("committeemeetings").unwrap().is_empty());

  let runs = s.runs(1).await.unwrap();
  assert_eq!(runs[0].status, RunStatus::Failed);
  assert!(runs[0].detail.as_deref().unwrap().contains("committeemeeting_bills"));
}

// ─── Backfill ────────────────────────────────────────────────────────────────

fn retitle(title: &str) -> Correction {
  Correction {
    table:  "bills".into(),
    key:    row([("bill_id", "hr1-118".into())]),
    source: Source::Legislative,
    fields: row([("title", title.into())]),
  }
}

#[tokio::test]
async fn backfill_is_idempotent() {
  let s = store().await;
  s.stage(Source::Legislative, vec![bill("hr1-118", "Old")]).await.unwrap();
  pipeline::reconcile(&s).await.unwrap();

  let first = pipeline::backfill(&s, &[retitle("New")]).await.unwrap();
  assert_eq!((first.summary.rows_written, first.summary.corrections), (1, 1));
  let after_first = s.read_canonical().await.unwrap();

  let second = pipeline::backfill(&s, &[retitle("New")]).await.unwrap();
  assert_eq!((second.summary.rows_written, second.summary.corrections), (0, 0));
  assert_eq!(s.read_canonical().await.unwrap(), after_first);
  assert_eq!(s.corrections().await.unwrap(), vec![retitle("New")]);
}

#[tokio::test]
async fn backfill_survives_reconciliation() {
  let s = store().await;
  s.stage(Source::Legislative, vec![bill("hr1-118", "Old")]).await.unwrap();
  pipeline::reconcile(&s).await.unwrap();
  pipeline::backfill(&s, &[retitle("New")]).await.unwrap();

  let outcome = pipeline::reconcile(&s).await.unwrap();
  assert_eq!(outcome.reapplied, 1);
  assert_eq!(title_of(&s, "bills", "hr1-118").await, Value::from("New"));
}

#[tokio::test]
async fn backfill_creates_missing_rows() {
  let s = store().await;
  pipeline::backfill(&s, &[retitle("Created")]).await.unwrap();

  let set = s.read_canonical().await.unwrap();
  let bill = set.get("bills", &Key::single("hr1-118")).unwrap();
  assert_eq!(bill.provenance, Provenance::Backfill);
  assert_eq!(bill.values["title"], Value::from("Created"));
}

#[tokio::test]
async fn invalid_corrections_write_nothing() {
  let s = store().await;
  let bad = Correction {
    table:  "bills".into(),
    key:    row([("bill_id", "hr1-118".into())]),
    source: Source::Document,
    fields: row([("nonexistent", "x".into())]),
  };

  let err = pipeline::backfill(&s, &[retitle("Fine"), bad]).await.unwrap_err();
  assert!(matches!(err, Error::Core(_)));
  assert!(s.corrections().await.unwrap().is_empty());
  assert!(s.read_canonical().await.unwrap().table("bills").unwrap().is_empty());
}

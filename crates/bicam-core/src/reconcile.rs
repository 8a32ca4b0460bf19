//! Full reconciliation of both staging snapshots into a canonical row set.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Result,
  canonical::{CanonicalRow, CanonicalSet},
  catalog::{Catalog, TableDef},
  merge,
  resolve::{BridgeTable, KeyResolver},
  source::{Provenance, Source},
  staging::Snapshot,
  value::{Key, Row, Value},
};

/// Per-table counts from one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
  pub table:            &'static str,
  pub rows:             usize,
  pub both:             usize,
  pub legislative_only: usize,
  pub document_only:    usize,
  pub seeded:           usize,
  /// Staged rows folded into another row of the same source.
  pub collapsed:        usize,
  /// Staged rows whose canonical key could not be determined.
  pub unresolved:       usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
  /// In write order.
  pub tables: Vec<TableReport>,
}

impl ReconcileReport {
  pub fn table(&self, name: &str) -> Option<&TableReport> {
    self.tables.iter().find(|t| t.table == name)
  }

  pub fn rows(&self) -> usize { self.tables.iter().map(|t| t.rows).sum() }

  pub fn unresolved(&self) -> usize { self.tables.iter().map(|t| t.unresolved).sum() }
}

/// Merges a legislative and a document snapshot under a catalog.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
  catalog:     Catalog,
  legislative: &'a Snapshot,
  document:    &'a Snapshot,
  resolver:    KeyResolver<'a>,
}

impl<'a> Reconciler<'a> {
  pub fn new(
    catalog: Catalog,
    legislative: &'a Snapshot,
    document: &'a Snapshot,
    bridges: &'a BridgeTable,
  ) -> Self {
    Self {
      catalog,
      legislative,
      document,
      resolver: KeyResolver::new(bridges),
    }
  }

  /// Produce every canonical table. The key set of each table is the union of
  /// the keys both sources resolve to; a key seen by one source only gets
  /// nulls for the other source's fields.
  pub fn run(&self) -> Result<(CanonicalSet, ReconcileReport)> {
    let mut set = CanonicalSet::new();
    let mut report = ReconcileReport::default();

    for table in self.catalog.write_order()? {
      let mut counts = TableReport { table: table.name, ..Default::default() };
      set.ensure_table(table.name);

      if let Some(seed) = table.seed {
        for row in seed() {
          let values = complete(table, merge::coerce_canonical(table, &row)?);
          let key = table.key_of(&values);
          set.insert(table.name, key, CanonicalRow {
            values,
            provenance: Provenance::Static,
          });
          counts.seeded += 1;
        }
      } else {
        let legislative = self.gather(table, Source::Legislative, &mut counts)?;
        let document = self.gather(table, Source::Document, &mut counts)?;

        let mut keys: Vec<&Key> = legislative.keys().chain(document.keys()).collect();
        keys.sort();
        keys.dedup();

        for key in keys {
          let l = legislative.get(key);
          let d = document.get(key);
          let Some(provenance) = Provenance::from_presence(l.is_some(), d.is_some())
          else {
            continue;
          };
          match provenance {
            Provenance::Both => counts.both += 1,
            Provenance::Legislative => counts.legislative_only += 1,
            _ => counts.document_only += 1,
          }
          let values = merge::merge(table, key, l, d);
          set.insert(table.name, key.clone(), CanonicalRow { values, provenance });
        }
      }

      counts.rows = set.table(table.name).map_or(0, BTreeMap::len);
      if counts.unresolved > 0 {
        warn!(
          table = table.name,
          unresolved = counts.unresolved,
          "staged rows without a canonical key"
        );
      }
      debug!(
        table = table.name,
        rows = counts.rows,
        both = counts.both,
        legislative_only = counts.legislative_only,
        document_only = counts.document_only,
        "reconciled table"
      );
      report.tables.push(counts);
    }

    info!(
      tables = report.tables.len(),
      rows = report.rows(),
      unresolved = report.unresolved(),
      "reconciliation complete"
    );
    Ok((set, report))
  }

  fn snapshot(&self, source: Source) -> &'a Snapshot {
    match source {
      Source::Legislative => self.legislative,
      Source::Document => self.document,
    }
  }

  /// Resolve, project and collapse one source's staged rows for `table`.
  fn gather(
    &self,
    table: &TableDef,
    source: Source,
    counts: &mut TableReport,
  ) -> Result<BTreeMap<Key, Row>> {
    let Some(binding) = table.binding(source) else {
      return Ok(BTreeMap::new());
    };

    let mut grouped: BTreeMap<Key, Vec<Row>> = BTreeMap::new();
    for staged in self.snapshot(source).rows(binding.staging) {
      match self.resolver.resolve(table, source, &staged.fields) {
        Ok(key) => {
          let projected = merge::project(table, source, &staged.fields)?;
          grouped.entry(key).or_default().push(projected);
        }
        Err(reason) => {
          counts.unresolved += 1;
          debug!(
            table = table.name,
            %source,
            natural_key = %staged.natural_key,
            %reason,
            "unresolved staged row"
          );
        }
      }
    }

    let mut collapsed = BTreeMap::new();
    for (key, rows) in grouped {
      counts.collapsed += rows.len().saturating_sub(1);
      if let Some(row) = merge::collapse(table, rows) {
        collapsed.insert(key, row);
      }
    }
    Ok(collapsed)
  }
}

/// Give every catalog column a value, null where absent.
fn complete(table: &TableDef, mut row: Row) -> Row {
  for column in table.columns {
    row.entry(column.name.to_owned()).or_insert(Value::Null);
  }
  row
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    resolve::BridgeLink,
    staging::{StagedRow, StagingLog},
    value::row,
  };

  fn log(source: Source, rows: &[(&str, &str, Row)]) -> Snapshot {
    let rows = rows
      .iter()
      .enumerate()
      .map(|(i, (table, natural_key, fields))| StagedRow {
        sequence: i as i64,
        source,
        table: (*table).to_owned(),
        natural_key: (*natural_key).to_owned(),
        fields: fields.clone(),
        inserted_at: Utc::now(),
      })
      .collect();
    StagingLog::new(source, rows).snapshot()
  }

  fn run(leg: &Snapshot, doc: &Snapshot) -> (CanonicalSet, ReconcileReport) {
    let bridges = BridgeTable::new();
    Reconciler::new(Catalog::bicam(), leg, doc, &bridges).run().unwrap()
  }

  #[test]
  fn key_set_is_the_union_of_both_sources() {
    let leg = log(Source::Legislative, &[(
      "bills",
      "hr1-118",
      row([("bill_id", "hr1-118".into())]),
    )]);
    let doc = log(Source::Document, &[
      ("bill_collections", "BILLS-118hr1ih", row([("package_id", "BILLS-118hr1ih".into())])),
      ("bill_collections", "BILLS-118hr2ih", row([("package_id", "BILLS-118hr2ih".into())])),
    ]);
    let (set, report) = run(&leg, &doc);

    let bills = set.table("bills").unwrap();
    let keys: Vec<_> = bills.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["hr1-118", "hr2-118"]);
    assert_eq!(bills[&Key::single("hr1-118")].provenance, Provenance::Both);
    assert_eq!(bills[&Key::single("hr2-118")].provenance, Provenance::Document);

    let counts = report.table("bills").unwrap();
    assert_eq!((counts.both, counts.document_only), (1, 1));
  }

  #[test]
  fn prefer_document_title_falls_back_to_legislative() {
    let leg = log(Source::Legislative, &[
      ("hearings", "a", row([("hearing_id", "hhrg1-118".into()), ("title", "x".into())])),
      ("hearings", "b", row([("hearing_id", "hhrg2-118".into()), ("title", "x".into())])),
    ]);
    let doc = log(Source::Document, &[
      ("congressional_hearings", "CHRG-118hhrg1", row([
        ("package_id", "CHRG-118hhrg1".into()),
        ("title", Value::Null),
      ])),
      ("congressional_hearings", "CHRG-118hhrg2", row([
        ("package_id", "CHRG-118hhrg2".into()),
        ("title", "y".into()),
      ])),
    ]);
    let (set, _) = run(&leg, &doc);

    let title = |id: &str| set.get("hearings", &Key::single(id)).unwrap().values["title"].clone();
    assert_eq!(title("hhrg1-118"), Value::from("x"));
    assert_eq!(title("hhrg2-118"), Value::from("y"));
  }

  #[test]
  fn last_update_takes_the_later_source() {
    let leg = log(Source::Legislative, &[(
      "bills",
      "hr1-118",
      row([("bill_id", "hr1-118".into()), ("updated_at", "2020-01-01".into())]),
    )]);
    let doc = log(Source::Document, &[(
      "bill_collections",
      "BILLS-118hr1ih",
      row([
        ("package_id", "BILLS-118hr1ih".into()),
        ("last_modified", "2021-06-01".into()),
      ]),
    )]);
    let (set, _) = run(&leg, &doc);

    let updated = &set.get("bills", &Key::single("hr1-118")).unwrap().values["updated_at"];
    let expected = Value::from("2021-06-01")
      .coerce(crate::value::ColumnType::Timestamp)
      .unwrap();
    assert_eq!(updated, &expected);
  }

  #[test]
  fn child_rows_are_unioned_and_deduplicated() {
    let action = |id: &str| row([("bill_id", "hr1-118".into()), ("action_id", id.into())]);
    let leg = log(Source::Legislative, &[("bill_actions", "hr1-118/A1", action("A1"))]);
    let doc = log(Source::Document, &[
      ("bill_actions", "hr1-118/A1", action("A1")),
      ("bill_actions", "hr1-118/A2", action("A2")),
    ]);
    let (set, _) = run(&leg, &doc);
    assert_eq!(set.table("bill_actions").unwrap().len(), 2);
  }

  #[test]
  fn text_versions_collapse_onto_one_bill() {
    let doc = log(Source::Document, &[
      ("bill_collections", "BILLS-118hr1eh", row([
        ("package_id", "BILLS-118hr1eh".into()),
        ("version_count", Value::Int(2)),
      ])),
      ("bill_collections", "BILLS-118hr1ih", row([
        ("package_id", "BILLS-118hr1ih".into()),
        ("version_count", Value::Int(1)),
      ])),
    ]);
    let (set, report) = run(&log(Source::Legislative, &[]), &doc);

    let bill = set.get("bills", &Key::single("hr1-118")).unwrap();
    assert_eq!(bill.values["texts_count"], Value::Int(2));
    assert_eq!(report.table("bills").unwrap().collapsed, 1);
    // each package keeps its own metadata row
    assert_eq!(set.table("bills_metadata").unwrap().len(), 2);
  }

  #[test]
  fn unbridged_granules_are_counted_not_fatal() {
    let doc = log(Source::Document, &[(
      "congressional_directory_granules",
      "CDIR-2022-10-26-AL-H-1",
      row([
        ("package_id", "CDIR-2022-10-26".into()),
        ("granule_id", "CDIR-2022-10-26-AL-H-1".into()),
        ("biography", "Representative from Alabama".into()),
      ]),
    )]);
    let leg = log(Source::Legislative, &[]);

    let (set, report) = run(&leg, &doc);
    assert!(set.table("members").unwrap().is_empty());
    assert_eq!(report.table("members").unwrap().unresolved, 1);

    let bridges: BridgeTable = [BridgeLink {
      package_id: "CDIR-2022-10-26".into(),
      granule_id: "CDIR-2022-10-26-AL-H-1".into(),
      entity_key: "C001055".into(),
    }]
    .into_iter()
    .collect();
    let (set, _) = Reconciler::new(Catalog::bicam(), &leg, &doc, &bridges).run().unwrap();
    let member = set.get("members", &Key::single("C001055")).unwrap();
    assert_eq!(member.values["biography"], Value::from("Representative from Alabama"));
    assert_eq!(member.provenance, Provenance::Document);
  }

  #[test]
  fn reference_tables_are_seeded() {
    let empty = log(Source::Legislative, &[]);
    let (set, _) = run(&empty, &log(Source::Document, &[]));
    let row = set
      .get("ref_bill_version_codes", &Key::single("IH"))
      .unwrap();
    assert_eq!(row.provenance, Provenance::Static);
    assert_eq!(row.values["chamber"], Value::from("house"));
  }

  #[test]
  fn rerunning_produces_identical_output() {
    let leg = log(Source::Legislative, &[(
      "bills",
      "hr1-118",
      row([("bill_id", "hr1-118".into()), ("legislative_subjects", "Taxation; Energy".into())]),
    )]);
    let doc = log(Source::Document, &[(
      "bill_collections",
      "BILLS-118hr1ih",
      row([("package_id", "BILLS-118hr1ih".into()), ("subjects", "Energy; Health".into())]),
    )]);
    let (first, _) = run(&leg, &doc);
    let (second, _) = run(&leg, &doc);
    assert_eq!(
      serde_json::to_string(&first.to_json()).unwrap(),
      serde_json::to_string(&second.to_json()).unwrap()
    );
    let subjects = &first.get("bills", &Key::single("hr1-118")).unwrap().values["subjects"];
    assert_eq!(subjects, &Value::from("Energy; Health; Taxation"));
  }

  #[test]
  fn identifiers_match_across_sources_whatever_their_case() {
    let leg = log(Source::Legislative, &[
      ("bills", "HR1-118", row([("bill_id", "HR1-118".into()), ("title", "x".into())])),
      ("bill_actions", "HR1-118/A1", row([
        ("bill_id", " HR1-118".into()),
        ("action_id", "A1".into()),
      ])),
    ]);
    let doc = log(Source::Document, &[(
      "bill_collections",
      "BILLS-118hr1ih",
      row([("package_id", "BILLS-118hr1ih".into())]),
    )]);
    let (set, report) = run(&leg, &doc);

    let bills = set.table("bills").unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[&Key::single("hr1-118")].provenance, Provenance::Both);
    assert_eq!(report.table("bills").unwrap().both, 1);

    let action = Key(vec!["hr1-118".into(), "A1".into()]);
    assert!(set.get("bill_actions", &action).is_some());
  }

  #[test]
  fn bill_version_falls_back_to_the_package_suffix() {
    let doc = log(Source::Document, &[
      ("bill_collections", "BILLS-118hr1eh", row([
        ("package_id", "BILLS-118hr1eh".into()),
        ("bill_version", "enr".into()),
      ])),
      ("bill_collections", "BILLS-118hr1ih", row([("package_id", "BILLS-118hr1ih".into())])),
    ]);
    let (set, _) = run(&log(Source::Legislative, &[]), &doc);

    let version = |package: &str| {
      let key = Key(vec!["hr1-118".into(), package.into()]);
      set.get("bills_metadata", &key).unwrap().values["bill_version"].clone()
    };
    assert_eq!(version("BILLS-118hr1ih"), Value::from("IH"));
    assert_eq!(version("BILLS-118hr1eh"), Value::from("ENR"));
  }

  #[test]
  fn amendment_flags_follow_the_amended_ids() {
    let leg = log(Source::Legislative, &[
      ("amendments", "samdt5-118", row([
        ("amendment_id", "SAMDT5-118".into()),
        ("amended_bill_id", "HR1-118".into()),
        ("amended_amendment_id", "-99".into()),
      ])),
      ("amendments", "samdt6-118", row([
        ("amendment_id", "samdt6-118".into()),
        ("amended_amendment_id", "samdt5-118".into()),
      ])),
    ]);
    let (set, _) = run(&leg, &log(Source::Document, &[]));

    let flags = |id: &str| {
      let values = &set.get("amendments", &Key::single(id)).unwrap().values;
      [
        values["is_bill_amendment"].clone(),
        values["is_treaty_amendment"].clone(),
        values["is_amendment_amendment"].clone(),
      ]
    };
    let (yes, no) = (Value::Bool(true), Value::Bool(false));
    assert_eq!(flags("samdt5-118"), [yes.clone(), no.clone(), no.clone()]);
    assert_eq!(flags("samdt6-118"), [no.clone(), no, yes]);

    let amended = &set.get("amendments", &Key::single("samdt5-118")).unwrap().values;
    assert_eq!(amended["amended_bill_id"], Value::from("hr1-118"));
  }

  #[test]
  fn law_ids_are_prefixed_law_numbers() {
    let leg = log(Source::Legislative, &[
      ("bills_laws", "hr1-118/118-5", row([
        ("bill_id", "hr1-118".into()),
        ("law_number", "118-5".into()),
        ("law_type", "Public Law".into()),
      ])),
      ("bills_laws", "hr2-118/118-6", row([
        ("bill_id", "hr2-118".into()),
        ("law_number", "118-6".into()),
        ("law_id", "PL118-6A".into()),
      ])),
    ]);
    let (set, _) = run(&leg, &log(Source::Document, &[]));

    let law_id = |bill: &str, number: &str| {
      let key = Key(vec![bill.into(), number.into()]);
      set.get("bills_laws", &key).unwrap().values["law_id"].clone()
    };
    assert_eq!(law_id("hr1-118", "118-5"), Value::from("PL118-5"));
    assert_eq!(law_id("hr2-118", "118-6"), Value::from("PL118-6A"));
  }

  #[test]
  fn print_text_renditions_fold_into_one_row() {
    let leg = log(Source::Legislative, &[
      ("committeeprints_texts", "cprt-118hprt1/pdf", row([
        ("print_id", "CPRT-118HPRT1".into()),
        ("pdf", "https://example.test/p.pdf".into()),
      ])),
      ("committeeprints_texts", "cprt-118hprt1/html", row([
        ("print_id", "cprt-118hprt1".into()),
        ("html", "https://example.test/p.htm".into()),
      ])),
    ]);
    let (set, report) = run(&leg, &log(Source::Document, &[]));

    let texts = set.table("committeeprints_texts").unwrap();
    assert_eq!(texts.len(), 1);
    let values = &texts[&Key::single("cprt-118hprt1")].values;
    assert_eq!(values["pdf_url"], Value::from("https://example.test/p.pdf"));
    assert_eq!(values["html_url"], Value::from("https://example.test/p.htm"));
    assert_eq!(report.table("committeeprints_texts").unwrap().collapsed, 1);
  }

  #[test]
  fn package_versions_fold_in_package_id_order() {
    fn version(package: &'static str, title: &str) -> (&'static str, &'static str, Row) {
      ("bill_collections", package, row([
        ("package_id", package.into()),
        ("title", title.into()),
      ]))
    }
    let doc = log(Source::Document, &[
      version("BILLS-118hr1ih", "Introduced"),
      version("BILLS-118hr1enr", "Enrolled"),
    ]);
    let (set, _) = run(&log(Source::Legislative, &[]), &doc);

    // `...ih` sorts after `...enr`, so the introduced title is folded last
    let bill = set.get("bills", &Key::single("hr1-118")).unwrap();
    assert_eq!(bill.values["title"], Value::from("Introduced"));
  }
}

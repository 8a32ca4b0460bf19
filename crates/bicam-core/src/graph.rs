//! The declared table dependency graph and the write order derived from it.

use std::{
  cmp::Reverse,
  collections::{BTreeMap, BTreeSet, BinaryHeap},
};

use crate::{
  Error, Result,
  catalog::{Catalog, TableDef, Tier},
};

/// Table → the tables it must be written after. Forward references and self
/// references are not edges; they are satisfied at commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
  edges: BTreeMap<&'static str, BTreeSet<&'static str>>,
}

impl DependencyGraph {
  pub fn from_catalog(catalog: Catalog) -> Self {
    let edges = catalog
      .tables()
      .iter()
      .map(|table| {
        let deps = table
          .foreign_keys
          .iter()
          .filter(|fk| !fk.forward && fk.references != table.name)
          .map(|fk| fk.references)
          .collect();
        (table.name, deps)
      })
      .collect();
    Self { edges }
  }

  pub fn dependencies_of(&self, table: &str) -> impl Iterator<Item = &'static str> + '_ {
    self.edges.get(table).into_iter().flatten().copied()
  }

  /// Kahn's algorithm. Among tables whose dependencies are all written, the
  /// one with the lowest (tier, declaration index) goes next, so the order is
  /// stable across runs and follows the tiers wherever the edges allow.
  pub fn write_order(&self, catalog: Catalog) -> Result<Vec<&'static TableDef>> {
    let tables = catalog.tables();
    let index: BTreeMap<&str, usize> =
      tables.iter().enumerate().map(|(i, t)| (t.name, i)).collect();

    let mut in_degree = vec![0usize; tables.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];
    for (i, table) in tables.iter().enumerate() {
      for dep in self.dependencies_of(table.name) {
        let &d = index.get(dep).ok_or_else(|| Error::UnknownTable(dep.to_owned()))?;
        dependents[d].push(i);
        in_degree[i] += 1;
      }
    }

    let mut ready: BinaryHeap<Reverse<(Tier, usize)>> = in_degree
      .iter()
      .enumerate()
      .filter(|(_, d)| **d == 0)
      .map(|(i, _)| Reverse((tables[i].tier, i)))
      .collect();

    let mut order = Vec::with_capacity(tables.len());
    while let Some(Reverse((_, i))) = ready.pop() {
      order.push(&tables[i]);
      for &next in &dependents[i] {
        in_degree[next] -= 1;
        if in_degree[next] == 0 {
          ready.push(Reverse((tables[next].tier, next)));
        }
      }
    }

    if order.len() != tables.len() {
      let stuck = tables
        .iter()
        .enumerate()
        .filter(|(i, _)| in_degree[*i] > 0)
        .map(|(_, t)| t.name.to_owned())
        .collect();
      return Err(Error::DependencyCycle(stuck));
    }

    Ok(order)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    catalog::{ColumnDef, ForeignKey, KeyRule, SourceBinding},
    value::ColumnType,
  };

  const COLUMNS: &[ColumnDef] = &[
    ColumnDef::key("id", ColumnType::Text),
    ColumnDef::legislative("other_id", ColumnType::Text),
  ];

  const fn fk(references: &'static str, forward: bool) -> ForeignKey {
    ForeignKey { columns: &["other_id"], references, forward }
  }

  const fn table(
    name: &'static str,
    tier: Tier,
    foreign_keys: &'static [ForeignKey],
  ) -> TableDef {
    TableDef {
      name,
      tier,
      columns: COLUMNS,
      foreign_keys,
      legislative: Some(SourceBinding { staging: name, key: KeyRule::Direct }),
      document: None,
      seed: None,
    }
  }

  const TO_A: &[ForeignKey] = &[fk("a", false)];
  const TO_B: &[ForeignKey] = &[fk("b", false)];
  const FORWARD_TO_A: &[ForeignKey] = &[fk("a", true)];

  static CYCLE: &[TableDef] = &[
    table("a", Tier::Entity, TO_B),
    table("b", Tier::Entity, TO_A),
    table("c", Tier::Collection, &[]),
  ];

  static FORWARD: &[TableDef] = &[
    table("a", Tier::Entity, TO_B),
    table("b", Tier::Entity, FORWARD_TO_A),
  ];

  #[test]
  fn cycles_are_reported_with_their_members() {
    let err = Catalog::new(CYCLE).write_order().unwrap_err();
    let Error::DependencyCycle(tables) = err else { panic!("expected cycle") };
    assert_eq!(tables, vec!["a".to_owned(), "b".to_owned()]);
  }

  #[test]
  fn forward_references_break_cycles() {
    let order: Vec<_> = Catalog::new(FORWARD)
      .write_order()
      .unwrap()
      .into_iter()
      .map(|t| t.name)
      .collect();
    assert_eq!(order, vec!["b", "a"]);
  }

  #[test]
  fn amendments_do_not_depend_on_themselves() {
    let graph = Catalog::bicam().graph();
    let deps: Vec<_> = graph.dependencies_of("amendments").collect();
    assert_eq!(deps, vec!["bills", "congresses", "treaties"]);
  }

  #[test]
  fn write_order_is_stable() {
    let names = |c: Catalog| -> Vec<&str> {
      c.write_order().unwrap().into_iter().map(|t| t.name).collect()
    };
    assert_eq!(names(Catalog::bicam()), names(Catalog::bicam()));
  }
}

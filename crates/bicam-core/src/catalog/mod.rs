//! The declarative table catalog: one field-rule table for every canonical table.
//!
//! Each canonical table is plain data: its columns with their types and
//! precedence rules, the staging tables that feed it, how a staged row's key
//! maps onto the canonical key, and its foreign keys. One generic merge
//! function interprets this; adding an entity type is a catalog change.

mod bicam;

use std::collections::BTreeSet;

use crate::{
  Error, Result,
  graph::DependencyGraph,
  precedence::Precedence,
  resolve::PackageScheme,
  source::Source,
  value::{ColumnType, Key, Row, Value},
};

// ─── Columns ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  /// Part of the natural key, in declaration order.
  Key,
  /// A mergeable field and its precedence rule.
  Field(Precedence),
}

/// A value computed from another staged column when the mapped one is
/// absent or null.
#[derive(Debug, Clone, Copy)]
pub struct Derivation {
  /// Staged column the value is computed from.
  pub from:   &'static str,
  pub derive: fn(&str) -> Option<String>,
}

impl Derivation {
  /// Apply to a staged row. A missing or non-text source column reads as
  /// the empty string.
  pub fn apply(&self, staged: &Row) -> Option<Value> {
    let text = staged.get(self.from).and_then(Value::as_text).unwrap_or_default();
    (self.derive)(text).map(Value::Text)
  }
}

/// One canonical column and the staging column it is read from in each
/// source (`None` when the source never supplies it).
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
  pub name:        &'static str,
  pub ty:          ColumnType,
  pub role:        Role,
  pub legislative: Option<&'static str>,
  pub document:    Option<&'static str>,
  pub derived:     Option<Derivation>,
}

impl ColumnDef {
  /// A key column read under the same name from both sources.
  pub const fn key(name: &'static str, ty: ColumnType) -> Self {
    Self {
      name,
      ty,
      role: Role::Key,
      legislative: Some(name),
      document: Some(name),
      derived: None,
    }
  }

  /// A field only the legislative source supplies.
  pub const fn legislative(name: &'static str, ty: ColumnType) -> Self {
    Self {
      name,
      ty,
      role: Role::Field(Precedence::Legislative),
      legislative: Some(name),
      document: None,
      derived: None,
    }
  }

  /// A field only the document source supplies.
  pub const fn document(name: &'static str, ty: ColumnType) -> Self {
    Self {
      name,
      ty,
      role: Role::Field(Precedence::Document),
      legislative: None,
      document: Some(name),
      derived: None,
    }
  }

  /// A field both sources supply under the same name, resolved by `rule`.
  pub const fn shared(
    name: &'static str,
    ty: ColumnType,
    rule: Precedence,
  ) -> Self {
    Self {
      name,
      ty,
      role: Role::Field(rule),
      legislative: Some(name),
      document: Some(name),
      derived: None,
    }
  }

  /// A field of a seeded reference table; no staging source feeds it.
  pub const fn fixed(name: &'static str, ty: ColumnType) -> Self {
    Self {
      name,
      ty,
      role: Role::Field(Precedence::Legislative),
      legislative: None,
      document: None,
      derived: None,
    }
  }

  pub const fn with_rule(mut self, rule: Precedence) -> Self {
    self.role = Role::Field(rule);
    self
  }

  /// Read this column from a differently named legislative staging column.
  pub const fn from_legislative(mut self, column: &'static str) -> Self {
    self.legislative = Some(column);
    self
  }

  /// Read this column from a differently named document staging column.
  pub const fn from_document(mut self, column: &'static str) -> Self {
    self.document = Some(column);
    self
  }

  /// Fall back to `derive(staged[from])` when the mapped column is missing.
  pub const fn derived(
    mut self,
    from: &'static str,
    derive: fn(&str) -> Option<String>,
  ) -> Self {
    self.derived = Some(Derivation { from, derive });
    self
  }

  pub fn source_column(&self, source: Source) -> Option<&'static str> {
    match source {
      Source::Legislative => self.legislative,
      Source::Document => self.document,
    }
  }

  pub fn rule(&self) -> Option<Precedence> {
    match self.role {
      Role::Key => None,
      Role::Field(rule) => Some(rule),
    }
  }

  pub fn is_key(&self) -> bool { self.role == Role::Key }
}

// ─── Foreign keys ────────────────────────────────────────────────────────────

/// A reference from `columns` to the full key of `references`.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
  pub columns:    &'static [&'static str],
  pub references: &'static str,
  /// A forward reference: it does not constrain write order and is satisfied
  /// only at commit (self references, amendment-amends-amendment).
  pub forward:    bool,
}

impl ForeignKey {
  pub const fn to(columns: &'static [&'static str], references: &'static str) -> Self {
    Self { columns, references, forward: false }
  }

  pub const fn forward(
    columns: &'static [&'static str],
    references: &'static str,
  ) -> Self {
    Self { columns, references, forward: true }
  }
}

// ─── Source bindings ─────────────────────────────────────────────────────────

/// How a staged row's canonical key is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRule {
  /// Every key column is present in the staged row.
  Direct,
  /// The first key column is derived from a document package identifier.
  Package {
    scheme: PackageScheme,
    column: &'static str,
  },
  /// The first key column is found by walking the bridge table from the row's
  /// package and granule identifiers.
  Bridge {
    package_column: &'static str,
    granule_column: &'static str,
  },
}

/// The staging table a canonical table reads from, for one source.
#[derive(Debug, Clone, Copy)]
pub struct SourceBinding {
  pub staging: &'static str,
  pub key:     KeyRule,
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Write tiers, in the order the reconciler fills them. Within a tier the
/// dependency graph decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
  /// Static lookups (version codes, title types).
  Reference,
  /// Entities with no foreign keys to other entities.
  Foundation,
  /// Entities referencing foundation entities or each other.
  Entity,
  /// Document-source provenance side-tables.
  Metadata,
  /// Child collections and cross-entity link tables.
  Collection,
  /// Full text blobs.
  Text,
  /// Committee meetings and their links to bills, treaties, nominations and
  /// hearings.
  Meeting,
}

#[derive(Debug)]
pub struct TableDef {
  pub name:         &'static str,
  pub tier:         Tier,
  pub columns:      &'static [ColumnDef],
  pub foreign_keys: &'static [ForeignKey],
  pub legislative:  Option<SourceBinding>,
  pub document:     Option<SourceBinding>,
  /// Seed rows for reference tables.
  pub seed:         Option<fn() -> Vec<Row>>,
}

impl TableDef {
  pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn key_columns(&self) -> impl Iterator<Item = &'static ColumnDef> + use<> {
    self.columns.iter().filter(|c| c.is_key())
  }

  pub fn field_columns(&self) -> impl Iterator<Item = &'static ColumnDef> + use<> {
    self.columns.iter().filter(|c| !c.is_key())
  }

  pub fn binding(&self, source: Source) -> Option<SourceBinding> {
    match source {
      Source::Legislative => self.legislative,
      Source::Document => self.document,
    }
  }

  /// Extract the natural key from a canonical row.
  pub fn key_of(&self, row: &Row) -> Key {
    Key(
      self
        .key_columns()
        .map(|c| row.get(c.name).cloned().unwrap_or(Value::Null))
        .collect(),
    )
  }

  fn invalid(&self, column: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRule {
      table:  self.name.to_owned(),
      column: column.to_owned(),
      reason: reason.into(),
    }
  }

  fn invalid_fk(&self, reason: impl Into<String>) -> Error {
    Error::InvalidForeignKey {
      table:  self.name.to_owned(),
      reason: reason.into(),
    }
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// A set of table definitions. Cheap to copy; the definitions are static.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
  tables: &'static [TableDef],
}

impl Catalog {
  pub const fn new(tables: &'static [TableDef]) -> Self { Self { tables } }

  /// The BICAM canonical schema.
  pub const fn bicam() -> Self { Self::new(bicam::TABLES) }

  pub fn tables(&self) -> &'static [TableDef] { self.tables }

  pub fn table(&self, name: &str) -> Result<&'static TableDef> {
    self
      .tables
      .iter()
      .find(|t| t.name == name)
      .ok_or_else(|| Error::UnknownTable(name.to_owned()))
  }

  /// The declared dependency graph over this catalog.
  pub fn graph(&self) -> DependencyGraph { DependencyGraph::from_catalog(*self) }

  /// Tables in the order they must be written.
  pub fn write_order(&self) -> Result<Vec<&'static TableDef>> {
    self.graph().write_order(*self)
  }

  /// Check the catalog for rules that could not be applied deterministically
  /// or foreign keys that could never be satisfied.
  pub fn validate(&self) -> Result<()> {
    let mut names = BTreeSet::new();
    for table in self.tables {
      if !names.insert(table.name) {
        return Err(Error::InvalidRule {
          table:  table.name.to_owned(),
          column: String::new(),
          reason: "table declared twice".into(),
        });
      }
    }

    for table in self.tables {
      validate_columns(table)?;
      self.validate_foreign_keys(table)?;
    }

    self.write_order().map(|_| ())
  }

  fn validate_foreign_keys(&self, table: &TableDef) -> Result<()> {
    for fk in table.foreign_keys {
      let target = self
        .table(fk.references)
        .map_err(|_| table.invalid_fk(format!("unknown table {:?}", fk.references)))?;

      let target_key: Vec<_> = target.key_columns().collect();
      if target_key.len() != fk.columns.len() {
        return Err(table.invalid_fk(format!(
          "{:?} has {} columns but the key of {} has {}",
          fk.columns,
          fk.columns.len(),
          target.name,
          target_key.len()
        )));
      }

      for (column, target_column) in fk.columns.iter().zip(&target_key) {
        let col = table
          .column(column)
          .ok_or_else(|| table.invalid_fk(format!("unknown column {column:?}")))?;
        if col.ty != target_column.ty {
          return Err(table.invalid_fk(format!(
            "{column} is {} but {}.{} is {}",
            col.ty.name(),
            target.name,
            target_column.name,
            target_column.ty.name()
          )));
        }
      }

      if target.name == table.name && !fk.forward {
        return Err(table.invalid_fk("self references must be forward"));
      }
      if !fk.forward && target.tier > table.tier {
        return Err(table.invalid_fk(format!(
          "{} ({:?}) is written after {} ({:?})",
          target.name, target.tier, table.name, table.tier
        )));
      }
    }
    Ok(())
  }
}

fn validate_columns(table: &TableDef) -> Result<()> {
  let mut seen = BTreeSet::new();
  for col in table.columns {
    if !seen.insert(col.name) {
      return Err(table.invalid(col.name, "column declared twice"));
    }
  }

  if table.key_columns().next().is_none() {
    return Err(table.invalid("", "table has no key columns"));
  }

  if table.tier == Tier::Reference {
    if table.seed.is_none() {
      return Err(table.invalid("", "reference table without seed rows"));
    }
    if table.legislative.is_some() || table.document.is_some() {
      return Err(table.invalid("", "reference tables are not staged"));
    }
    return Ok(());
  }

  if table.legislative.is_none() && table.document.is_none() {
    return Err(table.invalid("", "table has no staging source"));
  }

  for col in table.columns {
    for source in Source::ALL {
      if col.source_column(source).is_some()
        && table.binding(source).is_none()
        && !col.is_key()
      {
        return Err(table.invalid(
          col.name,
          format!("mapped from {source} but the table has no {source} binding"),
        ));
      }
    }

    let Some(rule) = col.rule() else { continue };

    let bound: Vec<Source> = Source::ALL
      .into_iter()
      .filter(|s| col.source_column(*s).is_some() && table.binding(*s).is_some())
      .collect();
    if bound.is_empty() {
      return Err(table.invalid(col.name, "no source supplies this field"));
    }
    if let Some(owner) = rule.exclusive_to()
      && !bound.contains(&owner)
    {
      return Err(table.invalid(
        col.name,
        format!("rule {} names a source the column is not read from", rule.name()),
      ));
    }

    match rule {
      Precedence::Max if !col.ty.is_ordered() => {
        return Err(table.invalid(col.name, "max requires an integer or timestamp"));
      }
      Precedence::Union
        if !matches!(
          col.ty,
          ColumnType::Text | ColumnType::Id | ColumnType::Int | ColumnType::Bool
        ) =>
      {
        return Err(table.invalid(col.name, "union requires a scalar type"));
      }
      _ => {}
    }
  }
  Ok(())
}

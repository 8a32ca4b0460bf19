//! Key equivalence between the legislative and document sources.
//!
//! A staged row's canonical key comes from one of three places, chosen per
//! table and source by the catalog's [`KeyRule`]: the row carries the shared
//! identifier directly, the identifier is derived from a document package id,
//! or it is looked up in the scraped bridge table. Nothing is fuzzy; a row
//! whose key cannot be determined is reported as unresolved.

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt,
  sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
  catalog::{KeyRule, TableDef},
  source::Source,
  value::{Key, Row, Value},
};

// ─── Package id derivations ──────────────────────────────────────────────────

static BILL_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?i)BILLS-(\d+)([a-z]+?)(\d+)([a-z]+)$").unwrap()
});

static REPORT_PACKAGE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(?i)CRPT-(\d+)([a-z]+)(\d+)$").unwrap());

static HEARING_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?i)(?:GPO-)?CHRG-(\d+)([a-z]+)(\d.*)$").unwrap()
});

static PRINT_PACKAGE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(?i)CPRT-(\d+)([a-z]+)(\d+)$").unwrap());

static TREATY_PACKAGE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(?i)CDOC-(\d+)tdoc(\d+)$").unwrap());

/// Document collections whose package ids encode the canonical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageScheme {
  /// `BILLS-118hr1ih` → `hr1-118` (text version `IH`).
  Bill,
  /// `CRPT-118hrpt860` → `hrpt860-118`.
  Report,
  /// `CHRG-118hhrg53874` → `hhrg53874-118`.
  Hearing,
  /// `CPRT-118HPRT12345` → `hprt12345-118`.
  Print,
  /// `CDOC-118tdoc5` → `td118-5`.
  Treaty,
}

impl PackageScheme {
  /// Derive the canonical identifier from a package id, or `None` if the
  /// package id does not follow this collection's pattern.
  pub fn derive(self, package_id: &str) -> Option<String> {
    let package_id = package_id.trim();
    let id = match self {
      Self::Bill => {
        let c = BILL_PACKAGE.captures(package_id)?;
        format!("{}{}-{}", &c[2], &c[3], &c[1])
      }
      Self::Report => {
        let c = REPORT_PACKAGE.captures(package_id)?;
        format!("{}{}-{}", &c[2], &c[3], &c[1])
      }
      Self::Hearing => {
        let c = HEARING_PACKAGE.captures(package_id)?;
        format!("{}{}-{}", &c[2], &c[3], &c[1])
      }
      Self::Print => {
        let c = PRINT_PACKAGE.captures(package_id)?;
        format!("{}{}-{}", &c[2], &c[3], &c[1])
      }
      Self::Treaty => {
        let c = TREATY_PACKAGE.captures(package_id)?;
        format!("td{}-{}", &c[1], &c[2])
      }
    };
    Some(id.to_ascii_lowercase())
  }

  /// The bill text version code a bill package id carries (`IH`, `ENR`, ...).
  pub fn bill_version(package_id: &str) -> Option<String> {
    BILL_PACKAGE
      .captures(package_id.trim())
      .map(|c| c[4].to_ascii_uppercase())
  }
}

// ─── Bridge table ────────────────────────────────────────────────────────────

/// One scraped (package, granule) → entity key association.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BridgeLink {
  pub package_id: String,
  pub granule_id: String,
  pub entity_key: String,
}

/// Result of walking the bridge for one granule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeLookup<'a> {
  Missing,
  Unique(&'a str),
  /// More than one entity claims the granule.
  Ambiguous(Vec<&'a str>),
}

#[derive(Debug, Clone, Default)]
pub struct BridgeTable {
  links: BTreeMap<(String, String), BTreeSet<String>>,
}

impl BridgeTable {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, link: BridgeLink) {
    self
      .links
      .entry((link.package_id, link.granule_id))
      .or_default()
      .insert(link.entity_key);
  }

  pub fn lookup(&self, package_id: &str, granule_id: &str) -> BridgeLookup<'_> {
    let Some(keys) = self
      .links
      .get(&(package_id.to_owned(), granule_id.to_owned()))
    else {
      return BridgeLookup::Missing;
    };
    let mut keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    match keys.len() {
      0 => BridgeLookup::Missing,
      1 => BridgeLookup::Unique(keys.remove(0)),
      _ => BridgeLookup::Ambiguous(keys),
    }
  }

  pub fn len(&self) -> usize { self.links.values().map(BTreeSet::len).sum() }

  pub fn is_empty(&self) -> bool { self.links.is_empty() }
}

impl FromIterator<BridgeLink> for BridgeTable {
  fn from_iter<I: IntoIterator<Item = BridgeLink>>(iter: I) -> Self {
    let mut table = Self::new();
    for link in iter {
      table.insert(link);
    }
    table
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Why a staged row could not be given a canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
  /// A key column is absent or null in the staged row.
  MissingKey { column: &'static str },
  /// A key value cannot be read as the key column's type.
  InvalidKey { column: &'static str, value: String },
  /// The package id does not match its collection's pattern.
  UnparseablePackage { package_id: String },
  NoBridge { package_id: String, granule_id: String },
  AmbiguousBridge {
    package_id: String,
    granule_id: String,
    candidates: Vec<String>,
  },
}

impl fmt::Display for Unresolved {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingKey { column } => write!(f, "missing key column {column}"),
      Self::InvalidKey { column, value } => {
        write!(f, "invalid value {value:?} for key column {column}")
      }
      Self::UnparseablePackage { package_id } => {
        write!(f, "cannot derive a key from package {package_id}")
      }
      Self::NoBridge { package_id, granule_id } => {
        write!(f, "no bridge link for {package_id}/{granule_id}")
      }
      Self::AmbiguousBridge { package_id, granule_id, candidates } => write!(
        f,
        "{package_id}/{granule_id} bridges to several entities: {}",
        candidates.join(", ")
      ),
    }
  }
}

/// Maps staged rows onto canonical keys.
#[derive(Debug, Clone, Copy)]
pub struct KeyResolver<'a> {
  bridges: &'a BridgeTable,
}

impl<'a> KeyResolver<'a> {
  pub fn new(bridges: &'a BridgeTable) -> Self { Self { bridges } }

  /// The canonical key of `staged`, a row from `source`'s staging table for
  /// `table`.
  pub fn resolve(
    &self,
    table: &TableDef,
    source: Source,
    staged: &Row,
  ) -> Result<Key, Unresolved> {
    let rule = table.binding(source).map_or(KeyRule::Direct, |b| b.key);
    let mut parts = Vec::new();

    for (i, column) in table.key_columns().enumerate() {
      let raw = match (i, rule) {
        (0, KeyRule::Package { scheme, column: package_column }) => {
          let package_id = text(staged, package_column)
            .ok_or(Unresolved::MissingKey { column: package_column })?;
          let id = scheme.derive(package_id).ok_or_else(|| {
            Unresolved::UnparseablePackage { package_id: package_id.to_owned() }
          })?;
          Value::Text(id)
        }
        (0, KeyRule::Bridge { package_column, granule_column }) => {
          let package_id = text(staged, package_column)
            .ok_or(Unresolved::MissingKey { column: package_column })?;
          let granule_id = text(staged, granule_column)
            .ok_or(Unresolved::MissingKey { column: granule_column })?;
          Value::Text(self.walk_bridge(package_id, granule_id)?.to_owned())
        }
        _ => {
          let name = column.source_column(source).unwrap_or(column.name);
          staged.get(name).cloned().unwrap_or_default()
        }
      };

      let value = raw.coerce(column.ty).ok_or_else(|| Unresolved::InvalidKey {
        column: column.name,
        value:  raw.to_string(),
      })?;
      if value.is_null() {
        return Err(Unresolved::MissingKey { column: column.name });
      }
      parts.push(value);
    }

    Ok(Key(parts))
  }

  fn walk_bridge(
    &self,
    package_id: &str,
    granule_id: &str,
  ) -> Result<&'a str, Unresolved> {
    match self.bridges.lookup(package_id, granule_id) {
      BridgeLookup::Unique(key) => Ok(key),
      BridgeLookup::Missing => Err(Unresolved::NoBridge {
        package_id: package_id.to_owned(),
        granule_id: granule_id.to_owned(),
      }),
      BridgeLookup::Ambiguous(keys) => Err(Unresolved::AmbiguousBridge {
        package_id: package_id.to_owned(),
        granule_id: granule_id.to_owned(),
        candidates: keys.into_iter().map(str::to_owned).collect(),
      }),
    }
  }
}

fn text<'r>(row: &'r Row, column: &str) -> Option<&'r str> {
  row
    .get(column)
    .and_then(Value::as_text)
    .map(str::trim)
    .filter(|s| !s.is_empty())
}

//! Seed rows for the static reference tables.
//!
//! These are small lookups that other tables point at with foreign keys. They
//! are written first in every run and carry [`Provenance::Static`].
//!
//! [`Provenance::Static`]: crate::source::Provenance::Static

use crate::value::{Row, Value, row};

/// GPO bill text version codes: (code, name, chamber).
const BILL_VERSION_CODES: &[(&str, &str, Option<&str>)] = &[
  ("AS", "Amendment Ordered to be Printed (Senate)", Some("senate")),
  ("ASH", "Additional Sponsors House", Some("house")),
  ("ATH", "Agreed to House", Some("house")),
  ("ATS", "Agreed to Senate", Some("senate")),
  ("CDH", "Committee Discharged House", Some("house")),
  ("CDS", "Committee Discharged Senate", Some("senate")),
  ("CPH", "Considered and Passed House", Some("house")),
  ("CPS", "Considered and Passed Senate", Some("senate")),
  ("EAH", "Engrossed Amendment House", Some("house")),
  ("EAS", "Engrossed Amendment Senate", Some("senate")),
  ("EH", "Engrossed in House", Some("house")),
  ("ENR", "Enrolled Bill", None),
  ("ES", "Engrossed in Senate", Some("senate")),
  ("FPH", "Failed Passage House", Some("house")),
  ("FPS", "Failed Passage Senate", Some("senate")),
  ("IH", "Introduced in House", Some("house")),
  ("IPH", "Indefinitely Postponed in House", Some("house")),
  ("IPS", "Indefinitely Postponed in Senate", Some("senate")),
  ("IS", "Introduced in Senate", Some("senate")),
  ("LTH", "Laid on Table in House", Some("house")),
  ("LTS", "Laid on Table in Senate", Some("senate")),
  ("PCH", "Placed on Calendar House", Some("house")),
  ("PCS", "Placed on Calendar Senate", Some("senate")),
  ("PP", "Public Print", None),
  ("RCH", "Reference Change House", Some("house")),
  ("RCS", "Reference Change Senate", Some("senate")),
  ("RDH", "Received in House", Some("house")),
  ("RDS", "Received in Senate", Some("senate")),
  ("RFH", "Referred in House", Some("house")),
  ("RFS", "Referred in Senate", Some("senate")),
  ("RH", "Reported in House", Some("house")),
  ("RIH", "Referral Instructions House", Some("house")),
  ("RIS", "Referral Instructions Senate", Some("senate")),
  ("RS", "Reported in Senate", Some("senate")),
  ("RTH", "Referred to Committee House", Some("house")),
  ("RTS", "Referred to Committee Senate", Some("senate")),
  ("SC", "Sponsor Change", None),
];

const TITLE_TYPE_CODES: &[(i64, &str)] = &[
  (6, "Official Title as Introduced"),
  (7, "Official Titles as Amended by House"),
  (8, "Official Titles as Amended by Senate"),
  (9, "Official Title as Agreed to by House and Senate"),
  (14, "Short Titles as Introduced"),
  (17, "Short Titles as Passed House"),
  (18, "Short Titles as Passed Senate"),
  (19, "Short Titles as Enacted"),
  (22, "Short Titles as Introduced for portions of this bill"),
  (23, "Short Titles as Reported to House for portions of this bill"),
  (24, "Short Titles as Reported to Senate for portions of this bill"),
  (25, "Short Titles as Passed House for portions of this bill"),
  (26, "Short Titles as Passed Senate for portions of this bill"),
  (27, "Short Titles as Enacted for portions of this bill"),
  (30, "Popular Title"),
  (45, "Display Title"),
  (101, "Short Title(s) as Introduced"),
  (102, "Short Title(s) as Reported to House"),
  (103, "Short Title(s) as Reported to Senate"),
  (104, "Short Title(s) as Passed House"),
  (105, "Short Title(s) as Passed Senate"),
  (106, "Short Title(s) as Introduced for portions of this bill"),
  (107, "Short Title(s) as Reported to House for portions of this bill"),
  (108, "Short Title(s) as Reported to Senate for portions of this bill"),
  (109, "Short Title(s) as Passed House for portions of this bill"),
  (110, "Short Title(s) as Passed Senate for portions of this bill"),
  (147, "Short Title(s) from ENR (Enrolled) bill text"),
  (250, "Short Title(s) from Engrossed Amendment Senate"),
  (
    253,
    "Short Title(s) from Engrossed Amendment House for portions of this bill",
  ),
  (
    254,
    "Short Title(s) from Engrossed Amendment Senate for portions of this bill",
  ),
];

/// Bill summary version codes. The code alone is not unique ("00" is both
/// introduced-in-House and introduced-in-Senate), so the action description
/// is part of the key.
const SUMMARY_VERSION_CODES: &[(&str, &str, Option<&str>)] = &[
  ("00", "Introduced in House", Some("house")),
  ("00", "Introduced in Senate", Some("senate")),
  ("01", "Reported to Senate with amendment(s)", Some("senate")),
  ("02", "Reported to Senate amended, 1st committee reporting", Some("senate")),
  ("03", "Reported to Senate amended, 2nd committee reporting", Some("senate")),
  ("04", "Reported to Senate amended, 3rd committee reporting", Some("senate")),
  ("07", "Reported to House", Some("house")),
  ("08", "Reported to House, Part I", Some("house")),
  ("09", "Reported to House, Part II", Some("house")),
  (
    "12",
    "Reported to Senate without amendment, 1st committee reporting",
    Some("senate"),
  ),
  (
    "13",
    "Reported to Senate without amendment, 2nd committee reporting",
    Some("senate"),
  ),
  ("17", "Reported to House with amendment(s)", Some("house")),
  ("18", "Reported to House amended, Part I", Some("house")),
  ("19", "Reported to House amended Part II", Some("house")),
  ("20", "Reported to House amended, Part III", Some("house")),
  ("21", "Reported to House amended, Part IV", Some("house")),
  ("22", "Reported to House amended, Part V", Some("house")),
  ("25", "Reported to Senate", Some("senate")),
  ("28", "Reported to House without amendment, Part I", Some("house")),
  ("29", "Reported to House without amendment, Part II", Some("house")),
  ("31", "Reported to House without amendment, Part IV", Some("house")),
  ("33", "Laid on table in House", Some("house")),
  ("34", "Indefinitely postponed in Senate", Some("senate")),
  ("35", "Passed Senate amended", Some("senate")),
  ("36", "Passed House amended", Some("house")),
  ("37", "Failed of passage in Senate", Some("senate")),
  ("38", "Failed of passage in House", Some("house")),
  ("39", "Senate agreed to House amendment with amendment", Some("senate")),
  ("40", "House agreed to Senate amendment with amendment", Some("house")),
  ("43", "Senate disagreed to House amendment", Some("senate")),
  ("44", "House disagreed to Senate amendment", Some("house")),
  ("45", "Senate receded and concurred with amendment", Some("senate")),
  ("46", "House receded and concurred with amendment", Some("house")),
  ("47", "Conference report filed in Senate", Some("senate")),
  ("48", "Conference report filed in House", Some("house")),
  ("49", "Public Law", None),
  ("51", "Line item veto by President", None),
  ("52", "Passed Senate amended, 2nd occurrence", Some("senate")),
  ("53", "Passed House", Some("house")),
  ("54", "Passed House, 2nd occurrence", Some("house")),
  ("55", "Passed Senate", Some("senate")),
  ("56", "Senate vitiated passage of bill after amendment", Some("senate")),
  ("58", "Motion to recommit bill as amended by Senate", Some("senate")),
  ("59", "House agreed to Senate amendment", Some("house")),
  (
    "60",
    "Senate agreed to House amendment with amendment, 2nd occurrence",
    Some("senate"),
  ),
  (
    "62",
    "House agreed to Senate amendment with amendment, 2nd occurrence",
    Some("house"),
  ),
  (
    "66",
    "House receded and concurred with amendment, 2nd occurrence",
    Some("house"),
  ),
  ("70", "House agreed to Senate amendment without amendment", Some("house")),
  ("71", "Senate agreed to House amendment without amendment", Some("senate")),
  ("74", "Senate agreed to House amendment", Some("senate")),
  ("77", "Discharged from House committee", Some("house")),
  ("78", "Discharged from Senate committee", Some("senate")),
  ("79", "Reported to House without amendment", Some("house")),
  ("80", "Reported to Senate without amendment", Some("senate")),
  ("81", "Passed House without amendment", Some("house")),
  ("82", "Passed Senate without amendment", Some("senate")),
  (
    "83",
    "Conference report filed in Senate, 2nd conference report",
    Some("senate"),
  ),
  (
    "86",
    "Conference report filed in House, 2nd conference report",
    Some("house"),
  ),
  (
    "87",
    "Conference report filed in House, 3rd conference report",
    Some("house"),
  ),
];

pub fn bill_version_codes() -> Vec<Row> {
  BILL_VERSION_CODES
    .iter()
    .map(|(code, name, chamber)| {
      row([
        ("version_code", (*code).into()),
        ("version_name", (*name).into()),
        ("chamber", Value::from(*chamber)),
      ])
    })
    .collect()
}

pub fn title_type_codes() -> Vec<Row> {
  TITLE_TYPE_CODES
    .iter()
    .map(|(code, description)| {
      row([
        ("title_type_code", (*code).into()),
        ("description", (*description).into()),
      ])
    })
    .collect()
}

pub fn summary_version_codes() -> Vec<Row> {
  SUMMARY_VERSION_CODES
    .iter()
    .map(|(code, desc, chamber)| {
      row([
        ("version_code", (*code).into()),
        ("action_desc", (*desc).into()),
        ("chamber", Value::from(*chamber)),
      ])
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  #[test]
  fn summary_codes_are_unique_on_code_and_description() {
    let keys: BTreeSet<_> =
      SUMMARY_VERSION_CODES.iter().map(|(c, d, _)| (c, d)).collect();
    assert_eq!(keys.len(), SUMMARY_VERSION_CODES.len());
  }

  #[test]
  fn version_codes_are_upper_case() {
    for (code, ..) in BILL_VERSION_CODES {
      assert_eq!(*code, code.to_ascii_uppercase());
    }
  }
}

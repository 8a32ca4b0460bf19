//! The BICAM canonical schema.
//!
//! Column names are canonical; `.from_legislative(..)` / `.from_document(..)`
//! name the staging column when a source spells it differently.

use super::{ColumnDef, ForeignKey, KeyRule, SourceBinding, TableDef, Tier};
use crate::{
  precedence::Precedence::{Max, PreferDocument, PreferLegislative, Union},
  reference,
  resolve::PackageScheme,
  value::ColumnType::{Bool, Chamber, Code, Id, Int, Text, Timestamp},
};

const fn key(name: &'static str, ty: crate::value::ColumnType) -> ColumnDef {
  ColumnDef::key(name, ty)
}
const fn leg(name: &'static str, ty: crate::value::ColumnType) -> ColumnDef {
  ColumnDef::legislative(name, ty)
}
const fn doc(name: &'static str, ty: crate::value::ColumnType) -> ColumnDef {
  ColumnDef::document(name, ty)
}
const fn fixed(name: &'static str, ty: crate::value::ColumnType) -> ColumnDef {
  ColumnDef::fixed(name, ty)
}
const fn fk(columns: &'static [&'static str], references: &'static str) -> ForeignKey {
  ForeignKey::to(columns, references)
}

const fn direct(staging: &'static str) -> Option<SourceBinding> {
  Some(SourceBinding { staging, key: KeyRule::Direct })
}
const fn package(staging: &'static str, scheme: PackageScheme) -> Option<SourceBinding> {
  Some(SourceBinding {
    staging,
    key: KeyRule::Package { scheme, column: "package_id" },
  })
}
const fn bridged(staging: &'static str) -> Option<SourceBinding> {
  Some(SourceBinding {
    staging,
    key: KeyRule::Bridge {
      package_column: "package_id",
      granule_column: "granule_id",
    },
  })
}

/// `"true"` when a staged id column holds a value, `"false"` otherwise.
fn present(id: &str) -> Option<String> {
  let id = id.trim();
  Some((!id.is_empty() && id != "-99").to_string())
}

/// Public law ids are the law number with a `PL` prefix (`PL118-5`).
fn public_law_id(law_number: &str) -> Option<String> {
  let number = law_number.trim();
  (!number.is_empty()).then(|| format!("PL{number}"))
}

/// `updated_at` from the legislative record, `last_modified` from the
/// document package, whichever is later.
const LAST_UPDATE: ColumnDef =
  ColumnDef::shared("updated_at", Timestamp, Max).from_document("last_modified");

pub(super) static TABLES: &[TableDef] = &[
  // ─── Reference ───
  TableDef {
    name:         "ref_bill_version_codes",
    tier:         Tier::Reference,
    columns:      &[
      key("version_code", Code),
      fixed("version_name", Text),
      fixed("chamber", Chamber),
    ],
    foreign_keys: &[],
    legislative:  None,
    document:     None,
    seed:         Some(reference::bill_version_codes),
  },
  TableDef {
    name:         "ref_title_type_codes",
    tier:         Tier::Reference,
    columns:      &[key("title_type_code", Int), fixed("description", Text)],
    foreign_keys: &[],
    legislative:  None,
    document:     None,
    seed:         Some(reference::title_type_codes),
  },
  TableDef {
    name:         "ref_bill_summary_version_codes",
    tier:         Tier::Reference,
    columns:      &[
      key("version_code", Code),
      key("action_desc", Text),
      fixed("chamber", Chamber),
    ],
    foreign_keys: &[],
    legislative:  None,
    document:     None,
    seed:         Some(reference::summary_version_codes),
  },
  // ─── Foundation ───
  TableDef {
    name:         "congresses",
    tier:         Tier::Foundation,
    columns:      &[
      key("congress", Int),
      leg("name", Text),
      leg("start_year", Int),
      leg("end_year", Int),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[],
    legislative:  direct("congresses"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "members",
    tier:         Tier::Foundation,
    columns:      &[
      key("bioguide_id", Text),
      leg("direct_order_name", Text),
      leg("first_name", Text),
      leg("last_name", Text),
      leg("party", Text),
      ColumnDef::shared("state", Text, PreferLegislative),
      leg("district", Int),
      leg("birth_year", Int),
      leg("death_year", Int),
      leg("is_current_member", Bool),
      ColumnDef::shared("official_url", Text, PreferLegislative),
      doc("biography", Text),
      doc("twitter_url", Text),
      doc("facebook_url", Text),
      doc("youtube_url", Text),
      doc("instagram_url", Text),
      leg("sponsored_legislation_count", Int),
      leg("cosponsored_legislation_count", Int),
      LAST_UPDATE,
    ],
    foreign_keys: &[],
    legislative:  direct("members"),
    document:     bridged("congressional_directory_granules"),
    seed:         None,
  },
  TableDef {
    name:         "committees",
    tier:         Tier::Foundation,
    columns:      &[
      key("committee_code", Text),
      leg("name", Text),
      leg("chamber", Chamber),
      leg("committee_type", Text),
      leg("parent_committee_code", Text),
      leg("is_current", Bool),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[ForeignKey::forward(&["parent_committee_code"], "committees")],
    legislative:  direct("committees"),
    document:     None,
    seed:         None,
  },
  // ─── Entities ───
  TableDef {
    name:         "bills",
    tier:         Tier::Entity,
    columns:      &[
      key("bill_id", Id),
      ColumnDef::shared("congress", Int, PreferLegislative),
      leg("bill_type", Text),
      leg("bill_number", Int),
      ColumnDef::shared("title", Text, PreferLegislative),
      ColumnDef::shared("origin_chamber", Chamber, PreferLegislative)
        .from_document("chamber"),
      leg("introduced_at", Timestamp).from_legislative("introduced_date"),
      leg("policy_area", Text),
      leg("is_law", Bool),
      doc("is_appropriation", Bool),
      doc("is_private", Bool),
      doc("pages", Int),
      leg("actions_count", Int),
      leg("cosponsors_count", Int),
      ColumnDef::shared("texts_count", Int, Union).from_document("version_count"),
      ColumnDef::shared("subjects", Text, Union)
        .from_legislative("legislative_subjects"),
      LAST_UPDATE,
    ],
    foreign_keys: &[fk(&["congress"], "congresses")],
    legislative:  direct("bills"),
    document:     package("bill_collections", PackageScheme::Bill),
    seed:         None,
  },
  TableDef {
    name:         "treaties",
    tier:         Tier::Entity,
    columns:      &[
      key("treaty_id", Id),
      ColumnDef::shared("congress_received", Int, PreferLegislative)
        .from_document("congress"),
      leg("topic", Text),
      doc("title", Text),
      doc("summary", Text),
      leg("transmitted_at", Timestamp).from_legislative("transmitted_date"),
      doc("pages", Int),
      LAST_UPDATE,
    ],
    foreign_keys: &[fk(&["congress_received"], "congresses")],
    legislative:  direct("treaties"),
    document:     package("treaty_docs", PackageScheme::Treaty),
    seed:         None,
  },
  TableDef {
    name:         "hearings",
    tier:         Tier::Entity,
    columns:      &[
      key("hearing_id", Id),
      ColumnDef::shared("congress", Int, PreferLegislative),
      ColumnDef::shared("chamber", Chamber, PreferLegislative),
      ColumnDef::shared("title", Text, PreferDocument),
      leg("committee_code", Text),
      leg("citation", Text),
      leg("jacket_number", Text),
      doc("pages", Int),
      doc("is_appropriation", Bool),
      doc("issued_at", Timestamp).from_document("date_issued"),
      LAST_UPDATE,
    ],
    foreign_keys: &[
      fk(&["congress"], "congresses"),
      fk(&["committee_code"], "committees"),
    ],
    legislative:  direct("hearings"),
    document:     package("congressional_hearings", PackageScheme::Hearing),
    seed:         None,
  },
  TableDef {
    name:         "nominations",
    tier:         Tier::Entity,
    columns:      &[
      key("nomination_id", Text),
      leg("congress", Int),
      leg("citation", Text),
      leg("description", Text),
      leg("organization", Text),
      leg("received_at", Timestamp).from_legislative("received_date"),
      leg("is_privileged", Bool),
      leg("is_civilian", Bool),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[fk(&["congress"], "congresses")],
    legislative:  direct("nominations"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "amendments",
    tier:         Tier::Entity,
    columns:      &[
      key("amendment_id", Id),
      leg("congress", Int),
      leg("amendment_type", Text),
      leg("amendment_number", Int),
      leg("chamber", Chamber),
      leg("purpose", Text),
      leg("description", Text),
      leg("submitted_at", Timestamp).from_legislative("submitted_date"),
      leg("amended_bill_id", Id),
      leg("amended_treaty_id", Id),
      leg("amended_amendment_id", Id),
      leg("is_bill_amendment", Bool).derived("amended_bill_id", present),
      leg("is_treaty_amendment", Bool).derived("amended_treaty_id", present),
      leg("is_amendment_amendment", Bool).derived("amended_amendment_id", present),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[
      fk(&["congress"], "congresses"),
      fk(&["amended_bill_id"], "bills"),
      fk(&["amended_treaty_id"], "treaties"),
      ForeignKey::forward(&["amended_amendment_id"], "amendments"),
    ],
    legislative:  direct("amendments"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "committeereports",
    tier:         Tier::Entity,
    columns:      &[
      key("report_id", Id),
      ColumnDef::shared("congress", Int, PreferLegislative),
      ColumnDef::shared("chamber", Chamber, PreferLegislative),
      ColumnDef::shared("title", Text, PreferDocument),
      doc("subtitle", Text),
      leg("report_type", Text),
      leg("citation", Text),
      leg("is_conference_report", Bool),
      doc("pages", Int),
      ColumnDef::shared("issued_at", Timestamp, PreferDocument)
        .from_legislative("issue_date")
        .from_document("date_issued"),
      LAST_UPDATE,
    ],
    foreign_keys: &[fk(&["congress"], "congresses")],
    legislative:  direct("committeereports"),
    document:     package("congressional_reports", PackageScheme::Report),
    seed:         None,
  },
  TableDef {
    name:         "committeeprints",
    tier:         Tier::Entity,
    columns:      &[
      key("print_id", Id),
      ColumnDef::shared("congress", Int, PreferLegislative),
      ColumnDef::shared("chamber", Chamber, PreferLegislative),
      ColumnDef::shared("title", Text, PreferDocument),
      leg("jacket_number", Text),
      doc("document_number", Text),
      doc("pages", Int),
      doc("issued_at", Timestamp).from_document("date_issued"),
      LAST_UPDATE,
    ],
    foreign_keys: &[fk(&["congress"], "congresses")],
    legislative:  direct("committeeprints"),
    document:     package("committee_prints", PackageScheme::Print),
    seed:         None,
  },
  // ─── Metadata side-tables (document source only) ───
  TableDef {
    name:         "bills_metadata",
    tier:         Tier::Metadata,
    columns:      &[
      key("bill_id", Id),
      key("package_id", Text),
      doc("bill_version", Code).derived("package_id", PackageScheme::bill_version),
      doc("collection_code", Text),
      doc("su_doc_class_number", Text),
      doc("pdf_url", Text),
      doc("xml_url", Text),
      doc("txt_url", Text),
      doc("last_modified", Timestamp),
    ],
    foreign_keys: &[
      fk(&["bill_id"], "bills"),
      fk(&["bill_version"], "ref_bill_version_codes"),
    ],
    legislative:  None,
    document:     package("bill_collections", PackageScheme::Bill),
    seed:         None,
  },
  TableDef {
    name:         "treaties_metadata",
    tier:         Tier::Metadata,
    columns:      &[
      key("treaty_id", Id),
      key("package_id", Text),
      doc("collection_code", Text),
      doc("su_doc_class_number", Text),
      doc("pdf_url", Text),
      doc("last_modified", Timestamp),
    ],
    foreign_keys: &[fk(&["treaty_id"], "treaties")],
    legislative:  None,
    document:     package("treaty_docs", PackageScheme::Treaty),
    seed:         None,
  },
  TableDef {
    name:         "hearings_metadata",
    tier:         Tier::Metadata,
    columns:      &[
      key("hearing_id", Id),
      key("package_id", Text),
      doc("collection_code", Text),
      doc("su_doc_class_number", Text),
      doc("pdf_url", Text),
      doc("txt_url", Text),
      doc("last_modified", Timestamp),
    ],
    foreign_keys: &[fk(&["hearing_id"], "hearings")],
    legislative:  None,
    document:     package("congressional_hearings", PackageScheme::Hearing),
    seed:         None,
  },
  TableDef {
    name:         "committeereports_metadata",
    tier:         Tier::Metadata,
    columns:      &[
      key("report_id", Id),
      key("package_id", Text),
      doc("collection_code", Text),
      doc("su_doc_class_number", Text),
      doc("pdf_url", Text),
      doc("txt_url", Text),
      doc("last_modified", Timestamp),
    ],
    foreign_keys: &[fk(&["report_id"], "committeereports")],
    legislative:  None,
    document:     package("congressional_reports", PackageScheme::Report),
    seed:         None,
  },
  TableDef {
    name:         "committeeprints_metadata",
    tier:         Tier::Metadata,
    columns:      &[
      key("print_id", Id),
      key("package_id", Text),
      doc("collection_code", Text),
      doc("su_doc_class_number", Text),
      doc("pdf_url", Text),
      doc("txt_url", Text),
      doc("last_modified", Timestamp),
    ],
    foreign_keys: &[fk(&["print_id"], "committeeprints")],
    legislative:  None,
    document:     package("committee_prints", PackageScheme::Print),
    seed:         None,
  },
  TableDef {
    name:         "members_metadata",
    tier:         Tier::Metadata,
    columns:      &[
      key("bioguide_id", Text),
      key("granule_id", Text),
      doc("package_id", Text),
      doc("gpo_id", Text),
      doc("authority_id", Text),
      doc("member_type", Text),
      doc("last_modified", Timestamp),
    ],
    foreign_keys: &[fk(&["bioguide_id"], "members")],
    legislative:  None,
    document:     bridged("congressional_directory_granules"),
    seed:         None,
  },
  // ─── Collections and links ───
  TableDef {
    name:         "bill_actions",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("action_id", Text),
      ColumnDef::shared("action_date", Timestamp, PreferLegislative),
      ColumnDef::shared("action_text", Text, PreferLegislative),
      ColumnDef::shared("action_type", Text, PreferLegislative),
      ColumnDef::shared("action_code", Text, PreferLegislative),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills")],
    legislative:  direct("bill_actions"),
    document:     direct("bill_actions"),
    seed:         None,
  },
  TableDef {
    name:         "bill_titles",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("title_type_code", Int),
      key("title", Text),
      leg("chamber", Chamber),
      leg("bill_text_version_code", Code),
    ],
    foreign_keys: &[
      fk(&["bill_id"], "bills"),
      fk(&["title_type_code"], "ref_title_type_codes"),
      fk(&["bill_text_version_code"], "ref_bill_version_codes"),
    ],
    legislative:  direct("bill_titles"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bill_summaries",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("version_code", Code),
      key("action_desc", Text),
      leg("action_date", Timestamp),
      leg("summary_text", Text),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[
      fk(&["bill_id"], "bills"),
      fk(&["version_code", "action_desc"], "ref_bill_summary_version_codes"),
    ],
    legislative:  direct("bill_summaries"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bill_sponsors",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("bioguide_id", Text),
      leg("is_by_request", Bool),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills"), fk(&["bioguide_id"], "members")],
    legislative:  direct("bill_sponsors"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bill_cosponsors",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("bioguide_id", Text),
      leg("sponsorship_date", Timestamp),
      leg("is_original_cosponsor", Bool),
      leg("sponsorship_withdrawn_date", Timestamp),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills"), fk(&["bioguide_id"], "members")],
    legislative:  direct("bill_cosponsors"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bill_committees",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("committee_code", Text),
      leg("activities", Text)
        .from_legislative("activity")
        .with_rule(Union),
    ],
    foreign_keys: &[
      fk(&["bill_id"], "bills"),
      fk(&["committee_code"], "committees"),
    ],
    legislative:  direct("bill_committees"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bill_related_bills",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("related_bill_id", Id),
      leg("relationship_type", Text),
      leg("identified_by", Text),
    ],
    foreign_keys: &[
      fk(&["bill_id"], "bills"),
      fk(&["related_bill_id"], "bills"),
    ],
    legislative:  direct("bill_related_bills"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bill_reference_codes",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("reference_code", Text),
      doc("sections", Text).with_rule(Union),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills")],
    legislative:  None,
    document:     package("bill_collections_reference_codes", PackageScheme::Bill),
    seed:         None,
  },
  TableDef {
    name:         "members_terms",
    tier:         Tier::Collection,
    columns:      &[
      key("bioguide_id", Text),
      key("congress", Int),
      key("chamber", Chamber),
      leg("member_type", Text),
      leg("start_year", Int),
      leg("end_year", Int),
      leg("state_code", Text),
      leg("district", Int),
    ],
    foreign_keys: &[
      fk(&["bioguide_id"], "members"),
      fk(&["congress"], "congresses"),
    ],
    legislative:  direct("members_terms"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "committeereports_bills",
    tier:         Tier::Collection,
    columns:      &[key("report_id", Id), key("bill_id", Id)],
    foreign_keys: &[
      fk(&["report_id"], "committeereports"),
      fk(&["bill_id"], "bills"),
    ],
    legislative:  direct("committeereports_associated_bills"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "nominations_committees",
    tier:         Tier::Collection,
    columns:      &[
      key("nomination_id", Text),
      key("committee_code", Text),
      leg("activity", Text),
    ],
    foreign_keys: &[
      fk(&["nomination_id"], "nominations"),
      fk(&["committee_code"], "committees"),
    ],
    legislative:  direct("nominations_committees"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bills_laws",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("law_number", Text),
      leg("law_type", Text),
      leg("law_id", Text).derived("law_number", public_law_id),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills")],
    legislative:  direct("bills_laws"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bills_notes",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("note_number", Int),
      leg("note_text", Text),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills")],
    legislative:  direct("bills_notes"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bills_notes_links",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("note_number", Int),
      key("link_number", Int),
      leg("link_name", Text),
      leg("link_url", Text),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[fk(&["bill_id", "note_number"], "bills_notes")],
    legislative:  direct("bills_notes_links"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bills_cbocostestimates",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("url", Text),
      leg("title", Text),
      leg("description", Text),
      leg("published_at", Timestamp).from_legislative("pub_date"),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills")],
    legislative:  direct("bills_cbocostestimates"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "bill_actions_recorded_votes",
    tier:         Tier::Collection,
    columns:      &[
      key("bill_id", Id),
      key("action_id", Text),
      key("roll_number", Int),
      leg("chamber", Chamber),
      leg("congress", Int),
      leg("session", Int),
      leg("voted_at", Timestamp).from_legislative("date"),
      leg("url", Text),
    ],
    foreign_keys: &[
      fk(&["bill_id", "action_id"], "bill_actions"),
      fk(&["congress"], "congresses"),
    ],
    legislative:  direct("bill_actions_recorded_votes"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "amendments_amended_bills",
    tier:         Tier::Collection,
    columns:      &[key("amendment_id", Id), key("bill_id", Id)],
    foreign_keys: &[
      fk(&["amendment_id"], "amendments"),
      fk(&["bill_id"], "bills"),
    ],
    legislative:  direct("amendments_amended_bills"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "amendments_amended_treaties",
    tier:         Tier::Collection,
    columns:      &[key("amendment_id", Id), key("treaty_id", Id)],
    foreign_keys: &[
      fk(&["amendment_id"], "amendments"),
      fk(&["treaty_id"], "treaties"),
    ],
    legislative:  direct("amendments_amended_treaties"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "amendments_amended_amendments",
    tier:         Tier::Collection,
    columns:      &[key("amendment_id", Id), key("amended_amendment_id", Id)],
    foreign_keys: &[
      fk(&["amendment_id"], "amendments"),
      fk(&["amended_amendment_id"], "amendments"),
    ],
    legislative:  direct("amendments_amended_amendments"),
    document:     None,
    seed:         None,
  },
  // ─── Texts ───
  TableDef {
    name:         "bill_texts",
    tier:         Tier::Text,
    columns:      &[
      key("bill_id", Id),
      key("url", Text),
      leg("version_type", Text),
      leg("version_date", Timestamp),
      leg("raw_text", Text),
    ],
    foreign_keys: &[fk(&["bill_id"], "bills")],
    legislative:  direct("bill_texts"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "hearing_texts",
    tier:         Tier::Text,
    columns:      &[key("hearing_id", Id), key("url", Text), leg("raw_text", Text)],
    foreign_keys: &[fk(&["hearing_id"], "hearings")],
    legislative:  direct("hearing_texts"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "committeereport_texts",
    tier:         Tier::Text,
    columns:      &[key("report_id", Id), key("url", Text), leg("raw_text", Text)],
    foreign_keys: &[fk(&["report_id"], "committeereports")],
    legislative:  direct("committeereport_texts"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "amendments_texts",
    tier:         Tier::Text,
    columns:      &[
      key("amendment_id", Id),
      key("text_type", Text).from_legislative("type"),
      key("text_date", Timestamp).from_legislative("date"),
      leg("pdf_url", Text).from_legislative("pdf"),
      leg("html_url", Text).from_legislative("html"),
      leg("raw_text", Text),
    ],
    foreign_keys: &[fk(&["amendment_id"], "amendments")],
    legislative:  direct("amendments_texts"),
    document:     None,
    seed:         None,
  },
  // One staged row per rendition; collapsing fills each url column.
  TableDef {
    name:         "committeeprints_texts",
    tier:         Tier::Text,
    columns:      &[
      key("print_id", Id),
      leg("formatted_text_url", Text).from_legislative("formatted_text"),
      leg("pdf_url", Text).from_legislative("pdf"),
      leg("html_url", Text).from_legislative("html"),
      leg("raw_text", Text),
    ],
    foreign_keys: &[fk(&["print_id"], "committeeprints")],
    legislative:  direct("committeeprints_texts"),
    document:     None,
    seed:         None,
  },
  // ─── Committee meetings ───
  TableDef {
    name:         "committeemeetings",
    tier:         Tier::Meeting,
    columns:      &[
      key("meeting_id", Text),
      leg("congress", Int),
      leg("chamber", Chamber),
      leg("committee_code", Text),
      leg("title", Text),
      leg("meeting_type", Text),
      leg("meeting_status", Text),
      leg("meeting_date", Timestamp),
      leg("location", Text),
      leg("updated_at", Timestamp),
    ],
    foreign_keys: &[
      fk(&["congress"], "congresses"),
      fk(&["committee_code"], "committees"),
    ],
    legislative:  direct("committeemeetings"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "committeemeeting_bills",
    tier:         Tier::Meeting,
    columns:      &[key("meeting_id", Text), key("bill_id", Id)],
    foreign_keys: &[
      fk(&["meeting_id"], "committeemeetings"),
      fk(&["bill_id"], "bills"),
    ],
    legislative:  direct("committeemeetings_associated_bills"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "committeemeeting_treaties",
    tier:         Tier::Meeting,
    columns:      &[key("meeting_id", Text), key("treaty_id", Id)],
    foreign_keys: &[
      fk(&["meeting_id"], "committeemeetings"),
      fk(&["treaty_id"], "treaties"),
    ],
    legislative:  direct("committeemeetings_associated_treaties"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "committeemeeting_nominations",
    tier:         Tier::Meeting,
    columns:      &[key("meeting_id", Text), key("nomination_id", Text)],
    foreign_keys: &[
      fk(&["meeting_id"], "committeemeetings"),
      fk(&["nomination_id"], "nominations"),
    ],
    legislative:  direct("committeemeetings_associated_nominations"),
    document:     None,
    seed:         None,
  },
  TableDef {
    name:         "committeemeeting_hearings",
    tier:         Tier::Meeting,
    columns:      &[key("meeting_id", Text), key("hearing_id", Id)],
    foreign_keys: &[
      fk(&["meeting_id"], "committeemeetings"),
      fk(&["hearing_id"], "hearings"),
    ],
    legislative:  direct("committeemeetings_associated_hearings"),
    document:     None,
    seed:         None,
  },
];

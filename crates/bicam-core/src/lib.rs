//! Core types, the field-rule catalog and the reconciliation engine for BICAM.
//!
//! This crate is deliberately free of database dependencies. It consumes
//! staged rows from the legislative-metadata source and the
//! document-repository source, and produces one canonical row set. Storage
//! backends implement [`store::BicamStore`]; the [`pipeline`] functions drive
//! them.

pub mod backfill;
pub mod canonical;
pub mod catalog;
pub mod error;
pub mod graph;
pub mod merge;
pub mod pipeline;
pub mod precedence;
pub mod reconcile;
pub mod reference;
pub mod resolve;
pub mod source;
pub mod staging;
pub mod store;
pub mod value;

pub use error::{Error, Result};

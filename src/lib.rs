//! HomeKey - property intelligence aggregation.
//!
//! Looks an address up in several independent data sources at once, merges
//! whatever came back into one record with per-source confidence, records a
//! snapshot, and produces a short plain-language summary.

pub mod address;
pub mod aggregator;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod sources;
pub mod store;
pub mod summary;

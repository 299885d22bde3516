// src/printer/mod.rs

//! Report rendering and run-summary printing for _alalib_.
//!
//! The aggregation engine only exposes read accessors; everything here
//! consumes those and writes text. The report file layout follows the
//! fixed section order: run header, filter rules, interval summary table,
//! slowest-request listings, URL frequency table, optional full 5xx/4xx
//! listings.

pub mod report;
pub mod summary;

//! Aggregation and rollup engine behind the student well-being dashboard.
//!
//! A request resolves a gender/age-range selection into a [`filter::Predicate`],
//! plans each report's grouping, averages the requested measures per group,
//! optionally appends rollup rows, and shapes the result into the report's
//! JSON contract. [`engine::run_dashboard`] computes all five reports over one
//! snapshot from a [`source::FactSource`].

pub mod aggregate;
pub mod db;
pub mod engine;
pub mod error;
pub mod filter;
pub mod models;
pub mod plan;
pub mod report;
pub mod rollup;
pub mod source;

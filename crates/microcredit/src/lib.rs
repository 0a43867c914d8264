//! Pricing, proposal-record, and debt-instrument engine behind the micro-loan origination site.
//!
//! The [`origination`] module holds the pure arithmetic (quote table, written-out amounts,
//! due-date cadence). [`proposals`] layers the record model, reconciliation, document assembly
//! and the service facade on top of it, while [`stores`] and [`collaborators`] provide the I/O
//! adapters the service is wired with at runtime.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod origination;
pub mod proposals;
pub mod stores;
pub mod telemetry;

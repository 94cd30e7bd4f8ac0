//! Reasoning over the knowledge base: select rows for a modality and phase,
//! then collapse them into one row per CQA.
//!
//! "No results" is data, not an error: a query that matches nothing returns
//! the single `No data found` row.

mod aggregator;
mod options;

pub use aggregator::{query, JOIN_SEPARATOR};
pub use options::{options, QueryOptions};

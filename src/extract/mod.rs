//! Page content extractors
//!
//! Two independent extractors run over fetched bodies: the link extractor
//! feeding the candidate pipeline, and the pluck-rule engine producing the
//! structured payload stored with each completed URL.

mod data;
mod links;

pub use data::{DataExtractor, PluckRule};
pub use links::extract_links;

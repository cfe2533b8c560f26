//! Catalog synchronization pipeline.
//!
//! - `bounds`: commit timestamp windows over the index and pages
//! - `CatalogProcessor`: one pass from the cursor to the upper bound
//! - `run_until_success` / `poll`: loops around passes

pub mod bounds;
mod processor;
mod runner;

pub use bounds::{select_leaves, select_pages};
pub use processor::{CatalogProcessor, PassOutcome, PassState, PassSummary};
pub use runner::{poll, run_until_success};

//! # Pipeline Module
//!
//! Orchestrates one aggregation run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Enumerate candidate files under the root
//! 2. **Extract** - Dispatch every file to the active mode's extractor
//! 3. **Collect** - Sort the trackers into report sections
//! 4. **Materialize** - Optionally write distinct embedded images
//!
//! ## Parallelism
//! Files are independent work items. Under [`Execution::Parallel`] they are
//! spread over a rayon pool and race on the shared trackers, whose locks
//! keep one slot per distinct value. Each worker owns its own hasher.

mod executor;

pub use executor::{Aggregator, AggregatorBuilder, Execution, RunConfig, RunReport};

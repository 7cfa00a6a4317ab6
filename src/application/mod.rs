//! Application Layer - pipeline orchestration
//!
//! The detector runs the poll-classify-persist cycle; the enricher turns its
//! output into the published report entries.

pub mod detector;
pub mod enricher;

pub use detector::{CycleOutcome, DetectorConfig, DetectorError, MigrationDetector};
pub use enricher::Enricher;

//! # Core Module
//!
//! The GUI-agnostic organizing engine.
//!
//! ## Modules
//! - `scanner` - Discovers documents and builds file records
//! - `hasher` - Content fingerprints
//! - `extract` - Text extraction capability and summaries
//! - `duplicates` - Exact-duplicate clusters
//! - `grouping` - Classification, response parsing, extension fallback
//! - `plan` - Pure move plans
//! - `apply` - Moves, metadata and undo
//! - `session` - Per-folder state, undo stack and outcome codes

pub mod apply;
pub mod duplicates;
pub mod extract;
pub mod grouping;
pub mod hasher;
pub mod plan;
pub mod scanner;
pub mod session;

// Re-export commonly used types
pub use duplicates::DuplicateCluster;
pub use grouping::{Classifier, GroupProposal, GroupingOutcome};
pub use hasher::Fingerprint;
pub use plan::{MoveOperation, MovePlan};
pub use scanner::FileRecord;

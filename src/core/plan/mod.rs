//! # Plan Module
//!
//! Joins duplicate clusters and group proposals into one [`MovePlan`]:
//! every relocation an apply will perform, with unique destinations.
//! Building a plan is pure, so the preview shows exactly what will happen.

mod planner;
mod types;

pub use planner::{
    sanitize_group_name, PlanBuilder, DUPLICATES_FOLDER, DUPLICATES_RATIONALE,
    METADATA_FILE,
};
pub use types::*;

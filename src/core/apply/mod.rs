//! # Apply Module
//!
//! Executes a [`MovePlan`](crate::core::plan::MovePlan) and reverses it.
//!
//! ## Guarantees
//! - Operations run in plan order; a failing one is skipped, never fatal
//! - Metadata is written after the move phase and covers only real moves
//! - The returned [`UndoEntry`] lists exactly the moves that happened
//! - Undo runs last move first and never overwrites a file

mod executor;
mod metadata;
mod undo;

pub use executor::{ApplyEngine, ApplyReport, SkippedMove};
pub use metadata::{render_group_metadata, write_metadata, MetadataWriteResult, SUMMARY_FILE};
pub use undo::{undo, undo_with_events, FailedRestore, UndoEntry, UndoReport};

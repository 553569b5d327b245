//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every event the engine emits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Scan(ScanEvent),
    Group(GroupEvent),
    Apply(ApplyEvent),
    Undo(UndoEvent),
    Session(SessionEvent),
}

/// Events during the scan phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    Started { root: PathBuf },
    /// A file was fingerprinted and summarized
    FileScanned { relative_path: String, scanned: usize },
    /// A file could not be read or extracted; the scan continues
    Warning { path: PathBuf, message: String },
    Completed { total_files: usize, warnings: usize },
}

/// Events during the grouping phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    /// The classification request is about to be sent
    Requesting { model: String, files: usize },
    /// The classifier failed or answered with nothing usable
    FallbackUsed { reason: String },
    Completed { groups: usize, used_fallback: bool },
}

/// Events while moving files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApplyEvent {
    Started { total_moves: usize },
    Progress(MoveProgress),
    Skipped { source: PathBuf, reason: String },
    Completed { moved: usize, skipped: usize },
}

/// Progress through a plan or an undo entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveProgress {
    pub completed: usize,
    pub total: usize,
    pub current: PathBuf,
}

/// Events while reversing an apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UndoEvent {
    Started { total_moves: usize },
    Progress(MoveProgress),
    Failed { path: PathBuf, reason: String },
    Completed { restored: usize, warnings: usize },
}

/// Session bookkeeping around the engine operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Settings were re-read for an operation
    SettingsLoaded { origin: String },
    /// An undo entry was dropped because a newer apply replaced it
    UndoDiscarded { plan_id: String },
    /// An operation did not run
    Failed { detail: String },
}

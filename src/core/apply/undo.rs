//! Reversal of one apply.

use super::executor::move_file;
use crate::core::plan::{MoveOperation, METADATA_FILE};
use crate::error::UndoError;
use crate::events::{null_sender, Event, EventSender, MoveProgress, UndoEvent};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Exactly the moves one apply performed, in the order it performed them
#[derive(Debug, Clone)]
pub struct UndoEntry {
    /// Id of the applied plan
    pub id: String,
    pub created_at: DateTime<Local>,
    pub output_root: PathBuf,
    pub operations: Vec<MoveOperation>,
    /// Metadata files the apply wrote
    pub metadata_files: Vec<PathBuf>,
}

impl UndoEntry {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Destination folders in first-use order, without repeats
    fn destination_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for op in &self.operations {
            if let Some(parent) = op.destination.parent() {
                if !dirs.iter().any(|d| d == parent) {
                    dirs.push(parent.to_path_buf());
                }
            }
        }
        dirs
    }
}

/// A move that could not be reversed
#[derive(Debug)]
pub struct FailedRestore {
    pub operation: MoveOperation,
    pub error: UndoError,
}

/// What one undo did
#[derive(Debug, Default)]
pub struct UndoReport {
    pub restored: usize,
    pub failures: Vec<FailedRestore>,
    /// Folders or metadata files that could not be removed
    pub removal_warnings: Vec<String>,
}

impl UndoReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn undo(entry: &UndoEntry) -> UndoReport {
    undo_with_events(entry, &null_sender())
}

/// Reverse an apply, last move first.
///
/// A failed reversal is reported and the rest continue. Afterwards the
/// apply's group `metadata.txt` files and destination folders are removed
/// where nothing else is left in them. The CSV export is not touched.
pub fn undo_with_events(entry: &UndoEntry, events: &EventSender) -> UndoReport {
    let total = entry.operations.len();
    info!(plan = %entry.id, total_moves = total, "undoing apply");
    events.send(Event::Undo(UndoEvent::Started { total_moves: total }));

    let mut report = UndoReport::default();

    for (i, operation) in entry.operations.iter().rev().enumerate() {
        events.send(Event::Undo(UndoEvent::Progress(MoveProgress {
            completed: i + 1,
            total,
            current: operation.destination.clone(),
        })));

        match restore(operation) {
            Ok(()) => report.restored += 1,
            Err(error) => {
                warn!(path = %operation.destination.display(), %error, "restore failed");
                events.send(Event::Undo(UndoEvent::Failed {
                    path: operation.destination.clone(),
                    reason: error.to_string(),
                }));
                report.failures.push(FailedRestore {
                    operation: operation.clone(),
                    error,
                });
            }
        }
    }

    for dir in entry.destination_dirs() {
        remove_if_emptied(&dir, &entry.metadata_files, &mut report.removal_warnings);
    }
    for warning in &report.removal_warnings {
        warn!(%warning, "cleanup after undo incomplete");
    }

    info!(
        restored = report.restored,
        failures = report.failures.len(),
        "undo finished"
    );
    events.send(Event::Undo(UndoEvent::Completed {
        restored: report.restored,
        warnings: report.removal_warnings.len(),
    }));

    report
}

fn restore(operation: &MoveOperation) -> Result<(), UndoError> {
    let (from, to) = operation.reversed();

    if !from.is_file() {
        return Err(UndoError::MovedFileMissing { path: from });
    }
    if to.exists() {
        return Err(UndoError::OriginalOccupied { path: to });
    }

    let result = match to.parent() {
        Some(parent) => fs::create_dir_all(parent).and_then(|_| move_file(&from, &to)),
        None => move_file(&from, &to),
    };
    result.map_err(|source| UndoError::Restore { from, to, source })
}

/// Remove this apply's metadata file from `dir` when it is the only thing
/// left, then the folder itself when it is empty.
fn remove_if_emptied(dir: &Path, metadata_files: &[PathBuf], warnings: &mut Vec<String>) {
    let entries: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(read) => read.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => return,
    };

    let metadata = dir.join(METADATA_FILE);
    let only_metadata = entries.len() == 1 && entries[0] == metadata;
    if only_metadata && metadata_files.contains(&metadata) {
        if let Err(e) = fs::remove_file(&metadata) {
            warnings.push(format!("{}: {}", metadata.display(), e));
            return;
        }
    } else if !entries.is_empty() {
        warnings.push(format!("{}: folder not empty, kept", dir.display()));
        return;
    }

    if let Err(e) = fs::remove_dir(dir) {
        warnings.push(format!("{}: {}", dir.display(), e));
    }
}

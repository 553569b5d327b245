//! Executor for move plans.

use super::metadata::{write_metadata, MetadataWriteResult};
use super::undo::UndoEntry;
use crate::core::plan::{MoveOperation, MovePlan};
use crate::error::MoveError;
use crate::events::{null_sender, ApplyEvent, Event, EventSender, MoveProgress};
use chrono::Local;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// An operation that was not performed. Its source file was left in place.
#[derive(Debug)]
pub struct SkippedMove {
    pub operation: MoveOperation,
    pub error: MoveError,
}

/// What one apply did
#[derive(Debug)]
pub struct ApplyReport {
    /// Exactly the operations that succeeded, ready to reverse
    pub undo_entry: UndoEntry,
    pub skipped: Vec<SkippedMove>,
    /// Metadata files that could not be written. The moves still stand.
    pub metadata_warnings: Vec<String>,
    pub folders_created: usize,
    pub duration_ms: u64,
}

impl ApplyReport {
    pub fn moved(&self) -> usize {
        self.undo_entry.operations.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Executes move plans
pub struct ApplyEngine;

impl ApplyEngine {
    /// Execute a plan. Consumes it: a plan is applied at most once.
    pub fn apply(plan: MovePlan) -> ApplyReport {
        Self::apply_with_events(plan, &null_sender())
    }

    /// Execute a plan, moving files in plan order.
    ///
    /// A failing operation is skipped and reported; the rest still run.
    /// Metadata is written after every move has been attempted and covers
    /// only the moves that succeeded.
    pub fn apply_with_events(plan: MovePlan, events: &EventSender) -> ApplyReport {
        let start = Instant::now();
        let total = plan.operations.len();
        info!(plan = %plan.id, total_moves = total, "applying plan");
        events.send(Event::Apply(ApplyEvent::Started { total_moves: total }));

        let mut moved = Vec::new();
        let mut skipped = Vec::new();
        let mut created_dirs: HashSet<PathBuf> = HashSet::new();

        for (i, operation) in plan.operations.iter().enumerate() {
            events.send(Event::Apply(ApplyEvent::Progress(MoveProgress {
                completed: i + 1,
                total,
                current: operation.source.clone(),
            })));

            match execute_operation(operation, &mut created_dirs) {
                Ok(()) => moved.push(operation.clone()),
                Err(error) => {
                    warn!(source = %operation.source.display(), %error, "move skipped");
                    events.send(Event::Apply(ApplyEvent::Skipped {
                        source: operation.source.clone(),
                        reason: error.to_string(),
                    }));
                    skipped.push(SkippedMove {
                        operation: operation.clone(),
                        error,
                    });
                }
            }
        }

        let created_at = Local::now();
        let MetadataWriteResult { written, warnings } = if moved.is_empty() {
            MetadataWriteResult::default()
        } else {
            write_metadata(&plan, &moved, &created_at)
        };
        for warning in &warnings {
            warn!(%warning, "metadata not written");
        }

        info!(
            moved = moved.len(),
            skipped = skipped.len(),
            "plan applied"
        );
        events.send(Event::Apply(ApplyEvent::Completed {
            moved: moved.len(),
            skipped: skipped.len(),
        }));

        ApplyReport {
            undo_entry: UndoEntry {
                id: plan.id,
                created_at,
                output_root: plan.output_root,
                operations: moved,
                metadata_files: written,
            },
            skipped,
            metadata_warnings: warnings,
            folders_created: created_dirs.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

fn execute_operation(
    operation: &MoveOperation,
    created_dirs: &mut HashSet<PathBuf>,
) -> Result<(), MoveError> {
    let source = operation.source.as_path();
    let destination = operation.destination.as_path();

    if !source.is_file() {
        return Err(MoveError::SourceMissing {
            path: source.to_path_buf(),
        });
    }
    if destination.exists() {
        return Err(MoveError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }

    if let Some(parent) = destination.parent() {
        if !created_dirs.contains(parent) && !parent.is_dir() {
            fs::create_dir_all(parent).map_err(|source| MoveError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
            created_dirs.insert(parent.to_path_buf());
        }
    }

    move_file(source, destination).map_err(|error| MoveError::Move {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: error,
    })
}

/// Move a file, keeping its modification time.
///
/// `rename` fails across filesystems; only then is the file copied, the
/// copy's size checked against the source, and the source removed. Any other
/// rename error is returned as is.
pub(super) fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, destination, |path| fs::remove_file(path))
        }
        result => result,
    }
}

/// Copy `source` to `destination`, then remove the source with `remove_source`.
///
/// On any failure the destination copy is removed again, so a failed move
/// leaves only the source behind.
fn copy_then_remove<F>(source: &Path, destination: &Path, remove_source: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let metadata = fs::metadata(source)?;
    fs::copy(source, destination)?;

    let copied = fs::metadata(destination)?.len();
    if copied != metadata.len() {
        let _ = fs::remove_file(destination);
        return Err(io::Error::other(format!(
            "Copy verification failed: source {} bytes, destination {} bytes",
            metadata.len(),
            copied
        )));
    }

    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_mtime(destination, mtime) {
        warn!(path = %destination.display(), error = %e, "could not preserve modification time");
    }

    if let Err(e) = remove_source(source) {
        if let Err(cleanup) = fs::remove_file(destination) {
            warn!(path = %destination.display(), error = %cleanup, "could not remove copy after failed move");
        }
        return Err(e);
    }
    Ok(())
}

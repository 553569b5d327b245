//! Outcome codes returned by every session operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an operation did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Settings missing or invalid
    Config,
    /// Nothing to scan or group
    EmptyInput,
    /// An operation needed a scan that has not happened
    NoScan,
    /// Apply was requested without a built plan
    NoPlan,
    /// Undo was requested with no apply to reverse
    NothingToUndo,
    /// The scanned folder could not be opened
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Config => "configuration",
            FailureKind::EmptyInput => "empty input",
            FailureKind::NoScan => "no scan",
            FailureKind::NoPlan => "no plan",
            FailureKind::NothingToUndo => "nothing to undo",
            FailureKind::Io => "I/O",
        };
        f.write_str(label)
    }
}

/// Result of one session operation.
///
/// `Failed` means the operation did not run. Every other variant means it
/// ran, possibly with some items skipped; the counts say how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Scanned {
        files: usize,
        duplicate_clusters: usize,
        warnings: usize,
    },
    Grouped {
        groups: usize,
        used_fallback: bool,
    },
    Planned {
        moves: usize,
        groups: usize,
    },
    Applied {
        moved: usize,
        skipped: usize,
    },
    Undone {
        restored: usize,
        failures: usize,
        removal_warnings: usize,
    },
    Failed {
        kind: FailureKind,
        detail: String,
    },
}

impl Outcome {
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Outcome::Failed {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    /// True when the operation ran but left some items behind
    pub fn is_degraded(&self) -> bool {
        match self {
            Outcome::Scanned { warnings, .. } => *warnings > 0,
            Outcome::Grouped { used_fallback, .. } => *used_fallback,
            Outcome::Applied { skipped, .. } => *skipped > 0,
            Outcome::Undone {
                failures,
                removal_warnings,
                ..
            } => *failures > 0 || *removal_warnings > 0,
            _ => false,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Scanned {
                files,
                duplicate_clusters,
                warnings,
            } => write!(
                f,
                "Scanned {} files ({} duplicate sets, {} warnings)",
                files, duplicate_clusters, warnings
            ),
            Outcome::Grouped {
                groups,
                used_fallback,
            } => {
                write!(f, "Grouped into {} groups", groups)?;
                if *used_fallback {
                    write!(f, " (by extension)")?;
                }
                Ok(())
            }
            Outcome::Planned { moves, groups } => {
                write!(f, "Planned {} moves into {} folders", moves, groups)
            }
            Outcome::Applied { moved, skipped } => {
                write!(f, "Moved {} files, skipped {}", moved, skipped)
            }
            Outcome::Undone {
                restored,
                failures,
                removal_warnings,
            } => write!(
                f,
                "Restored {} files ({} failed, {} cleanup warnings)",
                restored, failures, removal_warnings
            ),
            Outcome::Failed { kind, detail } => write!(f, "Failed ({}): {}", kind, detail),
        }
    }
}

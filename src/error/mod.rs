//! # Error Module
//!
//! Error types for the document organizer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Contain per-item failures** - one file, one move or one reversal never aborts a batch
//! - **Include context** - paths, file names, what went wrong
//! - **Only two fatal conditions** - bad configuration and an empty input set

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Grouping error: {0}")]
    Grouping(#[from] GroupingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation that did not run, already rendered for the user
    #[error("Operation did not run: {0}")]
    Aborted(String),
}

/// Errors that stop a scan before it starts
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file text extraction failure. The scan continues with an empty summary.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read text from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract text from {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Failure talking to the classification service. Triggers the fallback.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Classification request failed: {0}")]
    Transport(String),

    #[error("Classification request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Classification service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Classification service rejected the credential (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Classification response had no text")]
    EmptyResponse,
}

/// The classifier answered, but nothing usable could be read from it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Response contained no recognizable group structure")]
    NoGroups,

    #[error("Response groups did not name any scanned file")]
    NoKnownFiles,
}

/// Fatal grouping conditions
#[derive(Error, Debug)]
pub enum GroupingError {
    #[error("No files to group")]
    NothingToGroup,
}

/// Per-operation filesystem failure while applying a plan
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-operation failure while reversing an apply
#[derive(Error, Debug)]
pub enum UndoError {
    #[error("Moved file is gone: {path}")]
    MovedFileMissing { path: PathBuf },

    #[error("Original location is occupied: {path}")]
    OriginalOccupied { path: PathBuf },

    #[error("Failed to restore {from} to {to}: {source}")]
    Restore {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Missing or invalid settings. Surfaced before any scan or apply runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found at {path}. Run `doc-organize init-config` to create one.")]
    NotFound { path: PathBuf },

    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Missing required setting `{0}`")]
    Missing(&'static str),

    #[error("Similarity threshold {0} is outside 0.0-1.0")]
    InvalidThreshold(f32),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrganizerError>;

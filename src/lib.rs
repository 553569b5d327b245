//! # Document Organizer
//!
//! Sorts a folder of documents into topic folders, with exact-duplicate
//! detection and a reversible apply.
//!
//! ## Core Philosophy
//! - **Never move without confirmation** - a plan is always previewed first
//! - **Never drop a file** - every scanned file lands in some group
//! - **Always reversible** - the most recent apply can be undone
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - Scanning, duplicates, grouping, planning, apply/undo, sessions
//! - `config` - Settings record, re-read per operation
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - Error taxonomy

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use config::{Settings, SettingsSource};
pub use core::session::{FailureKind, OrganizerSession, Outcome};
pub use error::{OrganizerError, Result};

/// Initialize tracing for the library
///
/// Called by the application entry point. Reads `RUST_LOG` unless `verbose`
/// forces debug output. Logs go to stderr so JSON output stays clean.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // A subscriber may already be installed by an embedding application
    let _ = tracing::subscriber::set_global_default(subscriber);
}

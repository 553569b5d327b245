//! # Scanner Module
//!
//! Walks a folder, fingerprints every supported document and extracts a
//! short text summary for the classifier.
//!
//! A scan only reads. Unreadable files are kept with an empty summary and a
//! zero fingerprint and counted as warnings; they never abort the scan.
//!
//! ## Example
//! ```rust,ignore
//! use document_organizer::core::scanner::{DocumentScanner, ScanConfig};
//!
//! let scanner = DocumentScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/Users/me/Documents"))?;
//! println!("{} files, {} warnings", result.records.len(), result.warnings.len());
//! ```

mod filter;
mod walker;

pub use filter::ExtensionFilter;
pub use walker::{DocumentScanner, ScanConfig, ScanItem, ScanIter};

use crate::core::hasher::Fingerprint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One scanned file. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path at scan time
    pub path: PathBuf,
    /// Path from the scanned root, `/`-separated
    pub relative_path: String,
    /// Content fingerprint (zero sentinel if unreadable)
    pub fingerprint: Fingerprint,
    /// Bounded text summary, possibly empty
    pub summary: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
}

impl FileRecord {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.relative_path)
    }

    /// Lower-cased extension without the dot, empty if none
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }
}

/// A file that was kept but could not be fully read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a full scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Records ordered by relative path
    pub records: Vec<FileRecord>,
    pub warnings: Vec<ScanWarning>,
}

/// Lower-cased extension without the dot
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// `/`-separated path of `path` below `root`
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/docs");
        let path = Path::new("/docs/2024/reports/q1.pdf");
        assert_eq!(relative_path(root, path), "2024/reports/q1.pdf");
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of(Path::new("/docs/Report.PDF")), "pdf");
        assert_eq!(extension_of(Path::new("/docs/Makefile")), "");
    }
}

//! Directory walking implementation using walkdir.

use super::{filter::ExtensionFilter, relative_path, FileRecord, ScanResult, ScanWarning};
use crate::config::Settings;
use crate::core::extract::{summarize, PlainTextExtractor, TextExtractor};
use crate::core::hasher::{fingerprint_file, Fingerprint};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the document scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Extensions to include (without the dot)
    pub extensions: Vec<String>,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Maximum summary length in characters
    pub summary_chars: usize,
    /// Subtrees never scanned (the output root, typically)
    pub exclude: Vec<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: crate::config::DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            include_hidden: false,
            follow_symlinks: false,
            summary_chars: 400,
            exclude: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Scan configuration for `root` under the given settings
    pub fn from_settings(settings: &Settings, root: &Path) -> Self {
        Self {
            extensions: settings.extensions.clone(),
            include_hidden: settings.include_hidden,
            follow_symlinks: false,
            summary_chars: settings.summary_chars,
            exclude: vec![settings.output_root(root)],
        }
    }
}

/// One step of a lazy scan
#[derive(Debug, Clone)]
pub enum ScanItem {
    /// A supported file, with a warning if it could not be fully read
    Record {
        record: FileRecord,
        warning: Option<ScanWarning>,
    },
    /// An entry the walker could not visit
    Warning(ScanWarning),
}

/// Lazy, finite scan over one root. Dropping it early reads nothing further.
pub struct ScanIter<'a> {
    scanner: &'a DocumentScanner,
    root: PathBuf,
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
}

impl Iterator for ScanIter<'_> {
    type Item = ScanItem;

    fn next(&mut self) -> Option<ScanItem> {
        for entry in self.entries.by_ref() {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file()
                        || !self.scanner.filter.should_include(entry.path())
                    {
                        continue;
                    }
                    let (record, warning) = self.scanner.record_for(&self.root, entry.path());
                    return Some(ScanItem::Record { record, warning });
                }
                Err(e) => return Some(ScanItem::Warning(walk_warning(&self.root, e))),
            }
        }
        None
    }
}

/// Scanner producing [`FileRecord`]s
pub struct DocumentScanner {
    config: ScanConfig,
    filter: ExtensionFilter,
    extractor: Arc<dyn TextExtractor>,
}

impl DocumentScanner {
    /// Create a scanner that reads text-like files itself
    pub fn new(config: ScanConfig) -> Self {
        Self::with_extractor(config, Arc::new(PlainTextExtractor))
    }

    /// Create a scanner with a caller-provided extraction adapter
    pub fn with_extractor(config: ScanConfig, extractor: Arc<dyn TextExtractor>) -> Self {
        let filter =
            ExtensionFilter::new(&config.extensions).with_hidden(config.include_hidden);
        Self {
            config,
            filter,
            extractor,
        }
    }

    /// Start a lazy scan. Each call is independent.
    pub fn iter(&self, root: &Path) -> Result<ScanIter<'_>, ScanError> {
        let root = check_root(root)?;
        let entries = Box::new(self.walk(&root));
        Ok(ScanIter {
            scanner: self,
            root,
            entries,
        })
    }

    /// Scan the whole tree
    pub fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &null_sender())
    }

    /// Scan the whole tree, fingerprinting files in parallel
    pub fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        let root = check_root(root)?;
        info!(root = %root.display(), "scan started");
        events.send(Event::Scan(ScanEvent::Started { root: root.clone() }));

        let mut warnings = Vec::new();
        let mut paths = Vec::new();
        for entry in self.walk(&root) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.filter.should_include(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                Err(e) => warnings.push(walk_warning(&root, e)),
            }
        }

        let scanned = AtomicUsize::new(0);
        let results: Vec<(FileRecord, Option<ScanWarning>)> = paths
            .par_iter()
            .map(|path| {
                let (record, warning) = self.record_for(&root, path);
                events.send(Event::Scan(ScanEvent::FileScanned {
                    relative_path: record.relative_path.clone(),
                    scanned: scanned.fetch_add(1, Ordering::SeqCst) + 1,
                }));
                (record, warning)
            })
            .collect();

        let mut records = Vec::with_capacity(results.len());
        for (record, warning) in results {
            if let Some(warning) = warning {
                events.send(Event::Scan(ScanEvent::Warning {
                    path: warning.path.clone(),
                    message: warning.message.clone(),
                }));
                warnings.push(warning);
            }
            records.push(record);
        }
        records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        info!(files = records.len(), warnings = warnings.len(), "scan completed");
        events.send(Event::Scan(ScanEvent::Completed {
            total_files: records.len(),
            warnings: warnings.len(),
        }));

        Ok(ScanResult { records, warnings })
    }

    fn walk<'a>(
        &'a self,
        root: &Path,
    ) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
        let include_hidden = self.filter.include_hidden();
        // An output root at or above the scanned root means organizing in place
        let exclude: Vec<PathBuf> = self
            .config
            .exclude
            .iter()
            .filter(|excluded| !root.starts_with(excluded))
            .cloned()
            .collect();
        WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if !include_hidden && ExtensionFilter::is_hidden(entry.path()) {
                    return false;
                }
                !exclude.iter().any(|excluded| entry.path().starts_with(excluded))
            })
    }

    /// Build the record for one file. Never fails: problems degrade the record.
    fn record_for(&self, root: &Path, path: &Path) -> (FileRecord, Option<ScanWarning>) {
        let relative = relative_path(root, path);
        let mut problems = Vec::new();

        let (size, modified) = match fs::metadata(path) {
            Ok(meta) => (
                meta.len(),
                meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ),
            Err(e) => {
                problems.push(format!("metadata: {e}"));
                (0, SystemTime::UNIX_EPOCH)
            }
        };

        let fingerprint = match fingerprint_file(path) {
            Ok(fp) => Some(fp),
            Err(e) => {
                problems.push(format!("read: {e}"));
                None
            }
        };

        let summary = match fingerprint {
            // Bytes are unreadable, extraction would fail the same way
            None => String::new(),
            Some(_) => match self.extractor.extract_text(path) {
                Ok(Some(text)) => summarize(&text, self.config.summary_chars),
                Ok(None) => {
                    debug!(path = %path.display(), "no extractor for this format");
                    String::new()
                }
                Err(e) => {
                    problems.push(e.to_string());
                    String::new()
                }
            },
        };

        let warning = if problems.is_empty() {
            None
        } else {
            let message = problems.join("; ");
            warn!(path = %path.display(), %message, "file kept with degraded record");
            Some(ScanWarning {
                path: path.to_path_buf(),
                message,
            })
        };

        let record = FileRecord {
            path: path.to_path_buf(),
            relative_path: relative,
            fingerprint: fingerprint.unwrap_or_else(Fingerprint::zero),
            summary,
            size,
            modified,
        };
        (record, warning)
    }
}

fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    fs::read_dir(root).map_err(|source| {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            ScanError::PermissionDenied {
                path: root.to_path_buf(),
            }
        } else {
            ScanError::Read {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(root.to_path_buf())
}

fn walk_warning(root: &Path, error: walkdir::Error) -> ScanWarning {
    let path = error
        .path()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| root.to_path_buf());
    warn!(path = %path.display(), %error, "entry skipped during scan");
    ScanWarning {
        path,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    struct BrokenExtractor;

    impl TextExtractor for BrokenExtractor {
        fn extract_text(&self, path: &Path) -> Result<Option<String>, ExtractionError> {
            Err(ExtractionError::Unreadable {
                path: path.to_path_buf(),
                reason: "corrupt archive".to_string(),
            })
        }
    }

    #[test]
    fn scan_empty_directory_returns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let result = DocumentScanner::new(ScanConfig::default())
            .scan(temp_dir.path())
            .unwrap();

        assert!(result.records.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn scan_records_relative_paths_and_summaries() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "b.txt", b"hello   world");
        write_file(temp_dir.path(), "sub/a.md", b"# notes");

        let result = DocumentScanner::new(ScanConfig::default())
            .scan(temp_dir.path())
            .unwrap();

        let paths: Vec<_> = result.records.iter().map(|r| r.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["b.txt", "sub/a.md"]);
        assert_eq!(result.records[0].summary, "hello world");
        assert_eq!(result.records[0].size, 13);
    }

    #[test]
    fn scan_skips_unsupported_and_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "keep.txt", b"x");
        write_file(temp_dir.path(), "photo.jpg", b"x");
        write_file(temp_dir.path(), ".hidden.txt", b"x");
        write_file(temp_dir.path(), ".git/config.txt", b"x");

        let result = DocumentScanner::new(ScanConfig::default())
            .scan(temp_dir.path())
            .unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].relative_path, "keep.txt");
    }

    #[test]
    fn scan_excludes_output_root() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "a.txt", b"x");
        write_file(temp_dir.path(), "organized_files/Teks/old.txt", b"y");

        let config = ScanConfig {
            exclude: vec![temp_dir.path().join("organized_files")],
            ..Default::default()
        };
        let result = DocumentScanner::new(config).scan(temp_dir.path()).unwrap();

        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn extraction_failure_keeps_file_with_empty_summary() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "a.txt", b"content");

        let scanner =
            DocumentScanner::with_extractor(ScanConfig::default(), Arc::new(BrokenExtractor));
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].summary, "");
        assert!(!result.records[0].fingerprint.is_zero());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn lazy_iterator_matches_full_scan() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "a.txt", b"1");
        write_file(temp_dir.path(), "b.txt", b"2");

        let scanner = DocumentScanner::new(ScanConfig::default());
        let lazy: Vec<FileRecord> = scanner
            .iter(temp_dir.path())
            .unwrap()
            .filter_map(|item| match item {
                ScanItem::Record { record, .. } => Some(record),
                ScanItem::Warning(_) => None,
            })
            .collect();
        let full = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(lazy, full.records);
    }

    #[test]
    fn lazy_iterator_can_stop_early() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            write_file(temp_dir.path(), &format!("{i}.txt"), b"x");
        }

        let scanner = DocumentScanner::new(ScanConfig::default());
        assert_eq!(scanner.iter(temp_dir.path()).unwrap().take(2).count(), 2);
    }

    #[test]
    fn scan_nonexistent_directory_is_an_error() {
        let scanner = DocumentScanner::new(ScanConfig::default());
        let result = scanner.scan(Path::new("/nonexistent/path/12345"));
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }

    #[test]
    fn rescanning_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "a.txt", b"alpha");
        write_file(temp_dir.path(), "b.csv", b"x,y\n1,2");

        let scanner = DocumentScanner::new(ScanConfig::default());
        let first = scanner.scan(temp_dir.path()).unwrap();
        let second = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(first.records, second.records);
    }

    #[test]
    fn output_root_at_or_above_scan_root_is_not_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("docs");
        write_file(&root, "a.txt", b"x");
        write_file(&root, "b.md", b"y");

        for excluded in [root.join("."), root.clone(), temp_dir.path().to_path_buf()] {
            let config = ScanConfig {
                exclude: vec![excluded.clone()],
                ..Default::default()
            };
            let result = DocumentScanner::new(config).scan(&root).unwrap();
            assert_eq!(result.records.len(), 2, "excluded {}", excluded.display());
        }
    }

    #[test]
    fn unreadable_file_gets_zero_fingerprint_and_scan_continues() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "a.txt", b"first");
        let vanishing = write_file(temp_dir.path(), "b.txt", b"second");
        write_file(temp_dir.path(), "c.txt", b"third");

        let scanner = DocumentScanner::new(ScanConfig::default());
        let mut items = scanner.iter(temp_dir.path()).unwrap();
        // The sorted walk has already listed the directory
        let first = items.next().unwrap();
        fs::remove_file(&vanishing).unwrap();
        let rest: Vec<ScanItem> = items.collect();

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        for item in std::iter::once(first).chain(rest) {
            match item {
                ScanItem::Record { record, warning } => {
                    records.push(record);
                    warnings.extend(warning);
                }
                ScanItem::Warning(warning) => warnings.push(warning),
            }
        }

        assert_eq!(records.len(), 3);
        let broken = records.iter().find(|r| r.relative_path == "b.txt").unwrap();
        assert!(broken.fingerprint.is_zero());
        assert_eq!(broken.summary, "");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, vanishing);
        let third = records.iter().find(|r| r.relative_path == "c.txt").unwrap();
        assert_eq!(third.summary, "third");
        assert!(!third.fingerprint.is_zero());
    }
}

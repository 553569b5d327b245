//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Decides which files a scan picks up
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    /// Lower-cased extensions without the dot
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl ExtensionFilter {
    /// Accept the given extensions (case-insensitive, leading dot optional)
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
    }

    pub fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && Self::is_hidden(path) {
            return false;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ExtensionFilter {
        ExtensionFilter::new(["txt", ".PDF"])
    }

    #[test]
    fn matches_case_insensitively() {
        assert!(filter().should_include(Path::new("/docs/a.TXT")));
        assert!(filter().should_include(Path::new("/docs/b.pdf")));
    }

    #[test]
    fn excludes_other_extensions() {
        assert!(!filter().should_include(Path::new("/docs/photo.jpg")));
        assert!(!filter().should_include(Path::new("/docs/no_extension")));
    }

    #[test]
    fn excludes_hidden_by_default() {
        assert!(!filter().should_include(Path::new("/docs/.secret.txt")));
        assert!(filter()
            .with_hidden(true)
            .should_include(Path::new("/docs/.secret.txt")));
    }
}

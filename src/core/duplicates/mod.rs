//! # Duplicates Module
//!
//! Exact-duplicate clustering by content fingerprint.
//!
//! Pure functions over scanned records: no I/O, deterministic output.
//! Clusters come out in order of first occurrence of their fingerprint and
//! the canonical member is the one with the smallest relative path.

use crate::core::hasher::Fingerprint;
use crate::core::scanner::FileRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Two or more records sharing one fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub fingerprint: Fingerprint,
    /// Kept in its topic group
    pub canonical: FileRecord,
    /// Routed to the duplicates folder, ordered by relative path
    pub redundant: Vec<FileRecord>,
}

impl DuplicateCluster {
    /// Number of members including the canonical one
    pub fn member_count(&self) -> usize {
        self.redundant.len() + 1
    }

    /// Bytes reclaimable by dropping the redundant copies
    pub fn redundant_bytes(&self) -> u64 {
        self.redundant.iter().map(|r| r.size).sum()
    }
}

/// Cluster records by fingerprint.
///
/// Records carrying the zero sentinel (unreadable files) are never clustered.
pub fn detect_duplicates(records: &[FileRecord]) -> Vec<DuplicateCluster> {
    let mut order: Vec<&Fingerprint> = Vec::new();
    let mut buckets: HashMap<&Fingerprint, Vec<&FileRecord>> = HashMap::new();

    for record in records {
        if record.fingerprint.is_zero() {
            continue;
        }
        let bucket = buckets.entry(&record.fingerprint).or_default();
        if bucket.is_empty() {
            order.push(&record.fingerprint);
        }
        bucket.push(record);
    }

    order
        .into_iter()
        .filter_map(|fingerprint| {
            let mut members = buckets.remove(fingerprint)?;
            if members.len() < 2 {
                return None;
            }
            members.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
            let mut members = members.into_iter().cloned();
            let canonical = members.next()?;
            Some(DuplicateCluster {
                fingerprint: fingerprint.clone(),
                canonical,
                redundant: members.collect(),
            })
        })
        .collect()
}

/// Relative paths of every non-canonical member
pub fn redundant_paths(clusters: &[DuplicateCluster]) -> HashSet<&str> {
    clusters
        .iter()
        .flat_map(|c| c.redundant.iter().map(|r| r.relative_path.as_str()))
        .collect()
}

/// Human summary of the clusters, embedded in the classification prompt
pub fn describe_duplicates(clusters: &[DuplicateCluster]) -> String {
    if clusters.is_empty() {
        return "Tidak ada duplikat terdeteksi.".to_string();
    }
    let mut lines = vec!["Duplikat terdeteksi:".to_string()];
    for cluster in clusters {
        let others = cluster
            .redundant
            .iter()
            .map(|r| r.relative_path.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("- {} -> {}", cluster.canonical.relative_path, others));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::fingerprint_reader;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn record(relative: &str, content: &str) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/docs").join(relative),
            relative_path: relative.to_string(),
            fingerprint: fingerprint_reader(content.as_bytes()).unwrap(),
            summary: String::new(),
            size: content.len() as u64,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    fn unreadable(relative: &str) -> FileRecord {
        FileRecord {
            fingerprint: Fingerprint::zero(),
            ..record(relative, "")
        }
    }

    #[test]
    fn equal_fingerprints_share_a_cluster() {
        let records = vec![
            record("c.txt", "same"),
            record("x.txt", "other"),
            record("a.txt", "same"),
            record("b.txt", "same"),
        ];

        let clusters = detect_duplicates(&records);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].member_count(), 3);
        assert_eq!(clusters[0].canonical.relative_path, "a.txt");
        let redundant: Vec<_> = clusters[0]
            .redundant
            .iter()
            .map(|r| r.relative_path.as_str())
            .collect();
        assert_eq!(redundant, vec!["b.txt", "c.txt"]);
    }

    #[test]
    fn distinct_fingerprints_never_cluster() {
        let records = vec![record("a.txt", "1"), record("b.txt", "2")];
        assert!(detect_duplicates(&records).is_empty());
    }

    #[test]
    fn clusters_follow_first_occurrence_order() {
        let records = vec![
            record("z1.txt", "second"),
            record("a1.txt", "first"),
            record("z2.txt", "second"),
            record("a2.txt", "first"),
        ];

        let clusters = detect_duplicates(&records);

        assert_eq!(clusters[0].canonical.relative_path, "z1.txt");
        assert_eq!(clusters[1].canonical.relative_path, "a1.txt");
    }

    #[test]
    fn canonical_choice_ignores_input_order() {
        let forward = vec![record("b/x.txt", "dup"), record("a/x.txt", "dup")];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(
            detect_duplicates(&forward)[0].canonical,
            detect_duplicates(&backward)[0].canonical
        );
    }

    #[test]
    fn unreadable_files_are_not_duplicates_of_each_other() {
        let records = vec![unreadable("a.pdf"), unreadable("b.pdf")];
        assert!(detect_duplicates(&records).is_empty());
    }

    #[test]
    fn describe_lists_canonical_and_copies() {
        let records = vec![record("a.txt", "same"), record("b.txt", "same")];
        let text = describe_duplicates(&detect_duplicates(&records));
        assert!(text.contains("a.txt -> b.txt"));
        assert_eq!(describe_duplicates(&[]), "Tidak ada duplikat terdeteksi.");
    }

    #[test]
    fn redundant_paths_excludes_canonical() {
        let records = vec![record("a.txt", "same"), record("b.txt", "same")];
        let clusters = detect_duplicates(&records);
        let paths = redundant_paths(&clusters);
        assert!(paths.contains("b.txt"));
        assert!(!paths.contains("a.txt"));
    }
}

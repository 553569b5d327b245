//! Plan generator: merges duplicate clusters and group proposals.

use super::types::*;
use crate::core::duplicates::{redundant_paths, DuplicateCluster};
use crate::core::grouping::GroupProposal;
use crate::core::scanner::FileRecord;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Folder receiving every redundant duplicate
pub const DUPLICATES_FOLDER: &str = "Duplikat";

pub const DUPLICATES_RATIONALE: &str = "File dengan isi serupa";

/// Per-group metadata file written by apply; no planned file may take this name
pub const METADATA_FILE: &str = "metadata.txt";

const DEFAULT_GROUP_FOLDER: &str = "Kelompok";
const MAX_FOLDER_CHARS: usize = 64;
const INVALID_FOLDER_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Builds move plans. Never touches the filesystem.
pub struct PlanBuilder;

impl PlanBuilder {
    /// Build the plan for one apply.
    ///
    /// Topic groups come first in proposal order, then the duplicates folder.
    /// Redundant duplicates always go to [`DUPLICATES_FOLDER`], even when a
    /// proposal names them. Files a proposal names that are not in `records`
    /// are ignored, and a file named by two proposals moves with the first.
    pub fn build(
        records: &[FileRecord],
        clusters: &[DuplicateCluster],
        proposals: &[GroupProposal],
        output_root: &Path,
    ) -> MovePlan {
        let by_path: HashMap<&str, &FileRecord> = records
            .iter()
            .map(|r| (r.relative_path.as_str(), r))
            .collect();
        let redundant = redundant_paths(clusters);

        let mut folders = FolderNames::default();
        let mut destinations = Destinations::default();
        let mut planned: HashSet<&str> = HashSet::new();
        let mut operations = Vec::new();
        let mut groups = Vec::new();

        for proposal in proposals {
            let members: Vec<&FileRecord> = proposal
                .files
                .iter()
                .filter(|path| !redundant.contains(path.as_str()))
                .filter_map(|path| {
                    let record = by_path.get(path.as_str()).copied();
                    if record.is_none() {
                        debug!(%path, group = %proposal.name, "proposal names a file outside the scan");
                    }
                    record
                })
                .filter(|record| planned.insert(record.relative_path.as_str()))
                .collect();
            if members.is_empty() {
                continue;
            }

            let folder = folders.claim(&sanitize_group_name(&proposal.name));
            for record in members {
                let destination =
                    destinations.claim(output_root.join(&folder).join(record.file_name()));
                operations.push(MoveOperation {
                    source: record.path.clone(),
                    destination,
                    relative_path: record.relative_path.clone(),
                    group_name: proposal.name.clone(),
                    group_folder: folder.clone(),
                    is_duplicate: false,
                    duplicate_of: None,
                });
            }
            groups.push(PlannedGroup {
                name: proposal.name.clone(),
                folder,
                rationale: proposal.rationale.clone(),
                is_duplicates: false,
            });
        }

        let mut has_duplicates = false;
        for cluster in clusters {
            for record in &cluster.redundant {
                if !planned.insert(record.relative_path.as_str()) {
                    continue;
                }
                has_duplicates = true;
                let destination = destinations
                    .claim(output_root.join(DUPLICATES_FOLDER).join(record.file_name()));
                operations.push(MoveOperation {
                    source: record.path.clone(),
                    destination,
                    relative_path: record.relative_path.clone(),
                    group_name: DUPLICATES_FOLDER.to_string(),
                    group_folder: DUPLICATES_FOLDER.to_string(),
                    is_duplicate: true,
                    duplicate_of: Some(cluster.canonical.relative_path.clone()),
                });
            }
        }
        if has_duplicates {
            groups.push(PlannedGroup {
                name: DUPLICATES_FOLDER.to_string(),
                folder: DUPLICATES_FOLDER.to_string(),
                rationale: DUPLICATES_RATIONALE.to_string(),
                is_duplicates: true,
            });
        }

        debug!(
            operations = operations.len(),
            groups = groups.len(),
            "plan built"
        );

        MovePlan {
            id: plan_id(output_root, &operations),
            output_root: output_root.to_path_buf(),
            operations,
            groups,
        }
    }
}

/// Name-based id: the same moves under the same root always share an id
fn plan_id(output_root: &Path, operations: &[MoveOperation]) -> String {
    let mut name = output_root.to_string_lossy().into_owned();
    for op in operations {
        name.push('\n');
        name.push_str(&op.source.to_string_lossy());
        name.push('\0');
        name.push_str(&op.destination.to_string_lossy());
    }
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Turn a group name into a single safe path segment.
///
/// Drops characters invalid in file names, joins words with `_`, strips
/// leading and trailing dots and caps the length. Empty results become
/// `Kelompok`.
pub fn sanitize_group_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !INVALID_FOLDER_CHARS.contains(c) && !c.is_control())
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let capped: String = joined
        .trim_matches('.')
        .chars()
        .take(MAX_FOLDER_CHARS)
        .collect();
    let capped = capped.trim_end_matches(['.', '_']);

    if capped.is_empty() {
        DEFAULT_GROUP_FOLDER.to_string()
    } else {
        capped.to_string()
    }
}

/// Group folder names handed out so far. Compared case-insensitively so
/// plans behave the same on case-folding filesystems.
struct FolderNames {
    taken: HashSet<String>,
}

impl Default for FolderNames {
    fn default() -> Self {
        Self {
            taken: HashSet::from([DUPLICATES_FOLDER.to_lowercase()]),
        }
    }
}

impl FolderNames {
    fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_lowercase()) {
            return base.to_string();
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{}_{}", base, counter);
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Destination paths handed out so far
#[derive(Default)]
struct Destinations {
    taken: HashSet<String>,
    // Next suffix per (parent, stem, ext) so repeated names stay O(1)
    counters: HashMap<String, usize>,
}

impl Destinations {
    fn claim(&mut self, path: PathBuf) -> PathBuf {
        let path = if self.taken.contains(&key(&path)) || is_reserved(&path) {
            self.next_free(&path)
        } else {
            path
        };
        self.taken.insert(key(&path));
        path
    }

    fn next_free(&mut self, path: &Path) -> PathBuf {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parent = path.parent().unwrap_or(Path::new(""));

        let pattern_key = format!("{}:{}:{}", parent.display(), stem, ext).to_lowercase();
        let counter = self.counters.entry(pattern_key).or_insert(1);

        loop {
            let new_name = if ext.is_empty() {
                format!("{}_{}", stem, counter)
            } else {
                format!("{}_{}.{}", stem, counter, ext)
            };
            let new_path = parent.join(new_name);
            *counter += 1;
            if !self.taken.contains(&key(&new_path)) {
                return new_path;
            }
        }
    }
}

fn is_reserved(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case(METADATA_FILE))
        .unwrap_or(false)
}

fn key(path: &Path) -> String {
    path.display().to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::duplicates::detect_duplicates;
    use crate::core::hasher::fingerprint_reader;
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

    fn proposal(name: &str, files: &[&str]) -> GroupProposal {
        GroupProposal {
            name: name.to_string(),
            rationale: String::new(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn destinations(plan: &MovePlan) -> Vec<String> {
        plan.operations
            .iter()
            .map(|op| {
                op.destination
                    .strip_prefix("/out")
                    .unwrap()
                    .display()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_duplicates_route_to_duplicates_folder() {
        let records = vec![
            record("a.txt", "same"),
            record("b.txt", "same"),
            record("c.pdf", "report"),
        ];
        let clusters = detect_duplicates(&records);
        let proposals = vec![proposal("Teks", &["a.txt", "c.pdf"])];

        let plan = PlanBuilder::build(&records, &clusters, &proposals, Path::new("/out"));

        assert_eq!(
            destinations(&plan),
            vec!["Teks/a.txt", "Teks/c.pdf", "Duplikat/b.txt"]
        );
        let duplicate = &plan.operations[2];
        assert!(duplicate.is_duplicate);
        assert_eq!(duplicate.duplicate_of.as_deref(), Some("a.txt"));
        assert_eq!(plan.groups.len(), 2);
        assert!(plan.groups[1].is_duplicates);
    }

    #[test]
    fn test_redundant_duplicate_named_by_proposal_still_goes_to_duplicates() {
        let records = vec![record("a.txt", "same"), record("b.txt", "same")];
        let clusters = detect_duplicates(&records);
        let proposals = vec![proposal("Teks", &["b.txt", "a.txt"])];

        let plan = PlanBuilder::build(&records, &clusters, &proposals, Path::new("/out"));

        assert_eq!(destinations(&plan), vec!["Teks/a.txt", "Duplikat/b.txt"]);
    }

    #[test]
    fn test_same_file_name_in_one_group_gets_suffix() {
        let records = vec![
            record("2023/report.pdf", "one"),
            record("2024/report.pdf", "two"),
            record("2025/report.pdf", "three"),
        ];
        let proposals = vec![proposal(
            "Laporan",
            &["2023/report.pdf", "2024/report.pdf", "2025/report.pdf"],
        )];

        let plan = PlanBuilder::build(&records, &[], &proposals, Path::new("/out"));

        assert_eq!(
            destinations(&plan),
            vec![
                "Laporan/report.pdf",
                "Laporan/report_1.pdf",
                "Laporan/report_2.pdf"
            ]
        );
    }

    #[test]
    fn test_group_named_like_duplicates_folder_gets_own_folder() {
        let records = vec![
            record("a.txt", "same"),
            record("b.txt", "same"),
            record("c.txt", "unique"),
        ];
        let clusters = detect_duplicates(&records);
        let proposals = vec![proposal("duplikat", &["a.txt", "c.txt"])];

        let plan = PlanBuilder::build(&records, &clusters, &proposals, Path::new("/out"));

        assert_eq!(plan.groups[0].folder, "duplikat_2");
        assert_eq!(
            destinations(&plan),
            vec!["duplikat_2/a.txt", "duplikat_2/c.txt", "Duplikat/b.txt"]
        );
    }

    #[test]
    fn test_groups_sanitizing_to_same_folder_stay_apart() {
        let records = vec![record("a.txt", "1"), record("b.txt", "2")];
        let proposals = vec![proposal("A B", &["a.txt"]), proposal("A/B", &["b.txt"])];

        let plan = PlanBuilder::build(&records, &[], &proposals, Path::new("/out"));

        assert_eq!(plan.groups[0].folder, "A_B");
        assert_eq!(plan.groups[1].folder, "AB");

        let proposals = vec![proposal("A B", &["a.txt"]), proposal("A  B", &["b.txt"])];
        let plan = PlanBuilder::build(&records, &[], &proposals, Path::new("/out"));
        assert_eq!(plan.groups[1].folder, "A_B_2");
    }

    #[test]
    fn test_no_duplicate_destinations_under_heavy_overlap() {
        let mut records = Vec::new();
        let mut proposals = Vec::new();
        for dir in 0..6 {
            let mut files = Vec::new();
            for name in ["x.txt", "X.TXT", "x_1.txt", "x"] {
                let relative = format!("d{}/{}", dir, name);
                records.push(record(&relative, &relative));
                files.push(relative);
            }
            let names: Vec<&str> = files.iter().map(String::as_str).collect();
            proposals.push(proposal(if dir % 2 == 0 { "G" } else { "g" }, &names));
        }
        let copy = record("z/x.txt", "d0/x.txt");
        records.push(copy);
        let clusters = detect_duplicates(&records);

        let plan = PlanBuilder::build(&records, &clusters, &proposals, Path::new("/out"));

        let keys: HashSet<String> = plan.operations.iter().map(|op| key(&op.destination)).collect();
        assert_eq!(keys.len(), plan.operations.len());
        assert_eq!(plan.operations.len(), records.len());
    }

    #[test]
    fn test_unknown_and_repeated_files_are_ignored() {
        let records = vec![record("a.txt", "1")];
        let proposals = vec![
            proposal("One", &["a.txt", "ghost.txt"]),
            proposal("Two", &["a.txt"]),
        ];

        let plan = PlanBuilder::build(&records, &[], &proposals, Path::new("/out"));

        assert_eq!(destinations(&plan), vec!["One/a.txt"]);
        assert_eq!(plan.groups.len(), 1);
    }

    #[test]
    fn test_build_is_deterministic() {
        let records = vec![
            record("a.txt", "same"),
            record("b.txt", "same"),
            record("c.pdf", "x"),
        ];
        let clusters = detect_duplicates(&records);
        let proposals = vec![proposal("Teks", &["a.txt", "c.pdf"])];

        let first = PlanBuilder::build(&records, &clusters, &proposals, Path::new("/out"));
        let second = PlanBuilder::build(&records, &clusters, &proposals, Path::new("/out"));

        assert_eq!(first.operations, second.operations);
        assert_eq!(first.groups, second.groups);
        assert_eq!(first.id, second.id);

        let elsewhere = PlanBuilder::build(&records, &clusters, &proposals, Path::new("/other"));
        assert_ne!(first.id, elsewhere.id);
    }

    #[test]
    fn test_file_named_like_metadata_is_renamed() {
        let records = vec![record("notes/metadata.txt", "mine")];
        let proposals = vec![proposal("Catatan", &["notes/metadata.txt"])];

        let plan = PlanBuilder::build(&records, &[], &proposals, Path::new("/out"));

        assert_eq!(destinations(&plan), vec!["Catatan/metadata_1.txt"]);
    }

    #[test]
    fn test_sanitize_group_name() {
        assert_eq!(sanitize_group_name("Laporan Keuangan 2024"), "Laporan_Keuangan_2024");
        assert_eq!(sanitize_group_name("  a/b:c?  "), "abc");
        assert_eq!(sanitize_group_name(".."), "Kelompok");
        assert_eq!(sanitize_group_name("   "), "Kelompok");
        assert_eq!(sanitize_group_name(&"x".repeat(200)).len(), MAX_FOLDER_CHARS);
    }
}

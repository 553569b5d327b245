//! Extension-based partition used whenever classification is unusable.

use super::GroupProposal;
use crate::core::scanner::FileRecord;
use std::collections::BTreeMap;

/// Bucket name for a lower-cased extension
pub fn bucket_name(extension: &str) -> String {
    match extension {
        "pdf" => "Dokumen PDF".to_string(),
        "doc" | "docx" => "Dokumen Word".to_string(),
        "txt" => "Dokumen Teks".to_string(),
        "md" => "Catatan Markdown".to_string(),
        "py" => "Kode Python".to_string(),
        "json" => "Data JSON".to_string(),
        "csv" => "Data CSV".to_string(),
        "" => "Tanpa Ekstensi".to_string(),
        other => format!("File {}", other.to_uppercase()),
    }
}

/// Partition records by extension. Buckets are ordered by extension and
/// files by relative path, so equal inputs give equal partitions.
pub fn partition_by_extension<'a, I>(records: I) -> Vec<GroupProposal>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(record.extension())
            .or_default()
            .push(record.relative_path.clone());
    }

    buckets
        .into_iter()
        .map(|(extension, mut files)| {
            files.sort();
            let rationale = if extension.is_empty() {
                "Pengelompokan otomatis untuk file tanpa ekstensi".to_string()
            } else {
                format!("Pengelompokan otomatis berdasarkan ekstensi .{extension}")
            };
            GroupProposal {
                name: bucket_name(&extension),
                rationale,
                files,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::Fingerprint;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn record(relative: &str) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/docs").join(relative),
            relative_path: relative.to_string(),
            fingerprint: Fingerprint::zero(),
            summary: String::new(),
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn partitions_by_lowercased_extension() {
        let records = vec![record("b.PDF"), record("a.txt"), record("a.pdf")];
        let groups = partition_by_extension(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Dokumen PDF");
        assert_eq!(groups[0].files, vec!["a.pdf", "b.PDF"]);
        assert_eq!(groups[1].name, "Dokumen Teks");
    }

    #[test]
    fn unknown_extensions_get_generic_bucket() {
        assert_eq!(bucket_name("xlsx"), "File XLSX");
    }

    #[test]
    fn partition_is_deterministic_across_input_order() {
        let forward = vec![record("x.md"), record("y.csv"), record("z.md")];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(
            partition_by_extension(&forward),
            partition_by_extension(&backward)
        );
    }
}

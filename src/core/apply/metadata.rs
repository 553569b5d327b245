//! Per-group `metadata.txt` files and the consolidated CSV export.

use crate::core::plan::{MoveOperation, MovePlan, METADATA_FILE};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Consolidated export written at the output root
pub const SUMMARY_FILE: &str = "metadata_summary.csv";

const DUPLICATE_DESCRIPTION: &str = "File duplikat berdasarkan hash";

/// Files written, and the ones that could not be
#[derive(Debug, Default)]
pub struct MetadataWriteResult {
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// One row of [`SUMMARY_FILE`]
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    group_name: &'a str,
    file_name: String,
    original_path: String,
    new_path: String,
    description: &'a str,
    timestamp: &'a str,
}

/// Write metadata for the moves that actually happened.
///
/// Groups with no successful move get no `metadata.txt`. Failures are
/// returned as warnings; the moves are already done.
pub fn write_metadata(
    plan: &MovePlan,
    moved: &[MoveOperation],
    created_at: &DateTime<Local>,
) -> MetadataWriteResult {
    let timestamp = format_timestamp(created_at);
    let mut result = MetadataWriteResult::default();

    for group in &plan.groups {
        let members: Vec<&MoveOperation> = moved
            .iter()
            .filter(|op| op.group_folder == group.folder)
            .collect();
        if members.is_empty() {
            continue;
        }

        let path = plan.output_root.join(&group.folder).join(METADATA_FILE);
        let text = render_group_metadata(&group.name, &group.rationale, &timestamp, &members);
        match fs::write(&path, text) {
            Ok(()) => result.written.push(path),
            Err(e) => result
                .warnings
                .push(format!("{}: {}", path.display(), e)),
        }
    }

    let summary_path = plan.output_root.join(SUMMARY_FILE);
    match write_summary(plan, moved, &timestamp, &summary_path) {
        Ok(()) => result.written.push(summary_path),
        Err(e) => result
            .warnings
            .push(format!("{}: {}", summary_path.display(), e)),
    }

    result
}

/// `metadata.txt` body for one group
pub fn render_group_metadata(
    name: &str,
    rationale: &str,
    timestamp: &str,
    members: &[&MoveOperation],
) -> String {
    let mut lines = vec![
        format!("Nama grup : {}", name),
        format!("Deskripsi : {}", rationale),
        format!("Dibuat pada : {}", timestamp),
        String::new(),
        "Daftar file:".to_string(),
    ];
    for op in members {
        let origin = op.source.display();
        match &op.duplicate_of {
            Some(canonical) => lines.push(format!(
                "- {} (duplikat dari {}, asal: {})",
                op.file_name(),
                canonical,
                origin
            )),
            None => lines.push(format!("- {} (asal: {})", op.file_name(), origin)),
        }
    }
    lines.join("\n")
}

fn write_summary(
    plan: &MovePlan,
    moved: &[MoveOperation],
    timestamp: &str,
    path: &std::path::Path,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for op in moved {
        let description = if op.is_duplicate {
            DUPLICATE_DESCRIPTION
        } else {
            plan.group(&op.group_folder)
                .map(|g| g.rationale.as_str())
                .unwrap_or("")
        };
        writer.serialize(SummaryRow {
            group_name: &op.group_name,
            file_name: op.original_name(),
            original_path: op.source.display().to_string(),
            new_path: op.destination.display().to_string(),
            description,
            timestamp,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

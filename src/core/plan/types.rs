//! Types for the plan module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file relocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOperation {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Relative path of the source below the scanned root
    pub relative_path: String,
    /// Display name of the owning group
    pub group_name: String,
    /// Folder of the owning group below the output root
    pub group_folder: String,
    pub is_duplicate: bool,
    /// Relative path of the canonical copy, for redundant duplicates
    pub duplicate_of: Option<String>,
}

impl MoveOperation {
    pub fn file_name(&self) -> String {
        file_name_of(&self.destination)
    }

    pub fn original_name(&self) -> String {
        file_name_of(&self.source)
    }

    /// The inverse move
    pub fn reversed(&self) -> (PathBuf, PathBuf) {
        (self.destination.clone(), self.source.clone())
    }
}

/// A destination folder and what the plan puts in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedGroup {
    pub name: String,
    /// Sanitized, unique folder name below the output root
    pub folder: String,
    pub rationale: String,
    pub is_duplicates: bool,
}

/// Everything one apply will do, before it does it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovePlan {
    pub id: String,
    pub output_root: PathBuf,
    /// In execution order
    pub operations: Vec<MoveOperation>,
    /// In the order their first operation appears
    pub groups: Vec<PlannedGroup>,
}

impl MovePlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn total_moves(&self) -> usize {
        self.operations.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.operations.iter().filter(|op| op.is_duplicate).count()
    }

    pub fn group(&self, folder: &str) -> Option<&PlannedGroup> {
        self.groups.iter().find(|g| g.folder == folder)
    }

    /// Operations targeting one group folder, in plan order
    pub fn operations_in<'a>(&'a self, folder: &'a str) -> impl Iterator<Item = &'a MoveOperation> {
        self.operations
            .iter()
            .filter(move |op| op.group_folder == folder)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

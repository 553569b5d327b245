//! # Grouping Module
//!
//! Turns scanned files into named groups.
//!
//! ## Pipeline Stages
//! 1. **Prompt** - describe every non-redundant file (path + summary) and the duplicates
//! 2. **Classify** - one call to the [`Classifier`]
//! 3. **Parse** - JSON pass, then line pass ([`parser`])
//! 4. **Resolve** - map named files onto scanned records
//! 5. **Fallback** - extension partition when any of 2-4 fails
//! 6. **Catch-all** - unclaimed files go to [`CATCH_ALL_GROUP`]
//!
//! Classification and parse failures are never fatal. The only error is an
//! empty input set.

mod classifier;
mod fallback;
pub mod parser;
mod prompt;

pub use classifier::{extract_response_text, Classifier, HttpClassifier};
pub use fallback::{bucket_name, partition_by_extension};
pub use parser::{parse_response, ParsedGroup};
pub use prompt::{build_prompt, describe_files};

use crate::core::duplicates::{describe_duplicates, redundant_paths, DuplicateCluster};
use crate::core::scanner::FileRecord;
use crate::error::{GroupingError, ParseError};
use crate::events::{null_sender, Event, EventSender, GroupEvent};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Group receiving every file no proposal claimed
pub const CATCH_ALL_GROUP: &str = "Lainnya";

const CATCH_ALL_RATIONALE: &str = "File yang tidak dikelompokkan oleh klasifikasi";

/// A named group and the files it claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProposal {
    pub name: String,
    /// Why these files belong together, possibly empty
    pub rationale: String,
    /// Relative paths, in order, without repeats
    pub files: Vec<String>,
}

/// What grouping produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingOutcome {
    pub proposals: Vec<GroupProposal>,
    /// The classifier's text, if it answered at all
    pub raw_response: Option<String>,
    pub used_fallback: bool,
    /// Why the fallback ran
    pub fallback_reason: Option<String>,
}

impl GroupingOutcome {
    /// Number of files across all proposals
    pub fn file_count(&self) -> usize {
        self.proposals.iter().map(|p| p.files.len()).sum()
    }
}

/// Runs the grouping stages against one classifier
pub struct GroupingPipeline<'a> {
    classifier: &'a dyn Classifier,
}

impl<'a> GroupingPipeline<'a> {
    pub fn new(classifier: &'a dyn Classifier) -> Self {
        Self { classifier }
    }

    /// Group every record that is not a redundant duplicate
    pub fn group(
        &self,
        records: &[FileRecord],
        clusters: &[DuplicateCluster],
        similarity_threshold: f32,
        model: &str,
    ) -> Result<GroupingOutcome, GroupingError> {
        self.group_with_events(records, clusters, similarity_threshold, model, &null_sender())
    }

    pub fn group_with_events(
        &self,
        records: &[FileRecord],
        clusters: &[DuplicateCluster],
        similarity_threshold: f32,
        model: &str,
        events: &EventSender,
    ) -> Result<GroupingOutcome, GroupingError> {
        // Reserved for duplicate-adjacent logic; grouping does not read it.
        let _ = similarity_threshold;

        let redundant = redundant_paths(clusters);
        let candidates: Vec<&FileRecord> = records
            .iter()
            .filter(|r| !redundant.contains(r.relative_path.as_str()))
            .collect();
        if candidates.is_empty() {
            return Err(GroupingError::NothingToGroup);
        }

        let prompt = build_prompt(
            &describe_files(candidates.iter().copied()),
            &describe_duplicates(clusters),
        );
        debug!(%prompt, "classification prompt");
        events.send(Event::Group(GroupEvent::Requesting {
            model: model.to_string(),
            files: candidates.len(),
        }));

        let (raw_response, classified) = match self.classifier.classify(model, &prompt) {
            Ok(text) => {
                debug!(response = %text, "classification response");
                let proposals = parse_response(&text)
                    .and_then(|parsed| resolve_groups(&parsed, &candidates));
                (Some(text), proposals.map_err(|e| e.to_string()))
            }
            Err(e) => (None, Err(e.to_string())),
        };

        let (mut proposals, fallback_reason) = match classified {
            Ok(proposals) => (proposals, None),
            Err(reason) => {
                warn!(%reason, "classification unusable, grouping by extension");
                events.send(Event::Group(GroupEvent::FallbackUsed {
                    reason: reason.clone(),
                }));
                (partition_by_extension(candidates.iter().copied()), Some(reason))
            }
        };

        append_unclaimed(&mut proposals, &candidates);

        let used_fallback = fallback_reason.is_some();
        info!(groups = proposals.len(), used_fallback, "grouping completed");
        events.send(Event::Group(GroupEvent::Completed {
            groups: proposals.len(),
            used_fallback,
        }));

        Ok(GroupingOutcome {
            proposals,
            raw_response,
            used_fallback,
            fallback_reason,
        })
    }
}

/// Map parsed file references onto scanned records.
///
/// A reference matches a relative path exactly, or else a file name. Each
/// record is claimed at most once (first group wins) and groups with the same
/// name are merged. Fails if no group ends up with a known file.
pub fn resolve_groups(
    parsed: &[ParsedGroup],
    candidates: &[&FileRecord],
) -> Result<Vec<GroupProposal>, ParseError> {
    let by_path: HashSet<&str> = candidates.iter().map(|r| r.relative_path.as_str()).collect();
    let mut by_name: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in candidates {
        by_name
            .entry(record.file_name())
            .or_default()
            .push(record.relative_path.as_str());
    }

    let mut claimed: HashSet<&str> = HashSet::new();
    let mut proposals: Vec<GroupProposal> = Vec::new();

    for group in parsed {
        let mut files = Vec::new();
        for reference in &group.files {
            let reference = normalize_reference(reference);
            let resolved = if by_path.contains(reference.as_str()) {
                by_path.get(reference.as_str()).copied()
            } else {
                by_name
                    .get(reference.as_str())
                    .and_then(|paths| paths.iter().copied().find(|p| !claimed.contains(p)))
            };
            match resolved {
                Some(path) if claimed.insert(path) => files.push(path.to_string()),
                Some(_) => {}
                None => debug!(%reference, group = %group.name, "classifier named an unknown file"),
            }
        }
        if files.is_empty() {
            continue;
        }

        match proposals
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&group.name))
        {
            Some(existing) => {
                existing.files.extend(files);
                if existing.rationale.is_empty() {
                    existing.rationale = group.rationale.clone();
                }
            }
            None => proposals.push(GroupProposal {
                name: group.name.clone(),
                rationale: group.rationale.clone(),
                files,
            }),
        }
    }

    if proposals.is_empty() {
        Err(ParseError::NoKnownFiles)
    } else {
        Ok(proposals)
    }
}

/// Put every candidate no proposal claimed into the catch-all group
fn append_unclaimed(proposals: &mut Vec<GroupProposal>, candidates: &[&FileRecord]) {
    let claimed: HashSet<&str> = proposals
        .iter()
        .flat_map(|p| p.files.iter().map(String::as_str))
        .collect();
    let unclaimed: Vec<String> = candidates
        .iter()
        .map(|r| r.relative_path.as_str())
        .filter(|path| !claimed.contains(path))
        .map(str::to_string)
        .collect();
    if unclaimed.is_empty() {
        return;
    }

    debug!(count = unclaimed.len(), "unclaimed files go to the catch-all group");
    match proposals
        .iter_mut()
        .find(|p| p.name.eq_ignore_ascii_case(CATCH_ALL_GROUP))
    {
        Some(catch_all) => catch_all.files.extend(unclaimed),
        None => proposals.push(GroupProposal {
            name: CATCH_ALL_GROUP.to_string(),
            rationale: CATCH_ALL_RATIONALE.to_string(),
            files: unclaimed,
        }),
    }
}

fn normalize_reference(reference: &str) -> String {
    let trimmed = reference
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .replace('\\', "/");
    trimmed.trim_start_matches("./").to_string()
}

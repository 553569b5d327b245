//! # Session Module
//!
//! Caller-owned state for one folder: the latest scan, grouping and plan,
//! plus the undo stack.
//!
//! Every operation re-reads settings, runs to completion and returns an
//! [`Outcome`]. Order is enforced: grouping needs a scan, apply needs a
//! previewed plan, and apply consumes that plan. The session holds no locks;
//! callers run one operation at a time.
//!
//! ## Example
//! ```rust,ignore
//! let mut session = OrganizerSession::new(SettingsSource::File(path));
//! println!("{}", session.preview(Path::new("/Users/me/Documents")));
//! if confirmed {
//!     println!("{}", session.apply());
//! }
//! ```

mod outcome;
mod stack;

pub use outcome::{FailureKind, Outcome};
pub use stack::UndoStack;

use crate::config::{Settings, SettingsSource};
use crate::core::apply::{undo_with_events, ApplyEngine, ApplyReport, UndoEntry, UndoReport};
use crate::core::duplicates::{detect_duplicates, DuplicateCluster};
use crate::core::extract::{PlainTextExtractor, TextExtractor};
use crate::core::grouping::{Classifier, GroupingOutcome, GroupingPipeline, HttpClassifier};
use crate::core::plan::{MovePlan, PlanBuilder};
use crate::core::scanner::{DocumentScanner, ScanConfig, ScanResult};
use crate::error::GroupingError;
use crate::events::{null_sender, Event, EventSender, SessionEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The latest completed scan
#[derive(Debug, Clone)]
pub struct ScanState {
    pub root: PathBuf,
    pub result: ScanResult,
    pub clusters: Vec<DuplicateCluster>,
}

/// One folder's organize session
pub struct OrganizerSession {
    source: SettingsSource,
    classifier: Option<Arc<dyn Classifier>>,
    extractor: Arc<dyn TextExtractor>,
    events: EventSender,
    scan: Option<ScanState>,
    grouping: Option<GroupingOutcome>,
    plan: Option<MovePlan>,
    undo_stack: UndoStack,
    last_apply: Option<ApplyReport>,
    last_undo: Option<UndoReport>,
}

impl OrganizerSession {
    pub fn new(source: SettingsSource) -> Self {
        Self {
            source,
            classifier: None,
            extractor: Arc::new(PlainTextExtractor),
            events: null_sender(),
            scan: None,
            grouping: None,
            plan: None,
            undo_stack: UndoStack::new(),
            last_apply: None,
            last_undo: None,
        }
    }

    /// Use this classifier instead of the HTTP one built from settings
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Scan `root` and detect duplicates. Clears any grouping and plan.
    pub fn scan(&mut self, root: &Path) -> Outcome {
        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(outcome) => return outcome,
        };

        let scanner = DocumentScanner::with_extractor(
            ScanConfig::from_settings(&settings, root),
            Arc::clone(&self.extractor),
        );
        let result = match scanner.scan_with_events(root, &self.events) {
            Ok(result) => result,
            Err(e) => return self.fail(FailureKind::Io, e.to_string()),
        };
        let clusters = detect_duplicates(&result.records);

        let outcome = Outcome::Scanned {
            files: result.records.len(),
            duplicate_clusters: clusters.len(),
            warnings: result.warnings.len(),
        };
        self.grouping = None;
        self.plan = None;
        self.scan = Some(ScanState {
            root: root.to_path_buf(),
            result,
            clusters,
        });
        outcome
    }

    /// Group the scanned files. Clears any plan.
    pub fn group(&mut self) -> Outcome {
        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(outcome) => return outcome,
        };
        let Some(scan) = &self.scan else {
            return self.fail(FailureKind::NoScan, "scan a folder first");
        };

        let classifier: Arc<dyn Classifier> = match &self.classifier {
            Some(classifier) => Arc::clone(classifier),
            None => Arc::new(HttpClassifier::from_settings(&settings)),
        };
        let grouped = GroupingPipeline::new(classifier.as_ref()).group_with_events(
            &scan.result.records,
            &scan.clusters,
            settings.similarity_threshold,
            &settings.model,
            &self.events,
        );

        match grouped {
            Ok(grouping) => {
                let outcome = Outcome::Grouped {
                    groups: grouping.proposals.len(),
                    used_fallback: grouping.used_fallback,
                };
                self.plan = None;
                self.grouping = Some(grouping);
                outcome
            }
            Err(GroupingError::NothingToGroup) => {
                self.fail(FailureKind::EmptyInput, "no supported files to organize")
            }
        }
    }

    /// Build the move plan, grouping first if needed
    pub fn plan(&mut self) -> Outcome {
        if self.scan.is_some() && self.grouping.is_none() {
            let grouped = self.group();
            if grouped.is_failure() {
                return grouped;
            }
        }

        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(outcome) => return outcome,
        };
        let (Some(scan), Some(grouping)) = (&self.scan, &self.grouping) else {
            return self.fail(FailureKind::NoScan, "scan a folder first");
        };

        let plan = PlanBuilder::build(
            &scan.result.records,
            &scan.clusters,
            &grouping.proposals,
            &settings.output_root(&scan.root),
        );
        let outcome = Outcome::Planned {
            moves: plan.total_moves(),
            groups: plan.groups.len(),
        };
        self.plan = Some(plan);
        outcome
    }

    /// Scan, group and plan in one go; stops at the first failure
    pub fn preview(&mut self, root: &Path) -> Outcome {
        let scanned = self.scan(root);
        if scanned.is_failure() {
            return scanned;
        }
        self.plan()
    }

    /// Apply the previewed plan and make it the undoable one
    pub fn apply(&mut self) -> Outcome {
        if let Err(outcome) = self.settings() {
            return outcome;
        }
        let Some(plan) = self.plan.take() else {
            return self.fail(FailureKind::NoPlan, "preview a plan before applying");
        };

        let report = ApplyEngine::apply_with_events(plan, &self.events);
        if let Some(replaced) = self.undo_stack.push(report.undo_entry.clone()) {
            debug!(plan = %replaced.id, "older apply is no longer undoable");
            self.events.send(Event::Session(SessionEvent::UndoDiscarded {
                plan_id: replaced.id,
            }));
        }

        let outcome = Outcome::Applied {
            moved: report.moved(),
            skipped: report.skipped.len(),
        };
        info!(%outcome, "apply finished");
        // The tree changed under the scan
        self.scan = None;
        self.grouping = None;
        self.last_apply = Some(report);
        outcome
    }

    /// Reverse the most recent apply.
    ///
    /// Moves that fail to reverse remain on the undo stack, so the caller can
    /// clear the conflict and undo again.
    pub fn undo(&mut self) -> Outcome {
        let Some(entry) = self.undo_stack.pop() else {
            return self.fail(FailureKind::NothingToUndo, "no apply to undo");
        };

        let report = undo_with_events(&entry, &self.events);
        if !report.is_complete() {
            // Moves that could not be reversed stay undoable for a retry
            let mut remaining: Vec<_> = report
                .failures
                .iter()
                .map(|failure| failure.operation.clone())
                .collect();
            remaining.reverse();
            warn!(plan = %entry.id, remaining = remaining.len(), "undo incomplete, kept for retry");
            self.undo_stack.push(UndoEntry {
                operations: remaining,
                ..entry
            });
        }
        let outcome = Outcome::Undone {
            restored: report.restored,
            failures: report.failures.len(),
            removal_warnings: report.removal_warnings.len(),
        };
        info!(%outcome, "undo finished");
        self.scan = None;
        self.grouping = None;
        self.plan = None;
        self.last_undo = Some(report);
        outcome
    }

    pub fn scan_state(&self) -> Option<&ScanState> {
        self.scan.as_ref()
    }

    pub fn grouping(&self) -> Option<&GroupingOutcome> {
        self.grouping.as_ref()
    }

    pub fn plan_preview(&self) -> Option<&MovePlan> {
        self.plan.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn last_apply(&self) -> Option<&ApplyReport> {
        self.last_apply.as_ref()
    }

    pub fn last_undo(&self) -> Option<&UndoReport> {
        self.last_undo.as_ref()
    }

    fn settings(&self) -> Result<Settings, Outcome> {
        match self.source.load() {
            Ok(settings) => {
                let origin = match &self.source {
                    SettingsSource::File(path) => path.display().to_string(),
                    SettingsSource::Fixed(_) => "fixed".to_string(),
                };
                debug!(%origin, "settings loaded");
                self.events
                    .send(Event::Session(SessionEvent::SettingsLoaded { origin }));
                Ok(settings)
            }
            Err(e) => Err(self.fail(FailureKind::Config, e.to_string())),
        }
    }

    fn fail(&self, kind: FailureKind, detail: impl Into<String>) -> Outcome {
        let outcome = Outcome::failed(kind, detail);
        warn!(%outcome, "operation did not run");
        if let Outcome::Failed { detail, .. } = &outcome {
            self.events.send(Event::Session(SessionEvent::Failed {
                detail: detail.clone(),
            }));
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PLACEHOLDER_API_KEY;
    use crate::error::ClassificationError;
    use std::fs;
    use tempfile::TempDir;

    struct StaticClassifier(&'static str);

    impl Classifier for StaticClassifier {
        fn classify(&self, _model: &str, _prompt: &str) -> Result<String, ClassificationError> {
            Ok(self.0.to_string())
        }
    }

    fn session(settings: Settings) -> OrganizerSession {
        OrganizerSession::new(SettingsSource::Fixed(settings)).with_classifier(Arc::new(
            StaticClassifier(r#"[{"group_name":"Teks","files":["a.txt"]}]"#),
        ))
    }

    fn folder() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.md"), "beta").unwrap();
        dir
    }

    fn settings() -> Settings {
        Settings::new("key", "model", 0.85, "organized_files")
    }

    #[test]
    fn operations_need_their_predecessor() {
        let mut session = session(settings());

        assert!(matches!(
            session.group(),
            Outcome::Failed { kind: FailureKind::NoScan, .. }
        ));
        assert!(matches!(
            session.apply(),
            Outcome::Failed { kind: FailureKind::NoPlan, .. }
        ));
        assert!(matches!(
            session.undo(),
            Outcome::Failed { kind: FailureKind::NothingToUndo, .. }
        ));
    }

    #[test]
    fn invalid_settings_stop_before_scanning() {
        let dir = folder();
        let mut session = session(Settings::new(PLACEHOLDER_API_KEY, "m", 0.5, "out"));

        let outcome = session.scan(dir.path());

        assert!(matches!(outcome, Outcome::Failed { kind: FailureKind::Config, .. }));
        assert!(session.scan_state().is_none());
    }

    #[test]
    fn missing_folder_is_io_failure() {
        let mut session = session(settings());
        let outcome = session.scan(Path::new("/nonexistent/folder"));
        assert!(matches!(outcome, Outcome::Failed { kind: FailureKind::Io, .. }));
    }

    #[test]
    fn empty_folder_cannot_be_grouped() {
        let dir = TempDir::new().unwrap();
        let mut session = session(settings());

        assert!(matches!(session.scan(dir.path()), Outcome::Scanned { files: 0, .. }));
        assert!(matches!(
            session.group(),
            Outcome::Failed { kind: FailureKind::EmptyInput, .. }
        ));
    }

    #[test]
    fn preview_then_apply_consumes_plan() {
        let dir = folder();
        let mut session = session(settings());

        assert_eq!(session.preview(dir.path()), Outcome::Planned { moves: 2, groups: 2 });
        assert_eq!(session.apply(), Outcome::Applied { moved: 2, skipped: 0 });
        assert!(matches!(
            session.apply(),
            Outcome::Failed { kind: FailureKind::NoPlan, .. }
        ));
        assert!(session.can_undo());
        assert!(dir.path().join("organized_files/Teks/a.txt").exists());
        assert!(dir.path().join("organized_files/Lainnya/b.md").exists());
    }

    #[test]
    fn undo_restores_last_apply_once() {
        let dir = folder();
        let mut session = session(settings());
        session.preview(dir.path());
        session.apply();

        let outcome = session.undo();

        assert!(matches!(outcome, Outcome::Undone { restored: 2, failures: 0, .. }));
        assert!(dir.path().join("a.txt").exists());
        assert!(dir.path().join("b.md").exists());
        assert!(!session.can_undo());
    }

    #[test]
    fn output_folder_is_not_rescanned() {
        let dir = folder();
        let mut session = session(settings());
        session.preview(dir.path());
        session.apply();

        fs::write(dir.path().join("c.txt"), "gamma").unwrap();
        let outcome = session.scan(dir.path());

        assert!(matches!(outcome, Outcome::Scanned { files: 1, .. }));
    }

    #[test]
    fn settings_are_reread_per_operation() {
        let dir = folder();
        let config_dir = TempDir::new().unwrap();
        let path = config_dir.path().join("config.toml");
        fs::write(
            &path,
            "api_key = \"k\"\nmodel = \"m\"\nsimilarity_threshold = 0.5\noutput_folder = \"first\"\n",
        )
        .unwrap();
        let mut session = OrganizerSession::new(SettingsSource::File(path.clone()))
            .with_classifier(Arc::new(StaticClassifier("garbage")));

        session.scan(dir.path());
        fs::write(
            &path,
            "api_key = \"k\"\nmodel = \"m\"\nsimilarity_threshold = 0.5\noutput_folder = \"second\"\n",
        )
        .unwrap();
        session.plan();

        let plan = session.plan_preview().unwrap();
        assert_eq!(plan.output_root, dir.path().join("second"));
    }

    #[test]
    fn failed_restores_stay_undoable() {
        let dir = folder();
        let mut session = session(settings());
        session.preview(dir.path());
        session.apply();
        fs::write(dir.path().join("a.txt"), "newer").unwrap();

        let first = session.undo();

        assert!(matches!(first, Outcome::Undone { restored: 1, failures: 1, .. }));
        assert!(session.can_undo());
        assert!(dir.path().join("b.md").exists());
        assert!(dir.path().join("organized_files/Teks/a.txt").exists());

        fs::remove_file(dir.path().join("a.txt")).unwrap();
        let second = session.undo();

        assert!(matches!(second, Outcome::Undone { restored: 1, failures: 0, .. }));
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "alpha");
        assert!(!dir.path().join("organized_files/Teks").exists());
        assert!(!session.can_undo());
    }
}

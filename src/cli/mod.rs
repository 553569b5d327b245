//! # CLI Module
//!
//! Command-line interface for the document organizer.
//!
//! ## Usage
//! ```bash
//! # Write a starter settings file
//! doc-organize init-config
//!
//! # Report files and exact duplicates
//! doc-organize scan ~/Documents
//!
//! # Show what organizing would do
//! doc-organize preview ~/Documents --output json
//!
//! # Preview, confirm, apply, then optionally undo
//! doc-organize organize ~/Documents
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use document_organizer::config::{Settings, SettingsSource};
use document_organizer::core::apply::{ApplyReport, UndoReport};
use document_organizer::core::plan::MovePlan;
use document_organizer::core::session::{OrganizerSession, Outcome, ScanState};
use document_organizer::core::GroupingOutcome;
use document_organizer::error::{OrganizerError, Result};
use document_organizer::events::{
    ApplyEvent, Event, EventChannel, EventReceiver, GroupEvent, ScanEvent, UndoEvent,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Document Organizer - Sort documents into topic folders, reversibly
#[derive(Parser, Debug)]
#[command(name = "doc-organize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output (forces debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a folder and report exact duplicates
    Scan {
        /// Folder to scan
        folder: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show the organize plan without moving anything
    Preview {
        /// Folder to organize
        folder: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Preview, confirm and apply the plan
    Organize {
        /// Folder to organize
        folder: PathBuf,

        /// Apply without asking (no undo offer)
        #[arg(short, long)]
        yes: bool,
    },

    /// Write a starter settings file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    document_organizer::init_tracing(cli.verbose);

    let config_path = cli.config.unwrap_or_else(SettingsSource::default_path);
    let source = SettingsSource::File(config_path.clone());

    match cli.command {
        Commands::Scan { folder, output } => run_scan(source, &folder, output, cli.verbose),
        Commands::Preview { folder, output } => {
            run_preview(source, &folder, output, cli.verbose)
        }
        Commands::Organize { folder, yes } => run_organize(source, &folder, yes, cli.verbose),
        Commands::InitConfig { force } => run_init_config(&config_path, force),
    }
}

fn run_scan(source: SettingsSource, folder: &Path, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);
    if pretty {
        print_header(&term);
    }

    with_session(source, pretty, verbose, |session| {
        let outcome = session.scan(folder);
        finish(&term, &outcome, pretty)?;
        if let Some(scan) = session.scan_state() {
            match output {
                OutputFormat::Pretty => print_scan(&term, scan, verbose),
                OutputFormat::Json => print_json(&serde_json::json!({
                    "root": scan.root,
                    "files": scan.result.records,
                    "duplicates": scan.clusters,
                    "warnings": scan.result.warnings,
                }))?,
            }
        }
        Ok(())
    })
}

fn run_preview(
    source: SettingsSource,
    folder: &Path,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);
    if pretty {
        print_header(&term);
    }

    with_session(source, pretty, verbose, |session| {
        let outcome = session.preview(folder);
        finish(&term, &outcome, pretty)?;
        if let (Some(grouping), Some(plan)) = (session.grouping(), session.plan_preview()) {
            match output {
                OutputFormat::Pretty => {
                    print_plan(&term, grouping, plan, verbose);
                    term.write_line(&format!(
                        "{}",
                        style("No files were moved. Run `organize` to apply this plan.").dim()
                    ))
                    .ok();
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "used_fallback": grouping.used_fallback,
                    "fallback_reason": grouping.fallback_reason,
                    "proposals": grouping.proposals,
                    "plan": plan,
                }))?,
            }
        }
        Ok(())
    })
}

fn run_organize(source: SettingsSource, folder: &Path, yes: bool, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    print_header(&term);

    with_session(source, true, verbose, |session| {
        let outcome = session.preview(folder);
        finish(&term, &outcome, true)?;
        let (Some(grouping), Some(plan)) = (session.grouping(), session.plan_preview()) else {
            return Ok(());
        };
        if plan.is_empty() {
            term.write_line("  Nothing to organize.").ok();
            return Ok(());
        }
        print_plan(&term, grouping, plan, verbose);

        if !yes && !confirm(&term, "Apply this plan?")? {
            term.write_line(&format!("{}", style("Cancelled. No files were moved.").dim()))
                .ok();
            return Ok(());
        }

        let outcome = session.apply();
        finish(&term, &outcome, true)?;
        if let Some(report) = session.last_apply() {
            print_apply(&term, report);
        }

        if !yes && session.can_undo() && confirm(&term, "Undo this organization?")? {
            let outcome = session.undo();
            finish(&term, &outcome, true)?;
            if let Some(report) = session.last_undo() {
                print_undo(&term, report);
            }
        }
        Ok(())
    })
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    let term = Term::stderr();
    if path.exists() && !force {
        term.write_line(&format!(
            "{} Settings file already exists at {} (use --force to overwrite)",
            style("!").yellow().bold(),
            path.display()
        ))
        .ok();
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, Settings::template())?;
    term.write_line(&format!(
        "{} Wrote {}. Set your api_key before organizing.",
        style("✓").green().bold(),
        path.display()
    ))
    .ok();
    Ok(())
}

/// Run `f` with a session whose events drive a progress display
fn with_session<F>(source: SettingsSource, progress: bool, verbose: bool, f: F) -> Result<()>
where
    F: FnOnce(&mut OrganizerSession) -> Result<()>,
{
    if !progress {
        return f(&mut OrganizerSession::new(source));
    }

    let (sender, receiver) = EventChannel::new();
    let event_thread = thread::spawn(move || render_events(receiver, verbose));

    let mut session = OrganizerSession::new(source).with_events(sender);
    let result = f(&mut session);

    // Dropping the session drops the sender and ends the event thread
    drop(session);
    event_thread.join().ok();
    result
}

fn render_events(receiver: EventReceiver, verbose: bool) {
    let mut bar: Option<ProgressBar> = None;

    for event in receiver.iter() {
        match event {
            Event::Scan(ScanEvent::Started { root }) => {
                bar = Some(spinner(format!("Scanning {}", display_path(&root))));
            }
            Event::Scan(ScanEvent::FileScanned {
                relative_path,
                scanned,
            }) => {
                if let Some(ref pb) = bar {
                    pb.set_message(format!("{} files · {}", scanned, relative_path));
                }
            }
            Event::Group(GroupEvent::Requesting { model, files }) => {
                bar = Some(spinner(format!("Asking {} to group {} files", model, files)));
            }
            Event::Group(GroupEvent::FallbackUsed { reason }) => {
                let line = format!(
                    "{} Classification unusable, grouping by extension: {}",
                    style("!").yellow().bold(),
                    reason
                );
                match bar {
                    Some(ref pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }
            Event::Apply(ApplyEvent::Started { total_moves })
            | Event::Undo(UndoEvent::Started { total_moves }) => {
                bar = Some(counter(total_moves as u64));
            }
            Event::Apply(ApplyEvent::Progress(p)) | Event::Undo(UndoEvent::Progress(p)) => {
                if let Some(ref pb) = bar {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
            }
            Event::Apply(ApplyEvent::Skipped { source, reason }) => {
                if verbose {
                    if let Some(ref pb) = bar {
                        pb.println(format!("  {} {}: {}", style("○").dim(), source.display(), reason));
                    }
                }
            }
            Event::Scan(ScanEvent::Completed { .. })
            | Event::Group(GroupEvent::Completed { .. })
            | Event::Apply(ApplyEvent::Completed { .. })
            | Event::Undo(UndoEvent::Completed { .. }) => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
            }
            _ => {}
        }
    }

    if let Some(pb) = bar.take() {
        pb.finish_and_clear();
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn counter(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb
}

/// Print the outcome line. Failures become an error so the exit code is non-zero.
fn finish(term: &Term, outcome: &Outcome, pretty: bool) -> Result<()> {
    if let Outcome::Failed { .. } = outcome {
        term.write_line(&format!("{} {}", style("✗").red().bold(), outcome))
            .ok();
        return Err(OrganizerError::Aborted(outcome.to_string()));
    }
    if pretty {
        let marker = if outcome.is_degraded() {
            style("!").yellow().bold()
        } else {
            style("✓").green().bold()
        };
        term.write_line(&format!("{} {}", marker, outcome)).ok();
    }
    Ok(())
}

fn confirm(term: &Term, question: &str) -> Result<bool> {
    term.write_str(&format!("{} {} [y/N] ", style("?").cyan().bold(), question))?;
    let answer = term.read_line()?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "ya"
    ))
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Document Organizer").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_scan(term: &Term, scan: &ScanState, verbose: bool) {
    term.write_line("").ok();
    let redundant: usize = scan.clusters.iter().map(|c| c.redundant.len()).sum();
    let reclaimable: u64 = scan.clusters.iter().map(|c| c.redundant_bytes()).sum();
    term.write_line(&format!(
        "  {} documents, {} redundant copies ({})",
        style(scan.result.records.len()).cyan(),
        style(redundant).cyan(),
        style(format_bytes(reclaimable)).yellow()
    ))
    .ok();
    term.write_line("").ok();

    if scan.clusters.is_empty() {
        term.write_line("  No duplicates found.").ok();
    } else {
        term.write_line(&format!("{}", style("Duplicate Sets:").bold().underlined()))
            .ok();
        for (i, cluster) in scan.clusters.iter().enumerate() {
            term.write_line(&format!(
                "  {} {} ({} files)",
                style(format!("Set {}:", i + 1)).bold(),
                style(cluster.fingerprint.short()).dim(),
                cluster.member_count()
            ))
            .ok();
            term.write_line(&format!(
                "    {} {}",
                style("★").green(),
                cluster.canonical.relative_path
            ))
            .ok();
            for record in &cluster.redundant {
                term.write_line(&format!("    {} {}", style("○").dim(), record.relative_path))
                    .ok();
            }
        }
    }

    if !scan.result.warnings.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} {} files could not be fully read",
            style("!").yellow().bold(),
            scan.result.warnings.len()
        ))
        .ok();
        if verbose {
            for warning in &scan.result.warnings {
                term.write_line(&format!(
                    "    {}: {}",
                    display_path(&warning.path),
                    warning.message
                ))
                .ok();
            }
        }
    }
}

fn print_plan(term: &Term, grouping: &GroupingOutcome, plan: &MovePlan, verbose: bool) {
    term.write_line("").ok();
    if grouping.used_fallback {
        term.write_line(&format!(
            "  {} Grouped by file extension: {}",
            style("!").yellow().bold(),
            grouping.fallback_reason.as_deref().unwrap_or("classification unavailable")
        ))
        .ok();
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{} {}",
        style("Plan:").bold().underlined(),
        style(display_path(&plan.output_root)).dim()
    ))
    .ok();
    for group in &plan.groups {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} {}/",
            style(&group.name).bold(),
            style(&group.folder).dim()
        ))
        .ok();
        if !group.rationale.is_empty() {
            term.write_line(&format!("    {}", style(&group.rationale).italic()))
                .ok();
        }
        for op in plan.operations_in(&group.folder) {
            let mut line = format!("    {} {}", style("→").cyan(), op.relative_path);
            if op.file_name() != op.original_name() {
                line.push_str(&format!(" as {}", op.file_name()));
            }
            if let Some(canonical) = &op.duplicate_of {
                line.push_str(&format!(" {}", style(format!("(duplikat dari {})", canonical)).dim()));
            }
            term.write_line(&line).ok();
        }
    }
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} moves into {} folders ({} grouped, {} duplicates)",
        style(plan.total_moves()).cyan(),
        style(plan.groups.len()).cyan(),
        grouping.file_count(),
        plan.duplicate_count()
    ))
    .ok();
    if verbose {
        if let Some(raw) = &grouping.raw_response {
            term.write_line(&format!("{}", style("Classifier response:").dim()))
                .ok();
            term.write_line(&format!("{}", style(raw).dim())).ok();
        }
    }
    term.write_line("").ok();
}

fn print_apply(term: &Term, report: &ApplyReport) {
    term.write_line(&format!(
        "  {} files moved, {} folders created in {:.1}s",
        style(report.moved()).cyan(),
        report.folders_created,
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    if report.is_partial() {
        term.write_line(&format!(
            "  {} These files were left in place:",
            style("!").yellow().bold()
        ))
        .ok();
    }
    for skipped in &report.skipped {
        term.write_line(&format!(
            "    {} {}: {}",
            style("○").yellow(),
            skipped.operation.relative_path,
            skipped.error
        ))
        .ok();
    }
    for warning in &report.metadata_warnings {
        term.write_line(&format!("    {} {}", style("!").yellow(), warning))
            .ok();
    }
    term.write_line("").ok();
}

fn print_undo(term: &Term, report: &UndoReport) {
    if report.is_complete() {
        term.write_line("  Every moved file is back in its original place.")
            .ok();
    }
    for failure in &report.failures {
        term.write_line(&format!(
            "    {} {}: {}",
            style("✗").red(),
            failure.operation.relative_path,
            failure.error
        ))
        .ok();
    }
    for warning in &report.removal_warnings {
        term.write_line(&format!("    {} {}", style("!").dim(), warning))
            .ok();
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{}", text);
    Ok(())
}

fn display_path(path: &Path) -> String {
    let home = dirs::home_dir().unwrap_or_default();
    match path.strip_prefix(&home) {
        Ok(rest) if !home.as_os_str().is_empty() => format!("~/{}", rest.display()),
        _ => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

//! Runs a [`Plan`] step by step, and reads one back for `status`.
//!
//! Failure policy: every step failure is downgraded to a printed warning and
//! the run moves on. Nothing is rolled back. A partial run is recovered by
//! running again; the patch rules make the second pass a no-op where the
//! first one succeeded.

use crate::fsops;
use crate::guard::ProjectGuard;
use crate::patch::{self, Decision, PatchOutcome, PatchRule};
use crate::process::ProcessRunner;
use crate::recipe::rules;
use crate::recipe::steps::{Plan, Step};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Counts for the closing report. `warnings` covers everything downgraded:
/// failed commands, missing files, anchor misses, guard refusals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub applied: usize,
    pub already_present: usize,
    pub skipped: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn print(&self) {
        println!();
        println!("{}", "Summary:".bold());
        println!("  {} applied", format!("{}", self.applied).green());
        println!(
            "  {} already in place",
            format!("{}", self.already_present).yellow()
        );
        println!("  {} skipped", format!("{}", self.skipped).cyan());
        println!("  {} warnings", format!("{}", self.warnings).yellow());
    }
}

/// Execute every step in order, printing one line per step as it happens.
///
/// Output goes straight to the terminal rather than through a collected
/// result list: the command steps stream composer and npm output live, so
/// the surrounding status lines have to interleave with them in real time.
pub fn execute(plan: &Plan, runner: &mut dyn ProcessRunner, show_diff: bool) -> Summary {
    let mut summary = Summary::default();
    // Built on first use: the project root only exists once create-project
    // has run.
    let mut guard: Option<ProjectGuard> = None;

    for step in &plan.steps {
        match step {
            Step::Note(msg) => {
                println!();
                println!("{}", msg.bold());
            }
            Step::Run(spec) => {
                println!("{}", format!("$ {}", spec).dimmed());
                match runner.run(spec) {
                    Ok(()) => summary.applied += 1,
                    Err(e) => warn(&mut summary, &e.to_string()),
                }
            }
            Step::Patch { target, rule } => {
                let path = match checked_target(&mut guard, &plan.project_root, target) {
                    Ok(path) => path,
                    Err(msg) => {
                        warn(&mut summary, &msg);
                        continue;
                    }
                };
                let before = if show_diff {
                    fs::read_to_string(&path).ok()
                } else {
                    None
                };
                match patch::patch(&path, rule) {
                    Ok(outcome) => report_outcome(
                        &mut summary,
                        rule.label,
                        target,
                        &outcome,
                        before.as_deref(),
                    ),
                    Err(e) => warn(&mut summary, &format!("{}: {}", rule.label, e)),
                }
            }
            Step::Append { target, rule } => {
                let path = match checked_target(&mut guard, &plan.project_root, target) {
                    Ok(path) => path,
                    Err(msg) => {
                        warn(&mut summary, &msg);
                        continue;
                    }
                };
                match patch::append(&path, rule) {
                    Ok(outcome) => {
                        report_outcome(&mut summary, rule.label, target, &outcome, None)
                    }
                    Err(e) => warn(&mut summary, &format!("{}: {}", rule.label, e)),
                }
            }
            Step::Scaffold { target, rule } => {
                let path = match checked_target(&mut guard, &plan.project_root, target) {
                    Ok(path) => path,
                    Err(msg) => {
                        warn(&mut summary, &msg);
                        continue;
                    }
                };
                match patch::scaffold(&path, rule) {
                    Ok(outcome) => {
                        report_outcome(&mut summary, rule.label, target, &outcome, None)
                    }
                    Err(e) => warn(&mut summary, &format!("{}: {}", rule.label, e)),
                }
            }
            Step::ReplaceTree { source, target } => {
                let path = match checked_target(&mut guard, &plan.project_root, target) {
                    Ok(path) => path,
                    Err(msg) => {
                        warn(&mut summary, &msg);
                        continue;
                    }
                };
                match fsops::replace_tree(source, &path) {
                    Ok(stats) => {
                        println!(
                            "{} {}: Replaced with {} ({} files)",
                            "✓".green(),
                            target,
                            source.display(),
                            stats.files
                        );
                        summary.applied += 1;
                    }
                    Err(e) => warn(&mut summary, &e.to_string()),
                }
            }
            Step::Skip { label, reason } => {
                println!("{} {}: Skipped ({})", "⊘".cyan(), label, reason);
                summary.skipped += 1;
            }
        }
    }

    summary
}

/// Print the step list without touching the filesystem or spawning anything.
pub fn render_plan(plan: &Plan) {
    println!(
        "{}",
        "[DRY RUN - planned steps, nothing will be executed]".cyan()
    );
    for step in &plan.steps {
        match step {
            Step::Note(msg) => {
                println!();
                println!("{}", msg.bold());
            }
            other => println!("  {}", other.describe()),
        }
    }
}

fn warn(summary: &mut Summary, message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
    summary.warnings += 1;
}

fn report_outcome(
    summary: &mut Summary,
    label: &str,
    target: &str,
    outcome: &PatchOutcome,
    before: Option<&str>,
) {
    match outcome {
        PatchOutcome::Applied { file } => {
            println!("{} {}: Applied to {}", "✓".green(), label, target);
            summary.applied += 1;
            if let Some(before) = before {
                if let Ok(after) = fs::read_to_string(file) {
                    if before != after {
                        display_diff(file, before, &after);
                    }
                }
            }
        }
        PatchOutcome::AlreadyPresent { .. } => {
            println!(
                "{} {}: Already applied to {}",
                "⊙".yellow(),
                label,
                target
            );
            summary.already_present += 1;
        }
        PatchOutcome::FileMissing { .. } | PatchOutcome::PatternNotFound { .. } => {
            warn(summary, &format!("{}: {}", label, outcome));
        }
    }
}

/// Resolve a step's relative target against the project root, refusing
/// anything that leaves the root or lands in a package-manager tree.
fn checked_target(
    slot: &mut Option<ProjectGuard>,
    root: &Path,
    target: &str,
) -> Result<PathBuf, String> {
    if slot.is_none() {
        *slot = Some(
            ProjectGuard::new(root).map_err(|e| format!("{}: {}", root.display(), e))?,
        );
    }
    let guard = slot
        .as_ref()
        .ok_or_else(|| format!("{}: project guard unavailable", root.display()))?;
    guard
        .validate_target(Path::new(target))
        .map_err(|e| format!("{}: {}", target, e))
}

/// Unified diff of one applied patch, for the operator's eyes only.
fn display_diff(file: &Path, before: &str, after: &str) {
    println!("\n{}", format!("--- {} (before)", file.display()).dimmed());
    println!("{}", format!("+++ {} (after)", file.display()).dimmed());

    let diff = TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", line);
    }
}

/// What one rule would do if the installer ran now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Applied,
    Pending,
    /// Cannot be decided from the file: missing, unreadable, or anchor drift.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub label: String,
    pub target: &'static str,
    pub status: StepStatus,
}

/// Read-only report over every known rule. Both database families are
/// listed; the one matching the project's `.env` shows as applied and the
/// other as pending, which tells the operator which kind was installed.
pub fn status_report(root: &Path) -> Vec<StatusEntry> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());

    let mut catalogue: Vec<(&'static str, String, PatchRule)> = vec![(
        rules::ENV_FILE,
        "env app name".to_string(),
        rules::app_name(),
    )];
    catalogue.push((
        rules::ENV_FILE,
        "env db connection (sqlite)".to_string(),
        rules::sqlite_connection(),
    ));
    for rule in rules::mysql_family(&name) {
        catalogue.push((rules::ENV_FILE, format!("{} (mysql)", rule.label), rule));
    }
    for (target, rule) in [
        (rules::BOOTSTRAP_APP, rules::middleware_aliases()),
        (rules::USER_MODEL, rules::user_model_traits()),
        (rules::USER_MODEL, rules::user_model_imports()),
        (rules::TAILWIND_CONFIG, rules::tailwind_heroui()),
    ] {
        catalogue.push((target, rule.label.to_string(), rule));
    }

    let mut entries: Vec<StatusEntry> = catalogue
        .into_iter()
        .map(|(target, label, rule)| StatusEntry {
            status: rule_status(root, target, &rule),
            label,
            target,
        })
        .collect();

    let health = rules::health_route();
    let health_status = match fs::read_to_string(root.join(rules::WEB_ROUTES)) {
        Ok(content) => {
            if health.present.matches(&content) {
                StepStatus::Applied
            } else {
                StepStatus::Pending
            }
        }
        // append bootstraps a missing routes file, so missing means pending
        Err(e) if e.kind() == io::ErrorKind::NotFound => StepStatus::Pending,
        Err(e) => StepStatus::Unknown(e.to_string()),
    };
    entries.push(StatusEntry {
        label: health.label.to_string(),
        target: rules::WEB_ROUTES,
        status: health_status,
    });

    for (target, rule) in [
        (rules::MAKE_INERTIA_COMMAND, rules::make_inertia_command()),
        (rules::MAKE_ORION_COMMAND, rules::make_orion_command()),
    ] {
        let status = if root.join(target).exists() {
            StepStatus::Applied
        } else {
            StepStatus::Pending
        };
        entries.push(StatusEntry {
            label: rule.label.to_string(),
            target,
            status,
        });
    }

    entries
}

fn rule_status(root: &Path, target: &str, rule: &PatchRule) -> StepStatus {
    let content = match fs::read_to_string(root.join(target)) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return StepStatus::Unknown("file missing".to_string());
        }
        Err(e) => return StepStatus::Unknown(e.to_string()),
    };
    match patch::evaluate(&content, rule) {
        Decision::AlreadyPresent => StepStatus::Applied,
        Decision::Apply { .. } => StepStatus::Pending,
        Decision::PatternNotFound => StepStatus::Unknown(rule.not_found.clone()),
    }
}

//! Console reporting for runs.
//!
//! Human output prints a line per file as the runner finishes it; JSON output
//! prints one document once the run is over. Reporting never influences
//! control flow.

use crate::run::{FileOutcome, FileReport, RunReport};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub dry_run: bool,
    pub diff: bool,
    pub json: bool,
    pub verbose: bool,
    /// Print the `Total files fixed` line at the end
    pub summary: bool,
    /// Print `No changes` lines for unchanged files
    pub show_unchanged: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    options: ReportOptions,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    dry_run: bool,
    files: &'a [FileReport],
    fixed: usize,
    unchanged: usize,
    failed: usize,
}

impl Reporter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Called once per file, in processing order.
    pub fn file(&self, report: &FileReport) {
        if self.options.json {
            return;
        }

        match &report.outcome {
            FileOutcome::Changed { insertions } => {
                let label = if self.options.dry_run {
                    "Would fix:"
                } else {
                    "Fixed:"
                };
                println!("{} {} {}", "✓".green(), label, report.path.display());

                if self.options.verbose {
                    for insertion in insertions {
                        println!(
                            "    {} line {}: +{}",
                            insertion.rule_id.cyan(),
                            insertion.line,
                            insertion.fields.join(", +")
                        );
                    }
                }

                if self.options.diff {
                    if let Some((before, after)) = &report.texts {
                        display_diff(&report.path, before, after);
                    }
                }
            }
            FileOutcome::Unchanged => {
                if self.options.show_unchanged || self.options.verbose {
                    println!("{} No changes: {}", "⊙".yellow(), report.path.display());
                }
            }
            FileOutcome::Failed { reason } => {
                eprintln!(
                    "{} Error fixing {}: {}",
                    "✗".red(),
                    report.path.display(),
                    reason
                );
            }
        }
    }

    /// Called once after every file has been processed.
    pub fn finish(&self, run: &RunReport) -> serde_json::Result<()> {
        if self.options.json {
            let summary = JsonSummary {
                dry_run: self.options.dry_run,
                files: &run.files,
                fixed: run.changed_count(),
                unchanged: run.unchanged_count(),
                failed: run.failed_count(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        if self.options.summary {
            let label = if self.options.dry_run {
                "Total files to fix:"
            } else {
                "Total files fixed:"
            };
            println!();
            println!("{} {}", label.bold(), run.changed_count());
        }

        if self.options.verbose {
            println!(
                "  {} unchanged, {} failed",
                run.unchanged_count(),
                failed_count(run.failed_count())
            );
        }

        Ok(())
    }
}

fn failed_count(count: usize) -> ColoredString {
    let text = count.to_string();
    if count > 0 {
        text.red()
    } else {
        text.normal()
    }
}

/// Show unified diff between original and patched content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for hunk in diff.unified_diff().context_radius(2).iter_hunks() {
        println!("{}", format!("{}", hunk.header()).cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", change).red(),
                ChangeTag::Insert => format!("+{}", change).green(),
                ChangeTag::Equal => format!(" {}", change).normal(),
            };
            print!("{}", line);
            if change.missing_newline() {
                println!();
            }
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fieldfix::config::{self, FixConfig};
use fieldfix::engine::PatchEngine;
use fieldfix::report::{ReportOptions, Reporter};
use fieldfix::run::Runner;
use fieldfix::safety::WorkspaceGuard;
use fieldfix::select::FileSelector;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fieldfix")]
#[command(
    about = "Insert generated ids and timestamps into record-creation calls",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to workspace root (defaults to the current directory)
    #[arg(short, long, global = true, env = "FIELDFIX_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Fix config TOML (defaults to <workspace>/fieldfix.toml, then the built-in rules)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long, global = true)]
    diff: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Show per-call-site detail and unchanged files
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fix every matching file under the configured walk root (default)
    Walk,

    /// Fix the configured list of files, in order
    List,

    /// Report which files would change without writing anything
    Check {
        /// Check the configured file list instead of walking
        #[arg(long)]
        list: bool,
    },

    /// List configured rules
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let workspace = resolve_workspace(cli.workspace.as_deref())?;
    let config = config::resolve(cli.config.as_deref(), &workspace)?;

    let options = ReportOptions {
        dry_run: cli.dry_run,
        diff: cli.diff,
        json: cli.json,
        verbose: cli.verbose,
        ..ReportOptions::default()
    };

    match cli.command.unwrap_or(Commands::Walk) {
        Commands::Walk => cmd_fix(&config, &workspace, FileSelector::walk(&config.select), options),
        Commands::List => cmd_fix(&config, &workspace, FileSelector::list(&config.select), options),
        Commands::Check { list } => {
            let selector = if list {
                FileSelector::list(&config.select)
            } else {
                FileSelector::walk(&config.select)
            };
            let options = ReportOptions {
                dry_run: true,
                ..options
            };
            cmd_fix(&config, &workspace, selector, options)
        }
        Commands::Rules => cmd_rules(&config),
    }
}

/// Resolve the workspace root
///
/// Priority order:
/// 1. Explicit --workspace flag (or FIELDFIX_WORKSPACE)
/// 2. Current directory
fn resolve_workspace(cli_workspace: Option<&Path>) -> Result<PathBuf> {
    let path = match cli_workspace {
        Some(path) => path.to_path_buf(),
        None => env::current_dir().context("cannot determine current directory")?,
    };

    path.canonicalize()
        .with_context(|| format!("workspace does not exist: {}", path.display()))
}

fn cmd_fix(
    config: &FixConfig,
    workspace: &Path,
    selector: FileSelector,
    options: ReportOptions,
) -> Result<()> {
    let engine = PatchEngine::new(config)?;
    let guard = WorkspaceGuard::new(workspace, config.select.walk.skip_dirs.as_slice())?;
    let candidates = selector.select(workspace);

    // List mode mirrors each file's outcome; walk mode stays quiet about
    // untouched files and ends with a count.
    let reporter = Reporter::new(ReportOptions {
        summary: selector.is_walk(),
        show_unchanged: !selector.is_walk(),
        ..options
    });

    if options.verbose && !options.json {
        println!(
            "{}",
            format!(
                "Workspace: {} ({} candidate files, {} rules)",
                workspace.display(),
                candidates.len(),
                config.rules.len()
            )
            .dimmed()
        );
    }

    let run = Runner::new(&engine, &guard)
        .dry_run(options.dry_run)
        .run(&candidates, |file| reporter.file(file));

    reporter.finish(&run)?;

    // Per-file failures are reported above and do not change the exit status
    Ok(())
}

fn cmd_rules(config: &FixConfig) -> Result<()> {
    let name = if config.meta.name.is_empty() {
        "(unnamed)"
    } else {
        config.meta.name.as_str()
    };
    println!("{} {}", "Rule set:".bold(), name);
    if let Some(description) = &config.meta.description {
        println!("{}", description.dimmed());
    }
    println!();

    for rule in &config.rules {
        println!(
            "{} {}.{}.{}({{ {}: {{ ... }} }})",
            rule.id.green(),
            config.meta.clients.join("|"),
            rule.model,
            config.meta.method,
            config.meta.data_key
        );
        println!("    first fields: {}", rule.first_fields.join(", "));
        for field in &rule.insert {
            println!("    insert:       {}: {}", field.name, field.value);
        }
    }

    Ok(())
}

//! # CLI Module
//!
//! Command-line interface for the artwork vault.
//!
//! ## Usage
//! ```bash
//! # Find duplicate artwork
//! artvault scan /plex/Metadata --output json
//!
//! # Delete into the backup store, then change your mind
//! artvault delete /plex/Metadata/Movies/a/posters/x.jpg --reason duplicate
//! artvault undo 12
//!
//! # Housekeeping
//! artvault history --limit 20
//! artvault clean --days 30
//! ```

use artwork_vault::core::backup::BackupUsage;
use artwork_vault::core::history::Operation;
use artwork_vault::core::pipeline::ScanReport;
use artwork_vault::core::retention::CleanResult;
use artwork_vault::core::vault::{BatchResult, UndoResult};
use artwork_vault::error::{Result, VaultError};
use artwork_vault::events::{Event, EventChannel, HashEvent, ScanEvent};
use artwork_vault::{init_tracing, Vault, VaultBuilder};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::thread;

/// Artwork Vault - Delete media artwork without fear
#[derive(Parser, Debug)]
#[command(name = "artvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backup store location
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan directories for byte-identical artwork
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Hashing threads (0 = one per core)
        #[arg(short, long, default_value = "0")]
        workers: usize,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,
    },
    /// Move files into the backup store
    Delete {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Recorded with each operation
        #[arg(short, long, default_value = "manual")]
        reason: String,
    },
    /// Restore a deleted file to its original location
    Undo { id: u64 },
    /// Permanently remove a deleted file's backup
    Purge { id: u64 },
    /// Show recent operations, newest first
    History {
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show how much space the backup store uses
    Usage,
    /// Remove backups older than the given age
    Clean {
        #[arg(short, long, default_value = "30")]
        days: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths or ids only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { "debug" } else { "warn" });

    let term = Term::stderr();
    let output = cli.output;
    let verbose = cli.verbose;

    match cli.command {
        Commands::Scan {
            paths,
            workers,
            include_hidden,
        } => run_scan(&term, cli.backup_dir, paths, workers, include_hidden, output, verbose),
        Commands::Delete { files, reason } => {
            let vault = open_vault(cli.backup_dir)?;
            let batch = vault.delete(&files, &reason);
            match output {
                OutputFormat::Pretty => print_batch(&term, &batch),
                OutputFormat::Json => print_json(&batch)?,
                OutputFormat::Minimal => {
                    for result in batch.results.iter().filter(|r| r.success) {
                        if let Some(id) = result.operation_id {
                            println!("{}", id);
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Undo { id } => {
            let vault = open_vault(cli.backup_dir)?;
            let outcome = vault.undo(id);
            match output {
                OutputFormat::Json => print_json(&UndoResult::new(id, &outcome))?,
                OutputFormat::Minimal => {
                    if let Ok(path) = &outcome {
                        println!("{}", path.display());
                    }
                }
                OutputFormat::Pretty => {
                    if let Ok(path) = &outcome {
                        status(&term, true, &format!("Restored {}", display_path(path)));
                    }
                }
            }
            outcome.map(|_| ()).map_err(VaultError::from)
        }
        Commands::Purge { id } => {
            let vault = open_vault(cli.backup_dir)?;
            let op = vault.purge(id)?;
            match output {
                OutputFormat::Json => print_json(&op)?,
                OutputFormat::Minimal => println!("{}", op.id),
                OutputFormat::Pretty => status(
                    &term,
                    true,
                    &format!("Purged backup of {}", display_path(&op.original_path)),
                ),
            }
            Ok(())
        }
        Commands::History { limit } => {
            let vault = open_vault(cli.backup_dir)?;
            let operations = vault.list_operations(limit);
            match output {
                OutputFormat::Pretty => print_history(&term, &operations),
                OutputFormat::Json => print_json(&operations)?,
                OutputFormat::Minimal => {
                    for op in &operations {
                        println!("{}\t{}", op.id, op.original_path.display());
                    }
                }
            }
            Ok(())
        }
        Commands::Usage => {
            let vault = open_vault(cli.backup_dir)?;
            let usage = vault.backup_usage();
            match output {
                OutputFormat::Pretty => print_usage(&term, vault.backup_root(), &usage),
                OutputFormat::Json => print_json(&usage)?,
                OutputFormat::Minimal => println!("{}", usage.total_size_bytes),
            }
            Ok(())
        }
        Commands::Clean { days } => {
            let vault = open_vault(cli.backup_dir)?;
            let cleaned = vault.clean_backups(days)?;
            match output {
                OutputFormat::Pretty => print_clean(&term, days, &cleaned),
                OutputFormat::Json => print_json(&cleaned)?,
                OutputFormat::Minimal => {
                    for name in &cleaned.removed {
                        println!("{}", name);
                    }
                }
            }
            Ok(())
        }
    }
}

fn vault_builder(backup_dir: Option<PathBuf>) -> VaultBuilder {
    match backup_dir {
        Some(dir) => VaultBuilder::new().backup_root(dir),
        None => VaultBuilder::new(),
    }
}

fn open_vault(backup_dir: Option<PathBuf>) -> Result<Vault> {
    vault_builder(backup_dir).open()
}

fn run_scan(
    term: &Term,
    backup_dir: Option<PathBuf>,
    paths: Vec<PathBuf>,
    workers: usize,
    include_hidden: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Artwork Vault").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let (sender, receiver) = EventChannel::new();

    let vault = vault_builder(backup_dir)
        .hash_workers(workers)
        .events(sender)
        .open()?;

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Scan(ScanEvent::Completed { total_entries }) => {
                    pb.set_length(total_entries as u64);
                    pb.set_message("hashing");
                }
                Event::Hash(HashEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Hash(HashEvent::Completed { .. }) => pb.finish_and_clear(),
                _ => {}
            }
        }
    });

    let cancel = AtomicBool::new(false);
    let scan_config = artwork_vault::core::scanner::ScanConfig {
        include_hidden,
        ..Default::default()
    };
    let report = vault.scan_with_config(&paths, scan_config, &cancel);

    // Dropping the vault drops the sender, which ends the event thread
    drop(vault);
    event_thread.join().ok();
    let report = report?;

    match output {
        OutputFormat::Pretty => print_scan(term, &report, verbose),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Minimal => {
            for pair in &report.pairs {
                println!("{}", pair.duplicate_entry.path.display());
            }
        }
    }

    Ok(())
}

fn print_scan(term: &Term, report: &ScanReport, verbose: bool) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files scanned in {:.1}s",
        style(report.entries.len()).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups, {} duplicate files",
        style(report.groups.len()).cyan(),
        style(report.pairs.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(report.wasted_bytes())).yellow()
    ))
    .ok();
    if report.hash_summary.failed > 0 {
        term.write_line(&format!(
            "  {} unreadable files skipped",
            style(report.hash_summary.failed).red()
        ))
        .ok();
    }
    if verbose {
        for error in &report.errors {
            term.write_line(&format!("  {} {}", style("!").red(), style(error).dim()))
                .ok();
        }
    }
    term.write_line("").ok();

    if report.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
        return;
    }

    term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    for (i, group) in report.groups.iter().enumerate() {
        term.write_line(&format!(
            "  {} {} ({} files, {})",
            style(format!("Group {}:", i + 1)).bold(),
            style(group.hash.to_hex()).dim(),
            group.entries.len(),
            format_bytes(group.wasted_bytes)
        ))
        .ok();

        term.write_line(&format!(
            "    {} {}",
            style("★").green(),
            display_path(&group.keeper().path)
        ))
        .ok();
        for entry in group.duplicates() {
            term.write_line(&format!(
                "    {} {} {}",
                style("○").dim(),
                display_path(&entry.path),
                style(format!("[{}]", entry.category)).dim()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("No files were deleted. Use `artvault delete` to move duplicates into the backup store.").dim()
    ))
    .ok();
}

fn print_batch(term: &Term, batch: &BatchResult) {
    for result in &batch.results {
        match (&result.backup_path, &result.error) {
            (Some(backup), None) => status(
                term,
                true,
                &format!(
                    "{} → {} (#{})",
                    display_path(&result.file),
                    display_path(backup),
                    result.operation_id.unwrap_or_default()
                ),
            ),
            (_, Some(error)) => status(
                term,
                false,
                &format!("{}: {}", display_path(&result.file), error.message),
            ),
            (None, None) => {}
        }
    }
    term.write_line(&format!(
        "\n  {} of {} files moved to the backup store",
        style(batch.succeeded()).cyan(),
        batch.total
    ))
    .ok();
}

fn print_history(term: &Term, operations: &[Operation]) {
    if operations.is_empty() {
        term.write_line("  No operations recorded yet").ok();
        return;
    }
    for op in operations {
        let state = if op.permanently_deleted {
            style("purged").red()
        } else if op.is_undone() {
            style("undone").yellow()
        } else {
            style("undoable").green()
        };
        term.write_line(&format!(
            "  {:>5}  {}  {:<9} {}  {}",
            style(op.id).bold(),
            op.timestamp.format("%Y-%m-%d %H:%M:%S"),
            state,
            display_path(&op.original_path),
            style(&op.reason).dim()
        ))
        .ok();
    }
}

fn print_usage(term: &Term, root: &Path, usage: &BackupUsage) {
    term.write_line(&format!(
        "  {} in {} files",
        style(format_bytes(usage.total_size_bytes)).yellow(),
        style(usage.file_count).cyan()
    ))
    .ok();
    term.write_line(&format!("  {}", style(display_path(root)).dim()))
        .ok();
}

fn print_clean(term: &Term, days: u32, cleaned: &CleanResult) {
    status(
        term,
        true,
        &format!(
            "Removed {} backup folders older than {} days",
            cleaned.removed_count, days
        ),
    );
    for name in &cleaned.removed {
        term.write_line(&format!("    {}", style(name).dim())).ok();
    }
}

fn status(term: &Term, ok: bool, message: &str) {
    let marker = if ok {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    term.write_line(&format!("{} {}", marker, message)).ok();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| VaultError::Config(format!("failed to render JSON: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
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

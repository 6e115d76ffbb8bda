use std::path::PathBuf;

use acn_core::{Config, FileRenameLog, Normalizer, PerceptualHasher};
use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "acn", version, about = "Photo archive helpers - duplicate finder and capture-date renamer")]
struct Cli {
    /// Config file (default: <config dir>/acn/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rename log file, overrides the config
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Show a progress bar while renaming
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List images in a folder whose perceptual hash matches an earlier image
    Duplicates {
        /// Folder to scan (not recursive)
        dir: PathBuf,

        /// Print pairs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename the media of a single event folder into the archive
    Event {
        /// Event folder name, `YYYY-MM-DD - <text>`
        folder: String,

        /// Parent directory holding the event folder
        #[arg(long)]
        source: PathBuf,

        /// Archive root; the event folder is mirrored underneath
        #[arg(long)]
        archive: PathBuf,

        /// Author name embedded in the new filenames
        #[arg(long)]
        author: String,
    },

    /// Rename every event folder of an author into the archive
    Author {
        /// Author name; also the folder name under --authors-root
        name: String,

        #[arg(long)]
        authors_root: PathBuf,

        #[arg(long)]
        archive: PathBuf,
    },

    /// Delete an author's empty event folders
    Clean {
        name: String,

        #[arg(long)]
        authors_root: PathBuf,
    },

    /// Re-tag files whose name carries a year before 2000
    Repair {
        /// Folder holding renamed files
        dir: PathBuf,

        /// Treat DIR as a root and repair each event folder below it
        #[arg(long)]
        all: bool,
    },
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")?.progress_chars("=> "));
    Ok(bar)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(log) = cli.log {
        config.log_path = log;
    }
    config.show_progress |= cli.progress;

    let bar = if config.show_progress { Some(progress_bar()?) } else { None };
    let on_progress = |_stage: &str, current: u64, total: u64, message: &str| {
        if let Some(bar) = &bar {
            bar.set_length(total);
            bar.set_position(current + 1);
            bar.set_message(message.to_string());
        }
    };

    let mut log = FileRenameLog::new(&config.log_path);

    match cli.command {
        Command::Duplicates { dir, json } => {
            let pairs = acn_core::find_duplicates(&dir, &PerceptualHasher::new())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pairs)?);
            } else if pairs.is_empty() {
                println!("No duplicates found.");
            } else {
                println!("Duplicate images found:");
                for pair in &pairs {
                    println!("{} is a duplicate of {}", pair.duplicate.display(), pair.original.display());
                }
            }
        }

        Command::Event {
            folder,
            source,
            archive,
            author,
        } => {
            let report = Normalizer::new(author, &mut log)
                .with_progress(&on_progress)
                .manage_event_folder(&folder, &source, &archive)?;
            eprintln!(
                "Done! {} renamed, {} left in place, {} source folder(s) removed ({:.2}s)",
                report.renamed,
                report.left_in_place,
                report.removed_folders,
                t_total.elapsed().as_secs_f64()
            );
        }

        Command::Author {
            name,
            authors_root,
            archive,
        } => {
            let report = Normalizer::new(name, &mut log)
                .with_progress(&on_progress)
                .manage_author_content(&authors_root, &archive)?;
            eprintln!(
                "Done! {} renamed, {} left in place, {} source folder(s) removed ({:.2}s)",
                report.renamed,
                report.left_in_place,
                report.removed_folders,
                t_total.elapsed().as_secs_f64()
            );
        }

        Command::Clean { name, authors_root } => {
            let removed = acn_core::clear_empty_folders(&name, &authors_root)?;
            eprintln!("Removed {} empty folder(s)", removed.len());
        }

        Command::Repair { dir, all } => {
            let renamed = if all {
                acn_core::repair_all(&dir, &mut log)?
            } else {
                acn_core::repair_dir(&dir, &mut log)?
            };
            eprintln!("Repaired {} file(s)", renamed.len());
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    Ok(())
}

//! # CLI Module
//!
//! Command-line interface for the image data aggregator.
//!
//! ## Usage
//! ```bash
//! # Serial numbers of every JPEG under a folder
//! aid ~/Pictures --ext jpg
//!
//! # Focal lengths of Leica DNGs, most used first
//! aid ~/Pictures --ext dng --model leica --mode focal-lengths --sort count
//!
//! # Distinct cover art in a music library, written to ./out
//! aid ~/Music --mode embedded --create
//!
//! # JSON output
//! aid ~/Pictures --mode models --output json
//! ```

use clap::{Parser, ValueEnum};
use console::{style, Term};
use image_data_aggregator::core::dispatch::{inspect_file, Mode};
use image_data_aggregator::core::materializer::DEFAULT_OUT_DIR;
use image_data_aggregator::core::metadata::ExifMetadataSource;
use image_data_aggregator::core::pipeline::{Aggregator, Execution, RunReport};
use image_data_aggregator::core::reporter::{write_json, write_text};
use image_data_aggregator::core::tracker::SortOrder;
use image_data_aggregator::error::{AidError, Result};
use image_data_aggregator::events::{Event, EventChannel, ExtractEvent, PipelineEvent, ScanEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

/// Aggregate Image Data - count camera, lens and image metadata
#[derive(Parser, Debug)]
#[command(name = "aid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// A file to inspect, a directory to aggregate, or a `*.ext` pattern
    path: Option<PathBuf>,

    /// What to aggregate
    #[arg(short = 'a', long, value_enum, default_value = "serials")]
    mode: ModeArg,

    /// Extension to include; repeatable, `?` and `*` allowed (default: all)
    #[arg(short = 'e', long = "ext")]
    extensions: Vec<String>,

    /// Only count files whose camera model contains this (case insensitive)
    #[arg(short, long, default_value = "")]
    model: String,

    /// Report order
    #[arg(short, long, value_enum, default_value = "key")]
    sort: SortArg,

    /// Process files on one thread, in order
    #[arg(short = 'o', long)]
    one_thread: bool,

    /// Worker threads (default: one per core)
    #[arg(short = 'j', long, conflicts_with = "one_thread")]
    threads: Option<usize>,

    /// With `--mode embedded`, write each distinct image to `--out-dir`
    #[arg(short, long)]
    create: bool,

    /// Where `--create` writes images
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    output: OutputFormat,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Per-file diagnostics
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Camera body and lens serial numbers (default)
    Serials,
    /// Lens models
    Lenses,
    /// 35mm-equivalent focal lengths
    FocalLengths,
    /// Camera models
    Models,
    /// Star ratings
    Ratings,
    /// Files with an embedded image (e.g. flac cover art)
    HasImage,
    /// Files with GPS coordinates
    Gps,
    /// Distinct embedded images (flac/mp3 unless --ext is given)
    Embedded,
    /// Files with and without raw editor settings
    EditorEdits,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Serials => Mode::Serials,
            ModeArg::Lenses => Mode::Lenses,
            ModeArg::FocalLengths => Mode::FocalLengths,
            ModeArg::Models => Mode::Models,
            ModeArg::Ratings => Mode::Ratings,
            ModeArg::HasImage => Mode::HasImage,
            ModeArg::Gps => Mode::Gps,
            ModeArg::Embedded => Mode::Embedded,
            ModeArg::EditorEdits => Mode::EditorEdits,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    /// By value
    Key,
    /// By number of files, most first
    Count,
}

impl From<SortArg> for SortOrder {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Key => SortOrder::Key,
            SortArg::Count => SortOrder::Count,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Text tables with a progress bar
    Pretty,
    /// JSON output for scripting
    Json,
}

/// What the positional argument names
#[derive(Debug, PartialEq, Eq)]
enum Target {
    File(PathBuf),
    Tree { root: PathBuf, extension: Option<String> },
}

/// Classify the positional argument; `*.ext` means `ext` under its parent
fn resolve_target(path: Option<PathBuf>) -> Target {
    let path = path.unwrap_or_else(|| PathBuf::from("."));

    if path.is_file() {
        return Target::File(path);
    }

    let pattern = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| n.contains('*') || n.contains('?'))
        .map(str::to_string);

    match pattern {
        Some(pattern) => {
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            Target::Tree {
                root,
                extension: Some(pattern),
            }
        }
        None => Target::Tree {
            root: path,
            extension: None,
        },
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mode = Mode::from(cli.mode);

    match resolve_target(cli.path.clone()) {
        Target::File(path) => {
            if !cli.extensions.is_empty() {
                return Err(AidError::Config(
                    "--ext can't be used when inspecting a single file".to_string(),
                ));
            }
            inspect_file(&ExifMetadataSource::new(), mode, &path, cli.verbose, io::stdout())
                .map_err(|e| AidError::Config(format!("can't write output: {}", e)))
        }
        Target::Tree { root, extension } => {
            let mut extensions = cli.extensions.clone();
            extensions.extend(extension);
            run_aggregate(&cli, mode, root, extensions)
        }
    }
}

fn run_aggregate(cli: &Cli, mode: Mode, root: PathBuf, extensions: Vec<String>) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(cli.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {} {}",
            style("Aggregate Image Data").bold().cyan(),
            style(mode).yellow(),
            style(root.display()).dim()
        ))
        .ok();
    }

    if cli.create && mode != Mode::Embedded {
        term.write_line(&format!(
            "{} --create only applies to --mode embedded",
            style("note:").yellow()
        ))
        .ok();
    }

    let execution = if cli.one_thread {
        Execution::Sequential
    } else {
        Execution::Parallel {
            threads: cli.threads,
        }
    };

    let aggregator = Aggregator::builder()
        .root(root)
        .mode(mode)
        .model_filter(cli.model.as_str())
        .extensions(extensions)
        .execution(execution)
        .verbose(cli.verbose)
        .sort(cli.sort.into())
        .include_hidden(cli.include_hidden)
        .materialize((cli.create && mode == Mode::Embedded).then(|| cli.out_dir.clone()))
        .build();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Verbose blocks and a progress bar would fight over the terminal
    let progress = if pretty && !cli.verbose {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let errors = Term::stderr();
        for event in receiver.iter() {
            if let Event::Extract(ExtractEvent::Error { message, .. }) = &event {
                let line = stream_error_line(message);
                match progress_clone.as_ref() {
                    Some(pb) => pb.suspend(|| errors.write_line(&line).ok()),
                    None => errors.write_line(&line).ok(),
                };
                continue;
            }

            let Some(pb) = progress_clone.as_ref() else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Completed { total_files }) => {
                    pb.set_length(total_files as u64);
                }
                Event::Extract(ExtractEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = aggregator.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = result?;

    let written = match cli.output {
        OutputFormat::Pretty => {
            write_text(&report, io::stdout()).map(|()| print_footer(&term, &report))
        }
        OutputFormat::Json => write_json(&report, io::stdout()),
    };
    written.map_err(|e| AidError::Config(format!("can't write output: {}", e)))
}

/// The error message already names the file
fn stream_error_line(message: &str) -> String {
    format!("can't open stream: {}", message)
}

fn print_footer(term: &Term, report: &RunReport) {
    term.write_line("").ok();

    if !report.errors.is_empty() {
        term.write_line(&format!(
            "{} {} files or images couldn't be read",
            style("!").yellow().bold(),
            style(report.errors.len()).yellow()
        ))
        .ok();
    }

    if let Some(materialized) = &report.materialized {
        for path in &materialized.written {
            term.write_line(&format!("  {} {}", style("+").green(), display_path(path)))
                .ok();
        }
    }

    term.write_line(&format!(
        "{} {} files in {:.1}s",
        style("✓").green().bold(),
        style(report.total_files).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
}

fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

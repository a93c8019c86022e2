//! Run execution: enumerate, fan out, collect, materialize.

use crate::core::dispatch::{CounterSnapshot, Dispatcher, Mode, ModelFilter, Trackers};
use crate::core::hasher::ContentHasher;
use crate::core::materializer::{materialize, MaterializeReport};
use crate::core::metadata::{ExifMetadataSource, MetadataSource};
use crate::core::records::{EmbeddedAssetRecord, Record};
use crate::core::reporter::Section;
use crate::core::scanner::{FileEnumerator, ScanConfig, WalkDirScanner, AUDIO_EXTENSIONS};
use crate::core::tracker::{Dedup, Entry, EntryTracker, SortOrder};
use crate::error::AidError;
use crate::events::{
    null_sender, Event, EventSender, ExtractEvent, ExtractProgress, PipelineEvent, PipelinePhase,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// How files are distributed over workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// One worker, files in enumeration order
    Sequential,
    /// A rayon pool; `None` lets rayon size it
    Parallel { threads: Option<usize> },
}

impl Default for Execution {
    fn default() -> Self {
        Execution::Parallel { threads: None }
    }
}

/// Result of one run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub mode: Mode,
    /// Files enumerated and dispatched
    pub total_files: usize,
    /// Sorted tracker contents; empty for counter modes
    pub sections: Vec<Section>,
    pub counters: CounterSnapshot,
    /// Present when materialization ran
    pub materialized: Option<MaterializeReport>,
    /// Reportable failures (non-fatal)
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Configuration for a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory to enumerate
    pub root: PathBuf,
    pub mode: Mode,
    /// Camera model substring; empty matches everything
    pub model_filter: String,
    /// Extension patterns; empty means every file (audio files in embedded mode)
    pub extensions: Vec<String>,
    pub execution: Execution,
    pub verbose: bool,
    pub sort: SortOrder,
    pub include_hidden: bool,
    /// Output directory for distinct embedded images, if they should be written
    pub materialize: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mode: Mode::default(),
            model_filter: String::new(),
            extensions: Vec::new(),
            execution: Execution::default(),
            verbose: false,
            sort: SortOrder::default(),
            include_hidden: false,
            materialize: None,
        }
    }
}

impl RunConfig {
    /// Extension patterns the enumerator actually uses
    pub fn effective_extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() && self.mode == Mode::Embedded {
            AUDIO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            self.extensions.clone()
        }
    }
}

/// Builder for an [`Aggregator`]
pub struct AggregatorBuilder {
    config: RunConfig,
    source: Option<Box<dyn MetadataSource>>,
}

impl AggregatorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            source: None,
        }
    }

    /// Set the directory to enumerate
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Set the operating mode
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Only count files whose camera model contains `model`
    pub fn model_filter(mut self, model: impl Into<String>) -> Self {
        self.config.model_filter = model.into();
        self
    }

    /// Restrict enumeration to these extension patterns
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the execution policy
    pub fn execution(mut self, execution: Execution) -> Self {
        self.config.execution = execution;
        self
    }

    /// Enable per-file diagnostic blocks
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Set the report sort order
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.config.sort = sort;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    /// Write distinct embedded images into `out_dir` after the run
    pub fn materialize(mut self, out_dir: Option<PathBuf>) -> Self {
        self.config.materialize = out_dir;
        self
    }

    /// Set the metadata source
    pub fn source(mut self, source: Box<dyn MetadataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the aggregator
    pub fn build(self) -> Aggregator {
        Aggregator {
            config: self.config,
            source: self
                .source
                .unwrap_or_else(|| Box::new(ExifMetadataSource::new())),
        }
    }
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregates one kind of metadata over a directory tree
pub struct Aggregator {
    config: RunConfig,
    source: Box<dyn MetadataSource>,
}

impl Aggregator {
    /// Create a new aggregator builder
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::new()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run without events
    pub fn run(&self) -> Result<RunReport, AidError> {
        self.run_with_events(&null_sender())
    }

    /// Enumerate the root, then aggregate every matching file
    pub fn run_with_events(&self, events: &EventSender) -> Result<RunReport, AidError> {
        let start_time = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(ScanConfig {
            include_hidden: self.config.include_hidden,
            extensions: self.config.effective_extensions(),
            ..Default::default()
        });
        let scan_result = scanner.enumerate(&self.config.root, events)?;

        tracing::info!(
            root = %self.config.root.display(),
            files = scan_result.files.len(),
            "enumeration complete"
        );

        let errors = scan_result.errors.iter().map(|e| e.to_string()).collect();
        self.aggregate(&scan_result.files, errors, events, start_time)
    }

    /// Aggregate an already-enumerated file list
    pub fn run_files(&self, files: &[PathBuf], events: &EventSender) -> Result<RunReport, AidError> {
        events.send(Event::Pipeline(PipelineEvent::Started));
        self.aggregate(files, Vec::new(), events, Instant::now())
    }

    fn aggregate(
        &self,
        files: &[PathBuf],
        mut errors: Vec<String>,
        events: &EventSender,
        start_time: Instant,
    ) -> Result<RunReport, AidError> {
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Extracting,
        }));
        events.send(Event::Extract(ExtractEvent::Started {
            total_files: files.len(),
        }));

        let dispatcher = Dispatcher::new(
            self.config.mode,
            ModelFilter::new(&self.config.model_filter),
            &*self.source,
            self.config.verbose,
        );

        errors.extend(self.fan_out(&dispatcher, files, events)?);

        events.send(Event::Extract(ExtractEvent::Completed {
            total_files: files.len(),
        }));

        let (trackers, counters) = dispatcher.into_results();
        let (sections, materialized) = self.collect(trackers, events, &mut errors);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        events.send(Event::Pipeline(PipelineEvent::Completed { duration_ms }));

        Ok(RunReport {
            mode: self.config.mode,
            total_files: files.len(),
            sections,
            counters,
            materialized,
            errors,
            duration_ms,
        })
    }

    /// Dispatch every file; returns the per-file failure messages
    fn fan_out(
        &self,
        dispatcher: &Dispatcher,
        files: &[PathBuf],
        events: &EventSender,
    ) -> Result<Vec<String>, AidError> {
        let completed = AtomicUsize::new(0);
        let total = files.len();

        let process = |hasher: &mut ContentHasher, path: &PathBuf| -> Option<String> {
            let result = dispatcher.process_file(path, hasher);

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            events.send(Event::Extract(ExtractEvent::Progress(ExtractProgress {
                completed: done,
                total,
                current_path: path.clone(),
            })));

            let error = result.err()?;
            tracing::debug!(path = %path.display(), "{}", error);
            events.send(Event::Extract(ExtractEvent::Error {
                path: path.clone(),
                message: error.to_string(),
            }));
            Some(error.to_string())
        };

        match self.config.execution {
            Execution::Sequential => {
                let mut hasher = ContentHasher::new();
                Ok(files
                    .iter()
                    .filter_map(|path| process(&mut hasher, path))
                    .collect())
            }
            Execution::Parallel { threads } => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(threads) = threads {
                    builder = builder.num_threads(threads);
                }
                let pool = builder
                    .build()
                    .map_err(|e| AidError::Config(format!("can't build worker pool: {}", e)))?;

                Ok(pool.install(|| {
                    files
                        .par_iter()
                        .map_init(ContentHasher::new, process)
                        .flatten()
                        .collect()
                }))
            }
        }
    }

    /// Sort the trackers for the active mode and run materialization
    fn collect(
        &self,
        trackers: Trackers,
        events: &EventSender,
        errors: &mut Vec<String>,
    ) -> (Vec<Section>, Option<MaterializeReport>) {
        let sort = self.config.sort;

        let sections = match self.config.mode {
            Mode::Serials => vec![
                section("bodies", trackers.bodies, sort),
                section("lenses", trackers.lenses, sort),
            ],
            Mode::Lenses => vec![section("lenses", trackers.models, sort)],
            Mode::Models => vec![section("models", trackers.models, sort)],
            Mode::FocalLengths => vec![section("focal lengths", trackers.focal_lengths, sort)],
            Mode::Ratings => vec![section("ratings", trackers.ratings, sort)],
            Mode::Embedded => {
                let assets = trackers.assets.into_sorted(sort);
                let materialized = self
                    .config
                    .materialize
                    .as_deref()
                    .and_then(|out_dir| self.write_assets(&assets, out_dir, events, errors));
                let entries = assets.into_iter().map(|e| e.into_record_entry()).collect();
                return (
                    vec![Section::new("embedded images", entries)],
                    materialized,
                );
            }
            Mode::HasImage | Mode::Gps | Mode::EditorEdits => Vec::new(),
        };

        (sections, None)
    }

    fn write_assets(
        &self,
        assets: &[Entry<EmbeddedAssetRecord>],
        out_dir: &Path,
        events: &EventSender,
        errors: &mut Vec<String>,
    ) -> Option<MaterializeReport> {
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Materializing,
        }));

        match materialize(assets, out_dir, events) {
            Ok(report) => {
                errors.extend(
                    report
                        .failed
                        .iter()
                        .map(|(path, message)| format!("{}: {}", path.display(), message)),
                );
                Some(report)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                errors.push(e.to_string());
                None
            }
        }
    }
}

fn section<T: Into<Record> + Dedup>(
    label: &str,
    tracker: EntryTracker<T>,
    sort: SortOrder,
) -> Section {
    let entries = tracker
        .into_sorted(sort)
        .into_iter()
        .map(|e| e.into_record_entry())
        .collect();
    Section::new(label, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatch::testing::{identity, Canned, ScriptedSource};
    use crate::core::metadata::CameraIdentity;
    use std::fs;
    use tempfile::TempDir;

    fn acme_source() -> ScriptedSource {
        let mut source = ScriptedSource::default();
        for i in 0..12 {
            let serial = if i % 4 == 0 { "456" } else { "123" };
            source = source.with(
                &format!("img{:02}.jpg", i),
                Canned {
                    identity: Some(identity("Acme", "X1", serial)),
                    ..Default::default()
                },
            );
        }
        source
    }

    fn names(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| PathBuf::from(format!("img{:02}.jpg", i)))
            .collect()
    }

    #[test]
    fn builder_sets_config() {
        let aggregator = Aggregator::builder()
            .root("/photos")
            .mode(Mode::Models)
            .model_filter("leica")
            .extensions(["dng"])
            .execution(Execution::Sequential)
            .sort(SortOrder::Count)
            .build();

        let config = aggregator.config();
        assert_eq!(config.root, PathBuf::from("/photos"));
        assert_eq!(config.mode, Mode::Models);
        assert_eq!(config.model_filter, "leica");
        assert_eq!(config.extensions, vec!["dng".to_string()]);
        assert_eq!(config.execution, Execution::Sequential);
        assert_eq!(config.sort, SortOrder::Count);
    }

    #[test]
    fn embedded_mode_defaults_to_audio_extensions() {
        let config = RunConfig {
            mode: Mode::Embedded,
            ..Default::default()
        };
        assert_eq!(config.effective_extensions(), vec!["flac", "mp3"]);

        let config = RunConfig {
            mode: Mode::Embedded,
            extensions: vec!["jpg".into()],
            ..Default::default()
        };
        assert_eq!(config.effective_extensions(), vec!["jpg"]);
    }

    #[test]
    fn sequential_run_counts_identities() {
        let aggregator = Aggregator::builder()
            .execution(Execution::Sequential)
            .sort(SortOrder::Count)
            .source(Box::new(acme_source()))
            .build();

        let report = aggregator.run_files(&names(12), &null_sender()).unwrap();

        assert_eq!(report.total_files, 12);
        assert_eq!(report.sections.len(), 2);
        let bodies = &report.sections[0];
        assert_eq!(bodies.label, "bodies");
        let counts: Vec<usize> = bodies.entries.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![9, 3]);
        assert!(report.sections[1].entries.is_empty());
    }

    #[test]
    fn parallel_matches_sequential() {
        let run = |execution| {
            Aggregator::builder()
                .execution(execution)
                .source(Box::new(acme_source()))
                .build()
                .run_files(&names(12), &null_sender())
                .unwrap()
        };

        let sequential = run(Execution::Sequential);
        let parallel = run(Execution::Parallel { threads: Some(4) });
        assert_eq!(sequential.sections, parallel.sections);
    }

    #[test]
    fn per_file_failures_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("present.flac");
        fs::write(&present, [0xFFu8, 0xD8, 1, 2, 3, 4, 5, 6]).unwrap();

        let image = |length| Canned {
            image: Some(crate::core::metadata::EmbeddedImage {
                offset: 0,
                length,
                ..Default::default()
            }),
            ..Default::default()
        };
        let source = ScriptedSource::default()
            .with("present.flac", image(8))
            .with("truncated.flac", image(8));
        fs::write(dir.path().join("truncated.flac"), [0u8; 3]).unwrap();

        let report = Aggregator::builder()
            .mode(Mode::Embedded)
            .source(Box::new(source))
            .build()
            .run_files(
                &[present, dir.path().join("truncated.flac")],
                &null_sender(),
            )
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.sections[0].entries.len(), 1);
        assert_eq!(report.counters.has_image, 2);
    }

    #[test]
    fn counter_modes_have_no_sections() {
        let source = ScriptedSource::default().with(
            "img00.jpg",
            Canned {
                identity: Some(CameraIdentity::default()),
                gps: Some(crate::core::metadata::GpsLocation {
                    latitude: 47.6,
                    longitude: -122.3,
                }),
                ..Default::default()
            },
        );
        let report = Aggregator::builder()
            .mode(Mode::Gps)
            .source(Box::new(source))
            .build()
            .run_files(&names(3), &null_sender())
            .unwrap();

        assert!(report.sections.is_empty());
        assert_eq!(report.counters.has_gps, 1);
    }

    #[test]
    fn run_walks_the_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("img00.jpg"), b"x").unwrap();
        fs::write(dir.path().join("img01.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let report = Aggregator::builder()
            .root(dir.path())
            .extensions(["jpg"])
            .source(Box::new(acme_source()))
            .build()
            .run()
            .unwrap();

        assert_eq!(report.total_files, 2);
        assert_eq!(report.sections[0].entries.len(), 2);
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = Aggregator::builder()
            .root("/nonexistent/path/12345")
            .build()
            .run();
        assert!(matches!(result, Err(AidError::Scan(_))));
    }
}

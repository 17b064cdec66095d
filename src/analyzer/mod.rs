use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use thiserror::Error;

use crate::activity::{filter_notes, is_musical};
use crate::aggregate::aggregate;
use crate::chords::label_windows;
use crate::config::AnalysisConfig;
use crate::input::{self, InputError};
use crate::key::{ProfileAnalyzer, TonalAnalyzer, estimate_key};
use crate::models::{ChordEvent, ChordLabel, ChordSegment, KeySignature, NoteEvent, Window};
use crate::normalize::normalize;
use crate::window::{WindowSizing, resolve_width, segment};

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// How many notes and windows survived each stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteStats {
    pub raw_notes: usize,
    pub normalized_notes: usize,
    pub filtered_notes: usize,
    pub windows: usize,
    pub active_windows: usize,
}

/// Everything the pipeline learned about one note stream.
#[derive(Debug, Clone, Serialize)]
pub struct Transcription {
    pub sizing: WindowSizing,
    pub segments: Vec<ChordSegment>,
    pub events: Vec<ChordEvent>,
    pub key: KeySignature,
    pub stats: NoteStats,
}

impl Transcription {
    /// Number of plays per chord, in order of first appearance.
    pub fn play_summary(&self) -> Vec<(ChordLabel, u32)> {
        let mut summary: Vec<(ChordLabel, u32)> = Vec::new();
        for event in &self.events {
            match summary.iter_mut().find(|(chord, _)| *chord == event.chord) {
                Some((_, plays)) => *plays += 1,
                None => summary.push((event.chord.clone(), 1)),
            }
        }
        summary
    }
}

/// Run the full pipeline over one note stream: normalize, size and cut
/// windows, keep the musically active ones, label them, group the labels
/// into plays, then estimate the key.
///
/// Never fails; an empty or all-noise stream yields no segments, no events
/// and an `Unknown` key.
pub fn transcribe(
    notes: &[NoteEvent],
    config: &AnalysisConfig,
    tonal: Option<&dyn TonalAnalyzer>,
) -> Transcription {
    let normalized = normalize(notes, &config.dedup);
    let sizing = resolve_width(config.window_width, &normalized);
    let filtered = filter_notes(&normalized, &config.filter);

    let windows = segment(&filtered, sizing.width);
    let window_count = windows.len();
    let active: Vec<Window> = windows
        .into_iter()
        .filter(|w| is_musical(&w.notes, &config.activity))
        .collect();

    let labels = label_windows(&active);
    let segments: Vec<ChordSegment> = active
        .iter()
        .zip(labels)
        .map(|(window, chord)| ChordSegment {
            start: window.start,
            end: window.end,
            chord,
            note_count: window.notes.len(),
        })
        .collect();

    let events = aggregate(&segments, &config.aggregation);
    let key = estimate_key(notes, &events, tonal);

    let stats = NoteStats {
        raw_notes: notes.len(),
        normalized_notes: normalized.len(),
        filtered_notes: filtered.len(),
        windows: window_count,
        active_windows: active.len(),
    };

    log::info!(
        "{} notes → {} active windows of {} → {} chord events, key {}",
        stats.raw_notes,
        stats.active_windows,
        stats.windows,
        events.len(),
        key
    );

    Transcription {
        sizing,
        segments,
        events,
        key,
        stats,
    }
}

/// Load a note file and transcribe it.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<Transcription, AnalyzeError> {
    let notes = input::load_notes(path)?;
    let profile = ProfileAnalyzer;
    let tonal: Option<&dyn TonalAnalyzer> = if config.key.profile_fallback {
        Some(&profile)
    } else {
        None
    };
    Ok(transcribe(&notes, config, tonal))
}

/// Outcome of one file in a batch.
#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: Result<Transcription, AnalyzeError>,
}

#[derive(Debug)]
pub struct BatchResult {
    /// One record per input, in input order
    pub files: Vec<FileResult>,
    pub analyzed: u64,
    pub failed: u64,
}

/// Analyze files in parallel on a rayon pool of `jobs` threads. A file that
/// fails to load is recorded and the rest carry on.
pub fn analyze_files(
    paths: &[PathBuf],
    config: &AnalysisConfig,
    jobs: usize,
) -> Result<BatchResult, AnalyzeError> {
    if paths.is_empty() {
        log::info!("No note files to analyze");
        return Ok(BatchResult {
            files: Vec::new(),
            analyzed: 0,
            failed: 0,
        });
    }

    log::info!("Analyzing {} files with {} workers", paths.len(), jobs);

    let pb = if paths.len() > 1 {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs.max(1)).build()?;

    let files: Vec<FileResult> = pool.install(|| {
        use rayon::prelude::*;
        paths
            .par_iter()
            .map(|path| {
                let outcome = analyze_file(path, config);
                pb.inc(1);
                FileResult {
                    path: path.clone(),
                    outcome,
                }
            })
            .collect()
    });

    let mut analyzed: u64 = 0;
    let mut failed: u64 = 0;
    for file in &files {
        match &file.outcome {
            Ok(_) => analyzed += 1,
            Err(e) => {
                log::warn!("Analysis failed for {}: {}", file.path.display(), e);
                failed += 1;
            }
        }
    }

    pb.finish_with_message(format!("Done: {} analyzed, {} failed", analyzed, failed));

    Ok(BatchResult {
        files,
        analyzed,
        failed,
    })
}

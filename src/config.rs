use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Application configuration loaded from TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Number of parallel workers for batch analysis. 0 = auto-detect (cores / 2, min 1).
    pub workers: usize,
    /// Thresholds for the transcription pipeline.
    pub analysis: AnalysisConfig,
}

/// Every tunable of the note → chord pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fixed window width in seconds. Absent = auto-size from chord strike spacing.
    pub window_width: Option<f64>,
    pub dedup: DedupConfig,
    pub filter: NoteFilterConfig,
    pub activity: ActivityConfig,
    pub aggregation: AggregationConfig,
    pub key: KeyConfig,
}

/// Duplicate detection and same-pitch merging in the note normalizer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Two onsets closer than this (seconds) may be the same note.
    pub start_tolerance: f64,
    /// Two pitches closer than this (semitones) may be the same note.
    pub pitch_tolerance: u8,
    /// Same-pitch neighbours separated by less than this (seconds) are joined.
    pub merge_gap: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            start_tolerance: 0.1,
            pitch_tolerance: 1,
            merge_gap: 0.1,
        }
    }
}

/// Per-note noise filter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NoteFilterConfig {
    pub min_velocity: u8,
    /// Seconds
    pub min_duration: f64,
}

impl Default for NoteFilterConfig {
    fn default() -> Self {
        Self {
            min_velocity: 45,
            min_duration: 0.1,
        }
    }
}

/// Window-level musical activity test.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub min_notes: usize,
    pub min_total_velocity: u32,
    pub min_distinct_pitches: usize,
    /// Semitones between lowest and highest pitch
    pub max_pitch_span: u8,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            min_notes: 2,
            min_total_velocity: 120,
            min_distinct_pitches: 2,
            max_pitch_span: 60,
        }
    }
}

/// Segment → event merging thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Largest gap (seconds) bridged when grouping same-chord segments.
    pub max_group_gap: f64,
    /// Segments with fewer notes never start or extend a group.
    pub min_segment_notes: usize,
    /// Events shorter than this (seconds) are candidates for repair.
    pub short_event_duration: f64,
    /// A short event merges back only if it starts within this gap (seconds).
    pub short_event_gap: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_group_gap: 1.0,
            min_segment_notes: 2,
            short_event_duration: 0.8,
            short_event_gap: 1.5,
        }
    }
}

/// Key estimation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Consult the pitch-profile analyzer when chord and note heuristics give up.
    pub profile_fallback: bool,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            profile_fallback: true,
        }
    }
}

impl AppConfig {
    /// Load config from `path`, or from `~/.config/chordtrace/config.toml` when `path` is None.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = path.map(Path::to_path_buf).or_else(Self::config_path);
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!(
                            "Failed to parse {}: {}. Using defaults.",
                            path.display(),
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!(
                        "Failed to read {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve worker count: 0 → auto-detect (cores / 2, min 1).
    pub fn resolve_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2);
            (cores / 2).max(1)
        }
    }

    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

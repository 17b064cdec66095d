pub mod activity;
pub mod aggregate;
pub mod analyzer;
pub mod chords;
pub mod config;
pub mod input;
pub mod key;
pub mod models;
pub mod normalize;
pub mod window;

/// Note file extensions we can load
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    // serde_json note dumps from the pitch detector
    "json",
    // Standard MIDI files (midly)
    "mid", "midi",
];

/// Application name for XDG paths
pub const APP_NAME: &str = "chordtrace";

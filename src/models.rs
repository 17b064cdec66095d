use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chords::pitch::PitchClass;

/// A detected note, as delivered by the upstream pitch detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number (piano range 21–108 in practice). Note files may
    /// also give a name such as `"F#4"`.
    #[serde(deserialize_with = "deserialize_pitch")]
    pub pitch: u8,
    /// Onset in seconds
    pub start: f64,
    /// Release in seconds
    pub end: f64,
    pub velocity: u8,
    /// Detector confidence (0–1), when the detector reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PitchField {
    Midi(u8),
    Name(String),
}

fn deserialize_pitch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    match PitchField::deserialize(deserializer)? {
        PitchField::Midi(pitch) => Ok(pitch),
        PitchField::Name(name) => PitchClass::midi_from_name(&name)
            .ok_or_else(|| D::Error::custom(format!("not a note name: {:?}", name))),
    }
}

impl NoteEvent {
    pub fn new(pitch: u8, start: f64, end: f64, velocity: u8) -> Self {
        Self {
            pitch,
            start,
            end,
            velocity,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True if the note sounds at any point inside `[start, end)`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && self.end > start
    }

    /// Finite times and a positive length.
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end > self.start
    }
}

/// A time span over which one chord label is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
    /// Notes overlapping the span, ordered by start
    pub notes: Vec<NoteEvent>,
}

impl Window {
    /// Distinct MIDI pitches, ascending.
    pub fn distinct_pitches(&self) -> Vec<u8> {
        let mut pitches: Vec<u8> = self.notes.iter().map(|n| n.pitch).collect();
        pitches.sort_unstable();
        pitches.dedup();
        pitches
    }
}

/// Chord name such as `"Am7"` or `"F#m"`, or one of the `Silence` / `Unknown` sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChordLabel(String);

impl ChordLabel {
    pub const SILENCE: &'static str = "Silence";
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn silence() -> Self {
        Self::new(Self::SILENCE)
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_silence(&self) -> bool {
        self.0 == Self::SILENCE
    }

    /// Any seventh quality: `m7`, `maj7` or dominant `7`.
    pub fn is_seventh(&self) -> bool {
        self.0.contains('7')
    }

    /// True if the label is one of `candidates`.
    pub fn is_any_of(&self, candidates: &[&str]) -> bool {
        candidates.contains(&self.0.as_str())
    }
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChordLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl PartialEq<str> for ChordLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ChordLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Raw per-window chord identification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordSegment {
    pub start: f64,
    pub end: f64,
    pub chord: ChordLabel,
    pub note_count: usize,
}

/// One continuous sounding ("play") of a chord after aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordEvent {
    pub start: f64,
    pub end: f64,
    pub chord: ChordLabel,
    /// 1-based occurrence of this chord among all events, in time order
    pub play_number: u32,
    pub duration: f64,
    pub total_notes: usize,
}

/// Estimated tonal center of a passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySignature {
    Major(PitchClass),
    Minor(PitchClass),
    Unknown,
}

impl KeySignature {
    pub fn is_unknown(&self) -> bool {
        matches!(self, KeySignature::Unknown)
    }
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySignature::Major(root) => write!(f, "{} major", root),
            KeySignature::Minor(root) => write!(f, "{} minor", root),
            KeySignature::Unknown => f.write_str("Unknown"),
        }
    }
}

impl Serialize for KeySignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

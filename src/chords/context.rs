//! Neighbour-aware relabelling of a window's base chord.
//!
//! These rules target the detector's usual misses on guitar recordings: a
//! dropped middle voice turning a sus2 into a bare fifth, or a C triad
//! heard inside an A minor seventh passage. They are tuned heuristics, not
//! general harmony rules.

use super::identify_chord;
use super::pitch::PitchClass::{A, B, Cs, E, Fs, Gs};
use super::pitch::PitchSet;
use crate::models::ChordLabel;

const E_CONTEXT: &[&str] = &["Esus2", "E"];
const A_MINOR_CONTEXT: &[&str] = &["Am", "Am7"];

/// What a window can see of its surroundings. Neighbour labels are the
/// neighbours' base labels, before their own correction.
#[derive(Debug, Clone, Copy)]
pub struct WindowContext<'a> {
    pub prev: Option<&'a ChordLabel>,
    pub next: Option<&'a ChordLabel>,
    /// Distinct pitches of the previous, current and next windows
    pub region_pitches: &'a [u8],
}

impl WindowContext<'_> {
    fn either_neighbour_in(&self, labels: &[&str]) -> bool {
        self.prev.is_some_and(|l| l.is_any_of(labels)) || self.next.is_some_and(|l| l.is_any_of(labels))
    }

    fn both_neighbours_in(&self, labels: &[&str]) -> bool {
        self.prev.is_some_and(|l| l.is_any_of(labels)) && self.next.is_some_and(|l| l.is_any_of(labels))
    }
}

/// Apply the correction rules to one window's base label. The first rule
/// that fires decides; when none fires the base label stands.
pub fn correct_with_context(pitches: &[u8], base: &ChordLabel, context: &WindowContext<'_>) -> ChordLabel {
    let corrected = first_matching_rule(pitches, base, context);

    match corrected {
        Some(label) if label != *base => {
            log::debug!("Context correction {} → {} (pitches {:?})", base, label, pitches);
            label
        }
        _ => base.clone(),
    }
}

fn first_matching_rule(pitches: &[u8], base: &ChordLabel, context: &WindowContext<'_>) -> Option<ChordLabel> {
    let classes = PitchSet::from_midi(pitches);

    // Bare fifth on E: the F# went missing
    if classes.contains_all(&[E, B]) && !classes.contains(Gs) {
        return Some("Esus2".into());
    }

    if classes.contains_all(&[Fs, A, Cs]) && context.either_neighbour_in(E_CONTEXT) {
        return Some("F#m7".into());
    }

    if classes.contains_all(&[A, B, E]) && !classes.contains(Cs) {
        return Some("Asus2".into());
    }

    if classes.contains_all(&[E, B, Gs]) {
        return Some("E".into());
    }

    if *base == "C" && context.either_neighbour_in(A_MINOR_CONTEXT) {
        let region = PitchSet::from_midi(context.region_pitches);
        if region.contains(A) || context.both_neighbours_in(A_MINOR_CONTEXT) {
            return Some("Am7".into());
        }
    }

    // Prefer a richer seventh heard across the region
    if context.region_pitches.len() > pitches.len() {
        let regional = identify_chord(context.region_pitches);
        if regional.is_seventh() && !base.is_seventh() {
            return Some(regional);
        }
    }

    None
}

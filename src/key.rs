//! Key-signature estimation.
//!
//! Three tiers, the first to produce a key wins:
//! 1. score the chord progression against fixed key vocabularies,
//! 2. read the most frequent pitch class off the note histogram,
//! 3. hand a weighted pitch list to a [`TonalAnalyzer`], if one is supplied.

use std::collections::HashMap;

use crate::chords::pitch::PitchClass::{self, *};
use crate::models::{ChordEvent, KeySignature, NoteEvent};

/// Cap on how many times one pitch is repeated in the weighted list.
pub const MAX_PITCH_WEIGHT: usize = 10;

/// Krumhansl-Kessler probe-tone ratings, tonic at index 0.
const KK_MAJOR: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];
const KK_MINOR: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// External key judgment over a pitch list.
pub trait TonalAnalyzer: Send + Sync {
    /// `None` when the analyzer cannot decide.
    fn analyze(&self, pitches: &[u8]) -> Option<KeySignature>;
}

/// Built-in analyzer: correlate the pitch-class histogram with the
/// Krumhansl-Kessler major and minor profiles in all twelve rotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileAnalyzer;

impl TonalAnalyzer for ProfileAnalyzer {
    fn analyze(&self, pitches: &[u8]) -> Option<KeySignature> {
        let mut histogram = [0.0_f64; 12];
        for class in pitches.iter().filter_map(|&p| PitchClass::from_midi(p)) {
            histogram[class.index()] += 1.0;
        }

        let first = histogram[0];
        if histogram.iter().all(|&v| v == first) {
            return None;
        }

        let mut best: Option<(f64, KeySignature)> = None;
        for root in PitchClass::ALL {
            let candidates = [
                (pearson(&histogram, &KK_MAJOR, root.index()), KeySignature::Major(root)),
                (pearson(&histogram, &KK_MINOR, root.index()), KeySignature::Minor(root)),
            ];
            for (score, key) in candidates {
                if best.as_ref().is_none_or(|(top, _)| score > *top) {
                    best = Some((score, key));
                }
            }
        }

        best.map(|(score, key)| {
            log::debug!("Profile correlation picked {} (r = {:.3})", key, score);
            key
        })
    }
}

/// Pearson correlation between a histogram rotated by `shift` semitones and a profile.
fn pearson(histogram: &[f64; 12], profile: &[f64; 12], shift: usize) -> f64 {
    let x: Vec<f64> = (0..12).map(|i| histogram[(i + shift) % 12]).collect();

    let mean_x = x.iter().sum::<f64>() / 12.0;
    let mean_y = profile.iter().sum::<f64>() / 12.0;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(profile) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom > 1e-10 { cov / denom } else { 0.0 }
}

struct KeyVocabulary {
    key: KeySignature,
    chords: &'static [&'static str],
}

const fn vocab(key: KeySignature, chords: &'static [&'static str]) -> KeyVocabulary {
    KeyVocabulary { key, chords }
}

// Majors first, then minors: enumeration order breaks score ties.
// Flat-named chords use the sharp spelling the identifier emits.
const VOCABULARIES: &[KeyVocabulary] = &[
    vocab(KeySignature::Major(C), &["C", "F", "G", "Am", "Dm", "Em"]),
    vocab(KeySignature::Major(G), &["G", "C", "D", "Em", "Am", "Bm"]),
    vocab(KeySignature::Major(D), &["D", "G", "A", "Bm", "Em", "F#m"]),
    vocab(KeySignature::Major(A), &["A", "D", "E", "F#m", "Bm", "C#m"]),
    vocab(KeySignature::Major(E), &["E", "A", "B", "C#m", "F#m", "G#m"]),
    vocab(KeySignature::Major(F), &["F", "A#", "C", "Dm", "Gm", "Am"]),
    vocab(KeySignature::Minor(A), &["Am", "F", "G", "C", "Dm", "Em", "E"]),
    vocab(KeySignature::Minor(E), &["Em", "C", "D", "G", "Am", "Bm", "B"]),
    vocab(KeySignature::Minor(B), &["Bm", "G", "A", "D", "Em", "F#m", "F#"]),
    vocab(KeySignature::Minor(Fs), &["F#m", "D", "E", "A", "Bm", "C#m", "C#"]),
    vocab(KeySignature::Minor(D), &["Dm", "A#", "C", "F", "Gm", "Am", "A"]),
    vocab(KeySignature::Minor(G), &["Gm", "D#", "F", "A#", "Cm", "Dm", "D"]),
];

/// Estimate the key of a passage from its chord events, falling back to the
/// raw notes and then to `tonal`. Returns [`KeySignature::Unknown`] when no
/// tier decides.
pub fn estimate_key(
    notes: &[NoteEvent],
    events: &[ChordEvent],
    tonal: Option<&dyn TonalAnalyzer>,
) -> KeySignature {
    let key = key_from_chords(events);
    if !key.is_unknown() {
        log::debug!("Key {} from chord progression", key);
        return key;
    }

    let key = key_from_notes(notes);
    if !key.is_unknown() {
        log::debug!("Key {} from note histogram", key);
        return key;
    }

    if let Some(analyzer) = tonal {
        if let Some(key) = analyzer.analyze(&weighted_pitches(notes)) {
            log::debug!("Key {} from tonal analyzer", key);
            return key;
        }
    }

    KeySignature::Unknown
}

/// Score each key by summing, over every event whose chord is in the key's
/// vocabulary, that chord's occurrence count.
pub fn key_from_chords(events: &[ChordEvent]) -> KeySignature {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for event in events {
        *counts.entry(event.chord.as_str()).or_insert(0) += 1;
    }

    let mut best_score = 0;
    let mut best_key = KeySignature::Unknown;
    for vocabulary in VOCABULARIES {
        let score: u32 = events
            .iter()
            .map(|e| e.chord.as_str())
            .filter(|chord| vocabulary.chords.contains(chord))
            .map(|chord| counts.get(chord).copied().unwrap_or(0))
            .sum();
        if score > best_score {
            best_score = score;
            best_key = vocabulary.key;
        }
    }

    best_key
}

/// Most frequent pitch class (first seen wins ties), refined by which
/// thirds and fifths are present.
pub fn key_from_notes(notes: &[NoteEvent]) -> KeySignature {
    let mut counts = [0usize; 12];
    let mut seen_order: Vec<PitchClass> = Vec::new();
    for class in notes.iter().filter_map(|n| PitchClass::from_midi(n.pitch)) {
        if counts[class.index()] == 0 {
            seen_order.push(class);
        }
        counts[class.index()] += 1;
    }

    let mut root: Option<PitchClass> = None;
    for &class in &seen_order {
        if root.is_none_or(|r| counts[class.index()] > counts[r.index()]) {
            root = Some(class);
        }
    }
    let Some(root) = root else {
        return KeySignature::Unknown;
    };

    let has = |class: PitchClass| counts[class.index()] > 0;
    match root {
        A if has(C) && has(E) => {
            if counts[C.index()] > counts[Cs.index()] {
                KeySignature::Minor(A)
            } else {
                KeySignature::Major(A)
            }
        }
        E if !(has(Gs) && has(B)) && has(G) && has(B) => KeySignature::Minor(E),
        _ => KeySignature::Major(root),
    }
}

/// Distinct pitches in first-seen order, each repeated by its count up to
/// [`MAX_PITCH_WEIGHT`].
pub fn weighted_pitches(notes: &[NoteEvent]) -> Vec<u8> {
    let mut order: Vec<u8> = Vec::new();
    let mut counts: HashMap<u8, usize> = HashMap::new();
    for note in notes {
        let count = counts.entry(note.pitch).or_insert(0);
        if *count == 0 {
            order.push(note.pitch);
        }
        *count += 1;
    }

    order
        .into_iter()
        .flat_map(|pitch| {
            let weight = counts.get(&pitch).copied().unwrap_or(0).min(MAX_PITCH_WEIGHT);
            std::iter::repeat_n(pitch, weight)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChordLabel;

    fn event(chord: &str) -> ChordEvent {
        ChordEvent {
            start: 0.0,
            end: 1.0,
            chord: ChordLabel::new(chord),
            play_number: 1,
            duration: 1.0,
            total_notes: 3,
        }
    }

    fn events(chords: &[&str]) -> Vec<ChordEvent> {
        chords.iter().map(|c| event(c)).collect()
    }

    fn notes(pitches: &[u8]) -> Vec<NoteEvent> {
        pitches
            .iter()
            .enumerate()
            .map(|(i, &p)| NoteEvent::new(p, i as f64, i as f64 + 0.5, 80))
            .collect()
    }

    #[test]
    fn g_major_progression() {
        let events = events(&["G", "C", "D", "G", "Em", "G"]);
        assert_eq!(key_from_chords(&events), KeySignature::Major(G));
    }

    #[test]
    fn ties_go_to_majors_in_order() {
        // C major and A minor both score 4; C major is listed first
        let events = events(&["C", "F", "G", "Am"]);
        assert_eq!(key_from_chords(&events), KeySignature::Major(C));
    }

    #[test]
    fn minor_key_wins_with_its_dominant() {
        // Am E Am E: E major's vocabulary lacks Am, A minor has both
        let events = events(&["Am", "E", "Am", "E"]);
        assert_eq!(key_from_chords(&events), KeySignature::Minor(A));
    }

    #[test]
    fn no_vocabulary_match_is_unknown() {
        assert_eq!(key_from_chords(&events(&["G#", "D#m"])), KeySignature::Unknown);
        assert_eq!(key_from_chords(&[]), KeySignature::Unknown);
    }

    #[test]
    fn histogram_a_minor_versus_major() {
        // A ×3, C ×2, E ×1 → minor
        assert_eq!(key_from_notes(&notes(&[57, 57, 57, 60, 60, 64])), KeySignature::Minor(A));
        // A ×3, C ×1, C# ×2, E ×1 → major
        assert_eq!(key_from_notes(&notes(&[57, 57, 57, 60, 61, 61, 64])), KeySignature::Major(A));
    }

    #[test]
    fn histogram_e_minor_and_default() {
        assert_eq!(key_from_notes(&notes(&[52, 52, 55, 59])), KeySignature::Minor(E));
        assert_eq!(key_from_notes(&notes(&[52, 52, 55, 56, 59])), KeySignature::Major(E));
        // F# with nothing else: default to major
        assert_eq!(key_from_notes(&notes(&[54, 54, 62])), KeySignature::Major(Fs));
    }

    #[test]
    fn histogram_ties_go_to_first_seen() {
        assert_eq!(key_from_notes(&notes(&[62, 55, 62, 55])), KeySignature::Major(D));
        assert_eq!(key_from_notes(&[]), KeySignature::Unknown);
    }

    #[test]
    fn weighted_pitches_cap_and_order() {
        let mut pitches = vec![64; 12];
        pitches.insert(0, 60);
        pitches.push(60);
        let weighted = weighted_pitches(&notes(&pitches));
        assert_eq!(&weighted[..2], &[60, 60]);
        assert_eq!(weighted.len(), 2 + MAX_PITCH_WEIGHT);
        assert!(weighted[2..].iter().all(|&p| p == 64));
    }

    #[test]
    fn profile_analyzer_finds_tonic() {
        let mut pitches = Vec::new();
        for (pitch, count) in [(60, 10), (64, 6), (67, 8), (62, 2), (65, 2), (69, 2), (71, 2)] {
            pitches.extend(std::iter::repeat_n(pitch, count));
        }
        assert_eq!(ProfileAnalyzer.analyze(&pitches), Some(KeySignature::Major(C)));

        let mut pitches = Vec::new();
        for (pitch, count) in [(57, 10), (60, 6), (64, 8), (59, 2), (62, 2), (65, 2), (67, 2)] {
            pitches.extend(std::iter::repeat_n(pitch, count));
        }
        assert_eq!(ProfileAnalyzer.analyze(&pitches), Some(KeySignature::Minor(A)));
    }

    #[test]
    fn profile_analyzer_declines_flat_input() {
        assert_eq!(ProfileAnalyzer.analyze(&[]), None);
        let chromatic: Vec<u8> = (60..72).collect();
        assert_eq!(ProfileAnalyzer.analyze(&chromatic), None);
    }

    struct Fixed(KeySignature);

    impl TonalAnalyzer for Fixed {
        fn analyze(&self, _pitches: &[u8]) -> Option<KeySignature> {
            Some(self.0)
        }
    }

    #[test]
    fn tiers_fall_through_in_order() {
        let tonal: &dyn TonalAnalyzer = &Fixed(KeySignature::Minor(D));

        let key = estimate_key(&notes(&[57, 60, 64]), &events(&["G", "D"]), Some(tonal));
        assert_eq!(key, KeySignature::Major(G));

        let key = estimate_key(&notes(&[55, 55, 59, 62]), &events(&["G#"]), Some(tonal));
        assert_eq!(key, KeySignature::Major(G));

        // Only unmappable pitches: the histogram is empty, the analyzer decides
        let key = estimate_key(&notes(&[200]), &[], Some(tonal));
        assert_eq!(key, KeySignature::Minor(D));

        assert_eq!(estimate_key(&[], &[], None), KeySignature::Unknown);
    }
}

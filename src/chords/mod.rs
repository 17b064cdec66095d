pub mod context;
pub mod patterns;
pub mod pitch;

use crate::models::{ChordLabel, Window};
use context::{WindowContext, correct_with_context};
use patterns::{ChordPattern, FALLBACK_ROOTS, all_patterns};
use pitch::{PitchClass, PitchSet};

/// Name the chord formed by a set of MIDI pitches.
///
/// Lookup order: exact pattern match (tables in priority order), then the
/// largest pattern contained in the set, then a root-note fallback. Never
/// fails: an empty pitch list is `Silence`, a list with no mappable pitch
/// is `Unknown`.
pub fn identify_chord(pitches: &[u8]) -> ChordLabel {
    if pitches.is_empty() {
        return ChordLabel::silence();
    }

    let classes = PitchSet::from_midi(pitches);
    if classes.is_empty() {
        return ChordLabel::unknown();
    }

    if classes.len() == 1 {
        return classes
            .iter()
            .next()
            .map(|c| ChordLabel::new(c.name()))
            .unwrap_or_else(ChordLabel::unknown);
    }

    if let Some(pattern) = all_patterns().find(|p| p.notes == classes) {
        return ChordLabel::new(pattern.label);
    }

    if let Some(pattern) = best_subset_match(classes, bass_class(pitches)) {
        return ChordLabel::new(pattern.label);
    }

    root_fallback(classes)
}

/// Pitch class of the lowest mappable pitch.
fn bass_class(pitches: &[u8]) -> Option<PitchClass> {
    pitches
        .iter()
        .copied()
        .filter(|&p| PitchClass::from_midi(p).is_some())
        .min()
        .and_then(PitchClass::from_midi)
}

/// Largest pattern fully contained in `classes`; equal sizes go to the
/// earlier pattern in priority order.
///
/// One exception to table order: a pattern rooted on the bass note beats an
/// equal-size pattern that isn't. Pure table order would read a C E G B D
/// cluster as `Em7`, while the cluster voiced over C is expected to read as
/// `Cmaj7`; the bass rule reconciles the two.
fn best_subset_match(classes: PitchSet, bass: Option<PitchClass>) -> Option<&'static ChordPattern> {
    let mut best: Option<&'static ChordPattern> = None;

    for pattern in all_patterns() {
        if !pattern.notes.is_subset_of(classes) {
            continue;
        }
        let replace = match best {
            None => true,
            Some(current) => {
                let (size, current_size) = (pattern.notes.len(), current.notes.len());
                size > current_size
                    || (size == current_size
                        && Some(pattern.root) == bass
                        && Some(current.root) != bass)
            }
        };
        if replace {
            best = Some(pattern);
        }
    }

    best
}

fn root_fallback(classes: PitchSet) -> ChordLabel {
    for root in FALLBACK_ROOTS {
        if !classes.contains(root) {
            continue;
        }
        let label = match root {
            PitchClass::E if classes.contains_all(&[PitchClass::Fs, PitchClass::B]) => "Esus2",
            PitchClass::Fs if classes.contains_all(&[PitchClass::A, PitchClass::Cs]) => {
                if classes.contains(PitchClass::E) { "F#m7" } else { "F#m" }
            }
            PitchClass::A if classes.contains_all(&[PitchClass::Cs, PitchClass::E]) => "A",
            _ => root.name(),
        };
        return ChordLabel::new(label);
    }

    classes
        .sorted_names()
        .first()
        .map(|&name| ChordLabel::new(name))
        .unwrap_or_else(ChordLabel::unknown)
}

/// Label every window: base identification for all windows first, then a
/// second pass that corrects each label from its neighbours' base labels
/// and the pitches of the surrounding region.
pub fn label_windows(windows: &[Window]) -> Vec<ChordLabel> {
    let pitches: Vec<Vec<u8>> = windows.iter().map(Window::distinct_pitches).collect();
    let base: Vec<ChordLabel> = pitches.iter().map(|p| identify_chord(p)).collect();

    (0..windows.len())
        .map(|i| {
            let region = region_pitches(&pitches, i);
            let context = WindowContext {
                prev: i.checked_sub(1).map(|j| &base[j]),
                next: base.get(i + 1),
                region_pitches: &region,
            };
            correct_with_context(&pitches[i], &base[i], &context)
        })
        .collect()
}

/// Distinct pitches of the windows at `i - 1`, `i` and `i + 1`.
fn region_pitches(pitches: &[Vec<u8>], i: usize) -> Vec<u8> {
    let lo = i.saturating_sub(1);
    let hi = (i + 2).min(pitches.len());
    let mut region: Vec<u8> = pitches[lo..hi].iter().flatten().copied().collect();
    region.sort_unstable();
    region.dedup();
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteEvent;

    #[test]
    fn c_major_triad() {
        assert_eq!(identify_chord(&[60, 64, 67]), "C");
    }

    #[test]
    fn e7_is_not_e() {
        // E4 G#4 B4 D5
        assert_eq!(identify_chord(&[64, 68, 71, 74]), "E7");
    }

    #[test]
    fn exact_match_per_table() {
        assert_eq!(identify_chord(&[52, 54, 59]), "Bsus4"); // E F# B
        assert_eq!(identify_chord(&[53, 58, 60]), "Fsus4");
        assert_eq!(identify_chord(&[54, 57, 61, 64]), "F#m7");
        assert_eq!(identify_chord(&[60, 64, 67, 71]), "Cmaj7");
        assert_eq!(identify_chord(&[57, 60, 64]), "Am");
        assert_eq!(identify_chord(&[60, 63, 67]), "Cm"); // Eb spelled D#
        assert_eq!(identify_chord(&[55, 59, 62, 65]), "G7");
    }

    #[test]
    fn voicing_and_octave_do_not_matter() {
        // G major as a guitar open chord: G2 B2 D3 G3 B3 G4
        assert_eq!(identify_chord(&[43, 47, 50, 55, 59, 67]), "G");
    }

    #[test]
    fn richer_subset_wins() {
        // C E G B D (Cmaj9 cluster): Cmaj7 over C, and over Em7 because C is in the bass
        assert_eq!(identify_chord(&[60, 64, 67, 71, 74]), "Cmaj7");
    }

    #[test]
    fn equal_subsets_fall_back_to_priority() {
        // E G B D with C on top: Em7 and Cmaj7 both fit, E is in the bass
        assert_eq!(identify_chord(&[52, 55, 59, 62, 72]), "Em7");
        // Bass note not a root of either candidate → table order (minor 7th first)
        assert_eq!(identify_chord(&[50, 55, 59, 64, 72]), "Em7");
    }

    #[test]
    fn sus_twins_read_as_sus4() {
        assert_eq!(identify_chord(&[50, 52, 57]), "Asus4"); // D E A
        assert_eq!(identify_chord(&[55, 57, 62]), "Dsus4"); // G A D
        assert_eq!(identify_chord(&[48, 50, 55]), "Gsus4"); // C D G
        assert_eq!(identify_chord(&[53, 55, 60]), "Csus4"); // F G C
    }

    #[test]
    fn triad_with_extra_note() {
        // D F# A + E (Dadd9): Asus4 {D,E,A} and D {D,F#,A} tie on size, D in the bass
        assert_eq!(identify_chord(&[50, 54, 57, 64]), "D");
        // A C# E + B: Esus4 and A tie on size, A in the bass
        assert_eq!(identify_chord(&[57, 61, 64, 71]), "A");
        // Same notes over B: neither root is the bass, suspended table first
        assert_eq!(identify_chord(&[47, 57, 61, 64]), "Esus4");
    }

    #[test]
    fn single_pitch_class() {
        assert_eq!(identify_chord(&[45, 57, 69]), "A");
        assert_eq!(identify_chord(&[61]), "C#");
    }

    #[test]
    fn root_fallback_order() {
        // E + G# : no pattern → E
        assert_eq!(identify_chord(&[64, 68]), "E");
        // B + F: B before F in fallback order
        assert_eq!(identify_chord(&[59, 65]), "B");
        // C + D#: C
        assert_eq!(identify_chord(&[60, 63]), "C");
    }

    #[test]
    fn fallback_without_known_root_is_alphabetical() {
        // C# + G# + A# : no pattern, no fallback root → "A#"
        assert_eq!(identify_chord(&[61, 68, 70]), "A#");
        assert_eq!(identify_chord(&[61, 63]), "C#");
    }

    #[test]
    fn sentinels() {
        assert_eq!(identify_chord(&[]), "Silence");
        assert_eq!(identify_chord(&[200, 201]), "Unknown");
        // Unmappable pitch is ignored, not fatal
        assert_eq!(identify_chord(&[200, 60, 64, 67]), "C");
    }

    fn window(start: f64, pitches: &[u8]) -> Window {
        Window {
            start,
            end: start + 1.0,
            notes: pitches
                .iter()
                .map(|&p| NoteEvent::new(p, start, start + 1.0, 90))
                .collect(),
        }
    }

    #[test]
    fn label_windows_uses_neighbour_context() {
        // Am, C, Am: the C between A minors is read as Am7, and each Am
        // sits in a region spelling A C E G
        let windows = vec![
            window(0.0, &[57, 60, 64]),
            window(1.0, &[60, 64, 67]),
            window(2.0, &[57, 60, 64]),
        ];
        let labels = label_windows(&windows);
        assert_eq!(labels, vec!["Am7", "Am7", "Am7"]);
    }

    #[test]
    fn label_windows_without_context_matches_base() {
        let windows = vec![window(0.0, &[55, 59, 62])];
        assert_eq!(label_windows(&windows), vec!["G"]);
        assert!(label_windows(&[]).is_empty());
    }

    #[test]
    fn region_spans_neighbours_only() {
        let pitches = vec![vec![40], vec![50], vec![60], vec![70]];
        assert_eq!(region_pitches(&pitches, 0), vec![40, 50]);
        assert_eq!(region_pitches(&pitches, 1), vec![40, 50, 60]);
        assert_eq!(region_pitches(&pitches, 3), vec![60, 70]);
    }
}

//! Fixed chord vocabulary: pitch-class set → chord name, grouped by quality.

use super::pitch::PitchClass::{self, *};
use super::pitch::PitchSet;

/// One entry of the chord vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordPattern {
    pub label: &'static str,
    pub root: PitchClass,
    pub notes: PitchSet,
}

const fn chord(label: &'static str, root: PitchClass, notes: &[PitchClass]) -> ChordPattern {
    ChordPattern {
        label,
        root,
        notes: PitchSet::of(notes),
    }
}

// A sus4 chord spells the same pitch classes as the sus2 a fourth below it
// (Bsus4 = Esus2, Esus4 = Asus2, ...). The sus4 name wins; Bsus2 and Fsus4
// have no twin.
pub const SUSPENDED: &[ChordPattern] = &[
    chord("Bsus4", B, &[E, Fs, B]),
    chord("Esus4", E, &[A, B, E]),
    chord("Asus4", A, &[D, E, A]),
    chord("Dsus4", D, &[G, A, D]),
    chord("Gsus4", G, &[C, D, G]),
    chord("Csus4", C, &[F, G, C]),
    chord("Bsus2", B, &[B, Cs, Fs]),
    chord("Fsus4", F, &[F, As, C]),
];

pub const MINOR_SEVENTH: &[ChordPattern] = &[
    chord("F#m7", Fs, &[Fs, A, Cs, E]),
    chord("Am7", A, &[A, C, E, G]),
    chord("Dm7", D, &[D, F, A, C]),
    chord("Em7", E, &[E, G, B, D]),
    chord("Bm7", B, &[B, D, Fs, A]),
    chord("Cm7", C, &[C, Ds, G, As]),
    chord("Gm7", G, &[G, As, D, F]),
    chord("C#m7", Cs, &[Cs, E, Gs, B]),
];

pub const MAJOR_SEVENTH: &[ChordPattern] = &[
    chord("Emaj7", E, &[E, Gs, B, Ds]),
    chord("Amaj7", A, &[A, Cs, E, Gs]),
    chord("Bmaj7", B, &[B, Ds, Fs, As]),
    chord("F#maj7", Fs, &[Fs, As, Cs, F]),
    chord("Cmaj7", C, &[C, E, G, B]),
    chord("Dmaj7", D, &[D, Fs, A, Cs]),
    chord("Gmaj7", G, &[G, B, D, Fs]),
    chord("Fmaj7", F, &[F, A, C, E]),
];

pub const DOMINANT_SEVENTH: &[ChordPattern] = &[
    chord("E7", E, &[E, Gs, B, D]),
    chord("A7", A, &[A, Cs, E, G]),
    chord("B7", B, &[B, Ds, Fs, A]),
    chord("F#7", Fs, &[Fs, As, Cs, E]),
    chord("C7", C, &[C, E, G, As]),
    chord("D7", D, &[D, Fs, A, C]),
    chord("G7", G, &[G, B, D, F]),
];

pub const MAJOR: &[ChordPattern] = &[
    chord("E", E, &[E, Gs, B]),
    chord("A", A, &[A, Cs, E]),
    chord("B", B, &[B, Ds, Fs]),
    chord("F#", Fs, &[Fs, As, Cs]),
    chord("C", C, &[C, E, G]),
    chord("D", D, &[D, Fs, A]),
    chord("G", G, &[G, B, D]),
    chord("F", F, &[F, A, C]),
];

pub const MINOR: &[ChordPattern] = &[
    chord("F#m", Fs, &[Fs, A, Cs]),
    chord("Am", A, &[A, C, E]),
    chord("Bm", B, &[B, D, Fs]),
    chord("Em", E, &[E, G, B]),
    chord("Cm", C, &[C, Ds, G]),
    chord("Dm", D, &[D, F, A]),
    chord("Gm", G, &[G, As, D]),
    chord("C#m", Cs, &[Cs, E, Gs]),
];

/// Tables in lookup priority order: the first exact match wins, and equal-size
/// subset matches fall back to this order.
pub static PRIORITY: [&[ChordPattern]; 6] = [
    SUSPENDED,
    MINOR_SEVENTH,
    MAJOR_SEVENTH,
    DOMINANT_SEVENTH,
    MAJOR,
    MINOR,
];

/// Roots tried, in order, when no pattern matches at all.
pub const FALLBACK_ROOTS: [PitchClass; 8] = [E, Fs, A, B, C, D, G, F];

/// Every pattern in priority order.
pub fn all_patterns() -> impl Iterator<Item = &'static ChordPattern> {
    PRIORITY.iter().flat_map(|table| table.iter())
}

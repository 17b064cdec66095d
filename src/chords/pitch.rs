use std::fmt;

/// Octave-independent note identity. Always spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    /// Chromatic order starting at C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitones above C (0..12).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Pitch class of a MIDI note number. Numbers outside the MIDI range
    /// (above 127) have no pitch class.
    pub fn from_midi(pitch: u8) -> Option<Self> {
        if pitch > 127 {
            return None;
        }
        Some(Self::ALL[(pitch % 12) as usize])
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Parse a note name such as `"F#"`, `"Bb"`, `"G♯"`, `"E♭4"`.
    ///
    /// Unicode and ASCII accidentals are both accepted; flats resolve to the
    /// enharmonic sharp. A trailing octave number is ignored.
    pub fn parse(name: &str) -> Option<Self> {
        let (semitone, octave) = split_note_name(name)?;
        // Octave suffix ("4", "-1") is allowed, anything else is not a note name
        if !octave.chars().all(|c| c.is_ascii_digit() || c == '-') {
            return None;
        }
        Some(Self::from_index(semitone.rem_euclid(12) as usize))
    }

    /// MIDI number of a scientific-pitch name such as `"C4"` (60) or `"Bb2"`
    /// (46). The octave is required; names outside 0..=127 are rejected.
    pub fn midi_from_name(name: &str) -> Option<u8> {
        let (semitone, octave) = split_note_name(name)?;
        let octave: i32 = octave.parse().ok()?;
        let midi = (octave + 1) * 12 + semitone;
        u8::try_from(midi).ok().filter(|&m| m <= 127)
    }
}

/// Letter plus accidental as semitones above C (`Cb` is -1, `B#` is 12),
/// and whatever follows them.
fn split_note_name(name: &str) -> Option<(i32, &str)> {
    let name = name.trim();
    let mut chars = name.char_indices().peekable();
    let natural = match chars.next()?.1.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let shift = match chars.peek().map(|&(_, c)| c) {
        Some('#') | Some('♯') => 1,
        Some('b') | Some('♭') => -1,
        _ => 0,
    };
    if shift != 0 {
        chars.next();
    }

    let rest = chars.peek().map_or("", |&(i, _)| &name[i..]);
    Some((natural + shift, rest))
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of pitch classes packed into 12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PitchSet(u16);

impl PitchSet {
    pub const EMPTY: PitchSet = PitchSet(0);

    pub const fn of(classes: &[PitchClass]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < classes.len() {
            bits |= 1 << (classes[i] as u16);
            i += 1;
        }
        PitchSet(bits)
    }

    /// Pitch classes of a list of MIDI pitches. Unmappable pitches are skipped.
    pub fn from_midi(pitches: &[u8]) -> Self {
        pitches
            .iter()
            .filter_map(|&p| PitchClass::from_midi(p))
            .collect()
    }

    pub fn insert(&mut self, class: PitchClass) {
        self.0 |= 1 << (class as u16);
    }

    pub fn contains(self, class: PitchClass) -> bool {
        self.0 & (1 << (class as u16)) != 0
    }

    pub fn contains_all(self, classes: &[PitchClass]) -> bool {
        PitchSet::of(classes).is_subset_of(self)
    }

    pub fn is_subset_of(self, other: PitchSet) -> bool {
        self.0 & other.0 == self.0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in chromatic order.
    pub fn iter(self) -> impl Iterator<Item = PitchClass> {
        PitchClass::ALL.into_iter().filter(move |&c| self.contains(c))
    }

    /// Member names sorted alphabetically ("A" < "A#" < "B" < "C" ...).
    pub fn sorted_names(self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.iter().map(PitchClass::name).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<PitchClass> for PitchSet {
    fn from_iter<I: IntoIterator<Item = PitchClass>>(iter: I) -> Self {
        let mut set = PitchSet::EMPTY;
        for class in iter {
            set.insert(class);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_to_pitch_class() {
        assert_eq!(PitchClass::from_midi(60), Some(PitchClass::C));
        assert_eq!(PitchClass::from_midi(61), Some(PitchClass::Cs));
        assert_eq!(PitchClass::from_midi(21), Some(PitchClass::A)); // A0
        assert_eq!(PitchClass::from_midi(108), Some(PitchClass::C)); // C8
        assert_eq!(PitchClass::from_midi(127), Some(PitchClass::G));
        assert_eq!(PitchClass::from_midi(128), None);
        assert_eq!(PitchClass::from_midi(255), None);
    }

    #[test]
    fn parse_accepts_ascii_and_unicode_accidentals() {
        assert_eq!(PitchClass::parse("F#"), Some(PitchClass::Fs));
        assert_eq!(PitchClass::parse("F♯"), Some(PitchClass::Fs));
        assert_eq!(PitchClass::parse("Bb"), Some(PitchClass::As));
        assert_eq!(PitchClass::parse("B♭"), Some(PitchClass::As));
        assert_eq!(PitchClass::parse("Cb"), Some(PitchClass::B));
        assert_eq!(PitchClass::parse("E#"), Some(PitchClass::F));
        assert_eq!(PitchClass::parse("g"), Some(PitchClass::G));
        assert_eq!(PitchClass::parse("C#4"), Some(PitchClass::Cs));
        assert_eq!(PitchClass::parse("A-1"), Some(PitchClass::A));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(PitchClass::parse(""), None);
        assert_eq!(PitchClass::parse("H"), None);
        assert_eq!(PitchClass::parse("Cmaj7"), None);
    }

    #[test]
    fn midi_from_scientific_name() {
        assert_eq!(PitchClass::midi_from_name("C4"), Some(60));
        assert_eq!(PitchClass::midi_from_name("A0"), Some(21));
        assert_eq!(PitchClass::midi_from_name("F#4"), Some(66));
        assert_eq!(PitchClass::midi_from_name("E♭4"), Some(63));
        assert_eq!(PitchClass::midi_from_name("Bb2"), Some(46));
        assert_eq!(PitchClass::midi_from_name("Cb4"), Some(59));
        assert_eq!(PitchClass::midi_from_name("C-1"), Some(0));
        assert_eq!(PitchClass::midi_from_name("G9"), Some(127));
        assert_eq!(PitchClass::midi_from_name("G#9"), None);
        assert_eq!(PitchClass::midi_from_name("C"), None);
        assert_eq!(PitchClass::midi_from_name("Cmaj7"), None);
    }

    #[test]
    fn set_operations() {
        let c_major = PitchSet::of(&[PitchClass::C, PitchClass::E, PitchClass::G]);
        let cmaj9 = PitchSet::from_midi(&[60, 64, 67, 71, 74]);
        assert_eq!(c_major.len(), 3);
        assert_eq!(cmaj9.len(), 5);
        assert!(c_major.is_subset_of(cmaj9));
        assert!(!cmaj9.is_subset_of(c_major));
        assert!(cmaj9.contains(PitchClass::D));
        assert!(cmaj9.contains_all(&[PitchClass::B, PitchClass::D]));
        assert!(!cmaj9.contains(PitchClass::Fs));
    }

    #[test]
    fn octaves_collapse() {
        let set = PitchSet::from_midi(&[40, 52, 64, 76]);
        assert_eq!(set.len(), 1);
        assert!(set.contains(PitchClass::E));
    }

    #[test]
    fn unmappable_pitches_are_dropped() {
        let set = PitchSet::from_midi(&[200, 60]);
        assert_eq!(set, PitchSet::of(&[PitchClass::C]));
        assert!(PitchSet::from_midi(&[200, 201]).is_empty());
    }

    #[test]
    fn sorted_names_are_alphabetical() {
        let set = PitchSet::of(&[PitchClass::Cs, PitchClass::As, PitchClass::B, PitchClass::A]);
        assert_eq!(set.sorted_names(), vec!["A", "A#", "B", "C#"]);
    }
}

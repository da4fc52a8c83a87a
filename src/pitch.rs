//! # Pitch Table and Pitch Keys
//!
//! The pitch table maps a note's `sound` index to a letter name and octave. It is shared,
//! read-only configuration; notes only store the index.
//!
//! ## Pitch keys
//! A [`PitchKey`] is the string that ties an audio event to the glyph engraved for the same
//! note: `letter + "#"? + octave`, e.g. `C4` or `C#4`. It is produced in exactly one place,
//! [`pitch_key()`], which both the layout engine and the playback translator call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter names A through G
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Letter {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub fn as_str(self) -> &'static str {
        match self {
            Letter::C => "C",
            Letter::D => "D",
            Letter::E => "E",
            Letter::F => "F",
            Letter::G => "G",
            Letter::A => "A",
            Letter::B => "B",
        }
    }

    /// Diatonic step within the octave (C = 0 .. B = 6)
    pub fn step(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    /// Semitones above C
    pub fn semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the pitch table: `(letter, octave)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchEntry {
    pub letter: Letter,
    pub octave: u8,
}

impl PitchEntry {
    pub const fn new(letter: Letter, octave: u8) -> Self {
        Self { letter, octave }
    }

    /// Staff position in diatonic steps above C0.
    pub fn diatonic_index(&self) -> i32 {
        self.octave as i32 * 7 + self.letter.step()
    }

    /// MIDI note number (C4 = 60), raised a semitone when sharp.
    pub fn midi(&self, sharp: bool) -> u8 {
        let base = (self.octave as i32 + 1) * 12 + self.letter.semitone();
        (base + i32::from(sharp)).clamp(0, 127) as u8
    }
}

/// The ordered sound-index → pitch mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchTable {
    entries: Vec<PitchEntry>,
}

impl PitchTable {
    pub fn new(entries: Vec<PitchEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, sound: usize) -> Option<PitchEntry> {
        self.entries.get(sound).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PitchEntry] {
        &self.entries
    }
}

impl Default for PitchTable {
    /// Two octaves of C major, C4 to C6.
    fn default() -> Self {
        let letters = [
            Letter::C,
            Letter::D,
            Letter::E,
            Letter::F,
            Letter::G,
            Letter::A,
            Letter::B,
        ];
        let mut entries = Vec::with_capacity(15);
        for octave in 4..=5 {
            for letter in letters {
                entries.push(PitchEntry::new(letter, octave));
            }
        }
        entries.push(PitchEntry::new(Letter::C, 6));
        Self { entries }
    }
}

/// Identity shared by an audio event and the visual handle engraved for the same note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PitchKey(String);

impl PitchKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PitchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PitchKey {
    fn from(s: &str) -> Self {
        PitchKey(s.to_string())
    }
}

/// Build the pitch key for a pitch table entry.
///
/// The sharp marker goes between the letter and the octave digit, which is also the
/// pitch naming convention of the sampler.
///
/// # Example
/// ```rust
/// use staffplay::{pitch_key, Letter, PitchEntry};
///
/// let c4 = PitchEntry::new(Letter::C, 4);
/// assert_eq!(pitch_key(c4, false).as_str(), "C4");
/// assert_eq!(pitch_key(c4, true).as_str(), "C#4");
/// ```
pub fn pitch_key(entry: PitchEntry, accidental: bool) -> PitchKey {
    let marker = if accidental { "#" } else { "" };
    PitchKey(format!("{}{}{}", entry.letter, marker, entry.octave))
}

/// Parse a pitch label such as `C4`, `F#3` or `Ds5` back into its parts.
///
/// Returns the entry and whether it is sharp. Flats are normalised to the sharp of the
/// letter below (`Eb4` -> `D#4`). Used by the sampler to read its sample names.
pub fn parse_pitch_label(label: &str) -> Option<(PitchEntry, bool)> {
    let mut chars = label.chars();
    let letter = Letter::from_char(chars.next()?)?;
    let rest: String = chars.collect();
    let (modifier, octave) = match rest.chars().next()? {
        '#' | 's' => (1, &rest[1..]),
        'b' => (-1, &rest[1..]),
        _ => (0, rest.as_str()),
    };
    let octave: u8 = octave.parse().ok()?;
    let entry = PitchEntry::new(letter, octave);
    match modifier {
        1 => Some((entry, true)),
        -1 => {
            // one semitone down, expressed as a sharp where possible
            let midi = entry.midi(false) as i32 - 1;
            Some(from_midi(midi as u8))
        }
        _ => Some((entry, false)),
    }
}

/// Spell a MIDI number with sharps.
pub fn from_midi(midi: u8) -> (PitchEntry, bool) {
    const SPELLING: [(Letter, bool); 12] = [
        (Letter::C, false),
        (Letter::C, true),
        (Letter::D, false),
        (Letter::D, true),
        (Letter::E, false),
        (Letter::F, false),
        (Letter::F, true),
        (Letter::G, false),
        (Letter::G, true),
        (Letter::A, false),
        (Letter::A, true),
        (Letter::B, false),
    ];
    let (letter, sharp) = SPELLING[(midi % 12) as usize];
    let octave = (midi / 12).saturating_sub(1);
    (PitchEntry::new(letter, octave), sharp)
}

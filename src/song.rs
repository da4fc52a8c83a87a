//! # Song Model
//!
//! The data structure shared by the layout engine and the playback translator.
//!
//! ```text
//! Song
//!   └── Vec<Measure>        (bar order of the piece)
//!         └── Vec<Note>
//!               ├── sound: index into the PitchTable
//!               ├── duration: ticks (sixteenth = 1, quarter = 4)
//!               └── accidental: sharp or not
//! ```
//!
//! A song is never mutated after it has been generated; a new generation replaces it
//! wholesale. Songs can also be read from YAML:
//!
//! ```yaml
//! measures:
//!   - notes:
//!       - { sound: 0, duration: 4 }
//!       - { sound: 2, duration: 4, accidental: true }
//! ```

use serde::{Deserialize, Serialize};

use crate::duration::Ticks;
use crate::error::StaffError;

/// A single note: pitch table index, tick duration and sharp flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub sound: usize,
    pub duration: Ticks,
    #[serde(default)]
    pub accidental: bool,
}

impl Note {
    pub fn new(sound: usize, duration: Ticks, accidental: bool) -> Self {
        Self {
            sound,
            duration,
            accidental,
        }
    }
}

/// Where a note sits in the song: measure index and index within the measure.
///
/// Both translators tag their output with it so an audio event can be traced back to the
/// glyph engraved for the same note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotePosition {
    pub measure: usize,
    pub index: usize,
}

impl NotePosition {
    pub fn new(measure: usize, index: usize) -> Self {
        Self { measure, index }
    }
}

/// One bar of the song. Its notes share a measure-relative time origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Measure {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    /// Sum of the note durations. Irregular totals are allowed.
    pub fn total_ticks(&self) -> Ticks {
        self.notes.iter().map(|n| n.duration).sum()
    }
}

/// An ordered sequence of measures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl Song {
    pub fn new(measures: Vec<Measure>) -> Self {
        Self { measures }
    }

    /// Parse a song from its YAML form.
    pub fn from_yaml(source: &str) -> Result<Self, StaffError> {
        serde_yaml::from_str(source).map_err(|e| StaffError::SongError(e.to_string()))
    }

    /// Serialize the song back to YAML (used by the CLI to save generated songs).
    pub fn to_yaml(&self) -> Result<String, StaffError> {
        serde_yaml::to_string(self).map_err(|e| StaffError::SongError(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Total number of notes across all measures.
    pub fn note_count(&self) -> usize {
        self.measures.iter().map(|m| m.notes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_from_yaml() {
        let source = r#"
measures:
  - notes:
      - { sound: 0, duration: 4 }
      - { sound: 2, duration: 4, accidental: true }
  - notes: []
"#;
        let song = Song::from_yaml(source).unwrap();
        assert_eq!(song.len(), 2);
        assert_eq!(song.measures[0].notes[1], Note::new(2, 4, true));
        assert!(!song.measures[0].notes[0].accidental);
        assert!(song.measures[1].notes.is_empty());
        assert_eq!(song.note_count(), 2);
    }

    #[test]
    fn test_song_yaml_rejects_garbage() {
        let result = Song::from_yaml("measures: [ { notes: [ { sound: x } ] } ]");
        assert!(matches!(result, Err(StaffError::SongError(_))));
    }

    #[test]
    fn test_measure_total_ticks_may_be_irregular() {
        let measure = Measure::new(vec![Note::new(0, 4, false), Note::new(1, 2, false)]);
        assert_eq!(measure.total_ticks(), 6);
    }
}

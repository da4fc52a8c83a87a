//! Stave line and engraved note types produced by the layout engine.

use serde::Deserialize;

use crate::duration::Ticks;
use crate::error::StaffError;
use crate::pitch::{Letter, PitchEntry, PitchKey};
use crate::song::NotePosition;

use super::surface::HandleId;

/// Clef drawn at the start of a visual row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
}

impl Clef {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim() {
            "treble" => Some(Clef::Treble),
            "bass" => Some(Clef::Bass),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }

    /// Pitch sitting on the bottom staff line
    pub fn bottom_line(self) -> PitchEntry {
        match self {
            Clef::Treble => PitchEntry::new(Letter::E, 4),
            Clef::Bass => PitchEntry::new(Letter::G, 2),
        }
    }
}

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl TimeSignature {
    pub fn parse(s: &str) -> Result<Self, StaffError> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 {
            return Err(StaffError::ConfigError(format!(
                "Invalid time signature: {}",
                s
            )));
        }

        let beats: u8 = parts[0].trim().parse().map_err(|_| {
            StaffError::ConfigError(format!("Invalid time signature beats: {}", parts[0]))
        })?;
        let beat_type: u8 = parts[1].trim().parse().map_err(|_| {
            StaffError::ConfigError(format!("Invalid time signature beat type: {}", parts[1]))
        })?;

        if beats == 0 || !matches!(beat_type, 1 | 2 | 4 | 8 | 16) {
            return Err(StaffError::ConfigError(format!(
                "Invalid time signature: {}",
                s
            )));
        }

        Ok(Self { beats, beat_type })
    }

    /// Ticks in one beat of this signature (sixteenth-note ticks)
    pub fn beat_ticks(&self) -> Ticks {
        (16 / self.beat_type as Ticks).max(1)
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.beats, self.beat_type)
    }
}

/// Barline closing a stave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarlineKind {
    Single,
    End,
}

/// One engraved note of a stave
#[derive(Debug, Clone, PartialEq)]
pub struct StaveNote {
    pub key: PitchKey,
    pub pitch: PitchEntry,
    pub position: NotePosition,
    pub ticks: Ticks,
    /// Notation duration code (`q`, `8`, `hd`, ...)
    pub symbol: String,
    /// Carries a sharp mark
    pub accidental: bool,
    /// Note head centre
    pub x: f64,
    pub y: f64,
    /// Diatonic steps above the bottom staff line
    pub staff_step: i32,
    pub stem_up: bool,
    /// Set once the note is drawn on a surface
    pub handle: Option<HandleId>,
}

/// Consecutive notes of one measure joined by a beam
#[derive(Debug, Clone, PartialEq)]
pub struct BeamGroup {
    /// Indices into the stave's notes
    pub notes: Vec<usize>,
    pub stem_up: bool,
}

/// One measure rendered as a stave
#[derive(Debug, Clone, PartialEq)]
pub struct StaveLine {
    pub measure: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub has_clef: bool,
    pub has_time_signature: bool,
    pub end_barline: BarlineKind,
    pub notes: Vec<StaveNote>,
    pub beams: Vec<BeamGroup>,
}

impl StaveLine {
    pub fn new(measure: usize, x: f64, y: f64, width: f64) -> Self {
        Self {
            measure,
            x,
            y,
            width,
            has_clef: false,
            has_time_signature: false,
            end_barline: BarlineKind::Single,
            notes: Vec::new(),
            beams: Vec::new(),
        }
    }

    pub fn with_clef(mut self) -> Self {
        self.has_clef = true;
        self
    }

    pub fn with_time_signature(mut self) -> Self {
        self.has_time_signature = true;
        self
    }

    /// y of staff line `i` (0 = top line, 4 = bottom line)
    pub fn line_y(&self, i: usize, spacing: f64) -> f64 {
        self.y + (4.0 + i as f64) * spacing
    }

    pub fn top_line_y(&self, spacing: f64) -> f64 {
        self.line_y(0, spacing)
    }

    pub fn bottom_line_y(&self, spacing: f64) -> f64 {
        self.line_y(4, spacing)
    }

    /// x where the note area begins, after clef and time signature
    pub fn note_start_x(&self) -> f64 {
        let mut x = self.x + NOTE_PADDING;
        if self.has_clef {
            x += CLEF_WIDTH;
        }
        if self.has_time_signature {
            x += TIME_SIGNATURE_WIDTH;
        }
        x
    }

    pub fn note_end_x(&self) -> f64 {
        self.x + self.width - NOTE_PADDING
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

pub const CLEF_WIDTH: f64 = 30.0;
pub const TIME_SIGNATURE_WIDTH: f64 = 30.0;
pub const NOTE_PADDING: f64 = 10.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature_parse() {
        assert_eq!(
            TimeSignature::parse("3/4").unwrap(),
            TimeSignature {
                beats: 3,
                beat_type: 4
            }
        );
        assert_eq!(TimeSignature::parse("6/8").unwrap().beat_ticks(), 2);
        assert_eq!(TimeSignature::parse("4/4").unwrap().beat_ticks(), 4);
        assert!(TimeSignature::parse("4").is_err());
        assert!(TimeSignature::parse("4/5").is_err());
        assert!(TimeSignature::parse("x/4").is_err());
    }

    #[test]
    fn test_clef_names() {
        for clef in [Clef::Treble, Clef::Bass] {
            assert_eq!(Clef::from_name(clef.as_str()), Some(clef));
        }
        assert_eq!(Clef::from_name("alto"), None);
        assert_eq!(Clef::Bass.bottom_line(), PitchEntry::new(Letter::G, 2));
    }

    #[test]
    fn test_staff_line_positions() {
        let stave = StaveLine::new(0, 10.0, 40.0, 250.0);
        assert_eq!(stave.top_line_y(10.0), 80.0);
        assert_eq!(stave.bottom_line_y(10.0), 120.0);
    }

    #[test]
    fn test_note_area_shrinks_with_modifiers() {
        let plain = StaveLine::new(0, 10.0, 40.0, 250.0);
        let full = StaveLine::new(0, 10.0, 40.0, 250.0)
            .with_clef()
            .with_time_signature();
        assert_eq!(plain.note_start_x(), 20.0);
        assert_eq!(full.note_start_x(), 80.0);
        assert_eq!(full.note_end_x(), 250.0);
    }
}

//! Playback event type definitions
//!
//! This module defines the types handed to the clock for audio playback and visual
//! highlighting.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::duration::Ticks;
use crate::error::StaffError;
use crate::pitch::PitchKey;
use crate::song::NotePosition;

/// Transport position of an event: measure index plus ticks elapsed within the measure
///
/// Encoded as `"<measure>:<ticks>"`, both non-negative integers without leading zeros.
/// Offsets order measure-major, then ticks-major.
///
/// # Example
/// ```rust
/// use staffplay::playback::Offset;
///
/// let offset: Offset = "3:12".parse().unwrap();
/// assert_eq!(offset, Offset::new(3, 12));
/// assert_eq!(offset.to_string(), "3:12");
/// assert!("03:12".parse::<Offset>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset {
    pub measure: usize,
    pub ticks: Ticks,
}

impl Offset {
    pub fn new(measure: usize, ticks: Ticks) -> Self {
        Self { measure, ticks }
    }

    /// Absolute position in ticks for a given measure length.
    pub fn absolute_ticks(&self, ticks_per_measure: Ticks) -> u64 {
        self.measure as u64 * ticks_per_measure as u64 + self.ticks as u64
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.measure, self.ticks)
    }
}

impl FromStr for Offset {
    type Err = StaffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StaffError::InvalidOffset(s.to_string());
        let (measure, ticks) = s.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            measure: parse_component(measure).ok_or_else(invalid)?,
            ticks: parse_component(ticks).ok_or_else(invalid)?,
        })
    }
}

/// Digits only, no sign, no leading zero unless the number is zero itself.
fn parse_component<T: FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

impl Serialize for Offset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One note of the song, ready for the clock
///
/// # Fields
/// - `offset`: when the note starts, as a transport offset
/// - `pitch`: pitch key shared with the visual handle of the same note (`C4`, `C#4`)
/// - `duration`: playback duration symbol (`4n`, `8n.`, ...)
/// - `position`: the (measure, note) pair the event was translated from
/// - `ticks`: the note's length in ticks, for clocks that need seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioEvent {
    pub offset: Offset,
    pub pitch: PitchKey,
    pub duration: String,
    pub position: NotePosition,
    pub ticks: Ticks,
}

impl fmt::Display for AudioEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.offset, self.pitch, self.duration)
    }
}

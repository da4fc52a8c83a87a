//! # Duration Tables
//!
//! Notes store their length in ticks (sixteenth = 1, quarter = 4, whole = 16). Only a
//! fixed set of tick values can be engraved and played, and each one has two symbols:
//!
//! | ticks | notation | playback |
//! |-------|----------|----------|
//! | 16    | `w`      | `1n`     |
//! | 12    | `hd`     | `2n.`    |
//! | 8     | `h`      | `2n`     |
//! | 6     | `qd`     | `4n.`    |
//! | 4     | `q`      | `4n`     |
//! | 3     | `8d`     | `8n.`    |
//! | 2     | `8`      | `8n`     |
//! | 1     | `16`     | `16n`    |
//!
//! The notation column uses engraving duration codes, the playback column uses transport
//! note values. The two sets differ, so they are two separate maps; both must cover every
//! canonical tick value or [`DurationTables::new`] fails.

use std::collections::BTreeMap;

use crate::error::StaffError;

/// Abstract time unit of a note duration
pub type Ticks = u32;

/// Ticks in a quarter note
pub const TICKS_PER_BEAT: Ticks = 4;

/// Canonical tick values, longest first
pub const CANONICAL_TICKS: [Ticks; 8] = [16, 12, 8, 6, 4, 3, 2, 1];

const NOTATION_SYMBOLS: [(Ticks, &str); 8] = [
    (16, "w"),
    (12, "hd"),
    (8, "h"),
    (6, "qd"),
    (4, "q"),
    (3, "8d"),
    (2, "8"),
    (1, "16"),
];

const PLAYBACK_SYMBOLS: [(Ticks, &str); 8] = [
    (16, "1n"),
    (12, "2n."),
    (8, "2n"),
    (6, "4n."),
    (4, "4n"),
    (3, "8n."),
    (2, "8n"),
    (1, "16n"),
];

/// The two validated duration-to-symbol maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationTables {
    canonical: Vec<Ticks>,
    notation: BTreeMap<Ticks, String>,
    playback: BTreeMap<Ticks, String>,
}

impl DurationTables {
    /// Build the tables, checking that both maps cover every canonical tick value.
    ///
    /// Entries for ticks outside the canonical set are ignored; the canonical set is the
    /// single source of what a valid duration is.
    pub fn new(
        canonical: &[Ticks],
        notation: BTreeMap<Ticks, String>,
        playback: BTreeMap<Ticks, String>,
    ) -> Result<Self, StaffError> {
        for &ticks in canonical {
            if ticks == 0 {
                return Err(StaffError::ConfigError(
                    "canonical durations must be positive".to_string(),
                ));
            }
            if !notation.contains_key(&ticks) {
                return Err(StaffError::IncompleteDurationTable {
                    table: "notation",
                    ticks,
                });
            }
            if !playback.contains_key(&ticks) {
                return Err(StaffError::IncompleteDurationTable {
                    table: "playback",
                    ticks,
                });
            }
        }

        let mut canonical = canonical.to_vec();
        canonical.sort_unstable_by(|a, b| b.cmp(a));
        canonical.dedup();

        let notation = notation
            .into_iter()
            .filter(|(t, _)| canonical.contains(t))
            .collect();
        let playback = playback
            .into_iter()
            .filter(|(t, _)| canonical.contains(t))
            .collect();

        Ok(Self {
            canonical,
            notation,
            playback,
        })
    }

    pub fn is_canonical(&self, ticks: Ticks) -> bool {
        self.notation.contains_key(&ticks)
    }

    /// Canonical tick values, longest first.
    pub fn canonical(&self) -> &[Ticks] {
        &self.canonical
    }

    pub fn notation(&self, ticks: Ticks) -> Option<&str> {
        self.notation.get(&ticks).map(String::as_str)
    }

    pub fn playback(&self, ticks: Ticks) -> Option<&str> {
        self.playback.get(&ticks).map(String::as_str)
    }

    /// Reverse lookup used by the instrument to turn a playback symbol back into ticks.
    pub fn ticks_for_playback(&self, symbol: &str) -> Option<Ticks> {
        self.playback
            .iter()
            .find(|(_, s)| s.as_str() == symbol)
            .map(|(t, _)| *t)
    }
}

impl Default for DurationTables {
    fn default() -> Self {
        Self {
            canonical: CANONICAL_TICKS.to_vec(),
            notation: default_notation_symbols(),
            playback: default_playback_symbols(),
        }
    }
}

pub fn default_notation_symbols() -> BTreeMap<Ticks, String> {
    NOTATION_SYMBOLS
        .iter()
        .map(|(t, s)| (*t, s.to_string()))
        .collect()
}

pub fn default_playback_symbols() -> BTreeMap<Ticks, String> {
    PLAYBACK_SYMBOLS
        .iter()
        .map(|(t, s)| (*t, s.to_string()))
        .collect()
}

/// Whether a duration is short enough to be beamed (shorter than a quarter note)
pub fn is_beamable(ticks: Ticks) -> bool {
    ticks < TICKS_PER_BEAT
}

/// Number of flags/beams an unbeamed note of this length carries.
pub fn flag_count(ticks: Ticks) -> usize {
    match ticks {
        1 => 2,
        2 | 3 => 1,
        _ => 0,
    }
}

/// Whether the note head is filled (quarter or shorter).
pub fn is_filled(ticks: Ticks) -> bool {
    ticks < 8
}

/// Whether the note carries a stem (anything shorter than a whole note).
pub fn has_stem(ticks: Ticks) -> bool {
    ticks < 16
}

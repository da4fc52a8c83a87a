//! # Error Types
//!
//! This module defines all error types for staffplay.
//!
//! Translation errors carry the position of the offending note (0-indexed measure and
//! note) so a caller can point at the exact spot in the song.
//!
//! ## Error Types
//! - `UnmappedDuration` - a note's tick duration has no notation/playback symbol
//! - `UnknownSound` - a note's sound index is outside the pitch table
//! - `IncompleteDurationTable` - a duration table misses a canonical tick value
//! - `InvalidOffset` - a transport offset string is malformed
//! - `ConfigError` / `SongError` - YAML input could not be read
//!
//! ## Usage
//! ```rust
//! use staffplay::{translate, Config, Measure, Note, Song, StaffError};
//!
//! let config = Config::default();
//! let song = Song::new(vec![Measure::new(vec![Note::new(0, 5, false)])]);
//! match translate(&song, config.pitch_table(), &config.duration_tables()?) {
//!     Ok(events) => println!("{} events", events.len()),
//!     Err(StaffError::UnmappedDuration { measure, note, ticks }) => {
//!         eprintln!("measure {} note {}: no symbol for {} ticks", measure, note, ticks);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # Ok::<(), StaffError>(())
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StaffError {
    /// A note uses a tick duration outside the canonical set.
    ///
    /// Fatal for the whole song: neither translator produces partial output.
    ///
    /// # Example
    /// ```
    /// # use staffplay::StaffError;
    /// let err = StaffError::UnmappedDuration { measure: 2, note: 1, ticks: 5 };
    /// assert_eq!(err.to_string(), "Unmapped duration at measure 2, note 1: 5 ticks");
    /// ```
    #[error("Unmapped duration at measure {measure}, note {note}: {ticks} ticks")]
    UnmappedDuration {
        measure: usize,
        note: usize,
        ticks: u32,
    },

    /// A note's sound index does not resolve through the pitch table.
    #[error("Unknown sound at measure {measure}, note {note}: index {sound} is outside the pitch table")]
    UnknownSound {
        measure: usize,
        note: usize,
        sound: usize,
    },

    /// A duration table was built without an entry for a canonical tick value.
    ///
    /// # Example
    /// ```
    /// # use staffplay::StaffError;
    /// let err = StaffError::IncompleteDurationTable { table: "playback", ticks: 12 };
    /// assert_eq!(err.to_string(), "The playback duration table has no symbol for 12 ticks");
    /// ```
    #[error("The {table} duration table has no symbol for {ticks} ticks")]
    IncompleteDurationTable { table: &'static str, ticks: u32 },

    /// Offset strings must look like `<measure>:<ticks>` without leading zeros.
    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid song: {0}")]
    SongError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

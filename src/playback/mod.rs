//! # Playback Module
//!
//! Turn a [`Song`](crate::Song) into the ordered audio events the clock plays.
//!
//! ## Purpose
//! The events serve two consumers:
//! 1. **Audio playback** - the instrument attacks each event's pitch for its duration
//! 2. **Visual highlighting** - each event's pitch key and position find the handle the
//!    layout engine engraved for the same note
//!
//! ## Sub-modules
//! - `types` - [`Offset`] and [`AudioEvent`]
//! - `translator` - [`translate()`], the translation itself
//!
//! ## Example
//! ```rust
//! use staffplay::playback::translate;
//! use staffplay::{Config, Measure, Note, Song};
//!
//! let config = Config::default();
//! let song = Song::new(vec![Measure::new(vec![
//!     Note::new(0, 4, false),
//!     Note::new(0, 4, true),
//! ])]);
//!
//! let events = translate(&song, config.pitch_table(), &config.duration_tables()?)?;
//!
//! assert_eq!(events[0].to_string(), "0:0 C4 4n");
//! assert_eq!(events[1].to_string(), "0:4 C#4 4n");
//! # Ok::<(), staffplay::StaffError>(())
//! ```
//!
//! ## Timing
//!
//! Offsets are transport positions (`"<measure>:<ticks>"`), not seconds. The clock converts
//! them to wall-clock time at its current tempo.

mod translator;
mod types;


pub use translator::translate;
pub use types::{AudioEvent, Offset};

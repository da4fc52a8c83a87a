//! # Layout Module
//!
//! Engrave a [`Song`](crate::Song) onto paginated staves.
//!
//! ## Sub-modules
//! - `engine` - [`LayoutEngine`], stave planning and drawing
//! - `stave` - stave lines, engraved notes, clef and time signature
//! - `beam` - beat-aware automatic beaming
//! - `surface` - the owned rendering surface and its note handles
//! - `svg` - SVG export of a surface
//!
//! ## Row Wrapping
//!
//! Staves follow each other left to right. The stave of measure `i` opens a new visual row
//! (x back to the margin, y one row spacing lower, clef redrawn) when `(i + 1)` is a multiple
//! of `measures-per-row`. With the default of 5 the first row holds four staves and
//! measure 5 is the first one on the second row. This differs from a plain five-per-row
//! grid, where the first row would also hold five staves; later rows hold five either way.
//!
//! ## Example
//! ```rust
//! use staffplay::layout::LayoutEngine;
//! use staffplay::{Config, Measure, Note, Song};
//!
//! let config = Config::default();
//! let mut engine = LayoutEngine::new(&config)?;
//! let song = Song::new(vec![Measure::new(vec![Note::new(0, 4, false)])]);
//! engine.layout(&song, config.page_width)?;
//!
//! let surface = engine.surface().unwrap();
//! assert_eq!(surface.handles().len(), 1);
//! assert_eq!(surface.handles()[0].key.as_str(), "C4");
//! # Ok::<(), staffplay::StaffError>(())
//! ```

mod beam;
mod engine;
mod stave;
mod surface;
mod svg;

#[cfg(test)]
mod tests;

pub use beam::{beam_states, generate_beams, BeamState};
pub use engine::{plan_staves, starts_row, surface_size, LayoutEngine};
pub use stave::{BarlineKind, BeamGroup, Clef, StaveLine, StaveNote, TimeSignature};
pub use surface::{DrawOp, HandleId, NoteHandle, Style, Surface};
pub use svg::to_svg;

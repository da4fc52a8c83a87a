pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod generator;
pub mod instrument;
pub mod layout;
pub mod logger;
pub mod pitch;
pub mod playback;
pub mod session;
pub mod song;
pub mod sync;

pub use clock::{Clock, PlayState, Transport};
pub use config::Config;
pub use duration::{DurationTables, Ticks};
pub use error::*;
pub use generator::{FixedSong, Generator, RandomGenerator};
pub use instrument::{Instrument, Sampler, Voice};
pub use layout::{to_svg, LayoutEngine, Surface};
pub use pitch::{pitch_key, Letter, PitchEntry, PitchKey, PitchTable};
pub use playback::{translate, AudioEvent, Offset};
pub use session::{Session, SessionState};
pub use song::{Measure, Note, NotePosition, Song};
pub use sync::Synchronizer;

/// Lay a song out with the given configuration and return it as an SVG document.
/// This is the main entry point for rendering.
pub fn render_svg(song: &Song, config: &Config) -> Result<String, StaffError> {
    let mut engine = LayoutEngine::new(config)?;
    engine.layout(song, config.page_width)?;
    Ok(engine.surface().map(to_svg).unwrap_or_default())
}

/// Translate a song with the pitch and duration tables of a configuration.
pub fn events_for(song: &Song, config: &Config) -> Result<Vec<AudioEvent>, StaffError> {
    translate(song, config.pitch_table(), &config.duration_tables()?)
}

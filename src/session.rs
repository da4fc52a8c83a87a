//! # Session Controller
//!
//! Owns the current song and walks it through generate, layout and playback.
//!
//! ```text
//! Idle --generate--> Generated --play--> Playing --stop--> Stopped
//!                        ^                                    |
//!                        +---------------play-----------------+
//! ```
//!
//! `generate` is allowed from every state and always lands in `Generated`; a song already
//! sounding keeps playing until `stop`. The session is driven cooperatively: the owner calls
//! [`Session::pump`] with the current wall-clock time, which runs the autoplay armed by
//! [`Session::mount`], advances the clock and renders pending highlights.

use chrono::{DateTime, Local};
use log::info;

use crate::clock::Clock;
use crate::config::Config;
use crate::error::StaffError;
use crate::generator::Generator;
use crate::instrument::Instrument;
use crate::layout::{LayoutEngine, Surface};
use crate::song::Song;
use crate::sync::Synchronizer;

/// Format of the generation timestamp label, e.g. `07-Mar-24 14:05:09`
pub const TIMESTAMP_FORMAT: &str = "%d-%b-%y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Generated,
    Playing,
    Stopped,
}

pub struct Session<G: Generator, C: Clock, I: Instrument + 'static> {
    generator: G,
    engine: LayoutEngine,
    sync: Synchronizer<C, I>,
    song: Option<Song>,
    state: SessionState,
    generated_at: Option<DateTime<Local>>,
    tempo: f64,
    duration: usize,
    page_width: f64,
    autoplay_delay: f64,
    /// Wall-clock time the mount autoplay is due
    autoplay_at: Option<f64>,
    last_pump: Option<f64>,
}

impl<G: Generator, C: Clock, I: Instrument + 'static> Session<G, C, I> {
    pub fn new(
        config: &Config,
        generator: G,
        clock: C,
        instrument: I,
    ) -> Result<Self, StaffError> {
        Ok(Self {
            generator,
            engine: LayoutEngine::new(config)?,
            sync: Synchronizer::new(config, clock, instrument)?,
            song: None,
            state: SessionState::Idle,
            generated_at: None,
            tempo: config.tempo,
            duration: config.song_duration,
            page_width: config.page_width,
            autoplay_delay: config.autoplay_delay_ms as f64 / 1000.0,
            autoplay_at: None,
            last_pump: None,
        })
    }

    /// Generate a new song and render it, replacing the current one.
    ///
    /// On error the previous song, surface and state are kept.
    pub fn generate(&mut self) -> Result<(), StaffError> {
        let song = self.generator.generate(self.duration);
        self.load(song)
    }

    /// Render a given song as if it had just been generated.
    pub fn load(&mut self, song: Song) -> Result<(), StaffError> {
        self.engine.layout(&song, self.page_width)?;

        let now = Local::now();
        info!(
            "session: generated {} measures ({} notes) at {}",
            song.len(),
            song.note_count(),
            now.format(TIMESTAMP_FORMAT)
        );
        self.song = Some(song);
        self.generated_at = Some(now);
        self.state = SessionState::Generated;
        Ok(())
    }

    /// Start playback of the current song.
    ///
    /// Only acts from `Generated` or `Stopped`; returns `Ok(false)` otherwise.
    pub fn play(&mut self) -> Result<bool, StaffError> {
        if !matches!(self.state, SessionState::Generated | SessionState::Stopped) {
            return Ok(false);
        }
        let Some(song) = self.song.as_ref() else {
            return Ok(false);
        };
        let events = self.sync.play(song, self.tempo)?;
        info!("session: playing {} events at {} bpm", events, self.tempo);
        self.state = SessionState::Playing;
        Ok(true)
    }

    /// Stop playback.
    ///
    /// Acts from `Playing`, and also after a `generate` during playback, while the clock
    /// is still running the previous song. Returns `Ok(false)` when nothing is playing.
    pub fn stop(&mut self) -> Result<bool, StaffError> {
        if self.state != SessionState::Playing && !self.sync.is_playing() {
            return Ok(false);
        }
        self.sync.stop();
        info!("session: stopped");
        self.state = SessionState::Stopped;
        Ok(true)
    }

    /// Startup choreography: generate now, play once the autoplay delay has passed.
    pub fn mount(&mut self, now: f64) -> Result<(), StaffError> {
        self.generate()?;
        self.autoplay_at = Some(now + self.autoplay_delay);
        self.last_pump = Some(now);
        info!("session: mounted, autoplay in {}s", self.autoplay_delay);
        Ok(())
    }

    /// Drive the session up to wall-clock time `now` (seconds).
    ///
    /// Runs a due autoplay, advances the clock, then renders highlights and reverts.
    pub fn pump(&mut self, now: f64) -> Result<(), StaffError> {
        let last = self.last_pump.unwrap_or(now);
        self.last_pump = Some(now.max(last));

        match self.autoplay_at {
            Some(due) if due <= now => {
                self.sync.advance(due - last);
                self.autoplay_at = None;
                self.play()?;
                self.sync.advance(now - due);
            }
            _ => self.sync.advance(now - last),
        }

        self.sync.render(now, self.engine.surface_mut());
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn generated_at(&self) -> Option<DateTime<Local>> {
        self.generated_at
    }

    /// Generation time as shown to the user, `DD-MMM-YY HH:mm:ss`.
    pub fn timestamp_label(&self) -> Option<String> {
        self.generated_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.engine.surface()
    }

    pub fn synchronizer(&self) -> &Synchronizer<C, I> {
        &self.sync
    }

    pub fn autoplay_pending(&self) -> bool {
        self.autoplay_at.is_some()
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Tempo used by the next `play`.
    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm > 0.0 {
            self.tempo = bpm;
        }
    }

    /// Measures requested from the generator on the next `generate`.
    pub fn set_duration(&mut self, measures: usize) {
        self.duration = measures;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Transport;
    use crate::generator::{FixedSong, RandomGenerator};
    use crate::instrument::Sampler;
    use crate::song::{Measure, Note};

    fn song() -> Song {
        Song::new(vec![
            Measure::new(vec![Note::new(0, 8, false), Note::new(4, 8, false)]),
            Measure::new(vec![Note::new(2, 16, true)]),
        ])
    }

    fn session<G: Generator>(generator: G) -> Session<G, Transport, Sampler> {
        let config = Config::default();
        let clock = Transport::from_config(&config.clock);
        let sampler =
            Sampler::from_config(&config.sampler, config.duration_tables().unwrap()).unwrap();
        Session::new(&config, generator, clock, sampler).unwrap()
    }

    #[test]
    fn test_state_machine() {
        let mut session = session(FixedSong(song()));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.play().unwrap());
        assert!(!session.stop().unwrap());

        session.generate().unwrap();
        assert_eq!(session.state(), SessionState::Generated);
        assert!(!session.stop().unwrap());

        assert!(session.play().unwrap());
        assert_eq!(session.state(), SessionState::Playing);
        assert!(!session.play().unwrap());

        assert!(session.stop().unwrap());
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.synchronizer().clock().is_idle());

        assert!(session.play().unwrap());
        assert_eq!(session.state(), SessionState::Playing);

        session.generate().unwrap();
        assert_eq!(session.state(), SessionState::Generated);
    }

    #[test]
    fn test_stop_after_generate_during_playback() {
        let mut session = session(FixedSong(song()));
        session.generate().unwrap();
        session.play().unwrap();
        session.generate().unwrap();
        assert_eq!(session.state(), SessionState::Generated);
        assert!(session.synchronizer().is_playing());

        assert!(session.stop().unwrap());
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.synchronizer().clock().is_idle());
        assert!(!session.stop().unwrap());

        assert!(session.play().unwrap());
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn test_generate_records_timestamp() {
        let mut session = session(FixedSong(song()));
        assert!(session.timestamp_label().is_none());
        session.generate().unwrap();

        let label = session.timestamp_label().unwrap();
        // DD-MMM-YY HH:mm:ss
        assert_eq!(label.len(), 18);
        assert_eq!(&label[2..3], "-");
        assert_eq!(&label[9..10], " ");
        assert_eq!(session.surface().unwrap().handles().len(), 3);
    }

    #[test]
    fn test_mount_autoplays_after_delay() {
        let mut session = session(FixedSong(song()));
        session.mount(10.0).unwrap();
        assert_eq!(session.state(), SessionState::Generated);
        assert!(session.autoplay_pending());

        session.pump(10.5).unwrap();
        assert_eq!(session.state(), SessionState::Generated);

        session.pump(11.0).unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert!(!session.autoplay_pending());
        assert_eq!(session.synchronizer().highlights(), 1);
    }

    #[test]
    fn test_pump_plays_whole_song() {
        let mut session = session(FixedSong(song()));
        session.mount(0.0).unwrap();
        // autoplay at 1.0; at 100 bpm a half note is 1.2 s, a measure 2.4 s
        let mut now = 0.0;
        while now < 5.0 {
            now += 0.05;
            session.pump(now).unwrap();
        }
        let sync = session.synchronizer();
        assert_eq!(sync.highlights(), 3);
        assert_eq!(sync.misses(), 0);
        assert_eq!(sync.pending_reverts(), 0);

        let voices = sync.instrument();
        let starts: Vec<f64> = voices.voices().iter().map(|v| v.start).collect();
        assert_eq!(starts.len(), 3);
        assert!((starts[1] - 1.2).abs() < 1e-6);
        assert!((starts[2] - 2.4).abs() < 1e-6);
        assert!(surface_at_rest(session.surface().unwrap()));
    }

    fn surface_at_rest(surface: &Surface) -> bool {
        surface.handles().iter().all(|h| h.style.opacity == 0.3)
    }

    #[test]
    fn test_failed_generate_keeps_previous_song() {
        let mut session = session(FixedSong(song()));
        session.generate().unwrap();
        session.play().unwrap();

        let bad = Song::new(vec![Measure::new(vec![Note::new(0, 9, false)])]);
        assert!(matches!(
            session.load(bad),
            Err(StaffError::UnmappedDuration { .. })
        ));
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.song(), Some(&song()));
    }

    #[test]
    fn test_random_generator_session() {
        let mut config = Config::default();
        config.generator.seed = Some(9);
        let mut session = session(RandomGenerator::from_config(&config).unwrap());
        session.set_duration(6);
        session.generate().unwrap();
        assert_eq!(session.song().unwrap().len(), 6);
        assert_eq!(
            session.surface().unwrap().handles().len(),
            session.song().unwrap().note_count()
        );
    }
}

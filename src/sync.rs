//! # Playback/Visual Synchronizer
//!
//! Binds translated audio events to the clock and highlights the engraved note of each
//! event as it sounds.
//!
//! ## Flow
//! 1. [`Synchronizer::play`] translates the song, resets the clock and schedules the events.
//! 2. Each clock callback attacks the instrument and queues a [`DrawCue`] for the same time.
//! 3. [`Synchronizer::render`], called from the rendering side, drains the cues: the handle
//!    for the cue's pitch key is raised to the top, switched to its active style, and a
//!    revert timer is armed on the wall clock.
//! 4. Due revert timers put the handle back in its resting style.
//!
//! Revert timers belong to the wall clock, not the transport, so [`Synchronizer::stop`]
//! leaves them running: a highlight shown just before a stop still fades out on time.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, warn};

use crate::clock::{Clock, PlayState};
use crate::config::{Config, HighlightConfig};
use crate::duration::DurationTables;
use crate::error::StaffError;
use crate::instrument::Instrument;
use crate::layout::{HandleId, Style, Surface};
use crate::pitch::{PitchKey, PitchTable};
use crate::playback::{translate, AudioEvent};
use crate::song::{NotePosition, Song};

/// A highlight waiting for the rendering side
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCue {
    /// Transport time of the event, in seconds
    pub time: f64,
    pub key: PitchKey,
    pub position: NotePosition,
}

#[derive(Debug, Clone, PartialEq)]
struct RevertTimer {
    /// Wall-clock time in seconds
    due: f64,
    handle: HandleId,
    key: PitchKey,
    position: NotePosition,
}

type DrawQueue = Rc<RefCell<VecDeque<DrawCue>>>;

pub struct Synchronizer<C: Clock, I: Instrument + 'static> {
    clock: C,
    instrument: Rc<RefCell<I>>,
    queue: DrawQueue,
    reverts: Vec<RevertTimer>,
    highlight: HighlightConfig,
    pitches: PitchTable,
    durations: DurationTables,
    misses: usize,
    highlights: usize,
}

impl<C: Clock, I: Instrument + 'static> Synchronizer<C, I> {
    pub fn new(config: &Config, clock: C, instrument: I) -> Result<Self, StaffError> {
        Ok(Self {
            clock,
            instrument: Rc::new(RefCell::new(instrument)),
            queue: Rc::new(RefCell::new(VecDeque::new())),
            reverts: Vec::new(),
            highlight: config.highlight.clone(),
            pitches: config.pitch_table().clone(),
            durations: config.duration_tables()?,
            misses: 0,
            highlights: 0,
        })
    }

    /// Translate `song` and play it from the start at `tempo` bpm.
    ///
    /// The clock is rewound and its previous schedule dropped before the new events are
    /// registered. Returns the number of scheduled events.
    ///
    /// A translation error leaves the clock as it was: nothing is cancelled or scheduled.
    pub fn play(&mut self, song: &Song, tempo: f64) -> Result<usize, StaffError> {
        let events = translate(song, &self.pitches, &self.durations)?;
        let count = events.len();

        self.clock.stop();
        self.clock.cancel();
        self.clock.clear();

        let instrument = Rc::clone(&self.instrument);
        let queue = Rc::clone(&self.queue);
        self.clock.schedule(
            events,
            Box::new(move |time: f64, bpm: f64, event: &AudioEvent| {
                let mut instrument = instrument.borrow_mut();
                instrument.set_tempo(bpm);
                instrument.attack(&event.pitch, &event.duration, time);
                queue.borrow_mut().push_back(DrawCue {
                    time,
                    key: event.pitch.clone(),
                    position: event.position,
                });
            }),
        );

        self.clock.ramp_tempo(tempo);
        self.clock.start();
        debug!("sync: playing {} events at {} bpm", count, tempo);
        Ok(count)
    }

    /// Stop the clock and drop everything it has not fired yet.
    ///
    /// Highlights already shown keep their revert timers.
    pub fn stop(&mut self) {
        self.clock.stop();
        self.clock.cancel();
        self.clock.clear();
        debug!(
            "sync: stopped, {} revert timers still armed",
            self.reverts.len()
        );
    }

    /// Advance the clock by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.clock.advance(dt);
    }

    /// Apply queued highlights and due reverts to the surface.
    ///
    /// `now` is wall-clock time in seconds. Without a surface every queued cue is a miss.
    pub fn render(&mut self, now: f64, mut surface: Option<&mut Surface>) {
        let cues: Vec<DrawCue> = self.queue.borrow_mut().drain(..).collect();
        for cue in cues {
            match surface.as_deref_mut() {
                Some(surface) => self.highlight(now, surface, cue),
                None => self.miss(&cue),
            }
        }

        let (due, waiting): (Vec<RevertTimer>, Vec<RevertTimer>) =
            std::mem::take(&mut self.reverts)
                .into_iter()
                .partition(|timer| timer.due <= now);
        self.reverts = waiting;

        if let Some(surface) = surface {
            for timer in due {
                self.revert(surface, &timer);
            }
        }
    }

    fn highlight(&mut self, now: f64, surface: &mut Surface, cue: DrawCue) {
        let Some(id) = surface.find(&cue.key, cue.position) else {
            self.miss(&cue);
            return;
        };
        let Some(handle) = surface.handle(id) else {
            self.miss(&cue);
            return;
        };
        let active = Style {
            fill: handle.color.clone(),
            opacity: self.highlight.active_opacity,
            radius: handle.radius + self.highlight.radius_boost,
            transition_ms: self.highlight.transition_ms,
        };

        surface.raise(id);
        if let Some(style) = surface.style_mut(id) {
            *style = active;
        }
        self.highlights += 1;

        self.reverts.push(RevertTimer {
            due: now + self.highlight.hold_ms as f64 / 1000.0,
            handle: id,
            key: cue.key,
            position: cue.position,
        });
    }

    fn revert(&self, surface: &mut Surface, timer: &RevertTimer) {
        // the surface may have been rebuilt since the highlight
        let radius = match surface.handle(timer.handle) {
            Some(h) if h.key == timer.key && h.position == timer.position => h.radius,
            _ => return,
        };
        if let Some(style) = surface.style_mut(timer.handle) {
            *style = Style {
                fill: self.highlight.inactive_fill.clone(),
                opacity: self.highlight.inactive_opacity,
                radius,
                transition_ms: self.highlight.transition_ms,
            };
        }
    }

    fn miss(&mut self, cue: &DrawCue) {
        self.misses += 1;
        warn!(
            "no visual handle for {} (measure {}, note {})",
            cue.key, cue.position.measure, cue.position.index
        );
    }

    pub fn is_playing(&self) -> bool {
        self.clock.state() == PlayState::Playing
    }

    /// Draw cues whose handle could not be found.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Highlights applied so far.
    pub fn highlights(&self) -> usize {
        self.highlights
    }

    pub fn pending_reverts(&self) -> usize {
        self.reverts.len()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn instrument(&self) -> Ref<'_, I> {
        self.instrument.borrow()
    }

    pub fn instrument_mut(&self) -> RefMut<'_, I> {
        self.instrument.borrow_mut()
    }
}

//! Transport clock: schedules audio events against musical time.
//!
//! The [`Clock`] trait is the capability the synchronizer drives. [`Transport`] is the
//! cooperative implementation: nothing happens until the owner calls [`Clock::advance`],
//! which moves musical time forward and fires every event reached, in offset order.

use log::debug;

use crate::config::ClockConfig;
use crate::duration::Ticks;
use crate::playback::AudioEvent;

/// Callback fired for each scheduled event, with the transport time in seconds and the
/// tempo in bpm at that moment.
pub type ClockCallback = Box<dyn FnMut(f64, f64, &AudioEvent)>;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

pub trait Clock {
    /// Drop every callback that has not fired yet.
    fn cancel(&mut self);
    /// Drop the scheduled event list.
    fn clear(&mut self);
    /// Replace the schedule. Events must be in non-decreasing offset order.
    fn schedule(&mut self, events: Vec<AudioEvent>, callback: ClockCallback);
    fn ramp_tempo(&mut self, bpm: f64);
    fn start(&mut self);
    fn stop(&mut self);
    /// Move time forward by `dt` seconds, firing the events reached.
    fn advance(&mut self, dt: f64);
    fn state(&self) -> PlayState;
    /// Events scheduled but not fired yet.
    fn pending(&self) -> usize;
    /// Transport time in seconds since the last start.
    fn seconds(&self) -> f64;
    fn bpm(&self) -> f64;

    /// Stopped with nothing scheduled.
    fn is_idle(&self) -> bool {
        self.state() == PlayState::Stopped && self.pending() == 0
    }
}

/// Cooperative musical transport
///
/// Position is kept in fractional ticks so tempo ramps integrate exactly. Event offsets
/// become absolute ticks as `measure * ticks_per_measure + ticks`.
pub struct Transport {
    ticks_per_measure: Ticks,
    ticks_per_beat: Ticks,
    ramp_seconds: f64,
    state: PlayState,
    bpm: f64,
    /// Tempo being ramped to and the seconds left to reach it
    ramp: Option<(f64, f64)>,
    position: f64,
    seconds: f64,
    events: Vec<AudioEvent>,
    next: usize,
    callback: Option<ClockCallback>,
}

impl Transport {
    pub fn new(ticks_per_measure: Ticks, ticks_per_beat: Ticks, bpm: f64) -> Self {
        Self {
            ticks_per_measure,
            ticks_per_beat: ticks_per_beat.max(1),
            ramp_seconds: 0.0,
            state: PlayState::Stopped,
            bpm,
            ramp: None,
            position: 0.0,
            seconds: 0.0,
            events: Vec::new(),
            next: 0,
            callback: None,
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        let mut transport = Self::new(
            config.ticks_per_measure,
            config.ticks_per_beat,
            config.initial_bpm,
        );
        transport.ramp_seconds = config.ramp_seconds.max(0.0);
        transport
    }

    /// Current position in ticks.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Seconds from the start of the transport to `event` at the current tempo.
    pub fn seconds_at(&self, event: &AudioEvent) -> f64 {
        let ticks = event.offset.absolute_ticks(self.ticks_per_measure) as f64;
        ticks * (60.0 / self.bpm) / self.ticks_per_beat as f64
    }

    fn ticks_per_second(&self, bpm: f64) -> f64 {
        bpm / 60.0 * self.ticks_per_beat as f64
    }

    /// Fire every pending event at or before `until` ticks.
    ///
    /// `from` and `from_seconds` describe where the current step started, `rate` its
    /// average ticks per second, for the time handed to the callback.
    fn fire_until(&mut self, until: f64, from: f64, from_seconds: f64, rate: f64) {
        while self.next < self.events.len() {
            let event = &self.events[self.next];
            let at = event.offset.absolute_ticks(self.ticks_per_measure) as f64;
            if at > until + 1e-9 {
                break;
            }
            let time = if rate > 0.0 {
                from_seconds + (at - from).max(0.0) / rate
            } else {
                from_seconds
            };
            if let Some(callback) = self.callback.as_mut() {
                callback(time, self.bpm, event);
            }
            self.next += 1;
        }
    }
}

impl Clock for Transport {
    fn cancel(&mut self) {
        self.callback = None;
        self.next = self.events.len();
    }

    fn clear(&mut self) {
        self.events.clear();
        self.next = 0;
    }

    fn schedule(&mut self, events: Vec<AudioEvent>, callback: ClockCallback) {
        debug!("transport: scheduled {} events", events.len());
        self.events = events;
        self.next = 0;
        self.callback = Some(callback);
    }

    fn ramp_tempo(&mut self, bpm: f64) {
        if bpm <= 0.0 {
            return;
        }
        if self.ramp_seconds > 0.0 {
            self.ramp = Some((bpm, self.ramp_seconds));
        } else {
            self.bpm = bpm;
            self.ramp = None;
        }
    }

    fn start(&mut self) {
        debug!("transport: start at {} bpm", self.bpm);
        self.state = PlayState::Playing;
        // events sitting at the very start fire right away
        let rate = self.ticks_per_second(self.bpm);
        self.fire_until(self.position, self.position, self.seconds, rate);
    }

    fn stop(&mut self) {
        if self.state == PlayState::Playing {
            debug!("transport: stop at {:.3}s", self.seconds);
        }
        self.state = PlayState::Stopped;
        self.position = 0.0;
        self.seconds = 0.0;
        self.next = 0;
    }

    fn advance(&mut self, dt: f64) {
        if self.state == PlayState::Stopped || dt <= 0.0 {
            return;
        }

        let mut remaining = dt;
        while remaining > 0.0 {
            let (step, end_bpm) = match self.ramp {
                Some((target, left)) if left > 0.0 => {
                    let step = remaining.min(left);
                    let bpm = self.bpm + (target - self.bpm) * step / left;
                    self.ramp = if step < left {
                        Some((target, left - step))
                    } else {
                        None
                    };
                    (step, bpm)
                }
                _ => (remaining, self.bpm),
            };

            let rate = self.ticks_per_second((self.bpm + end_bpm) / 2.0);
            let from = self.position;
            let from_seconds = self.seconds;
            self.position += rate * step;
            self.seconds += step;
            self.bpm = end_bpm;
            self.fire_until(self.position, from, from_seconds, rate);

            remaining -= step;
        }
    }

    fn state(&self) -> PlayState {
        self.state
    }

    fn pending(&self) -> usize {
        self.events.len() - self.next.min(self.events.len())
    }

    fn seconds(&self) -> f64 {
        self.seconds
    }

    fn bpm(&self) -> f64 {
        self.bpm
    }
}

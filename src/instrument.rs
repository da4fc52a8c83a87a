//! Instruments played by the clock.
//!
//! [`Sampler`] works like a sampled piano: a sparse set of recorded pitches, each note
//! played from the nearest sample, pitch-shifted by changing the playback rate.

use log::{debug, warn};

use crate::config::SamplerConfig;
use crate::duration::{DurationTables, TICKS_PER_BEAT};
use crate::error::StaffError;
use crate::pitch::{parse_pitch_label, PitchKey};

/// Common interface for anything that can sound a pitch.
pub trait Instrument {
    /// Start `pitch` at transport `time` (seconds) for a playback duration symbol.
    fn attack(&mut self, pitch: &PitchKey, duration: &str, time: f64);

    /// Tempo used to turn duration symbols into seconds. The synchronizer sets it from the
    /// clock before every attack, so held notes follow a tempo ramp.
    fn set_tempo(&mut self, _bpm: f64) {}
}

/// One triggered note
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub pitch: PitchKey,
    /// Sample URL under the base path
    pub sample: String,
    /// Playback rate relative to the recorded pitch
    pub rate: f64,
    pub start: f64,
    /// Held length in seconds, release excluded
    pub duration: f64,
    pub release: f64,
}

#[derive(Debug, Clone)]
struct Sample {
    midi: u8,
    file: String,
}

/// Sampled instrument loaded from a named set of per-pitch files.
#[derive(Debug, Clone)]
pub struct Sampler {
    base_url: String,
    release: f64,
    /// Sorted by MIDI number
    samples: Vec<Sample>,
    durations: DurationTables,
    bpm: f64,
    voices: Vec<Voice>,
}

impl Sampler {
    /// Build a sampler from its configuration.
    ///
    /// Only the sample names are checked; fetching the files is left to whoever plays
    /// the voices.
    pub fn from_config(
        config: &SamplerConfig,
        durations: DurationTables,
    ) -> Result<Self, StaffError> {
        let mut samples = Vec::with_capacity(config.samples.len());
        for (label, file) in &config.samples {
            let (entry, sharp) = parse_pitch_label(label).ok_or_else(|| {
                StaffError::ConfigError(format!("Invalid sample pitch: {}", label))
            })?;
            samples.push(Sample {
                midi: entry.midi(sharp),
                file: file.clone(),
            });
        }
        if samples.is_empty() {
            return Err(StaffError::ConfigError(
                "sampler needs at least one sample".to_string(),
            ));
        }
        samples.sort_by_key(|s| s.midi);
        debug!(
            "sampler: {} samples under {}",
            samples.len(),
            config.base_url
        );

        Ok(Self {
            base_url: config.base_url.clone(),
            release: config.release,
            samples,
            durations,
            bpm: 120.0,
            voices: Vec::new(),
        })
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Hand over the voices triggered so far.
    pub fn take_voices(&mut self) -> Vec<Voice> {
        std::mem::take(&mut self.voices)
    }

    /// Nearest sample to a MIDI number; the lower one wins a tie.
    fn nearest(&self, midi: u8) -> Option<&Sample> {
        self.samples
            .iter()
            .min_by_key(|s| (s.midi as i32 - midi as i32).abs())
    }

    fn seconds(&self, symbol: &str) -> Option<f64> {
        let ticks = self.durations.ticks_for_playback(symbol)?;
        Some(ticks as f64 * 60.0 / self.bpm / TICKS_PER_BEAT as f64)
    }
}

impl Instrument for Sampler {
    fn attack(&mut self, pitch: &PitchKey, duration: &str, time: f64) {
        let Some((entry, sharp)) = parse_pitch_label(pitch.as_str()) else {
            warn!("sampler: cannot play pitch {}", pitch);
            return;
        };
        let Some(seconds) = self.seconds(duration) else {
            warn!("sampler: unknown duration {}", duration);
            return;
        };
        let midi = entry.midi(sharp);
        let Some(sample) = self.nearest(midi) else {
            return;
        };

        let semitones = midi as f64 - sample.midi as f64;
        let voice = Voice {
            pitch: pitch.clone(),
            sample: format!("{}{}", self.base_url, sample.file),
            rate: 2.0f64.powf(semitones / 12.0),
            start: time,
            duration: seconds,
            release: self.release,
        };
        self.voices.push(voice);
    }

    fn set_tempo(&mut self, bpm: f64) {
        if bpm > 0.0 {
            self.bpm = bpm;
        }
    }
}

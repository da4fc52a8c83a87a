//! Song generation.
//!
//! The session treats generation as an opaque producer of songs through the [`Generator`]
//! trait. [`RandomGenerator`] is a seeded random walk over the pitch table; the same seed
//! always yields the same songs.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::Config;
use crate::duration::Ticks;
use crate::error::StaffError;
use crate::song::{Measure, Note, Song};

pub trait Generator {
    /// Produce a song of `duration` measures.
    fn generate(&mut self, duration: usize) -> Song;
}

/// Hands out the same song on every call, e.g. one loaded from a file.
#[derive(Debug, Clone)]
pub struct FixedSong(pub Song);

impl Generator for FixedSong {
    fn generate(&mut self, _duration: usize) -> Song {
        self.0.clone()
    }
}

/// Random walk melody generator
pub struct RandomGenerator {
    rng: ChaCha8Rng,
    pitch_count: usize,
    /// Canonical tick values, longest first
    durations: Vec<Ticks>,
    accidental_probability: f64,
    max_leap: usize,
    ticks_per_measure: Ticks,
}

impl RandomGenerator {
    pub fn new(
        seed: u64,
        pitch_count: usize,
        durations: Vec<Ticks>,
        accidental_probability: f64,
    ) -> Self {
        let mut durations = durations;
        durations.sort_unstable_by(|a, b| b.cmp(a));
        durations.dedup();
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            pitch_count: pitch_count.max(1),
            durations,
            accidental_probability: accidental_probability.clamp(0.0, 1.0),
            max_leap: 3,
            ticks_per_measure: 16,
        }
    }

    /// Generator from configuration; without a configured seed one is drawn from entropy.
    pub fn from_config(config: &Config) -> Result<Self, StaffError> {
        let tables = config.duration_tables()?;
        let seed = config
            .generator
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        debug!("generator: seed {}", seed);

        let mut generator = Self::new(
            seed,
            config.pitch_table().len(),
            tables.canonical().to_vec(),
            config.generator.accidental_probability,
        );
        generator.max_leap = config.generator.max_leap;
        generator.ticks_per_measure = config.generator.ticks_per_measure;
        Ok(generator)
    }

    pub fn with_max_leap(mut self, max_leap: usize) -> Self {
        self.max_leap = max_leap;
        self
    }

    pub fn with_ticks_per_measure(mut self, ticks: Ticks) -> Self {
        self.ticks_per_measure = ticks;
        self
    }

    fn measure(&mut self, sound: &mut usize) -> Measure {
        let mut notes = Vec::new();
        let mut remaining = self.ticks_per_measure;

        while remaining > 0 {
            let fitting: Vec<Ticks> = self
                .durations
                .iter()
                .copied()
                .filter(|&d| d <= remaining)
                .collect();
            if fitting.is_empty() {
                break;
            }
            let duration = fitting[self.rng.gen_range(0..fitting.len())];

            let leap = self.max_leap as i64;
            let step = if leap > 0 {
                self.rng.gen_range(-leap..=leap)
            } else {
                0
            };
            let top = self.pitch_count as i64 - 1;
            *sound = (*sound as i64 + step).clamp(0, top) as usize;

            let accidental = self.rng.gen_bool(self.accidental_probability);
            notes.push(Note::new(*sound, duration, accidental));
            remaining -= duration;
        }

        Measure::new(notes)
    }
}

impl Generator for RandomGenerator {
    fn generate(&mut self, duration: usize) -> Song {
        let mut sound = self.pitch_count / 2;
        let measures = (0..duration).map(|_| self.measure(&mut sound)).collect();
        Song::new(measures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::CANONICAL_TICKS;

    fn generator(seed: u64) -> RandomGenerator {
        RandomGenerator::new(seed, 15, CANONICAL_TICKS.to_vec(), 0.1)
    }

    #[test]
    fn test_same_seed_same_song() {
        let a = generator(7).generate(10);
        let b = generator(7).generate(10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn test_measures_are_full() {
        let song = generator(3).generate(20);
        for measure in &song.measures {
            assert_eq!(measure.total_ticks(), 16);
            assert!(measure
                .notes
                .iter()
                .all(|n| n.sound < 15 && CANONICAL_TICKS.contains(&n.duration)));
        }
    }

    #[test]
    fn test_three_four_measures() {
        let song = generator(4).with_ticks_per_measure(12).generate(5);
        assert!(song.measures.iter().all(|m| m.total_ticks() == 12));
    }

    #[test]
    fn test_leaps_are_bounded() {
        let song = generator(11).with_max_leap(1).generate(8);
        let sounds: Vec<i64> = song
            .measures
            .iter()
            .flat_map(|m| m.notes.iter().map(|n| n.sound as i64))
            .collect();
        assert!(sounds.windows(2).all(|w| (w[0] - w[1]).abs() <= 1));
    }

    #[test]
    fn test_no_accidentals_at_zero_probability() {
        let mut generator = RandomGenerator::new(5, 15, vec![4, 2], 0.0);
        let song = generator.generate(6);
        assert!(song.measures.iter().flat_map(|m| &m.notes).all(|n| !n.accidental));
    }

    #[test]
    fn test_measure_stops_when_nothing_fits() {
        let mut generator = RandomGenerator::new(1, 15, vec![6], 0.0);
        let song = generator.generate(2);
        assert_eq!(song.measures[0].total_ticks(), 12);
    }

    #[test]
    fn test_fixed_song_ignores_duration() {
        let song = generator(2).generate(3);
        let mut fixed = FixedSong(song.clone());
        assert_eq!(fixed.generate(10), song);
    }

    #[test]
    fn test_zero_duration_is_empty_song() {
        assert!(generator(0).generate(0).is_empty());
    }

    #[test]
    fn test_from_config_uses_seed() {
        let mut config = Config::default();
        config.generator.seed = Some(42);
        let a = RandomGenerator::from_config(&config).unwrap().generate(4);
        let b = RandomGenerator::from_config(&config).unwrap().generate(4);
        assert_eq!(a, b);
    }
}

//! # Configuration
//!
//! All tunables of the engine, loaded from YAML. Every key is optional; missing keys take
//! the defaults below.
//!
//! ```yaml
//! page-width: 1250
//! tempo: 100
//! song-duration: 10
//! layout:
//!   stave-width: 220
//! highlight:
//!   hold-ms: 500
//! durations:
//!   canonical: [16, 8, 4, 2, 1]
//! ```
//!
//! The pitch table and duration tables are validated when they are requested through
//! [`Config::pitch_table`] and [`Config::duration_tables`].

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::duration::{
    default_notation_symbols, default_playback_symbols, DurationTables, Ticks, CANONICAL_TICKS,
};
use crate::error::StaffError;
use crate::layout::{Clef, TimeSignature};
use crate::pitch::PitchTable;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Width of the rendering surface in pixels
    pub page_width: f64,
    /// Playback tempo in quarter-note BPM
    pub tempo: f64,
    /// Duration parameter handed to the generator
    pub song_duration: usize,
    /// Delay between mount-time generation and autoplay
    pub autoplay_delay_ms: u64,
    pub layout: LayoutConfig,
    pub highlight: HighlightConfig,
    pub clock: ClockConfig,
    pub sampler: SamplerConfig,
    pub generator: GeneratorConfig,
    pub pitch_table: PitchTable,
    pub durations: DurationsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_width: 1250.0,
            tempo: 100.0,
            song_duration: 10,
            autoplay_delay_ms: 1000,
            layout: LayoutConfig::default(),
            highlight: HighlightConfig::default(),
            clock: ClockConfig::default(),
            sampler: SamplerConfig::default(),
            generator: GeneratorConfig::default(),
            pitch_table: PitchTable::default(),
            durations: DurationsConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(source: &str) -> Result<Self, StaffError> {
        let config: Config =
            serde_yaml::from_str(source).map_err(|e| StaffError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StaffError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    /// Check the values that would otherwise only fail deep inside a run.
    pub fn validate(&self) -> Result<(), StaffError> {
        if self.pitch_table.is_empty() {
            return Err(StaffError::ConfigError(
                "pitch-table must contain at least one entry".to_string(),
            ));
        }
        if self.tempo <= 0.0 {
            return Err(StaffError::ConfigError(format!(
                "tempo must be positive, got {}",
                self.tempo
            )));
        }
        if self.clock.ticks_per_beat == 0 || self.clock.ticks_per_measure == 0 {
            return Err(StaffError::ConfigError(
                "clock ticks-per-beat and ticks-per-measure must be positive".to_string(),
            ));
        }
        if self.layout.measures_per_row == 0 {
            return Err(StaffError::ConfigError(
                "layout measures-per-row must be positive".to_string(),
            ));
        }
        TimeSignature::parse(&self.layout.time_signature)?;
        if !(0.0..=1.0).contains(&self.generator.accidental_probability) {
            return Err(StaffError::ConfigError(format!(
                "generator accidental-probability must be within 0..1, got {}",
                self.generator.accidental_probability
            )));
        }
        self.duration_tables()?;
        Ok(())
    }

    pub fn pitch_table(&self) -> &PitchTable {
        &self.pitch_table
    }

    pub fn duration_tables(&self) -> Result<DurationTables, StaffError> {
        DurationTables::new(
            &self.durations.canonical,
            self.durations.notation.clone(),
            self.durations.playback.clone(),
        )
    }
}

/// Stave geometry. Values are pixels unless noted.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayoutConfig {
    pub margin: f64,
    pub top: f64,
    pub first_stave_width: f64,
    pub stave_width: f64,
    pub row_spacing: f64,
    pub row_height: f64,
    /// Staves per visual row before wrapping (count, not pixels)
    pub measures_per_row: usize,
    /// Page width per measure used to size the surface
    pub column_width: f64,
    pub line_spacing: f64,
    pub clef: Clef,
    pub time_signature: String,
    /// Base radius of a note's visual handle
    pub note_radius: f64,
    /// Handle colours, indexed by letter name (C..B)
    pub palette: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 10.0,
            top: 40.0,
            first_stave_width: 250.0,
            stave_width: 220.0,
            row_spacing: 120.0,
            row_height: 150.0,
            measures_per_row: 5,
            column_width: 250.0,
            line_spacing: 10.0,
            clef: Clef::Treble,
            time_signature: "4/4".to_string(),
            note_radius: 5.0,
            palette: [
                "#e6194b", "#f58231", "#ffe119", "#3cb44b", "#4363d8", "#911eb4", "#f032e6",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

/// Visual states applied to a handle while its note sounds.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct HighlightConfig {
    /// Wall-clock time a handle stays active before reverting
    pub hold_ms: u64,
    pub transition_ms: u64,
    pub radius_boost: f64,
    pub active_opacity: f64,
    pub inactive_opacity: f64,
    pub inactive_fill: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            hold_ms: 500,
            transition_ms: 500,
            radius_boost: 5.0,
            active_opacity: 1.0,
            inactive_opacity: 0.3,
            inactive_fill: "white".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClockConfig {
    pub ticks_per_measure: Ticks,
    pub ticks_per_beat: Ticks,
    /// Seconds a tempo ramp takes to reach its target
    pub ramp_seconds: f64,
    /// Tempo the transport starts at before the first ramp
    pub initial_bpm: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            ticks_per_measure: 16,
            ticks_per_beat: 4,
            ramp_seconds: 0.0,
            initial_bpm: 120.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct SamplerConfig {
    pub base_url: String,
    /// Release time in seconds
    pub release: f64,
    /// Pitch label -> sample file name
    pub samples: BTreeMap<String, String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            base_url: "./salamander/".to_string(),
            release: 1.0,
            samples: salamander_samples(),
        }
    }
}

/// The Salamander grand piano set: one sample every minor third from A0 to C8.
fn salamander_samples() -> BTreeMap<String, String> {
    let mut samples = BTreeMap::new();
    samples.insert("A0".to_string(), "A0.mp3".to_string());
    for octave in 1..=7 {
        for name in ["C", "Ds", "Fs", "A"] {
            let label = format!("{}{}", name, octave);
            samples.insert(label.clone(), format!("{}.mp3", label));
        }
    }
    samples.insert("C8".to_string(), "C8.mp3".to_string());
    samples
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorConfig {
    pub seed: Option<u64>,
    pub accidental_probability: f64,
    /// Largest step of the random walk, in pitch table rows
    pub max_leap: usize,
    pub ticks_per_measure: Ticks,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            accidental_probability: 0.1,
            max_leap: 3,
            ticks_per_measure: 16,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct DurationsConfig {
    pub canonical: Vec<Ticks>,
    pub notation: BTreeMap<Ticks, String>,
    pub playback: BTreeMap<Ticks, String>,
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            canonical: CANONICAL_TICKS.to_vec(),
            notation: default_notation_symbols(),
            playback: default_playback_symbols(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Letter, PitchEntry};
    use std::io::Write;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tempo, 100.0);
        assert_eq!(config.layout.measures_per_row, 5);
        assert_eq!(config.highlight.hold_ms, 500);
    }

    #[test]
    fn test_partial_override() {
        let source = r#"
page-width: 800
layout:
  stave-width: 200
pitch-table:
  - { letter: A, octave: 3 }
  - { letter: B, octave: 3 }
"#;
        let config = Config::from_yaml(source).unwrap();
        assert_eq!(config.page_width, 800.0);
        assert_eq!(config.layout.stave_width, 200.0);
        assert_eq!(config.layout.first_stave_width, 250.0);
        assert_eq!(config.pitch_table().len(), 2);
        assert_eq!(
            config.pitch_table().get(1),
            Some(PitchEntry::new(Letter::B, 3))
        );
    }

    #[test]
    fn test_incomplete_durations_rejected() {
        let source = r#"
durations:
  canonical: [4, 2]
  notation: { 4: q, 2: "8" }
  playback: { 4: 4n }
"#;
        let result = Config::from_yaml(source);
        assert!(matches!(
            result,
            Err(StaffError::IncompleteDurationTable {
                table: "playback",
                ticks: 2
            })
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_yaml("tempo: 0"),
            Err(StaffError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_yaml("pitch-table: []"),
            Err(StaffError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_yaml("generator: { accidental-probability: 2.0 }"),
            Err(StaffError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_yaml("layout: { time-signature: 4-4 }"),
            Err(StaffError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_yaml("layout: { clef: alto }"),
            Err(StaffError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_yaml("page-width: [1, 2]"),
            Err(StaffError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tempo: 90\nsong-duration: 4").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.tempo, 90.0);
        assert_eq!(config.song_duration, 4);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = Config::load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(StaffError::Io(_))));
    }

    #[test]
    fn test_salamander_sample_names() {
        let samples = salamander_samples();
        assert_eq!(samples.len(), 30);
        assert_eq!(samples.get("Ds1").map(String::as_str), Some("Ds1.mp3"));
        assert!(samples.contains_key("C8"));
    }
}

//! Notation layout engine
//!
//! Turns a [`Song`] into one stave per measure on a freshly created [`Surface`]. The whole
//! song is resolved (pitches, notation symbols, positions, beams) before the previous surface
//! is torn down, so a song that fails to translate leaves the old rendering untouched.

use std::collections::HashSet;

use log::debug;

use crate::config::{Config, HighlightConfig, LayoutConfig};
use crate::duration::{flag_count, has_stem, is_filled, DurationTables};
use crate::error::StaffError;
use crate::pitch::{pitch_key, PitchTable};
use crate::song::{Note, NotePosition, Song};

use super::beam::{generate_beams, MIDDLE_LINE_STEP};
use super::stave::{BarlineKind, BeamGroup, Clef, StaveLine, StaveNote, TimeSignature};
use super::surface::{DrawOp, NoteHandle, Style, Surface};

/// Stem length in pixels
const STEM_LENGTH: f64 = 35.0;
/// Shortest stem a beam may leave
const MIN_STEM: f64 = 25.0;
/// Steepest beam slope
const MAX_BEAM_SLOPE: f64 = 0.25;
/// Gap between a primary and a secondary beam
const BEAM_GAP: f64 = 5.0;

pub struct LayoutEngine {
    config: LayoutConfig,
    highlight: HighlightConfig,
    time_signature: TimeSignature,
    pitches: PitchTable,
    durations: DurationTables,
    surface: Option<Surface>,
}

impl LayoutEngine {
    pub fn new(config: &Config) -> Result<Self, StaffError> {
        Ok(Self {
            config: config.layout.clone(),
            highlight: config.highlight.clone(),
            time_signature: TimeSignature::parse(&config.layout.time_signature)?,
            pitches: config.pitch_table().clone(),
            durations: config.duration_tables()?,
            surface: None,
        })
    }

    /// Render a song onto a new surface, replacing the previous one.
    ///
    /// # Errors
    /// Returns [`StaffError::UnmappedDuration`] or [`StaffError::UnknownSound`] for the first
    /// note that cannot be engraved. In that case nothing is rendered and the previous surface
    /// is kept.
    pub fn layout(&mut self, song: &Song, page_width: f64) -> Result<(), StaffError> {
        let staves = plan_staves(
            song,
            &self.pitches,
            &self.durations,
            &self.config,
            self.time_signature,
        )?;

        self.teardown();

        let (width, height) = surface_size(song.len(), page_width, &self.config);
        let mut surface = Surface::create(width, height);
        for stave in staves {
            self.draw_stave(&mut surface, stave);
        }

        debug!(
            "laid out {} measures: {} handles, {} draw ops on {}x{}",
            song.len(),
            surface.handles().len(),
            surface.ops().len(),
            width,
            height
        );
        self.surface = Some(surface);
        Ok(())
    }

    /// Tear down the current surface, if any.
    pub fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.teardown();
        }
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut Surface> {
        self.surface.as_mut()
    }

    pub fn resting_style(&self) -> Style {
        Style {
            fill: self.highlight.inactive_fill.clone(),
            opacity: self.highlight.inactive_opacity,
            radius: self.config.note_radius,
            transition_ms: 0,
        }
    }

    /// Stave frame, then note glyphs, then beams.
    fn draw_stave(&self, surface: &mut Surface, mut stave: StaveLine) {
        let spacing = self.config.line_spacing;
        let top = stave.top_line_y(spacing);
        let bottom = stave.bottom_line_y(spacing);

        surface.draw(DrawOp::StaffLines {
            x: stave.x,
            y: top,
            width: stave.width,
            spacing,
        });
        surface.draw(DrawOp::Barline {
            x: stave.x,
            top,
            bottom,
            kind: BarlineKind::Single,
        });
        let mut modifier_x = stave.x + 5.0;
        if stave.has_clef {
            surface.draw(DrawOp::Clef {
                x: modifier_x,
                y: stave.line_y(3, spacing),
                clef: self.clef(),
            });
            modifier_x += super::stave::CLEF_WIDTH;
        }
        if stave.has_time_signature {
            surface.draw(DrawOp::TimeSignature {
                x: modifier_x,
                y: top,
                label: self.time_signature.label(),
            });
        }
        surface.draw(DrawOp::Barline {
            x: stave.right(),
            top,
            bottom,
            kind: stave.end_barline,
        });

        let beamed: HashSet<usize> = stave
            .beams
            .iter()
            .flat_map(|g| g.notes.iter().copied())
            .collect();
        let head = self.head_radius();

        for (j, note) in stave.notes.iter_mut().enumerate() {
            for y in ledger_lines(note.staff_step, bottom, spacing) {
                surface.draw(DrawOp::LedgerLine {
                    x1: note.x - head - 3.0,
                    x2: note.x + head + 3.0,
                    y,
                });
            }

            let handle = surface.add_handle(NoteHandle {
                id: 0,
                key: note.key.clone(),
                position: note.position,
                x: note.x,
                y: note.y,
                radius: self.config.note_radius,
                color: self
                    .config
                    .palette
                    .get(note.pitch.letter.step() as usize)
                    .cloned()
                    .unwrap_or_else(|| "black".to_string()),
                style: self.resting_style(),
            });
            note.handle = Some(handle);

            surface.draw(DrawOp::NoteHead {
                handle,
                x: note.x,
                y: note.y,
                filled: is_filled(note.ticks),
            });
            if note.accidental {
                surface.draw(DrawOp::Accidental {
                    x: note.x - head - 8.0,
                    y: note.y,
                    glyph: "#",
                });
            }

            if has_stem(note.ticks) && !beamed.contains(&j) {
                let (x, end) = stem(note, head);
                surface.draw(DrawOp::Stem {
                    x,
                    y1: note.y,
                    y2: end,
                });
                let flags = flag_count(note.ticks);
                if flags > 0 {
                    surface.draw(DrawOp::Flag {
                        x,
                        y: end,
                        count: flags,
                        up: note.stem_up,
                    });
                }
            }
        }

        for group in &stave.beams {
            draw_beam(surface, &stave.notes, group, head);
        }

        surface.push_stave(stave);
    }

    fn clef(&self) -> Clef {
        self.config.clef
    }

    fn head_radius(&self) -> f64 {
        self.config.line_spacing * 0.6
    }
}

/// Resolve, position and beam every measure of the song without touching any surface.
pub fn plan_staves(
    song: &Song,
    pitches: &PitchTable,
    durations: &DurationTables,
    config: &LayoutConfig,
    time_signature: TimeSignature,
) -> Result<Vec<StaveLine>, StaffError> {
    let mut staves = Vec::with_capacity(song.len());
    let mut stave = StaveLine::new(0, config.margin, config.top, config.first_stave_width)
        .with_clef()
        .with_time_signature();
    let last = song.len().saturating_sub(1);

    for (i, measure) in song.measures.iter().enumerate() {
        stave.measure = i;

        let mut notes = measure
            .notes
            .iter()
            .enumerate()
            .map(|(j, note)| {
                engrave_note(
                    note,
                    NotePosition::new(i, j),
                    pitches,
                    durations,
                    config.clef,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        format_notes(&stave, &mut notes, config.line_spacing);
        stave.beams = generate_beams(&mut notes, time_signature.beat_ticks());
        stave.notes = notes;

        if i == last {
            stave.end_barline = BarlineKind::End;
        }

        let next = next_stave(&stave, config);
        staves.push(std::mem::replace(&mut stave, next));
    }

    Ok(staves)
}

/// Whether the stave of measure `index` opens a new visual row.
///
/// Wrapping depends on the measure index only, never on rendered widths.
pub fn starts_row(index: usize, measures_per_row: usize) -> bool {
    (index + 1) % measures_per_row.max(1) == 0
}

/// Where the stave after `current` goes.
fn next_stave(current: &StaveLine, config: &LayoutConfig) -> StaveLine {
    let index = current.measure + 1;
    if starts_row(index, config.measures_per_row) {
        StaveLine::new(
            index,
            config.margin,
            current.y + config.row_spacing,
            config.stave_width,
        )
        .with_clef()
    } else {
        StaveLine::new(index, current.right(), current.y, config.stave_width)
    }
}

/// Surface size for a song of `measures` measures.
///
/// `measuresPerLine = floor(page_width / column_width)`, at least one; a song without
/// measures still gets one row of height.
pub fn surface_size(measures: usize, page_width: f64, config: &LayoutConfig) -> (f64, f64) {
    let per_line = ((page_width / config.column_width).floor() as usize).max(1);
    let rows = measures.div_ceil(per_line).max(1);
    (page_width, rows as f64 * config.row_height)
}

fn engrave_note(
    note: &Note,
    position: NotePosition,
    pitches: &PitchTable,
    durations: &DurationTables,
    clef: Clef,
) -> Result<StaveNote, StaffError> {
    let pitch = pitches
        .get(note.sound)
        .ok_or(StaffError::UnknownSound {
            measure: position.measure,
            note: position.index,
            sound: note.sound,
        })?;
    let symbol = durations
        .notation(note.duration)
        .ok_or(StaffError::UnmappedDuration {
            measure: position.measure,
            note: position.index,
            ticks: note.duration,
        })?;
    let staff_step = pitch.diatonic_index() - clef.bottom_line().diatonic_index();

    Ok(StaveNote {
        key: pitch_key(pitch, note.accidental),
        pitch,
        position,
        ticks: note.duration,
        symbol: symbol.to_string(),
        accidental: note.accidental,
        x: 0.0,
        y: 0.0,
        staff_step,
        stem_up: staff_step < MIDDLE_LINE_STEP,
        handle: None,
    })
}

/// Spread notes over the stave's note area in proportion to their ticks.
fn format_notes(stave: &StaveLine, notes: &mut [StaveNote], spacing: f64) {
    let total: u32 = notes.iter().map(|n| n.ticks).sum();
    if total == 0 {
        return;
    }
    let start = stave.note_start_x();
    let available = (stave.note_end_x() - start).max(0.0);
    let bottom = stave.bottom_line_y(spacing);

    let mut elapsed = 0u32;
    for note in notes.iter_mut() {
        note.x = start + available * elapsed as f64 / total as f64 + spacing * 0.6;
        note.y = bottom - note.staff_step as f64 * spacing / 2.0;
        elapsed += note.ticks;
    }
}

/// y of every ledger line a note at `staff_step` needs.
fn ledger_lines(staff_step: i32, bottom: f64, spacing: f64) -> Vec<f64> {
    let y = |step: i32| bottom - step as f64 * spacing / 2.0;
    let mut lines = Vec::new();
    let mut step = -2;
    while step >= staff_step {
        lines.push(y(step));
        step -= 2;
    }
    let mut step = 10;
    while step <= staff_step {
        lines.push(y(step));
        step += 2;
    }
    lines
}

/// Stem x and free end for an unbeamed note.
fn stem(note: &StaveNote, head: f64) -> (f64, f64) {
    if note.stem_up {
        (note.x + head - 0.5, note.y - STEM_LENGTH)
    } else {
        (note.x - head + 0.5, note.y + STEM_LENGTH)
    }
}

fn draw_beam(surface: &mut Surface, notes: &[StaveNote], group: &BeamGroup, head: f64) {
    let (first, last) = match (group.notes.first(), group.notes.last()) {
        (Some(&f), Some(&l)) if f != l => (&notes[f], &notes[l]),
        _ => return,
    };
    let (first_x, first_end) = stem(first, head);
    let (last_x, last_end) = stem(last, head);

    let dx = last_x - first_x;
    let slope = if dx.abs() > 0.1 {
        ((last_end - first_end) / dx).clamp(-MAX_BEAM_SLOPE, MAX_BEAM_SLOPE)
    } else {
        0.0
    };
    let beam_y = |x: f64| first_end + slope * (x - first_x);

    // shift the whole beam when a stem would come out too short
    let mut shift = 0.0_f64;
    for &i in &group.notes {
        let (x, _) = stem(&notes[i], head);
        let y = beam_y(x);
        if group.stem_up {
            let limit = notes[i].y - MIN_STEM;
            if y > limit {
                shift = shift.min(limit - y);
            }
        } else {
            let limit = notes[i].y + MIN_STEM;
            if y < limit {
                shift = shift.max(limit - y);
            }
        }
    }
    let beam_y = |x: f64| beam_y(x) + shift;

    for &i in &group.notes {
        let (x, _) = stem(&notes[i], head);
        surface.draw(DrawOp::Stem {
            x,
            y1: notes[i].y,
            y2: beam_y(x),
        });
    }
    surface.draw(DrawOp::Beam {
        x1: first_x,
        y1: beam_y(first_x),
        x2: last_x,
        y2: beam_y(last_x),
    });

    // secondary beams between neighbouring sixteenths
    let inward = if group.stem_up { BEAM_GAP } else { -BEAM_GAP };
    for pair in group.notes.windows(2) {
        let (a, b) = (&notes[pair[0]], &notes[pair[1]]);
        if flag_count(a.ticks) > 1 && flag_count(b.ticks) > 1 {
            let (ax, _) = stem(a, head);
            let (bx, _) = stem(b, head);
            surface.draw(DrawOp::Beam {
                x1: ax,
                y1: beam_y(ax) + inward,
                x2: bx,
                y2: beam_y(bx) + inward,
            });
        }
    }
}

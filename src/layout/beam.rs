//! Automatic beaming of a measure's notes.

use crate::duration::{is_beamable, Ticks};

use super::stave::{BeamGroup, StaveNote};

/// Beam state for a note
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeamState {
    None,
    Begin,
    Continue,
    End,
}

/// Calculate beam states for the notes of a measure, respecting beat boundaries.
///
/// Consecutive beamable notes (shorter than a quarter) are grouped as long as the group
/// does not cross into the next beat. A group needs at least two notes.
pub fn beam_states(durations: &[Ticks], beat_ticks: Ticks) -> Vec<BeamState> {
    let mut states = vec![BeamState::None; durations.len()];
    let beat_ticks = beat_ticks.max(1);

    let mut position: Ticks = 0;
    let mut i = 0;

    while i < durations.len() {
        let beat_end = (position / beat_ticks + 1) * beat_ticks;

        if is_beamable(durations[i]) {
            let start = i;
            let mut group_position = position;

            while i < durations.len() && group_position < beat_end {
                let ticks = durations[i];
                if !is_beamable(ticks) {
                    break;
                }
                // a note spilling over the beat starts a new group
                if group_position + ticks > beat_end && i > start {
                    break;
                }
                group_position += ticks;
                i += 1;
            }
            let end = i;

            if end - start >= 2 {
                states[start] = BeamState::Begin;
                for state in states.iter_mut().take(end - 1).skip(start + 1) {
                    *state = BeamState::Continue;
                }
                states[end - 1] = BeamState::End;
            }

            position = group_position;
        } else {
            position += durations[i];
            i += 1;
        }
    }

    states
}

/// Group a measure's notes into beams and settle a shared stem direction per group.
///
/// Stems of grouped notes are rewritten to the group direction: down when the notes sit on
/// average at or above the middle staff line, up otherwise.
pub fn generate_beams(notes: &mut [StaveNote], beat_ticks: Ticks) -> Vec<BeamGroup> {
    let durations: Vec<Ticks> = notes.iter().map(|n| n.ticks).collect();
    let states = beam_states(&durations, beat_ticks);

    let mut groups = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for (i, state) in states.iter().enumerate() {
        match state {
            BeamState::Begin => {
                current.clear();
                current.push(i);
            }
            BeamState::Continue => current.push(i),
            BeamState::End => {
                current.push(i);
                groups.push(std::mem::take(&mut current));
            }
            BeamState::None => {}
        }
    }

    groups
        .into_iter()
        .map(|indices| {
            let total: i32 = indices.iter().map(|&i| notes[i].staff_step).sum();
            let average = total as f64 / indices.len() as f64;
            let stem_up = average < MIDDLE_LINE_STEP as f64;
            for &i in &indices {
                notes[i].stem_up = stem_up;
            }
            BeamGroup {
                notes: indices,
                stem_up,
            }
        })
        .collect()
}

/// Staff step of the middle line, counted from the bottom line
pub const MIDDLE_LINE_STEP: i32 = 4;

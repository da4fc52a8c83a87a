//! Song to audio event translation

use log::debug;

use crate::duration::{DurationTables, Ticks};
use crate::error::StaffError;
use crate::pitch::{pitch_key, PitchTable};
use crate::song::{NotePosition, Song};

use super::types::{AudioEvent, Offset};

/// Translate a song into its ordered list of audio events.
///
/// Each measure keeps its own cursor starting at 0; a note starts at the cursor and moves
/// it on by its duration. Events come out measure-major, then in note order, so offsets
/// never decrease.
///
/// Pure and deterministic: the same song always yields the same events.
///
/// # Errors
/// The first note whose sound is outside the pitch table ([`StaffError::UnknownSound`]) or
/// whose duration has no playback symbol ([`StaffError::UnmappedDuration`]) aborts the
/// translation. No partial list is returned.
pub fn translate(
    song: &Song,
    pitches: &PitchTable,
    durations: &DurationTables,
) -> Result<Vec<AudioEvent>, StaffError> {
    let mut events = Vec::with_capacity(song.note_count());

    for (i, measure) in song.measures.iter().enumerate() {
        let mut cursor: Ticks = 0;

        for (j, note) in measure.notes.iter().enumerate() {
            let pitch = pitches.get(note.sound).ok_or(StaffError::UnknownSound {
                measure: i,
                note: j,
                sound: note.sound,
            })?;
            let symbol = durations
                .playback(note.duration)
                .ok_or(StaffError::UnmappedDuration {
                    measure: i,
                    note: j,
                    ticks: note.duration,
                })?;

            events.push(AudioEvent {
                offset: Offset::new(i, cursor),
                pitch: pitch_key(pitch, note.accidental),
                duration: symbol.to_string(),
                position: NotePosition::new(i, j),
                ticks: note.duration,
            });

            cursor += note.duration;
        }
    }

    debug!(
        "translated {} measures into {} audio events",
        song.len(),
        events.len()
    );
    Ok(events)
}

use super::*;
use crate::config::Config;
use crate::error::StaffError;
use crate::song::{Measure, Note, NotePosition, Song};

fn quarter(sound: usize) -> Note {
    Note::new(sound, 4, false)
}

fn song_of(measures: usize) -> Song {
    Song::new(
        (0..measures)
            .map(|i| Measure::new(vec![quarter(i % 7), quarter(2), quarter(4), quarter(0)]))
            .collect(),
    )
}

fn laid_out(song: &Song) -> LayoutEngine {
    let config = Config::default();
    let mut engine = LayoutEngine::new(&config).unwrap();
    engine.layout(song, config.page_width).unwrap();
    engine
}

#[test]
fn test_single_quarter_note() {
    let song = Song::new(vec![Measure::new(vec![quarter(0)])]);
    let engine = laid_out(&song);
    let surface = engine.surface().unwrap();

    assert_eq!(surface.staves().len(), 1);
    let stave = &surface.staves()[0];
    assert_eq!((stave.x, stave.y, stave.width), (10.0, 40.0, 250.0));
    assert!(stave.has_clef);
    assert!(stave.has_time_signature);
    assert_eq!(stave.end_barline, BarlineKind::End);
    assert_eq!(stave.notes.len(), 1);
    assert_eq!(stave.notes[0].symbol, "q");
    assert!(!stave.notes[0].accidental);

    assert_eq!(surface.handles().len(), 1);
    assert_eq!(surface.handles()[0].key.as_str(), "C4");
    assert!(!surface
        .ops()
        .iter()
        .any(|op| matches!(op, DrawOp::Accidental { .. })));
}

#[test]
fn test_sharp_engraves_accidental() {
    let song = Song::new(vec![Measure::new(vec![Note::new(0, 4, true)])]);
    let engine = laid_out(&song);
    let surface = engine.surface().unwrap();

    assert_eq!(surface.handles()[0].key.as_str(), "C#4");
    let accidentals: Vec<&DrawOp> = surface
        .ops()
        .iter()
        .filter(|op| matches!(op, DrawOp::Accidental { glyph: "#", .. }))
        .collect();
    assert_eq!(accidentals.len(), 1);
}

#[test]
fn test_handle_count_and_order_per_measure() {
    let song = song_of(3);
    let engine = laid_out(&song);
    let surface = engine.surface().unwrap();

    assert_eq!(surface.handles().len(), song.note_count());
    let positions: Vec<NotePosition> = surface.handles().iter().map(|h| h.position).collect();
    let expected: Vec<NotePosition> = song
        .measures
        .iter()
        .enumerate()
        .flat_map(|(i, m)| (0..m.notes.len()).map(move |j| NotePosition::new(i, j)))
        .collect();
    assert_eq!(positions, expected);

    for stave in surface.staves() {
        assert_eq!(stave.notes.len(), song.measures[stave.measure].notes.len());
        for note in &stave.notes {
            let id = note.handle.unwrap();
            assert_eq!(surface.handle(id).unwrap().position, note.position);
        }
    }
}

#[test]
fn test_five_measures_wrap_to_second_row() {
    let engine = laid_out(&song_of(5));
    let staves = engine.surface().unwrap().staves();

    assert_eq!(staves.len(), 5);
    let origins: Vec<(f64, f64)> = staves.iter().map(|s| (s.x, s.y)).collect();
    assert_eq!(
        origins,
        vec![
            (10.0, 40.0),
            (260.0, 40.0),
            (480.0, 40.0),
            (700.0, 40.0),
            (10.0, 160.0)
        ]
    );
    assert!(staves[4].has_clef);
    assert!(!staves[4].has_time_signature);
    assert!(!staves[1].has_clef);
    assert!(!staves[1].has_time_signature);
}

#[test]
fn test_four_measures_stay_on_first_row() {
    let engine = laid_out(&song_of(4));
    let staves = engine.surface().unwrap().staves();

    assert_eq!(staves.len(), 4);
    assert!(staves.iter().all(|s| s.y == 40.0));
}

#[test]
fn test_row_wrap_is_index_based() {
    assert!(!starts_row(0, 5));
    assert!(!starts_row(3, 5));
    assert!(starts_row(4, 5));
    assert!(starts_row(9, 5));
    assert!(!starts_row(10, 5));
    // degenerate row size never divides by zero
    assert!(starts_row(3, 0));
}

#[test]
fn test_only_last_stave_gets_end_barline() {
    let engine = laid_out(&song_of(6));
    let staves = engine.surface().unwrap().staves();

    let kinds: Vec<BarlineKind> = staves.iter().map(|s| s.end_barline).collect();
    assert_eq!(kinds[..5], [BarlineKind::Single; 5]);
    assert_eq!(kinds[5], BarlineKind::End);
}

#[test]
fn test_empty_song_renders_minimal_surface() {
    let engine = laid_out(&Song::default());
    let surface = engine.surface().unwrap();

    assert!(surface.staves().is_empty());
    assert!(surface.handles().is_empty());
    assert!(surface.ops().is_empty());
    assert_eq!(surface.height(), 150.0);
}

#[test]
fn test_empty_measure_renders_empty_stave() {
    let song = Song::new(vec![Measure::new(vec![]), Measure::new(vec![quarter(0)])]);
    let engine = laid_out(&song);
    let surface = engine.surface().unwrap();

    let empty = &surface.staves()[0];
    assert!(empty.notes.is_empty());
    assert!(empty.beams.is_empty());
    assert_eq!(surface.handles().len(), 1);
    assert_eq!(surface.handles()[0].position, NotePosition::new(1, 0));
}

#[test]
fn test_irregular_measure_total_is_laid_out() {
    let song = Song::new(vec![Measure::new(vec![
        Note::new(0, 16, false),
        Note::new(1, 16, false),
        Note::new(2, 2, false),
    ])]);
    let engine = laid_out(&song);
    assert_eq!(engine.surface().unwrap().handles().len(), 3);
}

#[test]
fn test_draw_order_frame_notes_beams() {
    let song = Song::new(vec![Measure::new(vec![
        Note::new(4, 2, false),
        Note::new(5, 2, false),
        quarter(6),
        Note::new(4, 8, false),
    ])]);
    let engine = laid_out(&song);
    let ops = engine.surface().unwrap().ops();

    assert!(matches!(ops[0], DrawOp::StaffLines { .. }));
    let last_frame = ops
        .iter()
        .rposition(|op| matches!(op, DrawOp::Barline { .. } | DrawOp::TimeSignature { .. }))
        .unwrap();
    let first_head = ops
        .iter()
        .position(|op| matches!(op, DrawOp::NoteHead { .. }))
        .unwrap();
    let last_head = ops
        .iter()
        .rposition(|op| matches!(op, DrawOp::NoteHead { .. }))
        .unwrap();
    let first_beam = ops
        .iter()
        .position(|op| matches!(op, DrawOp::Beam { .. }))
        .unwrap();

    assert!(last_frame < first_head);
    assert!(last_head < first_beam);
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(op, DrawOp::Beam { .. }))
            .count(),
        1
    );
    // beamed eighths get no flags
    assert!(!ops.iter().any(|op| matches!(op, DrawOp::Flag { .. })));
}

#[test]
fn test_lone_eighth_gets_flag() {
    let song = Song::new(vec![Measure::new(vec![
        Note::new(4, 2, false),
        Note::new(4, 6, false),
        Note::new(4, 8, false),
    ])]);
    let engine = laid_out(&song);
    let flags: Vec<&DrawOp> = engine
        .surface()
        .unwrap()
        .ops()
        .iter()
        .filter(|op| matches!(op, DrawOp::Flag { count: 1, .. }))
        .collect();
    assert_eq!(flags.len(), 1);
}

#[test]
fn test_notes_spread_by_ticks() {
    let song = Song::new(vec![Measure::new(vec![
        Note::new(0, 8, false),
        Note::new(0, 4, false),
        Note::new(0, 4, false),
    ])]);
    let engine = laid_out(&song);
    let notes = &engine.surface().unwrap().staves()[0].notes;

    let gap_half = notes[1].x - notes[0].x;
    let gap_quarter = notes[2].x - notes[1].x;
    assert!((gap_half - 2.0 * gap_quarter).abs() < 1e-9);
}

#[test]
fn test_ledger_line_for_middle_c() {
    let song = Song::new(vec![Measure::new(vec![quarter(0), quarter(4)])]);
    let engine = laid_out(&song);
    let ledgers = engine
        .surface()
        .unwrap()
        .ops()
        .iter()
        .filter(|op| matches!(op, DrawOp::LedgerLine { .. }))
        .count();
    // C4 needs one ledger line, G4 none
    assert_eq!(ledgers, 1);
}

#[test]
fn test_unmapped_duration_keeps_previous_surface() {
    let config = Config::default();
    let mut engine = LayoutEngine::new(&config).unwrap();
    engine.layout(&song_of(2), config.page_width).unwrap();

    let bad = Song::new(vec![
        Measure::new(vec![quarter(0)]),
        Measure::new(vec![quarter(1), Note::new(2, 5, false)]),
    ]);
    let result = engine.layout(&bad, config.page_width);
    assert!(matches!(
        result,
        Err(StaffError::UnmappedDuration {
            measure: 1,
            note: 1,
            ticks: 5
        })
    ));
    assert_eq!(engine.surface().unwrap().handles().len(), 8);
}

#[test]
fn test_unknown_sound_is_rejected() {
    let config = Config::default();
    let mut engine = LayoutEngine::new(&config).unwrap();
    let bad = Song::new(vec![Measure::new(vec![quarter(99)])]);
    let result = engine.layout(&bad, config.page_width);
    assert!(matches!(
        result,
        Err(StaffError::UnknownSound {
            measure: 0,
            note: 0,
            sound: 99
        })
    ));
    assert!(engine.surface().is_none());
}

#[test]
fn test_relayout_replaces_surface() {
    let config = Config::default();
    let mut engine = LayoutEngine::new(&config).unwrap();
    engine.layout(&song_of(3), config.page_width).unwrap();
    engine.layout(&song_of(1), config.page_width).unwrap();

    let surface = engine.surface().unwrap();
    assert_eq!(surface.staves().len(), 1);
    assert_eq!(surface.handles().len(), 4);
    assert_eq!(surface.stacking_order(), &[0, 1, 2, 3]);
}

#[test]
fn test_surface_size_formula() {
    let config = Config::default().layout;
    assert_eq!(surface_size(0, 1250.0, &config), (1250.0, 150.0));
    assert_eq!(surface_size(5, 1250.0, &config), (1250.0, 150.0));
    assert_eq!(surface_size(6, 1250.0, &config), (1250.0, 300.0));
    assert_eq!(surface_size(3, 500.0, &config), (500.0, 300.0));
    // narrower than one column still fits one measure per line
    assert_eq!(surface_size(3, 100.0, &config), (100.0, 450.0));
}

#[test]
fn test_handles_start_in_resting_style() {
    let engine = laid_out(&song_of(1));
    let surface = engine.surface().unwrap();
    let resting = engine.resting_style();
    assert!(surface.handles().iter().all(|h| h.style == resting));
    assert_eq!(resting.opacity, 0.3);
    assert_eq!(resting.fill, "white");
}

#[test]
fn test_svg_export_contains_handles() {
    let engine = laid_out(&song_of(2));
    let svg = to_svg(engine.surface().unwrap());
    assert_eq!(svg.matches("<circle").count(), 8);
    assert!(svg.contains("data-key=\"C4\""));
    assert!(svg.ends_with("</svg>\n"));
}

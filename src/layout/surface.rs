//! The rendering surface: an owned display list plus the visual handles of engraved notes.
//!
//! A surface is created at a size, drawn into, and torn down as a whole. Nothing is ever
//! patched in place except handle styles and stacking order, which the synchronizer animates.

use std::collections::HashMap;

use crate::pitch::PitchKey;
use crate::song::NotePosition;

use super::stave::{BarlineKind, Clef, StaveLine};

pub type HandleId = usize;

/// Visual state of a handle
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: String,
    pub opacity: f64,
    pub radius: f64,
    pub transition_ms: u64,
}

/// On-screen element tied to one engraved note
#[derive(Debug, Clone, PartialEq)]
pub struct NoteHandle {
    pub id: HandleId,
    pub key: PitchKey,
    pub position: NotePosition,
    pub x: f64,
    pub y: f64,
    /// Resting radius
    pub radius: f64,
    /// Colour shown while active
    pub color: String,
    pub style: Style,
}

/// One drawing primitive, in draw order
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    StaffLines {
        x: f64,
        y: f64,
        width: f64,
        spacing: f64,
    },
    Barline {
        x: f64,
        top: f64,
        bottom: f64,
        kind: BarlineKind,
    },
    Clef {
        x: f64,
        y: f64,
        clef: Clef,
    },
    TimeSignature {
        x: f64,
        y: f64,
        label: String,
    },
    LedgerLine {
        x1: f64,
        x2: f64,
        y: f64,
    },
    NoteHead {
        handle: HandleId,
        x: f64,
        y: f64,
        filled: bool,
    },
    Accidental {
        x: f64,
        y: f64,
        glyph: &'static str,
    },
    Stem {
        x: f64,
        y1: f64,
        y2: f64,
    },
    Flag {
        x: f64,
        y: f64,
        count: usize,
        up: bool,
    },
    Beam {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

/// Owned rendering target.
#[derive(Debug, Default)]
pub struct Surface {
    width: f64,
    height: f64,
    ops: Vec<DrawOp>,
    staves: Vec<StaveLine>,
    handles: Vec<NoteHandle>,
    /// Stacking order, bottom to top
    order: Vec<HandleId>,
    by_key: HashMap<PitchKey, Vec<HandleId>>,
}

impl Surface {
    pub fn create(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Drop everything drawn on the surface, including its handles.
    pub fn teardown(&mut self) {
        self.width = 0.0;
        self.height = 0.0;
        self.ops.clear();
        self.staves.clear();
        self.handles.clear();
        self.order.clear();
        self.by_key.clear();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn draw(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn push_stave(&mut self, stave: StaveLine) {
        self.staves.push(stave);
    }

    pub fn staves(&self) -> &[StaveLine] {
        &self.staves
    }

    /// Register a new handle on top of the stacking order. Its `id` is assigned here.
    pub fn add_handle(&mut self, mut handle: NoteHandle) -> HandleId {
        let id = self.handles.len();
        handle.id = id;
        self.by_key.entry(handle.key.clone()).or_default().push(id);
        self.handles.push(handle);
        self.order.push(id);
        id
    }

    pub fn handles(&self) -> &[NoteHandle] {
        &self.handles
    }

    pub fn handle(&self, id: HandleId) -> Option<&NoteHandle> {
        self.handles.get(id)
    }

    pub fn style_mut(&mut self, id: HandleId) -> Option<&mut Style> {
        self.handles.get_mut(id).map(|h| &mut h.style)
    }

    /// All handles engraved for a pitch key, in engraving order.
    pub fn handles_for(&self, key: &PitchKey) -> &[HandleId] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up the handle for a key, preferring the one engraved at `position`.
    ///
    /// Falls back to the most recently engraved handle with the key.
    pub fn find(&self, key: &PitchKey, position: NotePosition) -> Option<HandleId> {
        let ids = self.by_key.get(key)?;
        ids.iter()
            .copied()
            .find(|&id| self.handles[id].position == position)
            .or_else(|| ids.last().copied())
    }

    /// Move a handle to the top of the stacking order.
    pub fn raise(&mut self, id: HandleId) {
        if let Some(index) = self.order.iter().position(|&h| h == id) {
            let handle = self.order.remove(index);
            self.order.push(handle);
        }
    }

    pub fn stacking_order(&self) -> &[HandleId] {
        &self.order
    }
}

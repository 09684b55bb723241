//! The mode contract.
//!
//! A mode is a pluggable interaction state machine. The engine owns exactly
//! one active mode and drives it through this lifecycle:
//!
//! ```text
//! setup(params) ──ok──▶ [previous.on_exit] ──▶ on_enter ──▶ handle* / render* ──▶ on_exit
//!      │
//!      └─err──▶ request rejected, previous mode stays active
//! ```
//!
//! `setup` only validates and records; it must not have side effects,
//! because the previous mode has not been exited yet when it runs.
//!
//! Modes never mutate features directly. They emit `FeatureMutation`s and
//! `EditRequest`s through the `ModeContext`, and the host's geometry
//! engine carries them out.

use crate::error::ModeChangeError;
use crate::geometry::{Feature, Geometry, LngLat};
use crate::id::{FeatureId, ModeId};
use crate::input::{InputEvent, PointerPosition};
use crate::options::{BufferUnit, DrawOptions, LiveOptions, SnapOptions};
use crate::params::{ModeParams, SrCenter};
use serde::Serialize;

/// Interaction mode implemented by builtin and caller-supplied modes.
pub trait Mode {
    /// Validate `params` against the current context. Called before the
    /// previous mode exits; an error aborts the mode change.
    fn setup(
        &mut self,
        _id: ModeId,
        _params: &ModeParams,
        _ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        Ok(())
    }

    /// The mode became active.
    fn on_enter(&mut self, _ctx: &mut ModeContext<'_>) {}

    /// Handle one input event.
    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>);

    /// Transient feedback (draft geometry, guides) to draw over the map.
    fn render(&self, _options: &DrawOptions) -> Vec<DisplayFeature> {
        Vec::new()
    }

    /// The mode is being replaced. Drop any draft state here.
    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {}
}

/// Resolves snap targets for a pointer position. Implemented by the host,
/// which owns the rendered features and the screen projection.
pub trait Snapper {
    fn snap(&self, at: &PointerPosition, options: &SnapOptions) -> Option<LngLat>;
}

/// Snapper that never snaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnap;

impl Snapper for NoSnap {
    fn snap(&self, _at: &PointerPosition, _options: &SnapOptions) -> Option<LngLat> {
        None
    }
}

// ─── Mode output ─────────────────────────────────────────────────────────

/// Change to the feature collection produced by a mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FeatureMutation {
    Add(Feature),
    Remove(FeatureId),
    /// A feature drawn in a passing mode: delivered to the host, not stored.
    Passed(Feature),
    /// Work for the host's geometry engine.
    Request(EditRequest),
}

/// Which transform a scale/rotate drag performs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransformOp {
    Scale { center: SrCenter },
    Rotate { pivot: SrCenter },
}

/// Geometry operations the control asks the host to perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EditRequest {
    /// Subtract `cutter` from `targets` (empty: every feature it overlaps).
    Cut {
        cutter: Geometry,
        targets: Vec<FeatureId>,
    },
    SplitPolygon {
        splitter: Geometry,
        targets: Vec<FeatureId>,
    },
    SplitLine {
        splitter: Geometry,
        targets: Vec<FeatureId>,
    },
    Transform {
        targets: Vec<FeatureId>,
        operation: TransformOp,
        from: LngLat,
        to: LngLat,
    },
    /// Move a vertex and every vertex pinned to it.
    MovePinned { from: LngLat, to: LngLat },
    Combine { targets: Vec<FeatureId> },
    Uncombine { targets: Vec<FeatureId> },
    Union { targets: Vec<FeatureId> },
    Buffer {
        targets: Vec<FeatureId>,
        size: f64,
        unit: BufferUnit,
        steps: u32,
    },
    Length { targets: Vec<FeatureId>, unit: BufferUnit },
    Area { targets: Vec<FeatureId> },
    Centroid { targets: Vec<FeatureId> },
}

/// Role of a piece of transient feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    /// Geometry being drawn.
    Draft,
    Vertex,
    /// Alignment guide through the cursor.
    Guide,
    Selected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFeature {
    pub kind: DisplayKind,
    pub geometry: Geometry,
}

/// A mode change requested by a mode (e.g. back to select after drawing).
#[derive(Debug, Clone, PartialEq)]
pub struct ModeTransition {
    pub mode: ModeId,
    pub params: ModeParams,
}

// ─── Context ─────────────────────────────────────────────────────────────

/// Engine state a mode may read and the channels it writes to.
pub struct ModeContext<'a> {
    options: &'a LiveOptions,
    snapper: &'a dyn Snapper,
    selection: &'a mut Vec<FeatureId>,
    mutations: &'a mut Vec<FeatureMutation>,
    transition: &'a mut Option<ModeTransition>,
}

impl<'a> ModeContext<'a> {
    pub fn new(
        options: &'a LiveOptions,
        snapper: &'a dyn Snapper,
        selection: &'a mut Vec<FeatureId>,
        mutations: &'a mut Vec<FeatureMutation>,
        transition: &'a mut Option<ModeTransition>,
    ) -> Self {
        Self {
            options,
            snapper,
            selection,
            mutations,
            transition,
        }
    }

    /// The live option record. Reads always see the latest toggles.
    pub fn options(&self) -> &LiveOptions {
        self.options
    }

    /// Map position for a pointer event, snapped when snapping is on.
    pub fn snapped(&self, at: &PointerPosition) -> LngLat {
        if !self.options.snap() {
            return at.lng_lat;
        }
        self.snapper
            .snap(at, &self.options.snap_options())
            .unwrap_or(at.lng_lat)
    }

    pub fn selected(&self) -> &[FeatureId] {
        self.selection.as_slice()
    }

    pub fn set_selection(&mut self, ids: Vec<FeatureId>) {
        *self.selection = ids;
    }

    /// Add or remove `id` from the selection.
    pub fn toggle_selected(&mut self, id: FeatureId) {
        if let Some(pos) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(pos);
        } else {
            self.selection.push(id);
        }
    }

    pub fn emit(&mut self, mutation: FeatureMutation) {
        self.mutations.push(mutation);
    }

    pub fn request(&mut self, request: EditRequest) {
        self.mutations.push(FeatureMutation::Request(request));
    }

    /// Ask the engine to switch modes once the current event is handled.
    pub fn change_mode(&mut self, mode: ModeId, params: ModeParams) {
        *self.transition = Some(ModeTransition { mode, params });
    }

    /// Ask the engine to return to its configured default mode.
    pub fn finish(&mut self) {
        let mode = self.options.read(|o| o.default_mode);
        self.change_mode(mode, ModeParams::new());
    }

    /// Reborrow this context with a different mutation sink. Used by
    /// modes that wrap another mode and rewrite its output.
    pub fn redirect<'b>(&'b mut self, sink: &'b mut Vec<FeatureMutation>) -> ModeContext<'b> {
        ModeContext {
            options: self.options,
            snapper: self.snapper,
            selection: &mut *self.selection,
            mutations: sink,
            transition: &mut *self.transition,
        }
    }
}

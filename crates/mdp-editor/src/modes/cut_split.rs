//! Modes that draw a cutter or splitter and hand the geometry operation to
//! the host.

use super::draft::{Draft, DraftStep};
use mdp_core::{
    DisplayFeature, DrawOptions, EditRequest, FeatureId, Geometry, GeometryKind, InputEvent, Mode,
    ModeChangeError, ModeContext, ModeId, ModeParams, SplitLineParams, SplitTarget,
};

/// The drawing half every cut/split mode shares.
#[derive(Debug, Clone)]
struct Cutter {
    kind: GeometryKind,
    draft: Draft,
    targets: Vec<FeatureId>,
}

impl Cutter {
    fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            draft: Draft::default(),
            targets: Vec::new(),
        }
    }

    fn enter(&mut self, ctx: &ModeContext<'_>) {
        self.draft.clear();
        self.targets = ctx.selected().to_vec();
    }

    /// Feed `event`; when the cutter is complete, emit `build(cutter,
    /// targets)` and go back to the default mode.
    fn step(
        &mut self,
        event: &InputEvent,
        ctx: &mut ModeContext<'_>,
        build: impl FnOnce(Geometry, Vec<FeatureId>) -> EditRequest,
    ) {
        match self.draft.step(self.kind, event, ctx) {
            DraftStep::Continue => {}
            DraftStep::Finished(geometry) => {
                ctx.request(build(geometry, std::mem::take(&mut self.targets)));
                ctx.finish();
            }
            DraftStep::Cancelled => ctx.finish(),
        }
    }

    fn preview(&self, options: &DrawOptions) -> Vec<DisplayFeature> {
        self.draft.preview(self.kind, options.guides)
    }

    fn reset(&mut self) {
        self.draft.clear();
        self.targets.clear();
    }
}

fn require_selection(
    id: ModeId,
    ctx: &ModeContext<'_>,
    message: &str,
) -> Result<(), ModeChangeError> {
    if ctx.selected().is_empty() {
        return Err(ModeChangeError::Rejected {
            mode: id,
            message: message.to_string(),
        });
    }
    Ok(())
}

// ─── Cut polygon ─────────────────────────────────────────────────────────

/// Draw a polygon and subtract it from the selected polygons, or from
/// every polygon it overlaps when nothing is selected.
#[derive(Debug, Clone)]
pub struct CutPolygonMode {
    cutter: Cutter,
}

impl Default for CutPolygonMode {
    fn default() -> Self {
        Self {
            cutter: Cutter::new(GeometryKind::Polygon),
        }
    }
}

impl Mode for CutPolygonMode {
    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        self.cutter.enter(ctx);
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        self.cutter.step(event, ctx, |cutter, targets| EditRequest::Cut {
            cutter,
            targets,
        });
    }

    fn render(&self, options: &DrawOptions) -> Vec<DisplayFeature> {
        self.cutter.preview(options)
    }

    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.cutter.reset();
    }
}

// ─── Split polygon ───────────────────────────────────────────────────────

/// Draw a line across the selected polygons to split them.
#[derive(Debug, Clone)]
pub struct SplitPolygonMode {
    cutter: Cutter,
}

impl Default for SplitPolygonMode {
    fn default() -> Self {
        Self {
            cutter: Cutter::new(GeometryKind::LineString),
        }
    }
}

impl Mode for SplitPolygonMode {
    fn setup(
        &mut self,
        id: ModeId,
        _params: &ModeParams,
        ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        require_selection(id, ctx, "Please select a Polygon or MultiPolygon to split!")
    }

    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        self.cutter.enter(ctx);
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        self.cutter
            .step(event, ctx, |splitter, targets| EditRequest::SplitPolygon {
                splitter,
                targets,
            });
    }

    fn render(&self, options: &DrawOptions) -> Vec<DisplayFeature> {
        self.cutter.preview(options)
    }

    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.cutter.reset();
    }
}

// ─── Split line ──────────────────────────────────────────────────────────

/// Split the selected lines with a drawn point, line or polygon, chosen by
/// the `spliter` parameter.
#[derive(Debug, Clone)]
pub struct SplitLineMode {
    cutter: Cutter,
}

impl Default for SplitLineMode {
    fn default() -> Self {
        Self {
            cutter: Cutter::new(GeometryKind::LineString),
        }
    }
}

impl SplitLineMode {
    pub fn splitter_kind(&self) -> GeometryKind {
        self.cutter.kind
    }
}

fn kind_of(target: SplitTarget) -> GeometryKind {
    match target {
        SplitTarget::Point => GeometryKind::Point,
        SplitTarget::LineString => GeometryKind::LineString,
        SplitTarget::Polygon => GeometryKind::Polygon,
    }
}

impl Mode for SplitLineMode {
    fn setup(
        &mut self,
        id: ModeId,
        params: &ModeParams,
        ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        let SplitLineParams { spliter } = params.parse(id)?;
        require_selection(id, ctx, "Please select a LineString or MultiLineString to split!")?;
        self.cutter.kind = kind_of(spliter);
        Ok(())
    }

    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        self.cutter.enter(ctx);
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        self.cutter
            .step(event, ctx, |splitter, targets| EditRequest::SplitLine {
                splitter,
                targets,
            });
    }

    fn render(&self, options: &DrawOptions) -> Vec<DisplayFeature> {
        self.cutter.preview(options)
    }

    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.cutter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::test_support::Harness;
    use mdp_core::LngLat;
    use pretty_assertions::assert_eq;

    #[test]
    fn cut_without_selection_targets_everything() {
        let mut h = Harness::new();
        let mut mode = CutPolygonMode::default();
        h.enter(&mut mode);
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)] {
            h.click(&mut mode, x, y);
        }
        h.key(&mut mode, "Enter");

        let requests = h.requests();
        let [EditRequest::Cut { cutter, targets }] = requests.as_slice() else {
            panic!("expected one cut request");
        };
        assert!(targets.is_empty());
        assert_eq!(cutter.kind(), GeometryKind::Polygon);
        assert_eq!(h.transition_target(), Some("simple_select"));
    }

    #[test]
    fn split_polygon_requires_selection() {
        let mut h = Harness::new();
        let mut mode = SplitPolygonMode::default();
        let err = h
            .setup(&mut mode, "splitPolygonMode", &ModeParams::new())
            .unwrap_err();
        assert!(matches!(err, ModeChangeError::Rejected { .. }));
    }

    #[test]
    fn split_line_uses_requested_splitter_kind() {
        let mut h = Harness::new();
        let line = FeatureId::intern("line");
        h.selection = vec![line];
        let mut mode = SplitLineMode::default();
        h.setup(
            &mut mode,
            "splitLineMode",
            &ModeParams::new().with("spliter", "point"),
        )
        .unwrap();
        h.enter(&mut mode);
        assert_eq!(mode.splitter_kind(), GeometryKind::Point);

        h.click(&mut mode, 0.5, 0.5);
        assert_eq!(
            h.requests(),
            vec![EditRequest::SplitLine {
                splitter: Geometry::Point(LngLat::new(0.5, 0.5)),
                targets: vec![line],
            }]
        );
    }

    #[test]
    fn split_line_rejects_unknown_splitter() {
        let mut h = Harness::new();
        h.selection = vec![FeatureId::intern("line")];
        let mut mode = SplitLineMode::default();
        let err = h
            .setup(
                &mut mode,
                "splitLineMode",
                &ModeParams::new().with("spliter", "circle"),
            )
            .unwrap_err();
        assert!(matches!(err, ModeChangeError::InvalidParams { .. }));
    }
}

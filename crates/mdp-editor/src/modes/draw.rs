//! Point, line and polygon drawing with snapping and guides.

use super::draft::{Draft, DraftStep};
use mdp_core::{
    DisplayFeature, DrawOptions, Feature, FeatureMutation, GeometryKind, InputEvent, Mode,
    ModeContext,
};

/// Draws one feature of `kind`, emits it, selects it, and returns to the
/// default mode. Escape or trash abandons the draft.
#[derive(Debug, Clone)]
pub struct DrawMode {
    kind: GeometryKind,
    draft: Draft,
}

impl DrawMode {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            draft: Draft::default(),
        }
    }

    pub fn point() -> Self {
        Self::new(GeometryKind::Point)
    }

    pub fn line_string() -> Self {
        Self::new(GeometryKind::LineString)
    }

    pub fn polygon() -> Self {
        Self::new(GeometryKind::Polygon)
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }
}

impl Mode for DrawMode {
    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        self.draft.clear();
        ctx.set_selection(Vec::new());
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        match self.draft.step(self.kind, event, ctx) {
            DraftStep::Continue => {}
            DraftStep::Finished(geometry) => {
                let feature = Feature::new(geometry);
                log::debug!("drew {:?} {}", self.kind, feature.id);
                ctx.set_selection(vec![feature.id]);
                ctx.emit(FeatureMutation::Add(feature));
                ctx.finish();
            }
            DraftStep::Cancelled => ctx.finish(),
        }
    }

    fn render(&self, options: &DrawOptions) -> Vec<DisplayFeature> {
        self.draft.preview(self.kind, options.guides)
    }

    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.draft.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::test_support::Harness;
    use mdp_core::{DisplayKind, Geometry, LngLat};
    use pretty_assertions::assert_eq;

    #[test]
    fn point_finishes_on_first_click() {
        let mut h = Harness::new();
        let mut mode = DrawMode::point();
        h.click(&mut mode, 1.0, 2.0);
        let added = h.added();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].geometry, Geometry::Point(LngLat::new(1.0, 2.0)));
        assert_eq!(h.selection, vec![added[0].id]);
        assert_eq!(h.transition_target(), Some("simple_select"));
    }

    #[test]
    fn polygon_needs_three_vertices() {
        let mut h = Harness::new();
        let mut mode = DrawMode::polygon();
        h.click(&mut mode, 0.0, 0.0);
        h.click(&mut mode, 1.0, 0.0);
        h.key(&mut mode, "Enter");
        assert!(h.added().is_empty());
        assert_eq!(h.transition_target(), None);

        h.click(&mut mode, 1.0, 1.0);
        h.key(&mut mode, "Enter");
        let Geometry::Polygon(rings) = &h.added()[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 4);
    }

    #[test]
    fn clicking_last_vertex_again_finishes_line() {
        let mut h = Harness::new();
        let mut mode = DrawMode::line_string();
        h.click(&mut mode, 0.0, 0.0);
        h.click(&mut mode, 2.0, 0.0);
        h.click(&mut mode, 2.0, 0.0);
        assert_eq!(
            h.added()[0].geometry,
            Geometry::LineString(vec![LngLat::new(0.0, 0.0), LngLat::new(2.0, 0.0)])
        );
    }

    #[test]
    fn escape_discards_draft() {
        let mut h = Harness::new();
        let mut mode = DrawMode::line_string();
        h.click(&mut mode, 0.0, 0.0);
        h.key(&mut mode, "Escape");
        assert!(h.added().is_empty());
        assert!(mode.render(&h.options.snapshot()).is_empty());
        assert_eq!(h.transition_target(), Some("simple_select"));
    }

    #[test]
    fn snapping_follows_live_toggle() {
        let mut h = Harness::new().snapping_to(LngLat::new(10.0, 10.0));
        let mut mode = DrawMode::line_string();

        h.click(&mut mode, 0.0, 0.0);
        h.options.set_snap(false);
        h.click(&mut mode, 5.0, 5.0);
        h.key(&mut mode, "Enter");

        assert_eq!(
            h.added()[0].geometry,
            Geometry::LineString(vec![LngLat::new(10.0, 10.0), LngLat::new(5.0, 5.0)])
        );
    }

    #[test]
    fn guides_render_only_when_enabled() {
        let mut h = Harness::new();
        let mut mode = DrawMode::line_string();
        h.click(&mut mode, 0.0, 0.0);
        h.hover(&mut mode, 1.0, 1.0);

        let guides = |mode: &DrawMode, h: &Harness| {
            mode.render(&h.options.snapshot())
                .iter()
                .filter(|f| f.kind == DisplayKind::Guide)
                .count()
        };
        assert_eq!(guides(&mode, &h), 0);
        h.options.set_guides(true);
        assert_eq!(guides(&mode, &h), 2);
    }
}

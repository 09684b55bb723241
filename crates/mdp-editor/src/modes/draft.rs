//! Vertex accumulation shared by every mode that draws a path.

use mdp_core::{
    DisplayFeature, DisplayKind, Geometry, GeometryKind, InputEvent, LngLat, ModeContext,
};

/// Half-extent of an alignment guide, in degrees.
const GUIDE_SPAN: f64 = 180.0;

/// Outcome of feeding one event to a [`Draft`].
#[derive(Debug, Clone, PartialEq)]
pub enum DraftStep {
    Continue,
    Finished(Geometry),
    Cancelled,
}

/// Vertices placed so far plus the hovering cursor.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    vertices: Vec<LngLat>,
    cursor: Option<LngLat>,
}

impl Draft {
    pub fn vertices(&self) -> &[LngLat] {
        &self.vertices
    }

    pub fn cursor(&self) -> Option<LngLat> {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.cursor = None;
    }

    /// Advance the draft. Pointer positions go through `ctx.snapped`, so
    /// the snap toggle applies from the next event on.
    pub fn step(
        &mut self,
        kind: GeometryKind,
        event: &InputEvent,
        ctx: &ModeContext<'_>,
    ) -> DraftStep {
        match event {
            InputEvent::Click { at, .. } => {
                let vertex = ctx.snapped(at);
                self.cursor = Some(vertex);
                if self.vertices.last() == Some(&vertex) && kind != GeometryKind::Point {
                    return self.finish(kind);
                }
                self.vertices.push(vertex);
                if kind == GeometryKind::Point {
                    return self.finish(kind);
                }
                DraftStep::Continue
            }
            InputEvent::PointerMove { at, .. } => {
                self.cursor = Some(ctx.snapped(at));
                DraftStep::Continue
            }
            InputEvent::DoubleClick { .. } => self.finish(kind),
            InputEvent::Key { key } if key == "Enter" => self.finish(kind),
            InputEvent::Key { key } if key == "Escape" => {
                self.clear();
                DraftStep::Cancelled
            }
            InputEvent::Trash => {
                self.clear();
                DraftStep::Cancelled
            }
            _ => DraftStep::Continue,
        }
    }

    /// Finish if enough vertices exist; otherwise keep drawing.
    fn finish(&mut self, kind: GeometryKind) -> DraftStep {
        if self.vertices.len() < kind.min_vertices() {
            return DraftStep::Continue;
        }
        let vertices = std::mem::take(&mut self.vertices);
        self.cursor = None;
        DraftStep::Finished(match kind {
            GeometryKind::Point => Geometry::Point(vertices[0]),
            GeometryKind::LineString => Geometry::LineString(vertices),
            GeometryKind::Polygon => Geometry::polygon_from_open_ring(vertices),
        })
    }

    /// Draft geometry (with the cursor as a trailing vertex), the placed
    /// vertices, and guides through the cursor when `guides` is on.
    pub fn preview(&self, kind: GeometryKind, guides: bool) -> Vec<DisplayFeature> {
        let mut out = Vec::new();
        let mut path = self.vertices.clone();
        path.extend(self.cursor);
        if kind != GeometryKind::Point && path.len() >= 2 {
            let geometry = if kind == GeometryKind::Polygon && path.len() >= 3 {
                Geometry::polygon_from_open_ring(path)
            } else {
                Geometry::LineString(path)
            };
            out.push(DisplayFeature {
                kind: DisplayKind::Draft,
                geometry,
            });
        }
        out.extend(self.vertices.iter().map(|v| DisplayFeature {
            kind: DisplayKind::Vertex,
            geometry: Geometry::Point(*v),
        }));
        if guides && let Some(cursor) = self.cursor {
            out.extend(guides_through(cursor));
        }
        out
    }
}

/// A horizontal and a vertical guide line crossing at `at`.
fn guides_through(at: LngLat) -> [DisplayFeature; 2] {
    let lat_span = GUIDE_SPAN / 2.0;
    [
        DisplayFeature {
            kind: DisplayKind::Guide,
            geometry: Geometry::LineString(vec![
                LngLat::new(at.lng - GUIDE_SPAN, at.lat),
                LngLat::new(at.lng + GUIDE_SPAN, at.lat),
            ]),
        },
        DisplayFeature {
            kind: DisplayKind::Guide,
            geometry: Geometry::LineString(vec![
                LngLat::new(at.lng, (at.lat - lat_span).max(-lat_span)),
                LngLat::new(at.lng, (at.lat + lat_span).min(lat_span)),
            ]),
        },
    ]
}

use mdp_core::{EditRequest, InputEvent, LngLat, Mode, ModeContext};

/// Drag a shared vertex; every feature pinned to it moves along.
///
/// A drag only starts on a feature hit. The snapped position under the
/// pointer is taken as the vertex, so the host's snapper decides which
/// vertex is grabbed. While dragging the raw pointer position is the
/// target: snapping it would pull the vertex back onto itself.
#[derive(Debug, Default)]
pub struct PinningMode {
    grabbed: Option<LngLat>,
}

impl Mode for PinningMode {
    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        match event {
            InputEvent::PointerDown { at, .. } if at.hit.is_some() => {
                self.grabbed = Some(ctx.snapped(at));
            }
            InputEvent::PointerMove { at, .. } => {
                if let Some(from) = self.grabbed {
                    let to = at.lng_lat;
                    if to != from {
                        ctx.request(EditRequest::MovePinned { from, to });
                        self.grabbed = Some(to);
                    }
                }
            }
            InputEvent::PointerUp { .. } => self.grabbed = None,
            InputEvent::Key { key } if key == "Escape" => {
                self.grabbed = None;
                ctx.finish();
            }
            _ => {}
        }
    }

    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.grabbed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::test_support::Harness;
    use mdp_core::FeatureId;
    use pretty_assertions::assert_eq;

    #[test]
    fn drag_emits_incremental_moves() {
        let mut h = Harness::new();
        let mut mode = PinningMode::default();
        h.down_on(&mut mode, 0.0, 0.0, FeatureId::intern("shared"));
        h.hover(&mut mode, 1.0, 0.0);
        h.hover(&mut mode, 1.0, 1.0);
        h.up(&mut mode, 1.0, 1.0);
        h.hover(&mut mode, 9.0, 9.0);

        assert_eq!(
            h.requests(),
            vec![
                EditRequest::MovePinned {
                    from: LngLat::new(0.0, 0.0),
                    to: LngLat::new(1.0, 0.0),
                },
                EditRequest::MovePinned {
                    from: LngLat::new(1.0, 0.0),
                    to: LngLat::new(1.0, 1.0),
                },
            ]
        );
    }

    #[test]
    fn only_the_grab_is_snapped() {
        let mut h = Harness::new().snapping_to(LngLat::new(5.0, 5.0));
        let mut mode = PinningMode::default();
        h.down_on(&mut mode, 4.9, 5.1, FeatureId::intern("shared"));
        h.hover(&mut mode, 6.0, 5.0);
        h.hover(&mut mode, 7.0, 5.0);

        assert_eq!(
            h.requests(),
            vec![
                EditRequest::MovePinned {
                    from: LngLat::new(5.0, 5.0),
                    to: LngLat::new(6.0, 5.0),
                },
                EditRequest::MovePinned {
                    from: LngLat::new(6.0, 5.0),
                    to: LngLat::new(7.0, 5.0),
                },
            ]
        );
    }

    #[test]
    fn press_on_empty_map_does_nothing() {
        let mut h = Harness::new();
        let mut mode = PinningMode::default();
        h.down(&mut mode, 0.0, 0.0);
        h.hover(&mut mode, 1.0, 0.0);
        assert!(h.requests().is_empty());
    }
}

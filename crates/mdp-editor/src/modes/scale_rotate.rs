//! Scale and rotate the selection by dragging.
//!
//! Plain drags scale about `scaleCenter`; alt-drags rotate about
//! `rotatePivot`. When only one of the two is enabled, every drag does
//! that one.

use mdp_core::{
    EditRequest, FeatureId, FeatureMutation, InputEvent, LngLat, Mode, ModeChangeError,
    ModeContext, ModeId, ModeParams, Modifiers, ScaleRotateParams, TransformOp,
};

#[derive(Debug, Clone, Copy)]
struct Drag {
    operation: TransformOp,
    last: LngLat,
}

#[derive(Debug, Default)]
pub struct ScaleRotateMode {
    params: Option<ScaleRotateParams>,
    targets: Vec<FeatureId>,
    drag: Option<Drag>,
}

impl ScaleRotateMode {
    fn operation(params: &ScaleRotateParams, modifiers: Modifiers) -> Option<TransformOp> {
        let rotate = TransformOp::Rotate {
            pivot: params.rotate_pivot,
        };
        let scale = TransformOp::Scale {
            center: params.scale_center,
        };
        match (params.can_scale, params.can_rotate) {
            (true, true) if modifiers.alt => Some(rotate),
            (true, _) => Some(scale),
            (false, true) => Some(rotate),
            (false, false) => None,
        }
    }
}

impl Mode for ScaleRotateMode {
    fn setup(
        &mut self,
        id: ModeId,
        params: &ModeParams,
        _ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        self.params = Some(params.parse(id)?);
        Ok(())
    }

    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        self.targets = ctx.selected().to_vec();
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        let Some(params) = &self.params else {
            return;
        };
        match event {
            InputEvent::Click { at, modifiers } if params.can_select_features => {
                if let Some(hit) = at.hit {
                    if modifiers.shift {
                        ctx.toggle_selected(hit);
                    } else {
                        ctx.set_selection(vec![hit]);
                    }
                    self.targets = ctx.selected().to_vec();
                }
            }
            InputEvent::PointerDown { at, modifiers } if !self.targets.is_empty() => {
                self.drag = Self::operation(params, *modifiers).map(|operation| Drag {
                    operation,
                    last: at.lng_lat,
                });
            }
            InputEvent::PointerMove { at, .. } => {
                if let Some(drag) = &mut self.drag {
                    ctx.request(EditRequest::Transform {
                        targets: self.targets.clone(),
                        operation: drag.operation,
                        from: drag.last,
                        to: at.lng_lat,
                    });
                    drag.last = at.lng_lat;
                }
            }
            InputEvent::PointerUp { .. } => self.drag = None,
            InputEvent::Trash if params.can_trash => {
                for id in std::mem::take(&mut self.targets) {
                    ctx.emit(FeatureMutation::Remove(id));
                }
                ctx.set_selection(Vec::new());
                ctx.finish();
            }
            InputEvent::Trash => log::debug!("trash disabled in scale/rotate mode"),
            InputEvent::Key { key } if key == "Escape" => ctx.finish(),
            _ => {}
        }
    }

    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.drag = None;
        self.targets.clear();
    }
}

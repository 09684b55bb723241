use mdp_core::{
    FeatureId, FeatureMutation, InputEvent, Mode, ModeChangeError, ModeContext, ModeId,
    ModeParams,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectParams {
    #[serde(default)]
    feature_ids: Vec<FeatureId>,
}

/// Click to select, shift-click to extend, trash or Delete to remove.
#[derive(Debug, Default)]
pub struct SimpleSelectMode {
    initial: Option<Vec<FeatureId>>,
}

impl SimpleSelectMode {
    fn delete_selected(ctx: &mut ModeContext<'_>) {
        let doomed = ctx.selected().to_vec();
        for id in doomed {
            ctx.emit(FeatureMutation::Remove(id));
        }
        ctx.set_selection(Vec::new());
    }
}

impl Mode for SimpleSelectMode {
    fn setup(
        &mut self,
        id: ModeId,
        params: &ModeParams,
        _ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        if !params.is_empty() {
            let parsed: SelectParams = params.parse(id)?;
            self.initial = Some(parsed.feature_ids);
        }
        Ok(())
    }

    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        if let Some(ids) = self.initial.take() {
            ctx.set_selection(ids);
        }
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        match event {
            InputEvent::Click { at, modifiers } => match at.hit {
                Some(hit) if modifiers.shift => ctx.toggle_selected(hit),
                Some(hit) => ctx.set_selection(vec![hit]),
                None if !modifiers.shift => ctx.set_selection(Vec::new()),
                None => {}
            },
            InputEvent::Trash => Self::delete_selected(ctx),
            InputEvent::Key { key } => match key.as_str() {
                "Delete" | "Backspace" => Self::delete_selected(ctx),
                "Escape" => ctx.set_selection(Vec::new()),
                _ => {}
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::test_support::Harness;
    use mdp_core::{InputEvent, LngLat, Modifiers, PointerPosition};
    use pretty_assertions::assert_eq;

    #[test]
    fn click_selects_and_shift_click_extends() {
        let mut h = Harness::new();
        let mut mode = SimpleSelectMode::default();
        let (a, b) = (FeatureId::intern("a"), FeatureId::intern("b"));

        h.click_on(&mut mode, a);
        assert_eq!(h.selection, vec![a]);

        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        let at = PointerPosition::new(0.0, 0.0, LngLat::new(0.0, 0.0)).with_hit(b);
        h.send(&mut mode, InputEvent::Click { at, modifiers: shift });
        assert_eq!(h.selection, vec![a, b]);

        h.click(&mut mode, 5.0, 5.0);
        assert!(h.selection.is_empty());
    }

    #[test]
    fn trash_removes_selection() {
        let mut h = Harness::new();
        let mut mode = SimpleSelectMode::default();
        let a = FeatureId::intern("a");
        h.click_on(&mut mode, a);
        h.send(&mut mode, InputEvent::Trash);
        assert_eq!(h.mutations, vec![FeatureMutation::Remove(a)]);
        assert!(h.selection.is_empty());
    }

    #[test]
    fn feature_ids_param_seeds_selection() {
        let mut h = Harness::new();
        let mut mode = SimpleSelectMode::default();
        let params = ModeParams::new().with("featureIds", vec!["x", "y"]);
        h.setup(&mut mode, "simple_select", &params).unwrap();
        h.enter(&mut mode);
        assert_eq!(
            h.selection,
            vec![FeatureId::intern("x"), FeatureId::intern("y")]
        );
    }
}

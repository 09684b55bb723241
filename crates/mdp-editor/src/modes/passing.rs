//! Passing modes draw a feature and hand it to the host without adding it
//! to the collection.

use mdp_core::{
    DisplayFeature, DrawOptions, FeatureMutation, InputEvent, Mode, ModeChangeError, ModeContext,
    ModeId, ModeParams,
};

/// Wraps a drawing mode and turns its `Add` mutations into `Passed`.
#[derive(Debug, Clone)]
pub struct PassingMode<M> {
    inner: M,
}

impl<M: Mode> PassingMode<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: Mode> Mode for PassingMode<M> {
    fn setup(
        &mut self,
        id: ModeId,
        params: &ModeParams,
        ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        self.inner.setup(id, params, ctx)
    }

    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        self.inner.on_enter(ctx);
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        let mut produced = Vec::new();
        self.inner.handle(event, &mut ctx.redirect(&mut produced));
        for mutation in produced {
            match mutation {
                FeatureMutation::Add(feature) => {
                    // never stored, so it can't stay selected
                    let remaining = ctx
                        .selected()
                        .iter()
                        .copied()
                        .filter(|id| *id != feature.id)
                        .collect();
                    ctx.set_selection(remaining);
                    ctx.emit(FeatureMutation::Passed(feature));
                }
                other => ctx.emit(other),
            }
        }
    }

    fn render(&self, options: &DrawOptions) -> Vec<DisplayFeature> {
        self.inner.render(options)
    }

    fn on_exit(&mut self, ctx: &mut ModeContext<'_>) {
        self.inner.on_exit(ctx);
    }
}

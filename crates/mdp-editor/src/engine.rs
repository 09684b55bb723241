//! The base drawing engine: owns the active mode, the selection, and the
//! live option record, and renders the base control buttons.

use crate::actions::{ActionDescriptor, ActionSet};
use crate::dom::{CONTROL_GROUP_CLASSES, Dom, ElementId, ElementSpec};
use crate::notify::Notifier;
use mdp_core::{
    Controls, DisplayFeature, DrawOptions, EditRequest, FeatureId, FeatureMutation, InputEvent,
    LiveOptions, Mode, ModeChangeError, ModeContext, ModeId, ModeParams, ModeRegistry,
    ModeTransition, NoSnap, Snapper,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Mode transitions a single event may chain before the engine stops
/// following them.
const MAX_CHAINED_TRANSITIONS: usize = 8;

/// What the toolbar and the lifecycle manager need from a drawing engine.
pub trait BaseEngine {
    /// Switch to `mode`. On error the previous mode stays active and no
    /// lifecycle hook of it has run.
    fn change_mode(&mut self, mode: ModeId, params: ModeParams) -> Result<(), ModeChangeError>;

    fn active_mode(&self) -> ModeId;

    fn active_params(&self) -> &ModeParams;

    fn options(&self) -> &LiveOptions;

    fn selected(&self) -> &[FeatureId];

    fn set_selected(&mut self, ids: Vec<FeatureId>);

    /// Feed one input event to the active mode.
    fn handle_input(&mut self, event: &InputEvent);

    fn render(&self) -> Vec<DisplayFeature>;

    /// Drain the mutations produced since the last call.
    fn take_mutations(&mut self) -> Vec<FeatureMutation>;

    /// The trash button: handled by the active mode.
    fn trash(&mut self) {
        self.handle_input(&InputEvent::Trash);
    }

    /// Queue work for the host's geometry engine.
    fn request(&mut self, request: EditRequest);

    /// Build the engine's control group and base buttons. `this` is a weak
    /// handle to the engine itself, captured by button listeners.
    fn on_add(&mut self, dom: &mut dyn Dom, this: WeakEngine) -> ElementId;

    fn on_remove(&mut self, dom: &mut dyn Dom);
}

pub type SharedEngine = Rc<RefCell<dyn BaseEngine>>;
pub type WeakEngine = Weak<RefCell<dyn BaseEngine>>;

/// The drawing engine.
pub struct DrawEngine {
    registry: ModeRegistry,
    options: LiveOptions,
    notifier: Rc<dyn Notifier>,
    snapper: Box<dyn Snapper>,
    active: Box<dyn Mode>,
    active_id: ModeId,
    active_params: ModeParams,
    selection: Vec<FeatureId>,
    pending: Vec<FeatureMutation>,
    base_controls: ActionSet,
    container: Option<ElementId>,
}

impl DrawEngine {
    /// Create an engine sitting in `options.default_mode`. Fails when that
    /// mode is not registered or rejects empty parameters.
    pub fn new(
        registry: ModeRegistry,
        options: DrawOptions,
        notifier: Rc<dyn Notifier>,
    ) -> Result<Self, ModeChangeError> {
        let default_mode = options.default_mode;
        let options = LiveOptions::new(options);
        let snapper: Box<dyn Snapper> = Box::new(NoSnap);
        let mut selection = Vec::new();
        let mut pending = Vec::new();
        let mut transition = None;

        let mut active = registry.create(default_mode)?;
        let params = ModeParams::new();
        {
            let mut ctx = ModeContext::new(
                &options,
                snapper.as_ref(),
                &mut selection,
                &mut pending,
                &mut transition,
            );
            active.setup(default_mode, &params, &ctx)?;
            active.on_enter(&mut ctx);
        }
        log::debug!("draw engine starts in {default_mode}");

        let mut engine = Self {
            registry,
            options,
            notifier,
            snapper,
            active,
            active_id: default_mode,
            active_params: params,
            selection,
            pending,
            base_controls: ActionSet::default(),
            container: None,
        };
        engine.follow(transition, 0);
        Ok(engine)
    }

    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    /// Install the host's snap resolver.
    pub fn set_snapper(&mut self, snapper: Box<dyn Snapper>) {
        self.snapper = snapper;
    }

    /// The control group element, while attached.
    pub fn container(&self) -> Option<ElementId> {
        self.container
    }

    pub fn base_controls(&self) -> &ActionSet {
        &self.base_controls
    }

    fn switch(
        &mut self,
        mode: ModeId,
        params: ModeParams,
        depth: usize,
    ) -> Result<(), ModeChangeError> {
        let mut next = self.registry.create(mode)?;
        let mut transition = None;
        {
            let ctx = ModeContext::new(
                &self.options,
                self.snapper.as_ref(),
                &mut self.selection,
                &mut self.pending,
                &mut transition,
            );
            next.setup(mode, &params, &ctx)?;
        }
        {
            let mut ctx = ModeContext::new(
                &self.options,
                self.snapper.as_ref(),
                &mut self.selection,
                &mut self.pending,
                &mut transition,
            );
            self.active.on_exit(&mut ctx);
            next.on_enter(&mut ctx);
        }
        log::debug!("mode {} -> {mode}", self.active_id);
        self.active = next;
        self.active_id = mode;
        self.active_params = params;
        self.follow(transition, depth + 1);
        Ok(())
    }

    /// Apply a transition a mode asked for. Failures are reported, not
    /// returned: the event that caused them has already been handled.
    fn follow(&mut self, transition: Option<ModeTransition>, depth: usize) {
        let Some(ModeTransition { mode, params }) = transition else {
            return;
        };
        if depth >= MAX_CHAINED_TRANSITIONS {
            log::warn!("dropping transition to {mode}: too many chained mode changes");
            return;
        }
        if let Err(err) = self.switch(mode, params, depth) {
            log::error!("mode transition failed: {err}");
            self.notifier.alert(&err.to_string());
        }
    }
}

impl BaseEngine for DrawEngine {
    fn change_mode(&mut self, mode: ModeId, params: ModeParams) -> Result<(), ModeChangeError> {
        self.switch(mode, params, 0)
    }

    fn active_mode(&self) -> ModeId {
        self.active_id
    }

    fn active_params(&self) -> &ModeParams {
        &self.active_params
    }

    fn options(&self) -> &LiveOptions {
        &self.options
    }

    fn selected(&self) -> &[FeatureId] {
        &self.selection
    }

    fn set_selected(&mut self, ids: Vec<FeatureId>) {
        self.selection = ids;
    }

    fn handle_input(&mut self, event: &InputEvent) {
        let mut transition = None;
        {
            let mut ctx = ModeContext::new(
                &self.options,
                self.snapper.as_ref(),
                &mut self.selection,
                &mut self.pending,
                &mut transition,
            );
            self.active.handle(event, &mut ctx);
        }
        self.follow(transition, 0);
    }

    fn render(&self) -> Vec<DisplayFeature> {
        self.options.read(|options| self.active.render(options))
    }

    fn take_mutations(&mut self) -> Vec<FeatureMutation> {
        std::mem::take(&mut self.pending)
    }

    fn request(&mut self, request: EditRequest) {
        self.pending.push(FeatureMutation::Request(request));
    }

    fn on_add(&mut self, dom: &mut dyn Dom, this: WeakEngine) -> ElementId {
        let container = dom.create_element(&ElementSpec::container(&CONTROL_GROUP_CLASSES));
        let controls = self.options.read(|o| o.controls);
        self.base_controls = ActionSet::new(base_controls(controls));
        self.base_controls
            .mount(dom, container, this, self.notifier.clone());
        self.container = Some(container);
        container
    }

    fn on_remove(&mut self, dom: &mut dyn Dom) {
        self.base_controls.unmount(dom);
        if let Some(container) = self.container.take() {
            dom.remove_element(container);
        }
    }
}

/// The engine's own buttons, filtered by `controls`.
fn base_controls(controls: Controls) -> Vec<ActionDescriptor> {
    let mut actions = Vec::new();
    if controls.line_string {
        actions.push(
            ActionDescriptor::click(&["mapbox-gl-draw_line"], |cx| {
                cx.change_mode("draw_line_string", ModeParams::new())
            })
            .with_title("LineString tool (l)"),
        );
    }
    if controls.polygon {
        actions.push(
            ActionDescriptor::click(&["mapbox-gl-draw_polygon"], |cx| {
                cx.change_mode("draw_polygon", ModeParams::new())
            })
            .with_title("Polygon tool (p)"),
        );
    }
    if controls.point {
        actions.push(
            ActionDescriptor::click(&["mapbox-gl-draw_point"], |cx| {
                cx.change_mode("draw_point", ModeParams::new())
            })
            .with_title("Marker tool (m)"),
        );
    }
    if controls.trash {
        actions.push(
            ActionDescriptor::click(&["mapbox-gl-draw_trash"], |cx| {
                cx.engine.trash();
                Ok(())
            })
            .with_title("Delete"),
        );
    }
    if controls.combine_features {
        actions.push(
            ActionDescriptor::click(&["mapbox-gl-draw_combine"], |cx| {
                let targets = cx.require_selection("combine")?;
                cx.engine.request(EditRequest::Combine { targets });
                Ok(())
            })
            .with_title("Combine"),
        );
    }
    if controls.uncombine_features {
        actions.push(
            ActionDescriptor::click(&["mapbox-gl-draw_uncombine"], |cx| {
                let targets = cx.require_selection("uncombine")?;
                cx.engine.request(EditRequest::Uncombine { targets });
                Ok(())
            })
            .with_title("Uncombine"),
        );
    }
    actions
}

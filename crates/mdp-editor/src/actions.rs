//! Toolbar actions: a button, the event it reacts to, and the handler it
//! runs against the engine.
//!
//! Handlers return `Result`; an `Err` is reported once through the
//! notifier and logged. A failing handler never escapes the listener, and
//! the engine is left in whatever state the failed call left it (for mode
//! changes: the previous mode, untouched).

use crate::dom::{
    Classes, Dom, ElementId, ElementSpec, EventKind, Listener, MountedElement, UiEvent, classes,
};
use crate::engine::{BaseEngine, WeakEngine};
use crate::notify::Notifier;
use mdp_core::{FeatureId, ModeChangeError, ModeId, ModeParams, ScaleRotateParams};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Why a toolbar action failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error(transparent)]
    ModeChange(#[from] ModeChangeError),

    #[error("Please select at least one feature to {action}")]
    NothingSelected { action: &'static str },
}

/// What a handler gets to work with.
pub struct ActionContext<'a> {
    pub engine: &'a mut dyn BaseEngine,
    pub notifier: &'a dyn Notifier,
}

impl ActionContext<'_> {
    /// The current selection, or an error naming `action`.
    pub fn require_selection(&self, action: &'static str) -> Result<Vec<FeatureId>, ActionError> {
        let selected = self.engine.selected();
        if selected.is_empty() {
            return Err(ActionError::NothingSelected { action });
        }
        Ok(selected.to_vec())
    }

    pub fn change_mode(&mut self, mode: &str, params: ModeParams) -> Result<(), ActionError> {
        self.engine.change_mode(ModeId::intern(mode), params)?;
        Ok(())
    }
}

pub type ActionHandler = Rc<dyn Fn(&mut ActionContext<'_>) -> Result<(), ActionError>>;

/// One toolbar button.
pub struct ActionDescriptor {
    pub on: EventKind,
    pub handler: ActionHandler,
    pub classes: Classes,
    pub title: Option<String>,
    mounted: Option<MountedElement>,
}

impl ActionDescriptor {
    pub fn new(
        on: EventKind,
        class_names: &[&str],
        handler: impl Fn(&mut ActionContext<'_>) -> Result<(), ActionError> + 'static,
    ) -> Self {
        Self {
            on,
            handler: Rc::new(handler),
            classes: classes(class_names),
            title: None,
            mounted: None,
        }
    }

    /// A button that reacts to clicks.
    pub fn click(
        class_names: &[&str],
        handler: impl Fn(&mut ActionContext<'_>) -> Result<(), ActionError> + 'static,
    ) -> Self {
        Self::new(EventKind::Click, class_names, handler)
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn element(&self) -> Option<ElementId> {
        self.mounted.map(|m| m.element)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Name used in log lines.
    pub fn label(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.classes.join(" "))
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("on", &self.on)
            .field("classes", &self.classes)
            .field("title", &self.title)
            .field("mounted", &self.mounted)
            .finish()
    }
}

/// Run `handler` against the engine behind `engine`, reporting failures.
/// Returns whether the handler succeeded.
pub fn run_action(
    label: &str,
    handler: &ActionHandler,
    engine: &WeakEngine,
    notifier: &dyn Notifier,
) -> bool {
    let Some(shared) = engine.upgrade() else {
        log::warn!("{label}: draw engine is gone, action ignored");
        return false;
    };
    let Ok(mut guard) = shared.try_borrow_mut() else {
        log::warn!("{label}: draw engine busy, action ignored");
        return false;
    };
    let mut cx = ActionContext {
        engine: &mut *guard,
        notifier,
    };
    match handler(&mut cx) {
        Ok(()) => true,
        Err(err) => {
            notifier.alert(&err.to_string());
            log::error!("{label}: {err}");
            false
        }
    }
}

/// An ordered list of toolbar actions mounted into one container.
#[derive(Debug, Default)]
pub struct ActionSet {
    actions: Vec<ActionDescriptor>,
}

impl ActionSet {
    pub fn new(actions: Vec<ActionDescriptor>) -> Self {
        Self { actions }
    }

    pub fn push(&mut self, action: ActionDescriptor) {
        self.actions.push(action);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Elements of the mounted actions, in order.
    pub fn elements(&self) -> Vec<ElementId> {
        self.actions.iter().filter_map(|a| a.element()).collect()
    }

    /// Create one button per action, in order, and append them to
    /// `container`. Already mounted actions are skipped.
    pub fn mount(
        &mut self,
        dom: &mut dyn Dom,
        container: ElementId,
        engine: WeakEngine,
        notifier: Rc<dyn Notifier>,
    ) {
        for action in self.actions.iter_mut().filter(|a| !a.is_mounted()) {
            let label = action.label();
            let handler = action.handler.clone();
            let engine = engine.clone();
            let notifier = notifier.clone();
            let listener: Listener = Rc::new(move |_: &UiEvent| {
                run_action(&label, &handler, &engine, notifier.as_ref());
            });
            let spec = ElementSpec::button(&action.classes, action.title.as_deref());
            action.mounted = Some(MountedElement::mount(
                dom, container, &spec, action.on, listener,
            ));
        }
    }

    /// Remove every listener and button this set mounted.
    pub fn unmount(&mut self, dom: &mut dyn Dom) {
        for action in &mut self.actions {
            if let Some(mounted) = action.mounted.take() {
                mounted.release(dom);
            }
        }
    }
}

// ─── Builtin toolbar ─────────────────────────────────────────────────────

pub const SPLIT_LINE_PROMPT: &str = "Which Mode? (point, line_string, polygon)";

/// The split/cut/rotate/pin buttons added next to the base controls.
pub fn pro_toolbar() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::click(&["split-line"], |cx| {
            let Some(answer) = cx.notifier.prompt(SPLIT_LINE_PROMPT) else {
                log::debug!("split-line prompt cancelled");
                return Ok(());
            };
            let params = ModeParams::new().with("spliter", answer.trim());
            cx.change_mode("splitLineMode", params)
        }),
        ActionDescriptor::click(&["split-polygon"], |cx| {
            cx.change_mode("splitPolygonMode", ModeParams::new())
        }),
        ActionDescriptor::click(&["cut-polygon"], |cx| {
            cx.change_mode("cutPolygonMode", ModeParams::new())
        }),
        ActionDescriptor::click(&["rotate-icon"], |cx| {
            cx.change_mode("scaleRotateMode", ScaleRotateParams::toolbar_default().to_params())
        }),
        ActionDescriptor::click(&["pinning_mode"], |cx| {
            cx.change_mode("pinning_mode", ModeParams::new())
        })
        .with_title("Pinning Mode tool"),
    ]
}

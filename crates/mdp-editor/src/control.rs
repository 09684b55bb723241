//! The map control hosts add: base engine buttons, the builtin toolbar,
//! and the sibling bars mounted shortly after.
//!
//! ```text
//!            attach                       detach
//! DETACHED ─────────▶ ATTACHED ─────────────────────▶ DETACHED
//!                        │ defer(AUX_MOUNT_DELAY)          │ epoch += 1
//!                        ▼                                 ▼
//!              sibling bars added             siblings removed, or the
//!              (if epoch unchanged)           pending mount skipped
//! ```

use crate::actions::{ActionDescriptor, ActionSet, pro_toolbar};
use crate::additional::AdditionalToolsBar;
use crate::dom::ElementId;
use crate::engine::{DrawEngine, SharedEngine};
use crate::map::{HostMap, MapControl, Placement, SharedControl};
use crate::modes::builtin_modes;
use crate::notify::{LogNotifier, Notifier};
use crate::toggles::{AuxiliaryControlBar, snap_toggles};
use mdp_core::{
    DrawOptions, ModeChangeError, ModeFactory, ModeId, ModeRegistry, OptionsOverrides, Snapper,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Delay between attach and mounting the sibling bars, so the host has
/// inserted the main control first.
pub const AUX_MOUNT_DELAY: Duration = Duration::from_millis(400);

/// Toolbar composition, independent of how the engine was built.
pub struct ToolbarConfig {
    /// Appended after the builtin toolbar actions.
    pub extra_actions: Vec<ActionDescriptor>,
    /// Corner for the sibling bars; `None` uses the map default.
    pub sibling_placement: Option<Placement>,
    pub additional_tools: bool,
    pub notifier: Rc<dyn Notifier>,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            extra_actions: Vec::new(),
            sibling_placement: None,
            additional_tools: true,
            notifier: Rc::new(LogNotifier),
        }
    }
}

/// Everything `DrawControl::new` needs.
#[derive(Default)]
pub struct ControlConfig {
    /// Caller modes, merged over the builtins. Same identifier wins.
    pub modes: Vec<(ModeId, ModeFactory)>,
    pub options: OptionsOverrides,
    pub snapper: Option<Box<dyn Snapper>>,
    pub toolbar: ToolbarConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Detached,
    Attached { container: ElementId },
}

pub struct DrawControl {
    engine: SharedEngine,
    actions: ActionSet,
    notifier: Rc<dyn Notifier>,
    sibling_placement: Option<Placement>,
    additional_tools: bool,
    lifecycle: Lifecycle,
    /// Bumped on every attach and detach; a deferred mount only runs if
    /// the epoch it was scheduled in is still current.
    epoch: Rc<Cell<u64>>,
    siblings: Rc<RefCell<Vec<SharedControl>>>,
}

impl DrawControl {
    /// Build the registry and options, construct a [`DrawEngine`], and wrap
    /// it in a detached control.
    pub fn new(config: ControlConfig) -> Result<Self, ModeChangeError> {
        let ControlConfig {
            modes,
            options,
            snapper,
            toolbar,
        } = config;
        let registry = ModeRegistry::merge(builtin_modes(), modes);
        let options = DrawOptions::default().merge(options);
        let mut engine = DrawEngine::new(registry, options, toolbar.notifier.clone())?;
        if let Some(snapper) = snapper {
            engine.set_snapper(snapper);
        }
        let engine: SharedEngine = Rc::new(RefCell::new(engine));
        Ok(Self::with_engine(engine, toolbar))
    }

    /// Wrap an existing engine.
    pub fn with_engine(engine: SharedEngine, toolbar: ToolbarConfig) -> Self {
        let mut actions = ActionSet::new(pro_toolbar());
        for action in toolbar.extra_actions {
            actions.push(action);
        }
        Self {
            engine,
            actions,
            notifier: toolbar.notifier,
            sibling_placement: toolbar.sibling_placement,
            additional_tools: toolbar.additional_tools,
            lifecycle: Lifecycle::Detached,
            epoch: Rc::new(Cell::new(0)),
            siblings: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Attached { .. })
    }

    pub fn container(&self) -> Option<ElementId> {
        match self.lifecycle {
            Lifecycle::Attached { container } => Some(container),
            Lifecycle::Detached => None,
        }
    }

    /// Sibling controls currently mounted by the deferred step.
    pub fn sibling_count(&self) -> usize {
        self.siblings.borrow().len()
    }

    pub fn attach(&mut self, map: &mut dyn HostMap) -> ElementId {
        if let Lifecycle::Attached { container } = self.lifecycle {
            log::warn!("draw control is already attached; keeping the existing toolbar");
            return container;
        }
        let this = Rc::downgrade(&self.engine);
        let container = self.engine.borrow_mut().on_add(map.dom(), this.clone());
        self.actions
            .mount(map.dom(), container, this, self.notifier.clone());
        self.lifecycle = Lifecycle::Attached { container };

        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        self.schedule_siblings(map, epoch);
        log::debug!("draw control attached");
        container
    }

    fn schedule_siblings(&self, map: &mut dyn HostMap, epoch: u64) {
        let current = Rc::clone(&self.epoch);
        let siblings = Rc::clone(&self.siblings);
        let engine = Rc::downgrade(&self.engine);
        let options = self.engine.borrow().options().clone();
        let notifier = self.notifier.clone();
        let placement = self.sibling_placement;
        let additional_tools = self.additional_tools;

        map.defer(
            AUX_MOUNT_DELAY,
            Box::new(move |map: &mut dyn HostMap| {
                if current.get() != epoch {
                    log::debug!("draw control detached before sibling mount; skipping");
                    return;
                }
                let mut added: Vec<SharedControl> = Vec::new();
                if additional_tools {
                    added.push(Rc::new(RefCell::new(AdditionalToolsBar::new(
                        engine, notifier,
                    ))));
                }
                added.push(Rc::new(RefCell::new(AuxiliaryControlBar::new(
                    options,
                    snap_toggles(),
                ))));
                for control in added {
                    map.add_control(control.clone(), placement);
                    siblings.borrow_mut().push(control);
                }
            }),
        );
    }

    pub fn detach(&mut self, map: &mut dyn HostMap) {
        if self.lifecycle == Lifecycle::Detached {
            log::warn!("draw control is not attached; nothing to detach");
            return;
        }
        self.epoch.set(self.epoch.get() + 1);
        // reverse of attach: siblings, toolbar, then the engine's group
        let siblings = std::mem::take(&mut *self.siblings.borrow_mut());
        for control in siblings.iter().rev() {
            map.remove_control(control);
        }
        self.actions.unmount(map.dom());
        self.engine.borrow_mut().on_remove(map.dom());
        self.lifecycle = Lifecycle::Detached;
        log::debug!("draw control detached");
    }
}

impl MapControl for DrawControl {
    fn on_add(&mut self, map: &mut dyn HostMap) -> ElementId {
        self.attach(map)
    }

    fn on_remove(&mut self, map: &mut dyn HostMap) {
        self.detach(map);
    }
}

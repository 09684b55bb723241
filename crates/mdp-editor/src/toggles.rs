//! Checkbox toggles bound to live option flags, and the auxiliary control
//! bar that hosts them.
//!
//! Binding is two-way: a checkbox change writes its flag, and a flag
//! changed any other way (`setSnap`, another bar) is reflected back into
//! the checkbox while the bar is mounted.

use crate::dom::{
    CONTROL_GROUP_CLASSES, CheckedSetter, Classes, ElementId, ElementSpec, EventKind, Listener,
    MountedElement, UiEvent, classes,
};
use crate::map::{HostMap, MapControl};
use mdp_core::{LiveOptions, OptionChange, OptionFlag, Subscription};
use std::cell::Cell;
use std::rc::Rc;

/// One checkbox and the option flag it writes.
#[derive(Debug, Clone)]
pub struct ToggleDescriptor {
    pub on: EventKind,
    pub flag: OptionFlag,
    pub classes: Classes,
    pub title: Option<String>,
    mounted: Option<MountedElement>,
}

impl ToggleDescriptor {
    pub fn new(flag: OptionFlag, class_names: &[&str], title: &str) -> Self {
        Self {
            on: EventKind::Change,
            flag,
            classes: classes(class_names),
            title: Some(title.to_string()),
            mounted: None,
        }
    }

    pub fn element(&self) -> Option<ElementId> {
        self.mounted.map(|m| m.element)
    }
}

/// The snap and guides checkboxes.
pub fn snap_toggles() -> Vec<ToggleDescriptor> {
    vec![
        ToggleDescriptor::new(OptionFlag::Snap, &["snap_mode", "snap"], "Snap when Draw"),
        ToggleDescriptor::new(OptionFlag::Guides, &["snap_mode", "grid"], "Show Guides"),
    ]
}

/// A control group of option checkboxes, mounted as its own map control.
#[derive(Debug)]
pub struct AuxiliaryControlBar {
    options: LiveOptions,
    toggles: Vec<ToggleDescriptor>,
    container: Option<ElementId>,
    subscription: Option<Subscription>,
    /// Cleared by `on_remove`; an observer already queued for dispatch
    /// checks it before touching the checkboxes.
    mounted: Rc<Cell<bool>>,
}

impl AuxiliaryControlBar {
    pub fn new(options: LiveOptions, toggles: Vec<ToggleDescriptor>) -> Self {
        Self {
            options,
            toggles,
            container: None,
            subscription: None,
            mounted: Rc::new(Cell::new(false)),
        }
    }

    /// Push flag changes into the mounted checkboxes.
    fn follow_options(&mut self, setters: Vec<(OptionFlag, CheckedSetter)>) {
        let mounted = Rc::new(Cell::new(true));
        self.mounted = mounted.clone();
        let subscription = self.options.subscribe(move |change| {
            let OptionChange::Flag { flag, value } = change else {
                return;
            };
            if !mounted.get() {
                return;
            }
            for (_, set) in setters.iter().filter(|(f, _)| f == flag) {
                set(*value);
            }
        });
        self.subscription = Some(subscription);
    }

    pub fn container(&self) -> Option<ElementId> {
        self.container
    }

    pub fn toggles(&self) -> &[ToggleDescriptor] {
        &self.toggles
    }
}

impl MapControl for AuxiliaryControlBar {
    fn on_add(&mut self, map: &mut dyn HostMap) -> ElementId {
        if let Some(container) = self.container {
            log::warn!("auxiliary bar is already mounted");
            return container;
        }
        let dom = map.dom();
        let container = dom.create_element(&ElementSpec::container(&CONTROL_GROUP_CLASSES));
        let mut setters = Vec::new();
        for toggle in self.toggles.iter_mut().filter(|t| t.mounted.is_none()) {
            let checked = self.options.flag(toggle.flag);
            let options = self.options.clone();
            let flag = toggle.flag;
            let listener: Listener = Rc::new(move |event: &UiEvent| {
                if let Some(checked) = event.checked {
                    log::debug!("{flag} toggled to {checked}");
                    options.set_flag(flag, checked);
                }
            });
            let spec = ElementSpec::checkbox(&toggle.classes, toggle.title.as_deref(), checked);
            let mounted = MountedElement::mount(dom, container, &spec, toggle.on, listener);
            if let Some(set) = dom.checked_setter(mounted.element) {
                setters.push((flag, set));
            }
            toggle.mounted = Some(mounted);
        }
        self.follow_options(setters);
        self.container = Some(container);
        container
    }

    fn on_remove(&mut self, map: &mut dyn HostMap) {
        self.mounted.set(false);
        if let Some(subscription) = self.subscription.take() {
            self.options.unsubscribe(subscription);
        }
        let dom = map.dom();
        // only what this bar mounted
        for toggle in &mut self.toggles {
            if let Some(mounted) = toggle.mounted.take() {
                mounted.release(dom);
            }
        }
        if let Some(container) = self.container.take() {
            dom.remove_element(container);
        }
    }
}

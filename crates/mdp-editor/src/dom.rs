//! Document abstraction for toolbar UI.
//!
//! The control only ever creates buttons, checkboxes and container divs,
//! wires one listener per element, and removes both again on detach. The
//! `Dom` trait is that surface, plus a way to reflect option changes back
//! into checkboxes. The browser bridge implements it over `web-sys`,
//! headless hosts and tests use [`crate::headless::MemoryDom`].

use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

/// Class every toolbar button and checkbox carries, so host map styles apply.
pub const BUTTON_CLASS: &str = "mapbox-gl-draw_ctrl-draw-btn";

/// Classes of a control group container.
pub const CONTROL_GROUP_CLASSES: [&str; 2] = ["mapboxgl-ctrl-group", "mapboxgl-ctrl"];

/// Visual classification tags of an element.
pub type Classes = SmallVec<[String; 4]>;

/// Collect string slices into [`Classes`].
pub fn classes(names: &[&str]) -> Classes {
    names.iter().map(|c| (*c).to_string()).collect()
}

/// Opaque handle to an element created through a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

impl ListenerId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementTag {
    Div,
    Button,
    /// `<input type="checkbox">`
    Checkbox,
}

/// DOM events the toolbars listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Change,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Change => "change",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a listener receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiEvent {
    pub kind: EventKind,
    /// Checked state of the target, for checkbox change events.
    pub checked: Option<bool>,
}

impl UiEvent {
    pub fn click() -> Self {
        Self {
            kind: EventKind::Click,
            checked: None,
        }
    }

    pub fn change(checked: bool) -> Self {
        Self {
            kind: EventKind::Change,
            checked: Some(checked),
        }
    }
}

pub type Listener = Rc<dyn Fn(&UiEvent)>;

/// Writes a checkbox's checked state without firing `change`. Holds its
/// own handle to the element, so it can run outside any `Dom` borrow.
pub type CheckedSetter = Rc<dyn Fn(bool)>;

/// Everything needed to create one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    pub tag: ElementTag,
    pub classes: Classes,
    pub title: Option<String>,
    pub checked: bool,
}

impl ElementSpec {
    pub fn container(names: &[&str]) -> Self {
        Self {
            tag: ElementTag::Div,
            classes: classes(names),
            title: None,
            checked: false,
        }
    }

    /// A toolbar button: the shared button class followed by `extra`.
    pub fn button(extra: &[String], title: Option<&str>) -> Self {
        Self {
            tag: ElementTag::Button,
            classes: Self::with_button_class(extra),
            title: title.map(str::to_string),
            checked: false,
        }
    }

    pub fn checkbox(extra: &[String], title: Option<&str>, checked: bool) -> Self {
        Self {
            tag: ElementTag::Checkbox,
            classes: Self::with_button_class(extra),
            title: title.map(str::to_string),
            checked,
        }
    }

    fn with_button_class(extra: &[String]) -> Classes {
        std::iter::once(BUTTON_CLASS.to_string())
            .chain(extra.iter().cloned())
            .collect()
    }
}

/// Minimal document surface the toolbars need.
pub trait Dom {
    fn create_element(&mut self, spec: &ElementSpec) -> ElementId;

    fn append_child(&mut self, parent: ElementId, child: ElementId);

    /// Detach `element` from the document. Listeners must be removed first.
    fn remove_element(&mut self, element: ElementId);

    fn add_listener(&mut self, element: ElementId, kind: EventKind, listener: Listener)
    -> ListenerId;

    fn remove_listener(&mut self, element: ElementId, listener: ListenerId);

    /// Setter for the checked state of a checkbox; `None` for other
    /// elements.
    fn checked_setter(&mut self, element: ElementId) -> Option<CheckedSetter>;
}

/// An element plus the listener wired to it, owned by whatever mounted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountedElement {
    pub element: ElementId,
    pub listener: ListenerId,
}

impl MountedElement {
    /// Create `spec`, wire `listener` for `kind`, and append to `parent`.
    pub fn mount(
        dom: &mut dyn Dom,
        parent: ElementId,
        spec: &ElementSpec,
        kind: EventKind,
        listener: Listener,
    ) -> Self {
        let element = dom.create_element(spec);
        let listener = dom.add_listener(element, kind, listener);
        dom.append_child(parent, element);
        Self { element, listener }
    }

    /// Remove the listener, then the element.
    pub fn release(self, dom: &mut dyn Dom) {
        dom.remove_listener(self.element, self.listener);
        dom.remove_element(self.element);
    }
}

//! The host map surface the control plugs into.
//!
//! A map owns a document, a set of corner containers, and a list of
//! controls. `add_control` calls the control's `on_add` and appends the
//! returned element to a corner; `remove_control` calls `on_remove`.

use crate::dom::{Dom, ElementId};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Map corner a control is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Placement {
    pub const ALL: [Placement; 4] = [
        Placement::TopLeft,
        Placement::TopRight,
        Placement::BottomLeft,
        Placement::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Placement::TopLeft => "top-left",
            Placement::TopRight => "top-right",
            Placement::BottomLeft => "bottom-left",
            Placement::BottomRight => "bottom-right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// Something a map can host.
pub trait MapControl {
    /// Build the control's UI and return its root element. The map appends
    /// it to a corner container.
    fn on_add(&mut self, map: &mut dyn HostMap) -> ElementId;

    /// Tear down everything `on_add` created.
    fn on_remove(&mut self, map: &mut dyn HostMap);
}

pub type SharedControl = Rc<RefCell<dyn MapControl>>;

/// Work scheduled to run on the map after a delay.
pub type DeferredTask = Box<dyn FnOnce(&mut dyn HostMap)>;

pub trait HostMap {
    fn dom(&mut self) -> &mut dyn Dom;

    /// Mount `control`. `None` uses the map's default corner.
    fn add_control(&mut self, control: SharedControl, placement: Option<Placement>);

    /// Unmount a previously added control. Unknown controls are ignored.
    fn remove_control(&mut self, control: &SharedControl);

    /// Run `task` once after `delay`.
    fn defer(&mut self, delay: Duration, task: DeferredTask);
}

/// Identity comparison of two shared controls.
pub fn same_control(a: &SharedControl, b: &SharedControl) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

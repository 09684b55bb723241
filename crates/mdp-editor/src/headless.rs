//! In-memory host: a document tree, a map with corners and a virtual clock,
//! and a notifier that records what it was asked. Used by tests and by
//! hosts that drive the control without a browser.

use crate::dom::{
    CheckedSetter, Dom, ElementId, ElementSpec, ElementTag, EventKind, Listener, ListenerId,
    UiEvent,
};
use crate::map::{DeferredTask, HostMap, Placement, SharedControl, same_control};
use crate::notify::Notifier;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

// ─── Document ────────────────────────────────────────────────────────────

struct Node {
    spec: ElementSpec,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
    /// Shared with checked setters handed out for this node.
    checked: Rc<Cell<bool>>,
}

/// Document tree kept in memory. Element handles index into a node arena;
/// removed elements stay in the arena, detached.
pub struct MemoryDom {
    nodes: Vec<Node>,
    body: ElementId,
    next_listener: u32,
    removed: Vec<ElementId>,
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            body: ElementId::from_raw(0),
            next_listener: 0,
            removed: Vec::new(),
        };
        dom.body = dom.create_element(&ElementSpec::container(&["body"]));
        dom
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.raw() as usize)
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(element.raw() as usize)
    }

    /// Whether `element` is reachable from the body.
    pub fn is_connected(&self, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    /// Connected elements carrying `class`, in document order.
    pub fn query(&self, class: &str) -> Vec<ElementId> {
        let mut found = Vec::new();
        let mut stack = vec![self.body];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if node.spec.classes.iter().any(|c| c == class) {
                found.push(id);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    /// The single connected element carrying `class`, if exactly one exists.
    pub fn find(&self, class: &str) -> Option<ElementId> {
        match self.query(class).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.node(element).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn classes(&self, element: ElementId) -> &[String] {
        self.node(element).map(|n| n.spec.classes.as_slice()).unwrap_or(&[])
    }

    pub fn title(&self, element: ElementId) -> Option<&str> {
        self.node(element).and_then(|n| n.spec.title.as_deref())
    }

    pub fn tag(&self, element: ElementId) -> Option<ElementTag> {
        self.node(element).map(|n| n.spec.tag)
    }

    pub fn is_checked(&self, element: ElementId) -> bool {
        self.node(element).is_some_and(|n| n.checked.get())
    }

    /// Every `remove_element` call so far, oldest first.
    pub fn removal_order(&self) -> &[ElementId] {
        &self.removed
    }

    /// Listeners registered anywhere, connected or not.
    pub fn listener_count(&self) -> usize {
        self.nodes.iter().map(|n| n.listeners.len()).sum()
    }

    /// Simulate a user click on `element`.
    pub fn click(&self, element: ElementId) {
        self.dispatch(element, UiEvent::click());
    }

    /// Simulate the user setting a checkbox to `checked`.
    pub fn set_checked(&mut self, element: ElementId, checked: bool) {
        if let Some(node) = self.node(element) {
            node.checked.set(checked);
        }
        self.dispatch(element, UiEvent::change(checked));
    }

    /// Deliver `event` to the listeners of `element`. Listeners are cloned
    /// out first so they may freely touch shared state.
    pub fn dispatch(&self, element: ElementId, event: UiEvent) {
        let listeners: Vec<Listener> = self
            .node(element)
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|(_, kind, _)| *kind == event.kind)
                    .map(|(_, _, l)| l.clone())
                    .collect()
            })
            .unwrap_or_default();
        for listener in listeners {
            listener(&event);
        }
    }

    fn detach(&mut self, element: ElementId) {
        let parent = self.node_mut(element).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.retain(|c| *c != element);
        }
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Dom for MemoryDom {
    fn create_element(&mut self, spec: &ElementSpec) -> ElementId {
        let id = ElementId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node {
            spec: spec.clone(),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
            checked: Rc::new(Cell::new(spec.checked)),
        });
        id
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.detach(child);
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        } else {
            log::warn!("append to unknown element {}", parent.raw());
            return;
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    fn remove_element(&mut self, element: ElementId) {
        self.detach(element);
        self.removed.push(element);
    }

    fn add_listener(
        &mut self,
        element: ElementId,
        kind: EventKind,
        listener: Listener,
    ) -> ListenerId {
        let id = ListenerId::from_raw(self.next_listener);
        self.next_listener += 1;
        if let Some(node) = self.node_mut(element) {
            node.listeners.push((id, kind, listener));
        }
        id
    }

    fn remove_listener(&mut self, element: ElementId, listener: ListenerId) {
        if let Some(node) = self.node_mut(element) {
            node.listeners.retain(|(id, _, _)| *id != listener);
        }
    }

    fn checked_setter(&mut self, element: ElementId) -> Option<CheckedSetter> {
        let node = self.node(element)?;
        if node.spec.tag != ElementTag::Checkbox {
            return None;
        }
        let checked = node.checked.clone();
        Some(Rc::new(move |value: bool| checked.set(value)))
    }
}

// ─── Map ─────────────────────────────────────────────────────────────────

struct Scheduled {
    deadline: Duration,
    task: DeferredTask,
}

/// Map stub with four corner containers and a manually advanced clock.
pub struct MemoryMap {
    dom: MemoryDom,
    corners: HashMap<Placement, ElementId>,
    controls: Vec<SharedControl>,
    now: Duration,
    /// Ordered by insertion; ties on deadline run in that order.
    scheduled: VecDeque<Scheduled>,
}

impl MemoryMap {
    pub fn new() -> Self {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let corners = Placement::ALL
            .into_iter()
            .map(|placement| {
                let class = format!("mapboxgl-ctrl-{}", placement.as_str());
                let corner = dom.create_element(&ElementSpec::container(&[class.as_str()]));
                dom.append_child(body, corner);
                (placement, corner)
            })
            .collect();
        Self {
            dom,
            corners,
            controls: Vec::new(),
            now: Duration::ZERO,
            scheduled: VecDeque::new(),
        }
    }

    pub fn document(&self) -> &MemoryDom {
        &self.dom
    }

    pub fn document_mut(&mut self) -> &mut MemoryDom {
        &mut self.dom
    }

    pub fn corner(&self, placement: Placement) -> Option<ElementId> {
        self.corners.get(&placement).copied()
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduled.len()
    }

    /// Advance the clock by `elapsed` and run every task that came due.
    /// Returns how many ran.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        self.now += elapsed;
        let mut ran = 0;
        while let Some(index) = self.next_due() {
            if let Some(scheduled) = self.scheduled.remove(index) {
                (scheduled.task)(self);
                ran += 1;
            }
        }
        ran
    }

    /// Run every pending task, advancing the clock as far as needed.
    pub fn flush(&mut self) -> usize {
        let latest = self.scheduled.iter().map(|s| s.deadline).max();
        match latest {
            Some(deadline) => self.advance(deadline.saturating_sub(self.now)),
            None => 0,
        }
    }

    fn next_due(&self) -> Option<usize> {
        self.scheduled
            .iter()
            .enumerate()
            .filter(|(_, s)| s.deadline <= self.now)
            .min_by_key(|(i, s)| (s.deadline, *i))
            .map(|(i, _)| i)
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMap")
            .field("controls", &self.controls.len())
            .field("pending_tasks", &self.scheduled.len())
            .field("now", &self.now)
            .finish()
    }
}

impl HostMap for MemoryMap {
    fn dom(&mut self) -> &mut dyn Dom {
        &mut self.dom
    }

    fn add_control(&mut self, control: SharedControl, placement: Option<Placement>) {
        let root = control.borrow_mut().on_add(self);
        if let Some(corner) = self.corner(placement.unwrap_or_default()) {
            self.dom.append_child(corner, root);
        }
        self.controls.push(control);
    }

    fn remove_control(&mut self, control: &SharedControl) {
        let Some(index) = self.controls.iter().position(|c| same_control(c, control)) else {
            log::debug!("remove_control: control not on this map");
            return;
        };
        let control = self.controls.remove(index);
        control.borrow_mut().on_remove(self);
    }

    fn defer(&mut self, delay: Duration, task: DeferredTask) {
        self.scheduled.push_back(Scheduled {
            deadline: self.now + delay,
            task,
        });
    }
}

// ─── Notifier ────────────────────────────────────────────────────────────

/// Notifier that records alerts and answers prompts from a queue.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: RefCell<Vec<String>>,
    prompts: RefCell<Vec<String>>,
    answers: RefCell<VecDeque<Option<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next prompt. `None` cancels.
    pub fn answer(&self, answer: Option<&str>) {
        self.answers
            .borrow_mut()
            .push_back(answer.map(str::to_string));
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn prompt(&self, message: &str) -> Option<String> {
        self.prompts.borrow_mut().push(message.to_string());
        self.answers.borrow_mut().pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MountedElement;
    use crate::map::MapControl;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn removed_element_is_disconnected_with_its_children() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let group = dom.create_element(&ElementSpec::container(&["group"]));
        let button = dom.create_element(&ElementSpec::button(&[], None));
        dom.append_child(body, group);
        dom.append_child(group, button);
        assert!(dom.is_connected(button));

        dom.remove_element(group);
        assert!(!dom.is_connected(group));
        assert!(!dom.is_connected(button));
        assert!(dom.query("group").is_empty());
    }

    #[test]
    fn mounted_element_release_leaves_no_listener() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mounted = MountedElement::mount(
            &mut dom,
            body,
            &ElementSpec::button(&["x".into()], Some("X")),
            EventKind::Click,
            Rc::new(move |_: &UiEvent| counter.set(counter.get() + 1)),
        );
        dom.click(mounted.element);
        assert_eq!(clicks.get(), 1);
        assert_eq!(dom.title(mounted.element), Some("X"));

        mounted.release(&mut dom);
        assert_eq!(dom.listener_count(), 0);
        dom.click(mounted.element);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn change_listener_ignores_clicks() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mounted = MountedElement::mount(
            &mut dom,
            body,
            &ElementSpec::checkbox(&[], None, true),
            EventKind::Change,
            Rc::new(move |e: &UiEvent| log.borrow_mut().push(e.checked)),
        );
        assert!(dom.is_checked(mounted.element));
        dom.click(mounted.element);
        dom.set_checked(mounted.element, false);
        assert_eq!(*seen.borrow(), vec![Some(false)]);
        assert!(!dom.is_checked(mounted.element));
    }

    struct Marker {
        root: Option<ElementId>,
    }

    impl MapControl for Marker {
        fn on_add(&mut self, map: &mut dyn HostMap) -> ElementId {
            let root = map.dom().create_element(&ElementSpec::container(&["marker"]));
            self.root = Some(root);
            root
        }

        fn on_remove(&mut self, map: &mut dyn HostMap) {
            if let Some(root) = self.root.take() {
                map.dom().remove_element(root);
            }
        }
    }

    #[test]
    fn controls_land_in_the_requested_corner() {
        let mut map = MemoryMap::new();
        let marker: SharedControl = Rc::new(RefCell::new(Marker { root: None }));
        map.add_control(marker.clone(), Some(Placement::BottomLeft));

        let root = map.document().find("marker").unwrap();
        let corner = map.corner(Placement::BottomLeft).unwrap();
        assert_eq!(map.document().children(corner), &[root]);

        map.remove_control(&marker);
        assert_eq!(map.control_count(), 0);
        assert!(map.document().find("marker").is_none());
    }

    #[test]
    fn deferred_tasks_wait_for_their_deadline() {
        let mut map = MemoryMap::new();
        let ran = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(400, "late"), (100, "early")] {
            let ran = ran.clone();
            map.defer(
                Duration::from_millis(delay),
                Box::new(move |_: &mut dyn HostMap| ran.borrow_mut().push(tag)),
            );
        }

        assert_eq!(map.advance(Duration::from_millis(99)), 0);
        assert_eq!(map.advance(Duration::from_millis(1)), 1);
        assert_eq!(map.flush(), 1);
        assert_eq!(*ran.borrow(), vec!["early", "late"]);
        assert_eq!(map.pending_tasks(), 0);
    }

    #[test]
    fn recording_notifier_answers_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.answer(Some("point"));
        notifier.answer(None);
        assert_eq!(notifier.prompt("a"), Some("point".to_string()));
        assert_eq!(notifier.prompt("b"), None);
        assert_eq!(notifier.prompt("c"), None);
        assert_eq!(notifier.prompts(), vec!["a", "b", "c"]);
    }
}

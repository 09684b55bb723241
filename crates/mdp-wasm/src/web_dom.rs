//! `Dom` over the browser document.

use mdp_editor::dom::{
    CheckedSetter, Dom, ElementId, ElementSpec, ElementTag, EventKind, Listener, ListenerId,
    UiEvent,
};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlInputElement};

struct WebListener {
    element: Element,
    kind: EventKind,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// Owns every element and listener closure it created. Dropping a
/// listener's closure before unregistering it would leave a dangling
/// callback in JS, so closures live here until `remove_listener`.
pub struct WebDom {
    document: Document,
    elements: HashMap<ElementId, Element>,
    listeners: HashMap<ListenerId, WebListener>,
    next_element: u32,
    next_listener: u32,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            elements: HashMap::new(),
            listeners: HashMap::new(),
            next_element: 0,
            next_listener: 0,
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    fn build(&self, spec: &ElementSpec) -> Result<Element, JsValue> {
        let tag = match spec.tag {
            ElementTag::Div => "div",
            ElementTag::Button => "button",
            ElementTag::Checkbox => "input",
        };
        let element = self.document.create_element(tag)?;
        element.set_class_name(&spec.classes.join(" "));
        if let Some(title) = &spec.title {
            element.set_attribute("title", title)?;
        }
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_type("checkbox");
            input.set_checked(spec.checked);
        }
        Ok(element)
    }
}

impl Dom for WebDom {
    fn create_element(&mut self, spec: &ElementSpec) -> ElementId {
        let id = ElementId::from_raw(self.next_element);
        self.next_element += 1;
        match self.build(spec) {
            Ok(element) => {
                self.elements.insert(id, element);
            }
            Err(err) => log::error!("failed to create {:?} element: {err:?}", spec.tag),
        }
        id
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        let (Some(parent), Some(child)) = (self.elements.get(&parent), self.elements.get(&child))
        else {
            log::warn!("append_child on an element that was never created");
            return;
        };
        if let Err(err) = parent.append_child(child) {
            log::error!("append_child failed: {err:?}");
        }
    }

    fn remove_element(&mut self, element: ElementId) {
        if let Some(element) = self.elements.remove(&element) {
            element.remove();
        }
    }

    fn add_listener(
        &mut self,
        element: ElementId,
        kind: EventKind,
        listener: Listener,
    ) -> ListenerId {
        let id = ListenerId::from_raw(self.next_listener);
        self.next_listener += 1;
        let Some(target) = self.elements.get(&element) else {
            log::warn!("{kind} listener on an element that was never created");
            return id;
        };
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let ui = match kind {
                EventKind::Click => UiEvent::click(),
                EventKind::Change => UiEvent {
                    kind,
                    checked: event
                        .target()
                        .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                        .map(|input| input.checked()),
                },
            };
            listener(&ui);
        });
        let callback = closure.as_ref().unchecked_ref();
        match target.add_event_listener_with_callback(kind.as_str(), callback) {
            Ok(()) => {
                self.listeners.insert(
                    id,
                    WebListener {
                        element: target.clone(),
                        kind,
                        closure,
                    },
                );
            }
            Err(err) => log::error!("addEventListener({kind}) failed: {err:?}"),
        }
        id
    }

    fn remove_listener(&mut self, _element: ElementId, listener: ListenerId) {
        let Some(entry) = self.listeners.remove(&listener) else {
            return;
        };
        if let Err(err) = entry.element.remove_event_listener_with_callback(
            entry.kind.as_str(),
            entry.closure.as_ref().unchecked_ref(),
        ) {
            log::error!("removeEventListener({}) failed: {err:?}", entry.kind);
        }
    }

    fn checked_setter(&mut self, element: ElementId) -> Option<CheckedSetter> {
        let input = self.elements.get(&element)?.dyn_ref::<HtmlInputElement>()?.clone();
        // setting `checked` from script fires no `change` event
        Some(Rc::new(move |value: bool| input.set_checked(value)))
    }
}

//! The JS map seen through `HostMap`, plus browser alert/prompt.

use crate::web_dom::WebDom;
use js_sys::{Function, Object, Reflect};
use mdp_editor::dom::{Dom, ElementId};
use mdp_editor::map::{DeferredTask, HostMap, Placement, SharedControl, same_control};
use mdp_editor::notify::Notifier;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

/// A sibling control mounted through `map.addControl`.
struct MountedControl {
    control: SharedControl,
    /// The `{ onAdd, onRemove }` object handed to the map.
    handle: Object,
    _on_add: Closure<dyn FnMut() -> JsValue>,
    _on_remove: Closure<dyn FnMut()>,
}

/// Map state shared with timer callbacks through a weak self-reference.
pub struct JsHost {
    map: JsValue,
    dom: WebDom,
    mounted: Vec<MountedControl>,
    this: Weak<RefCell<JsHost>>,
}

impl JsHost {
    pub fn new(map: JsValue, document: Document) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|this| {
            RefCell::new(Self {
                map,
                dom: WebDom::new(document),
                mounted: Vec::new(),
                this: this.clone(),
            })
        })
    }

    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.dom.element(id).cloned()
    }

    fn call_map(&self, method: &str, a: &JsValue, b: &JsValue) -> Result<JsValue, JsValue> {
        let function: Function = Reflect::get(&self.map, &JsValue::from_str(method))?.dyn_into()?;
        function.call2(&self.map, a, b)
    }

    fn mount(
        &mut self,
        control: SharedControl,
        placement: Option<Placement>,
    ) -> Result<(), JsValue> {
        let root = control.borrow_mut().on_add(self);
        let element = self
            .element(root)
            .ok_or_else(|| JsValue::from_str("control root element was not created"))?;

        let on_add = Closure::<dyn FnMut() -> JsValue>::new(move || element.clone().into());
        // the control tears itself down in `remove_control`
        let on_remove = Closure::<dyn FnMut()>::new(|| {});
        let handle = Object::new();
        Reflect::set(&handle, &JsValue::from_str("onAdd"), on_add.as_ref())?;
        Reflect::set(&handle, &JsValue::from_str("onRemove"), on_remove.as_ref())?;

        let position = placement.map_or(JsValue::UNDEFINED, |p| JsValue::from_str(p.as_str()));
        self.mounted.push(MountedControl {
            control,
            handle: handle.clone(),
            _on_add: on_add,
            _on_remove: on_remove,
        });
        self.call_map("addControl", &handle, &position)?;
        Ok(())
    }
}

impl HostMap for JsHost {
    fn dom(&mut self) -> &mut dyn Dom {
        &mut self.dom
    }

    fn add_control(&mut self, control: SharedControl, placement: Option<Placement>) {
        if let Err(err) = self.mount(control, placement) {
            log::error!("addControl failed: {err:?}");
        }
    }

    fn remove_control(&mut self, control: &SharedControl) {
        let Some(index) = self.mounted.iter().position(|m| same_control(&m.control, control)) else {
            log::debug!("removeControl: control was not added through this host");
            return;
        };
        let mounted = self.mounted.remove(index);
        if let Err(err) = self.call_map("removeControl", &mounted.handle, &JsValue::UNDEFINED) {
            log::error!("removeControl failed: {err:?}");
        }
        mounted.control.borrow_mut().on_remove(self);
    }

    fn defer(&mut self, delay: Duration, task: DeferredTask) {
        let host = self.this.clone();
        let callback = Closure::once_into_js(move || {
            let Some(host) = host.upgrade() else {
                log::debug!("map host dropped before deferred task ran");
                return;
            };
            let Ok(mut state) = host.try_borrow_mut() else {
                log::warn!("map host busy; deferred task dropped");
                return;
            };
            task(&mut *state);
        });
        let Some(window) = web_sys::window() else {
            log::error!("no window: deferred task dropped");
            return;
        };
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(err) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            log::error!("setTimeout failed: {err:?}");
        }
    }
}

/// `window.alert` / `window.prompt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNotifier;

impl Notifier for BrowserNotifier {
    fn alert(&self, message: &str) {
        let Some(window) = web_sys::window() else {
            log::warn!("{message}");
            return;
        };
        if let Err(err) = window.alert_with_message(message) {
            log::error!("alert failed: {err:?}");
        }
    }

    fn prompt(&self, message: &str) -> Option<String> {
        web_sys::window()?
            .prompt_with_message(message)
            .ok()
            .flatten()
    }
}

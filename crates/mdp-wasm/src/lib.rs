//! WASM bridge for Map Draw Pro: exposes the draw control to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The exported class is a
//! Mapbox GL / MapLibre `IControl`: pass it to `map.addControl(draw)`.
//! Input is forwarded by the page (`handle_click`, `handle_key`, ...),
//! and feature changes are drained as JSON with `take_mutations`.

mod host;
mod js_mode;
mod web_dom;

pub use host::{BrowserNotifier, JsHost};
pub use js_mode::{JsInputEvent, JsMode, JsModeOutput, JsSnapper, js_error_message};

use js_sys::{Function, JSON, Object, Reflect};
use mdp_core::{
    DrawOptions, FeatureId, InputEvent, LngLat, ModeFactory, ModeId, ModeParams, Modifiers,
    OptionsOverrides, PointerPosition, mode_factory,
};
use mdp_editor::{BaseEngine, ControlConfig, DrawControl, Placement, ToolbarConfig};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// Option keys consumed by the bridge itself; everything else is
/// forwarded to the draw options.
const BRIDGE_KEYS: [&str; 3] = ["modes", "snapper", "siblingPosition"];

/// The map control handed to `map.addControl`.
#[wasm_bindgen]
pub struct MapDrawPro {
    control: DrawControl,
    /// Present while attached.
    host: Option<Rc<RefCell<JsHost>>>,
}

#[wasm_bindgen]
impl MapDrawPro {
    /// Build a control from a plain options object.
    ///
    /// Besides the draw options (`snap`, `guides`, `bufferSize`, ...) it
    /// accepts `modes` (mode objects keyed by identifier, overriding the
    /// builtins), `snapper` (a function resolving snap targets) and
    /// `siblingPosition` (corner for the auxiliary bars).
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<MapDrawPro, JsError> {
        setup_console();
        let config = control_config(&options)?;
        let control = DrawControl::new(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            control,
            host: None,
        })
    }

    /// `IControl.onAdd`: mount the toolbar and return its container.
    #[wasm_bindgen(js_name = onAdd)]
    pub fn on_add(&mut self, map: JsValue) -> Result<Element, JsError> {
        let host = match &self.host {
            Some(host) => host.clone(),
            None => {
                let document = web_sys::window()
                    .and_then(|w| w.document())
                    .ok_or_else(|| JsError::new("no document to mount into"))?;
                let host = JsHost::new(map, document);
                self.host = Some(host.clone());
                host
            }
        };
        let mut state = host
            .try_borrow_mut()
            .map_err(|_| JsError::new("map host is busy"))?;
        let root = self.control.attach(&mut *state);
        state
            .element(root)
            .ok_or_else(|| JsError::new("toolbar container was not created"))
    }

    /// `IControl.onRemove`: tear down everything `onAdd` created.
    #[wasm_bindgen(js_name = onRemove)]
    pub fn on_remove(&mut self) {
        let Some(host) = self.host.take() else {
            log::warn!("onRemove called on a control that is not attached");
            return;
        };
        match host.try_borrow_mut() {
            Ok(mut state) => self.control.detach(&mut *state),
            Err(_) => log::error!("map host is busy; control left mounted"),
        };
    }

    /// Switch modes. `params` is a plain object (or undefined).
    #[wasm_bindgen(js_name = changeMode)]
    pub fn change_mode(&self, mode: &str, params: JsValue) -> Result<(), JsError> {
        let params = mode_params(&params)?;
        self.with_engine(|engine| engine.change_mode(ModeId::intern(mode), params))?
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = getMode)]
    pub fn get_mode(&self) -> Result<String, JsError> {
        self.with_engine(|engine| engine.active_mode().to_string())
    }

    #[wasm_bindgen(js_name = setSnap)]
    pub fn set_snap(&self, on: bool) -> Result<(), JsError> {
        self.with_engine(|engine| engine.options().set_snap(on))
    }

    #[wasm_bindgen(js_name = setGuides)]
    pub fn set_guides(&self, on: bool) -> Result<(), JsError> {
        self.with_engine(|engine| engine.options().set_guides(on))
    }

    /// Current draw options as JSON.
    #[wasm_bindgen(js_name = getOptions)]
    pub fn get_options(&self) -> Result<String, JsError> {
        let options = self.with_engine(|engine| engine.options().snapshot())?;
        serde_json::to_string(&options).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Selected feature ids as a JSON array.
    #[wasm_bindgen(js_name = getSelectedIds)]
    pub fn get_selected_ids(&self) -> Result<String, JsError> {
        let ids = self.with_engine(|engine| engine.selected().to_vec())?;
        serde_json::to_string(&ids).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Replace the selection with a JSON array of feature ids.
    #[wasm_bindgen(js_name = setSelectedIds)]
    pub fn set_selected_ids(&self, ids_json: &str) -> Result<(), JsError> {
        let ids: Vec<FeatureId> =
            serde_json::from_str(ids_json).map_err(|e| JsError::new(&e.to_string()))?;
        self.with_engine(|engine| engine.set_selected(ids))
    }

    // ─── Input ───────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &self,
        x: f64,
        y: f64,
        lng: f64,
        lat: f64,
        hit: Option<String>,
        shift: bool,
        alt: bool,
    ) -> Result<(), JsError> {
        self.input(InputEvent::PointerDown {
            at: position(x, y, lng, lat, hit),
            modifiers: modifiers(shift, alt),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_move(
        &self,
        x: f64,
        y: f64,
        lng: f64,
        lat: f64,
        hit: Option<String>,
        shift: bool,
        alt: bool,
    ) -> Result<(), JsError> {
        self.input(InputEvent::PointerMove {
            at: position(x, y, lng, lat, hit),
            modifiers: modifiers(shift, alt),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(
        &self,
        x: f64,
        y: f64,
        lng: f64,
        lat: f64,
        hit: Option<String>,
        shift: bool,
        alt: bool,
    ) -> Result<(), JsError> {
        self.input(InputEvent::PointerUp {
            at: position(x, y, lng, lat, hit),
            modifiers: modifiers(shift, alt),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_click(
        &self,
        x: f64,
        y: f64,
        lng: f64,
        lat: f64,
        hit: Option<String>,
        shift: bool,
        alt: bool,
    ) -> Result<(), JsError> {
        self.input(InputEvent::Click {
            at: position(x, y, lng, lat, hit),
            modifiers: modifiers(shift, alt),
        })
    }

    pub fn handle_double_click(
        &self,
        x: f64,
        y: f64,
        lng: f64,
        lat: f64,
        hit: Option<String>,
    ) -> Result<(), JsError> {
        self.input(InputEvent::DoubleClick {
            at: position(x, y, lng, lat, hit),
        })
    }

    /// `KeyboardEvent.key` of a released key.
    pub fn handle_key(&self, key: &str) -> Result<(), JsError> {
        self.input(InputEvent::key(key))
    }

    pub fn trash(&self) -> Result<(), JsError> {
        self.with_engine(|engine| engine.trash())
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Drain queued feature mutations and edit requests as a JSON array.
    pub fn take_mutations(&self) -> Result<String, JsError> {
        let mutations = self.with_engine(|engine| engine.take_mutations())?;
        serde_json::to_string(&mutations).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Transient overlay of the active mode as a JSON array.
    pub fn render(&self) -> Result<String, JsError> {
        let features = self.with_engine(|engine| engine.render())?;
        serde_json::to_string(&features).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl MapDrawPro {
    /// Run `f` on the engine. Fails instead of panicking when a JS mode
    /// hook calls back into the control while the engine is working.
    fn with_engine<R>(&self, f: impl FnOnce(&mut dyn BaseEngine) -> R) -> Result<R, JsError> {
        let engine = self.control.engine();
        let mut engine = engine
            .try_borrow_mut()
            .map_err(|_| JsError::new("draw engine is busy"))?;
        Ok(f(&mut *engine))
    }

    fn input(&self, event: InputEvent) -> Result<(), JsError> {
        self.with_engine(|engine| engine.handle_input(&event))
    }
}

fn position(x: f64, y: f64, lng: f64, lat: f64, hit: Option<String>) -> PointerPosition {
    let at = PointerPosition::new(x, y, LngLat::new(lng, lat));
    match hit {
        Some(id) => at.with_hit(FeatureId::intern(&id)),
        None => at,
    }
}

fn modifiers(shift: bool, alt: bool) -> Modifiers {
    Modifiers {
        shift,
        alt,
        ..Modifiers::NONE
    }
}

fn js_error(err: JsValue) -> JsError {
    JsError::new(&js_error_message(&err))
}

fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

fn mode_params(value: &JsValue) -> Result<ModeParams, JsError> {
    if is_absent(value) {
        return Ok(ModeParams::new());
    }
    let json = JSON::stringify(value)
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();
    let value: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| JsError::new(&e.to_string()))?;
    ModeParams::from_value(value).ok_or_else(|| JsError::new("mode parameters must be an object"))
}

// ─── Configuration ───────────────────────────────────────────────────────

fn control_config(options: &JsValue) -> Result<ControlConfig, JsError> {
    if is_absent(options) {
        return Ok(ControlConfig {
            toolbar: browser_toolbar(None),
            ..ControlConfig::default()
        });
    }
    let options: &Object = options
        .dyn_ref()
        .ok_or_else(|| JsError::new("options must be an object"))?;
    let get = |key: &str| Reflect::get(options, &JsValue::from_str(key)).map_err(js_error);

    let modes = js_modes(&get("modes")?)?;
    let snapper = get("snapper")?;
    let snapper = match snapper.dyn_into::<Function>() {
        Ok(function) => Some(Box::new(JsSnapper::new(function)) as Box<dyn mdp_core::Snapper>),
        Err(other) if is_absent(&other) => None,
        Err(_) => return Err(JsError::new("`snapper` must be a function")),
    };
    let sibling_placement = get("siblingPosition")?
        .as_string()
        .and_then(|s| Placement::parse(&s));

    let rest = Object::assign(&Object::new(), options);
    for key in BRIDGE_KEYS {
        Reflect::delete_property(&rest, &JsValue::from_str(key)).map_err(js_error)?;
    }
    let json = JSON::stringify(&rest)
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();
    let overrides = OptionsOverrides::from_json(&json).map_err(|e| JsError::new(&e.to_string()))?;

    Ok(ControlConfig {
        modes,
        options: overrides,
        snapper,
        toolbar: browser_toolbar(sibling_placement),
    })
}

fn browser_toolbar(sibling_placement: Option<Placement>) -> ToolbarConfig {
    ToolbarConfig {
        sibling_placement,
        notifier: Rc::new(BrowserNotifier),
        ..ToolbarConfig::default()
    }
}

/// `{ id: modeObject }` into registry overrides. The same JS object serves
/// every activation of its mode.
fn js_modes(value: &JsValue) -> Result<Vec<(ModeId, ModeFactory)>, JsError> {
    if is_absent(value) {
        return Ok(Vec::new());
    }
    let object: &Object = value
        .dyn_ref()
        .ok_or_else(|| JsError::new("`modes` must be an object"))?;
    let mut modes = Vec::new();
    for key in Object::keys(object).iter() {
        let Some(name) = key.as_string() else {
            continue;
        };
        let mode = Reflect::get(object, &key).map_err(js_error)?;
        log::debug!("registering JS mode {name}");
        modes.push((
            ModeId::intern(&name),
            mode_factory(move || JsMode::new(mode.clone())),
        ));
    }
    Ok(modes)
}

// ─── Console logging and panic hook ──────────────────────────────────────

fn setup_console() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SETUP: Once = Once::new();
        SETUP.call_once(|| {
            if let Err(err) = console_log::init_with_level(log::Level::Debug) {
                web_sys::console::warn_1(&format!("console logger not installed: {err}").into());
            }
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Map Draw Pro WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no map needed) ───────────────────────────────

/// Validate draw options JSON. Returns `{"ok":true,"options":{...}}` with
/// the merged options, or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_options(json: &str) -> String {
    let result = OptionsOverrides::from_json(json).map_err(|e| e.to_string());
    let result = result.map(|overrides| DrawOptions::default().merge(overrides));
    let response = match result {
        Ok(options) => serde_json::json!({ "ok": true, "options": options }),
        Err(error) => serde_json::json!({ "ok": false, "error": error }),
    };
    response.to_string()
}

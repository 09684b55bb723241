//! Caller-supplied modes and snappers written in JavaScript.
//!
//! A JS mode is a plain object with any of `onSetup(args)`, `onEnter()`,
//! `onEvent(event)` and `onExit()`. `onSetup` rejects the mode change by
//! throwing. The others may return a [`JsModeOutput`]-shaped object.

use js_sys::{Function, JSON, Reflect};
use mdp_core::{
    Feature, FeatureId, FeatureMutation, Geometry, InputEvent, LngLat, Mode, ModeChangeError,
    ModeContext, ModeId, ModeParams, PointerPosition, SnapOptions, Snapper,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// An input event as JS modes receive it.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JsInputEvent<'a> {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng_lat: Option<LngLat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit: Option<FeatureId>,
    pub shift: bool,
    pub alt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<&'a str>,
}

impl<'a> From<&'a InputEvent> for JsInputEvent<'a> {
    fn from(event: &'a InputEvent) -> Self {
        let (kind, modifiers) = match event {
            InputEvent::PointerDown { modifiers, .. } => ("pointerdown", Some(*modifiers)),
            InputEvent::PointerMove { modifiers, .. } => ("pointermove", Some(*modifiers)),
            InputEvent::PointerUp { modifiers, .. } => ("pointerup", Some(*modifiers)),
            InputEvent::Click { modifiers, .. } => ("click", Some(*modifiers)),
            InputEvent::DoubleClick { .. } => ("dblclick", None),
            InputEvent::Key { .. } => ("keyup", None),
            InputEvent::Trash => ("trash", None),
        };
        let at = event.position();
        Self {
            kind,
            point: at.map(|p| [p.point.x, p.point.y]),
            lng_lat: at.map(|p| p.lng_lat),
            hit: at.and_then(|p| p.hit),
            shift: modifiers.is_some_and(|m| m.shift),
            alt: modifiers.is_some_and(|m| m.alt),
            key: match event {
                InputEvent::Key { key } => Some(key.as_str()),
                _ => None,
            },
        }
    }
}

/// What a JS mode hook may ask for.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct JsModeOutput {
    /// Geometries to add as new features.
    pub add: Vec<Geometry>,
    /// Geometries delivered to the host without being stored.
    pub pass: Vec<Geometry>,
    pub remove: Vec<FeatureId>,
    pub select: Option<Vec<FeatureId>>,
    pub change_mode: Option<ModeId>,
    /// Return to the default mode.
    pub finish: bool,
}

impl JsModeOutput {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn apply(self, ctx: &mut ModeContext<'_>) {
        for geometry in self.add {
            ctx.emit(FeatureMutation::Add(Feature::new(geometry)));
        }
        for geometry in self.pass {
            ctx.emit(FeatureMutation::Passed(Feature::new(geometry)));
        }
        for id in self.remove {
            ctx.emit(FeatureMutation::Remove(id));
        }
        if let Some(ids) = self.select {
            ctx.set_selection(ids);
        }
        if let Some(mode) = self.change_mode {
            ctx.change_mode(mode, ModeParams::new());
        } else if self.finish {
            ctx.finish();
        }
    }
}

#[derive(Serialize)]
struct SetupArgs<'a> {
    params: &'a ModeParams,
    selected: &'a [FeatureId],
}

/// Best-effort message of a thrown JS value.
pub fn js_error_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return error.message().into();
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    let json = serde_json::to_string(value).map_err(|e| e.to_string())?;
    JSON::parse(&json).map_err(|e| js_error_message(&e))
}

fn to_json(value: &JsValue) -> Option<String> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    JSON::stringify(value).ok().and_then(|s| s.as_string())
}

/// A mode implemented by a JS object.
pub struct JsMode {
    object: JsValue,
}

impl JsMode {
    pub fn new(object: JsValue) -> Self {
        Self { object }
    }

    /// Call `method` if the object defines it.
    fn call(&self, method: &str, arg: &JsValue) -> Result<Option<JsValue>, JsValue> {
        let value = Reflect::get(&self.object, &JsValue::from_str(method))?;
        let Some(function) = value.dyn_ref::<Function>() else {
            return Ok(None);
        };
        function.call1(&self.object, arg).map(Some)
    }

    fn run_hook(&self, method: &str, arg: &JsValue, ctx: &mut ModeContext<'_>) {
        let returned = match self.call(method, arg) {
            Ok(Some(returned)) => returned,
            Ok(None) => return,
            Err(err) => {
                log::error!("{method} threw: {}", js_error_message(&err));
                return;
            }
        };
        let Some(json) = to_json(&returned) else {
            return;
        };
        match JsModeOutput::parse(&json) {
            Ok(output) => output.apply(ctx),
            Err(err) => log::error!("{method} returned an unusable value: {err}"),
        }
    }
}

impl Mode for JsMode {
    fn setup(
        &mut self,
        id: ModeId,
        params: &ModeParams,
        ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        let args = SetupArgs {
            params,
            selected: ctx.selected(),
        };
        let args = to_js(&args).map_err(|message| ModeChangeError::InvalidParams {
            mode: id,
            message,
        })?;
        self.call("onSetup", &args)
            .map(drop)
            .map_err(|err| ModeChangeError::Rejected {
                mode: id,
                message: js_error_message(&err),
            })
    }

    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        self.run_hook("onEnter", &JsValue::UNDEFINED, ctx);
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ModeContext<'_>) {
        match to_js(&JsInputEvent::from(event)) {
            Ok(arg) => self.run_hook("onEvent", &arg, ctx),
            Err(err) => log::error!("could not encode input event: {err}"),
        }
    }

    fn on_exit(&mut self, ctx: &mut ModeContext<'_>) {
        self.run_hook("onExit", &JsValue::UNDEFINED, ctx);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapQuery<'a> {
    point: [f64; 2],
    lng_lat: LngLat,
    hit: Option<FeatureId>,
    #[serde(flatten)]
    options: &'a SnapOptions,
}

/// Snapper backed by a JS function `(query) => [lng, lat] | null`.
pub struct JsSnapper {
    function: Function,
}

impl JsSnapper {
    pub fn new(function: Function) -> Self {
        Self { function }
    }
}

impl Snapper for JsSnapper {
    fn snap(&self, at: &PointerPosition, options: &SnapOptions) -> Option<LngLat> {
        let query = SnapQuery {
            point: [at.point.x, at.point.y],
            lng_lat: at.lng_lat,
            hit: at.hit,
            options,
        };
        let arg = to_js(&query)
            .map_err(|err| log::error!("could not encode snap query: {err}"))
            .ok()?;
        let returned = self
            .function
            .call1(&JsValue::NULL, &arg)
            .map_err(|err| log::error!("snapper threw: {}", js_error_message(&err)))
            .ok()?;
        let json = to_json(&returned)?;
        serde_json::from_str(&json)
            .map_err(|err| log::error!("snapper returned an unusable value: {err}"))
            .ok()
    }
}

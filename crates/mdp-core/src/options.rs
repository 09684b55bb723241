//! Behavioural configuration for the drawing control.
//!
//! Three layers, last writer wins per key:
//!
//! 1. `DrawOptions::default()`: conservative, always-present values.
//! 2. `OptionsOverrides`: caller configuration given at construction.
//!    Nested bags (`snapOptions`, `controls`) merge key by key.
//! 3. Runtime setters on `LiveOptions` (checkbox toggles, host calls).
//!
//! The merged `DrawOptions` seeds one `LiveOptions` record. The engine,
//! the active mode and the toolbar toggles all hold clones of that same
//! record, so a toggle is visible to in-flight modes immediately.

use crate::id::ModeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Unit for buffer-style operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferUnit {
    Miles,
    NauticalMiles,
    #[default]
    Kilometers,
    Meters,
    Yards,
    Feet,
    Inches,
    Degrees,
    Radians,
}

/// Snapping parameters consulted by drawing modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapOptions {
    /// Snap radius in screen pixels.
    pub snap_px: f64,
    /// Also snap to segment midpoints.
    pub snap_to_mid_points: bool,
    /// Vertices within this factor of the nearest edge win over the edge.
    pub snap_vertex_priority_distance: f64,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            snap_px: 15.0,
            snap_to_mid_points: false,
            snap_vertex_priority_distance: 1.25,
        }
    }
}

/// Visibility of the base engine's own control buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub point: bool,
    pub line_string: bool,
    pub polygon: bool,
    pub trash: bool,
    pub combine_features: bool,
    pub uncombine_features: bool,
}

impl Controls {
    /// Every control set to `visible`.
    pub const fn all(visible: bool) -> Self {
        Self {
            point: visible,
            line_string: visible,
            polygon: visible,
            trash: visible,
            combine_features: visible,
            uncombine_features: visible,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::all(true)
    }
}

/// The effective option record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOptions {
    pub snap: bool,
    pub snap_options: SnapOptions,
    pub buffer_size: f64,
    pub buffer_unit: BufferUnit,
    pub buffer_steps: u32,
    pub guides: bool,
    pub user_properties: bool,
    pub controls: Controls,
    pub default_mode: ModeId,
    /// Feature rendering styles. Opaque to the control, handed to the renderer.
    pub styles: Option<Value>,
    /// Keys the control does not know about, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            snap: true,
            snap_options: SnapOptions::default(),
            buffer_size: 0.5,
            buffer_unit: BufferUnit::Kilometers,
            buffer_steps: 64,
            guides: false,
            user_properties: true,
            controls: Controls::default(),
            default_mode: ModeId::intern("simple_select"),
            styles: None,
            extra: Map::new(),
        }
    }
}

impl DrawOptions {
    /// Merge caller overrides on top of `self`.
    ///
    /// Keys present in `overrides` replace the current value; absent keys
    /// keep it. Nested bags are merged per key.
    pub fn merge(mut self, overrides: OptionsOverrides) -> Self {
        let OptionsOverrides {
            snap,
            snap_options,
            buffer_size,
            buffer_unit,
            buffer_steps,
            guides,
            user_properties,
            display_controls_default,
            controls,
            default_mode,
            styles,
            extra,
        } = overrides;

        if let Some(v) = snap {
            self.snap = v;
        }
        if let Some(patch) = snap_options {
            patch.apply(&mut self.snap_options);
        }
        if let Some(v) = buffer_size {
            self.buffer_size = v;
        }
        if let Some(v) = buffer_unit {
            self.buffer_unit = v;
        }
        if let Some(v) = buffer_steps {
            self.buffer_steps = v;
        }
        if let Some(v) = guides {
            self.guides = v;
        }
        if let Some(v) = user_properties {
            self.user_properties = v;
        }
        if let Some(visible) = display_controls_default {
            self.controls = Controls::all(visible);
        }
        if let Some(patch) = controls {
            patch.apply(&mut self.controls);
        }
        if let Some(v) = default_mode {
            self.default_mode = v;
        }
        if let Some(v) = styles {
            self.styles = Some(v);
        }
        self.extra.extend(extra);
        self
    }
}

/// Caller-supplied configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsOverrides {
    pub snap: Option<bool>,
    pub snap_options: Option<SnapOptionsPatch>,
    pub buffer_size: Option<f64>,
    pub buffer_unit: Option<BufferUnit>,
    pub buffer_steps: Option<u32>,
    pub guides: Option<bool>,
    pub user_properties: Option<bool>,
    /// Baseline visibility for every base control before `controls` applies.
    pub display_controls_default: Option<bool>,
    pub controls: Option<ControlsPatch>,
    pub default_mode: Option<ModeId>,
    pub styles: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OptionsOverrides {
    /// Parse overrides from a camelCase JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-key patch for [`SnapOptions`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapOptionsPatch {
    pub snap_px: Option<f64>,
    pub snap_to_mid_points: Option<bool>,
    pub snap_vertex_priority_distance: Option<f64>,
}

impl SnapOptionsPatch {
    fn apply(self, target: &mut SnapOptions) {
        if let Some(v) = self.snap_px {
            target.snap_px = v;
        }
        if let Some(v) = self.snap_to_mid_points {
            target.snap_to_mid_points = v;
        }
        if let Some(v) = self.snap_vertex_priority_distance {
            target.snap_vertex_priority_distance = v;
        }
    }
}

/// Per-key patch for [`Controls`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsPatch {
    pub point: Option<bool>,
    pub line_string: Option<bool>,
    pub polygon: Option<bool>,
    pub trash: Option<bool>,
    pub combine_features: Option<bool>,
    pub uncombine_features: Option<bool>,
}

impl ControlsPatch {
    fn apply(self, target: &mut Controls) {
        let fields = [
            (self.point, &mut target.point),
            (self.line_string, &mut target.line_string),
            (self.polygon, &mut target.polygon),
            (self.trash, &mut target.trash),
            (self.combine_features, &mut target.combine_features),
            (self.uncombine_features, &mut target.uncombine_features),
        ];
        for (patch, slot) in fields {
            if let Some(v) = patch {
                *slot = v;
            }
        }
    }
}

// ─── Live options ────────────────────────────────────────────────────────

/// Boolean options that UI toggles can flip at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionFlag {
    Snap,
    Guides,
    UserProperties,
}

impl OptionFlag {
    pub fn name(self) -> &'static str {
        match self {
            OptionFlag::Snap => "snap",
            OptionFlag::Guides => "guides",
            OptionFlag::UserProperties => "userProperties",
        }
    }
}

impl fmt::Display for OptionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a runtime setter changed. Delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionChange {
    Flag { flag: OptionFlag, value: bool },
    SnapOptions,
    Buffer,
}

type Observer = Rc<dyn Fn(&OptionChange)>;

/// Handle returned by [`LiveOptions::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

struct LiveState {
    options: DrawOptions,
    revision: u64,
    observers: Vec<(Subscription, Observer)>,
    next_subscription: u64,
}

/// The shared, mutable option record read by active modes and written by
/// toggles. Cloning shares the record; it never copies it.
#[derive(Clone)]
pub struct LiveOptions {
    inner: Rc<RefCell<LiveState>>,
}

impl LiveOptions {
    pub fn new(options: DrawOptions) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LiveState {
                options,
                revision: 0,
                observers: Vec::new(),
                next_subscription: 0,
            })),
        }
    }

    /// Read the current record without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&DrawOptions) -> R) -> R {
        f(&self.inner.borrow().options)
    }

    /// Clone of the current record.
    pub fn snapshot(&self) -> DrawOptions {
        self.read(DrawOptions::clone)
    }

    pub fn snap(&self) -> bool {
        self.flag(OptionFlag::Snap)
    }

    pub fn guides(&self) -> bool {
        self.flag(OptionFlag::Guides)
    }

    pub fn snap_options(&self) -> SnapOptions {
        self.read(|o| o.snap_options.clone())
    }

    pub fn flag(&self, flag: OptionFlag) -> bool {
        self.read(|o| match flag {
            OptionFlag::Snap => o.snap,
            OptionFlag::Guides => o.guides,
            OptionFlag::UserProperties => o.user_properties,
        })
    }

    pub fn set_snap(&self, value: bool) {
        self.set_flag(OptionFlag::Snap, value);
    }

    pub fn set_guides(&self, value: bool) {
        self.set_flag(OptionFlag::Guides, value);
    }

    pub fn set_flag(&self, flag: OptionFlag, value: bool) {
        self.mutate(OptionChange::Flag { flag, value }, |o| match flag {
            OptionFlag::Snap => o.snap = value,
            OptionFlag::Guides => o.guides = value,
            OptionFlag::UserProperties => o.user_properties = value,
        });
    }

    /// Replace the whole snap-options bag (no per-key merge).
    pub fn set_snap_options(&self, snap_options: SnapOptions) {
        self.mutate(OptionChange::SnapOptions, |o| o.snap_options = snap_options);
    }

    pub fn set_buffer(&self, size: f64, unit: BufferUnit, steps: u32) {
        self.mutate(OptionChange::Buffer, |o| {
            o.buffer_size = size;
            o.buffer_unit = unit;
            o.buffer_steps = steps;
        });
    }

    /// Number of runtime mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// Register a callback invoked after every runtime mutation.
    pub fn subscribe(&self, observer: impl Fn(&OptionChange) + 'static) -> Subscription {
        let mut state = self.inner.borrow_mut();
        let id = Subscription(state.next_subscription);
        state.next_subscription += 1;
        state.observers.push((id, Rc::new(observer)));
        id
    }

    /// Drop an observer. Unknown handles are ignored.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.inner
            .borrow_mut()
            .observers
            .retain(|(id, _)| *id != subscription);
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Whether `other` is a handle to the same record.
    pub fn same_record(&self, other: &LiveOptions) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn mutate(&self, change: OptionChange, f: impl FnOnce(&mut DrawOptions)) {
        // Observers run after the borrow ends so they may read the record.
        let observers = {
            let mut state = self.inner.borrow_mut();
            f(&mut state.options);
            state.revision += 1;
            state
                .observers
                .iter()
                .map(|(_, observer)| observer.clone())
                .collect::<Vec<_>>()
        };
        log::debug!("options changed: {change:?}");
        for observer in observers {
            observer(&change);
        }
    }
}

impl fmt::Debug for LiveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("LiveOptions")
            .field("options", &state.options)
            .field("revision", &state.revision)
            .finish()
    }
}

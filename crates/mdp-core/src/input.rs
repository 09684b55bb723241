//! Input abstraction layer.
//!
//! Normalizes map pointer and keyboard events into a unified `InputEvent`
//! consumed by modes. Hit-testing is done by the host: pointer events
//! carry the feature under the cursor, if any.

use crate::geometry::LngLat;
use crate::id::FeatureId;
use kurbo::Point;

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// Where a pointer event happened, in both screen and map space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    /// Screen position in CSS pixels.
    pub point: Point,
    pub lng_lat: LngLat,
    /// Feature under the pointer, as reported by the host's hit-test.
    pub hit: Option<FeatureId>,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64, lng_lat: LngLat) -> Self {
        Self {
            point: Point::new(x, y),
            lng_lat,
            hit: None,
        }
    }

    pub fn with_hit(mut self, hit: FeatureId) -> Self {
        self.hit = Some(hit);
        self
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown {
        at: PointerPosition,
        modifiers: Modifiers,
    },

    /// Pointer moved.
    PointerMove {
        at: PointerPosition,
        modifiers: Modifiers,
    },

    /// Pointer released.
    PointerUp {
        at: PointerPosition,
        modifiers: Modifiers,
    },

    /// Press and release without a drag.
    Click {
        at: PointerPosition,
        modifiers: Modifiers,
    },

    DoubleClick { at: PointerPosition },

    /// Key released (`KeyboardEvent.key`).
    Key { key: String },

    /// The trash control was pressed.
    Trash,
}

impl InputEvent {
    pub fn click(at: PointerPosition) -> Self {
        Self::Click {
            at,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<&PointerPosition> {
        match self {
            Self::PointerDown { at, .. }
            | Self::PointerMove { at, .. }
            | Self::PointerUp { at, .. }
            | Self::Click { at, .. }
            | Self::DoubleClick { at } => Some(at),
            Self::Key { .. } | Self::Trash => None,
        }
    }
}

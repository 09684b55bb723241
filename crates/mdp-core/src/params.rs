//! Per-invocation parameter bags for mode changes.
//!
//! The engine hands a `ModeParams` to the mode exactly as the caller built
//! it. Modes that expect structured parameters deserialize a typed view
//! with [`ModeParams::parse`].

use crate::error::ModeChangeError;
use crate::id::ModeId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A flat bag of named parameters for one mode change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeParams(Map<String, Value>);

impl ModeParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Build a bag from any serializable value that encodes as an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            Value::Null => Some(Self::default()),
            _ => None,
        }
    }

    /// Deserialize a typed view for `mode`, mapping failures to
    /// [`ModeChangeError::InvalidParams`].
    pub fn parse<T: DeserializeOwned>(&self, mode: ModeId) -> Result<T, ModeChangeError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            ModeChangeError::InvalidParams {
                mode,
                message: e.to_string(),
            }
        })
    }
}

impl From<Map<String, Value>> for ModeParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ─── Scale / rotate ──────────────────────────────────────────────────────

/// Pivot used when scaling or rotating.
///
/// Accepts `0`/`1` as well as `"center"`/`"opposite"`, because hosts pass
/// either the numeric constants or their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SrCenter {
    /// Centroid of the transformed features.
    #[default]
    Center,
    /// The vertex opposite to the dragged handle.
    Opposite,
}

impl Serialize for SrCenter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            SrCenter::Center => "center",
            SrCenter::Opposite => "opposite",
        })
    }
}

impl<'de> Deserialize<'de> for SrCenter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        match Value::deserialize(deserializer)? {
            Value::Number(n) if n.as_u64() == Some(0) => Ok(SrCenter::Center),
            Value::Number(n) if n.as_u64() == Some(1) => Ok(SrCenter::Opposite),
            Value::String(s) if s.eq_ignore_ascii_case("center") => Ok(SrCenter::Center),
            Value::String(s) if s.eq_ignore_ascii_case("opposite") => Ok(SrCenter::Opposite),
            other => Err(D::Error::custom(format!("unknown pivot {other}"))),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rotation_point_radius() -> f64 {
    1.0
}

/// Parameters of the scale/rotate mode. `canScale` and `canRotate` are
/// required; everything else has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleRotateParams {
    pub can_scale: bool,
    pub can_rotate: bool,
    #[serde(default = "default_true")]
    pub can_trash: bool,
    #[serde(default)]
    pub rotate_pivot: SrCenter,
    #[serde(default)]
    pub scale_center: SrCenter,
    #[serde(default)]
    pub single_rotation_point: bool,
    #[serde(default = "default_rotation_point_radius")]
    pub rotation_point_radius: f64,
    #[serde(default = "default_true")]
    pub can_select_features: bool,
}

impl ScaleRotateParams {
    /// The parameter set the toolbar's rotate button uses.
    pub fn toolbar_default() -> Self {
        Self {
            can_scale: true,
            can_rotate: true,
            can_trash: false,
            rotate_pivot: SrCenter::Center,
            scale_center: SrCenter::Opposite,
            single_rotation_point: true,
            rotation_point_radius: 1.2,
            can_select_features: true,
        }
    }

    pub fn to_params(&self) -> ModeParams {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => ModeParams(map),
            _ => ModeParams::default(),
        }
    }
}

// ─── Split line ──────────────────────────────────────────────────────────

/// Geometry kind drawn to split a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitTarget {
    Point,
    LineString,
    Polygon,
}

impl SplitTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "point" => Some(SplitTarget::Point),
            "line_string" => Some(SplitTarget::LineString),
            "polygon" => Some(SplitTarget::Polygon),
            _ => None,
        }
    }
}

/// Parameters of the split-line mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitLineParams {
    /// Which geometry the user draws to split with.
    pub spliter: SplitTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sr() -> ModeId {
        ModeId::intern("scaleRotateMode")
    }

    #[test]
    fn scale_rotate_requires_scale_and_rotate() {
        let params = ModeParams::new().with("canScale", true);
        let err = params.parse::<ScaleRotateParams>(sr()).unwrap_err();
        assert!(matches!(err, ModeChangeError::InvalidParams { .. }));
        assert!(err.to_string().contains("canRotate"));
    }

    #[test]
    fn scale_rotate_fills_defaults() {
        let params = ModeParams::new()
            .with("canScale", true)
            .with("canRotate", false);
        let parsed: ScaleRotateParams = params.parse(sr()).unwrap();
        assert!(parsed.can_trash);
        assert_eq!(parsed.rotate_pivot, SrCenter::Center);
        assert_eq!(parsed.rotation_point_radius, 1.0);
    }

    #[test]
    fn pivots_accept_numbers_and_names() {
        let params = ModeParams::from_value(json!({
            "canScale": true,
            "canRotate": true,
            "rotatePivot": 0,
            "scaleCenter": "opposite",
        }))
        .unwrap();
        let parsed: ScaleRotateParams = params.parse(sr()).unwrap();
        assert_eq!(parsed.rotate_pivot, SrCenter::Center);
        assert_eq!(parsed.scale_center, SrCenter::Opposite);
    }

    #[test]
    fn toolbar_default_survives_the_bag() {
        let bag = ScaleRotateParams::toolbar_default().to_params();
        assert_eq!(bag.get("canTrash"), Some(&json!(false)));
        let back: ScaleRotateParams = bag.parse(sr()).unwrap();
        assert_eq!(back, ScaleRotateParams::toolbar_default());
    }

    #[test]
    fn split_target_rejects_unknown_names() {
        assert_eq!(SplitTarget::parse("line_string"), Some(SplitTarget::LineString));
        assert_eq!(SplitTarget::parse("circle"), None);
        let bad = ModeParams::new().with("spliter", "circle");
        assert!(bad.parse::<SplitLineParams>(ModeId::intern("splitLineMode")).is_err());
    }
}

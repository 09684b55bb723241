pub mod error;
pub mod geometry;
pub mod id;
pub mod input;
pub mod mode;
pub mod options;
pub mod params;
pub mod registry;

pub use error::ModeChangeError;
pub use geometry::{Feature, Geometry, GeometryKind, LngLat};
pub use id::{FeatureId, ModeId};
pub use input::{InputEvent, Modifiers, PointerPosition};
pub use mode::{
    DisplayFeature, DisplayKind, EditRequest, FeatureMutation, Mode, ModeContext, ModeTransition,
    NoSnap, Snapper, TransformOp,
};
pub use options::{
    BufferUnit, Controls, DrawOptions, LiveOptions, OptionChange, OptionFlag, OptionsOverrides,
    SnapOptions, Subscription,
};
pub use params::{ModeParams, ScaleRotateParams, SplitLineParams, SplitTarget, SrCenter};
pub use registry::{ModeFactory, ModeRegistry, mode_factory};

// Re-export kurbo's point so downstream crates don't need a direct dependency
pub use kurbo::Point;

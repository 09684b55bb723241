pub mod actions;
pub mod additional;
pub mod control;
pub mod dom;
pub mod engine;
pub mod headless;
pub mod map;
pub mod modes;
pub mod notify;
pub mod toggles;

pub use actions::{ActionContext, ActionDescriptor, ActionError, ActionSet, pro_toolbar};
pub use additional::AdditionalToolsBar;
pub use control::{AUX_MOUNT_DELAY, ControlConfig, DrawControl, ToolbarConfig};
pub use dom::{Dom, ElementId, ElementSpec, EventKind, UiEvent};
pub use engine::{BaseEngine, DrawEngine, SharedEngine, WeakEngine};
pub use map::{HostMap, MapControl, Placement, SharedControl};
pub use modes::{BuiltinMode, builtin_modes};
pub use notify::{LogNotifier, Notifier};
pub use toggles::{AuxiliaryControlBar, ToggleDescriptor, snap_toggles};

//! Integration tests: control lifecycle against the in-memory map.
//!
//! Exercises attach/detach, the deferred sibling mount, toolbar actions and
//! the option toggles end to end through simulated DOM events.

use mdp_core::{
    FeatureId, FeatureMutation, Geometry, InputEvent, LngLat, Mode, ModeContext, ModeId,
    ModeParams, PointerPosition, ScaleRotateParams, SnapOptions, Snapper, mode_factory,
};
use mdp_editor::actions::ActionDescriptor;
use mdp_editor::dom::BUTTON_CLASS;
use mdp_editor::headless::{MemoryMap, RecordingNotifier};
use mdp_editor::{
    AUX_MOUNT_DELAY, ControlConfig, DrawControl, HostMap, SharedControl, SharedEngine,
    ToolbarConfig,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Fixture {
    map: MemoryMap,
    control: Rc<RefCell<DrawControl>>,
    notifier: Rc<RecordingNotifier>,
}

impl Fixture {
    fn new(config: ControlConfig) -> Self {
        init_logging();
        let notifier = Rc::new(RecordingNotifier::new());
        let config = ControlConfig {
            toolbar: ToolbarConfig {
                notifier: notifier.clone(),
                ..config.toolbar
            },
            ..config
        };
        let control = Rc::new(RefCell::new(DrawControl::new(config).unwrap()));
        Self {
            map: MemoryMap::new(),
            control,
            notifier,
        }
    }

    fn shared(&self) -> SharedControl {
        self.control.clone()
    }

    fn add(&mut self) {
        let shared = self.shared();
        self.map.add_control(shared, None);
    }

    fn remove(&mut self) {
        let shared = self.shared();
        self.map.remove_control(&shared);
    }

    fn engine(&self) -> SharedEngine {
        self.control.borrow().engine().clone()
    }

    fn active_mode(&self) -> String {
        self.engine().borrow().active_mode().to_string()
    }

    fn click(&self, class: &str) {
        let element = self
            .map
            .document()
            .find(class)
            .unwrap_or_else(|| panic!("no single element with class {class}"));
        self.map.document().click(element);
    }

    fn select(&self, ids: &[&str]) {
        let ids = ids.iter().map(|id| FeatureId::intern(id)).collect();
        self.engine().borrow_mut().set_selected(ids);
    }
}

struct FixedSnap(LngLat);

impl Snapper for FixedSnap {
    fn snap(&self, _at: &PointerPosition, _options: &SnapOptions) -> Option<LngLat> {
        Some(self.0)
    }
}

// ─── Attach / detach ────────────────────────────────────────────────────

#[test]
fn detach_removes_every_listener_and_button() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.map.flush();
    assert!(fx.map.document().listener_count() > 0);
    assert_eq!(fx.control.borrow().sibling_count(), 2);

    fx.remove();
    assert_eq!(fx.map.document().listener_count(), 0);
    assert!(fx.map.document().query(BUTTON_CLASS).is_empty());
    assert_eq!(fx.map.control_count(), 0);
    assert!(!fx.control.borrow().is_attached());
}

#[test]
fn toolbar_actions_follow_base_buttons_in_order() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();

    let container = fx.control.borrow().container().unwrap();
    let doc = fx.map.document();
    let classes: Vec<String> = doc
        .children(container)
        .iter()
        .map(|el| doc.classes(*el)[1].clone())
        .collect();
    assert_eq!(
        classes,
        vec![
            "mapbox-gl-draw_line",
            "mapbox-gl-draw_polygon",
            "mapbox-gl-draw_point",
            "mapbox-gl-draw_trash",
            "mapbox-gl-draw_combine",
            "mapbox-gl-draw_uncombine",
            "split-line",
            "split-polygon",
            "cut-polygon",
            "rotate-icon",
            "pinning_mode",
        ]
    );
    let pinning = doc.find("pinning_mode").unwrap();
    assert_eq!(doc.title(pinning), Some("Pinning Mode tool"));
}

#[test]
fn siblings_mount_after_delay() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    assert!(fx.map.document().query("snap_mode").is_empty());

    fx.map.advance(AUX_MOUNT_DELAY - Duration::from_millis(1));
    assert!(fx.map.document().query("snap_mode").is_empty());

    fx.map.advance(Duration::from_millis(1));
    assert_eq!(fx.map.document().query("snap_mode").len(), 2);
    assert!(fx.map.document().find("union").is_some());
    assert_eq!(fx.map.control_count(), 3);
}

#[test]
fn detach_before_deferred_mount_skips_siblings() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.remove();
    assert_eq!(fx.map.advance(AUX_MOUNT_DELAY), 1);

    assert!(fx.map.document().query("snap_mode").is_empty());
    assert_eq!(fx.map.control_count(), 0);
    assert_eq!(fx.map.document().listener_count(), 0);
}

#[test]
fn reattach_builds_a_fresh_toolbar() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.map.flush();
    fx.remove();
    fx.add();
    fx.map.flush();

    assert_eq!(fx.map.document().query("split-line").len(), 1);
    assert_eq!(fx.map.document().query("snap").len(), 1);
    assert_eq!(fx.map.control_count(), 3);
}

#[test]
fn attach_twice_keeps_existing_container() {
    let fx = Fixture::new(ControlConfig::default());
    let mut map = MemoryMap::new();
    let first = fx.control.borrow_mut().attach(&mut map);
    let listeners = map.document().listener_count();
    let second = fx.control.borrow_mut().attach(&mut map);
    assert_eq!(first, second);
    assert_eq!(map.document().listener_count(), listeners);

    fx.control.borrow_mut().detach(&mut map);
    fx.control.borrow_mut().detach(&mut map);
    assert_eq!(map.document().listener_count(), 0);
    assert_eq!(map.pending_tasks(), 1);
    map.flush();
    assert_eq!(map.control_count(), 0);
}

#[test]
fn detach_tears_down_in_reverse_order() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.map.flush();
    let doc = fx.map.document();
    let snap = doc.find("snap").unwrap();
    let union = doc.find("union").unwrap();
    let split_line = doc.find("split-line").unwrap();
    let base_line = doc.find("mapbox-gl-draw_line").unwrap();

    fx.remove();
    let order = fx.map.document().removal_order();
    let position = |el| order.iter().position(|r| *r == el).unwrap();
    assert!(position(snap) < position(union));
    assert!(position(union) < position(split_line));
    assert!(position(split_line) < position(base_line));
}

// ─── Toolbar actions ────────────────────────────────────────────────────

#[test]
fn unknown_mode_alerts_once_and_keeps_mode() {
    let config = ControlConfig {
        toolbar: ToolbarConfig {
            extra_actions: vec![ActionDescriptor::click(&["broken"], |cx| {
                cx.change_mode("does_not_exist", ModeParams::new())
            })],
            ..ToolbarConfig::default()
        },
        ..ControlConfig::default()
    };
    let mut fx = Fixture::new(config);
    fx.add();
    fx.click("broken");

    assert_eq!(
        fx.notifier.alerts(),
        vec!["Mode 'does_not_exist' is not registered"]
    );
    assert_eq!(fx.active_mode(), "simple_select");
}

#[test]
fn split_polygon_without_selection_is_rejected() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.click("split-polygon");
    assert_eq!(
        fx.notifier.alerts(),
        vec!["Please select a Polygon or MultiPolygon to split!"]
    );
    assert_eq!(fx.active_mode(), "simple_select");

    fx.select(&["parcel"]);
    fx.click("split-polygon");
    assert_eq!(fx.notifier.alerts().len(), 1);
    assert_eq!(fx.active_mode(), "splitPolygonMode");
}

#[test]
fn split_line_prompts_for_splitter() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.select(&["road"]);

    fx.notifier.answer(None);
    fx.click("split-line");
    assert_eq!(fx.active_mode(), "simple_select");
    assert!(fx.notifier.alerts().is_empty());

    fx.notifier.answer(Some(" line_string "));
    fx.click("split-line");
    assert_eq!(fx.active_mode(), "splitLineMode");
    assert_eq!(
        fx.notifier.prompts(),
        vec![
            mdp_editor::actions::SPLIT_LINE_PROMPT,
            mdp_editor::actions::SPLIT_LINE_PROMPT
        ]
    );
}

#[test]
fn split_line_with_bad_answer_alerts() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.select(&["road"]);
    fx.notifier.answer(Some("circle"));
    fx.click("split-line");
    assert_eq!(fx.notifier.alerts().len(), 1);
    assert_eq!(fx.active_mode(), "simple_select");
}

#[test]
fn rotate_button_passes_fixed_parameters() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.select(&["parcel"]);
    fx.click("rotate-icon");

    let engine = fx.engine();
    let engine = engine.borrow();
    assert_eq!(engine.active_mode(), ModeId::intern("scaleRotateMode"));
    assert_eq!(
        *engine.active_params(),
        ScaleRotateParams::toolbar_default().to_params()
    );
}

#[test]
fn additional_tools_need_a_selection() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.map.flush();

    fx.click("buffer");
    assert_eq!(
        fx.notifier.alerts(),
        vec!["Please select at least one feature to buffer"]
    );

    fx.select(&["parcel"]);
    fx.click("buffer");
    let mutations = fx.engine().borrow_mut().take_mutations();
    assert!(matches!(
        mutations.as_slice(),
        [FeatureMutation::Request(mdp_core::EditRequest::Buffer { steps: 64, .. })]
    ));
}

// ─── Options ────────────────────────────────────────────────────────────

#[test]
fn snap_toggle_applies_to_next_click() {
    let config = ControlConfig {
        snapper: Some(Box::new(FixedSnap(LngLat::new(9.0, 9.0)))),
        ..ControlConfig::default()
    };
    let mut fx = Fixture::new(config);
    fx.add();
    fx.map.flush();

    let click = InputEvent::click(PointerPosition::new(1.0, 2.0, LngLat::new(1.0, 2.0)));
    let draw_point = |fx: &Fixture| {
        let engine = fx.engine();
        let mut engine = engine.borrow_mut();
        engine
            .change_mode(ModeId::intern("draw_point"), ModeParams::new())
            .unwrap();
        engine.handle_input(&click);
        match engine.take_mutations().as_slice() {
            [FeatureMutation::Add(feature)] => feature.geometry.clone(),
            other => panic!("unexpected mutations {other:?}"),
        }
    };

    assert_eq!(draw_point(&fx), Geometry::Point(LngLat::new(9.0, 9.0)));

    let snap = fx.map.document().find("snap").unwrap();
    fx.map.document_mut().set_checked(snap, false);
    assert_eq!(draw_point(&fx), Geometry::Point(LngLat::new(1.0, 2.0)));
}

#[test]
fn checkboxes_reflect_option_setters() {
    let mut fx = Fixture::new(ControlConfig::default());
    fx.add();
    fx.map.flush();
    let snap = fx.map.document().find("snap").unwrap();
    let grid = fx.map.document().find("grid").unwrap();

    let engine = fx.engine();
    engine.borrow().options().set_snap(false);
    engine.borrow().options().set_guides(true);
    assert!(!fx.map.document().is_checked(snap));
    assert!(fx.map.document().is_checked(grid));

    fx.remove();
    assert_eq!(engine.borrow().options().observer_count(), 0);
}

// ─── Mode overrides ─────────────────────────────────────────────────────

/// Stands in for a caller's replacement point tool.
struct StampMode;

impl Mode for StampMode {
    fn on_enter(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.request(mdp_core::EditRequest::Area {
            targets: Vec::new(),
        });
    }

    fn handle(&mut self, _event: &InputEvent, _ctx: &mut ModeContext<'_>) {}
}

#[test]
fn caller_mode_replaces_builtin_behind_base_button() {
    let config = ControlConfig {
        modes: vec![(ModeId::intern("draw_point"), mode_factory(|| StampMode))],
        ..ControlConfig::default()
    };
    let mut fx = Fixture::new(config);
    fx.add();
    fx.click("mapbox-gl-draw_point");

    assert_eq!(fx.active_mode(), "draw_point");
    assert_eq!(
        fx.engine().borrow_mut().take_mutations(),
        vec![FeatureMutation::Request(mdp_core::EditRequest::Area {
            targets: Vec::new()
        })]
    );
}

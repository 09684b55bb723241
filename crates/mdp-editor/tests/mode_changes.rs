//! Integration tests: mode registry and engine mode changes (mdp-editor ↔ mdp-core).
//!
//! Drives a `DrawEngine` directly, without toolbar or map.

use mdp_core::{
    DrawOptions, FeatureId, FeatureMutation, Geometry, InputEvent, LngLat, Mode,
    ModeChangeError, ModeContext, ModeId, ModeParams, ModeRegistry, OptionsOverrides,
    PointerPosition, mode_factory,
};
use mdp_editor::headless::RecordingNotifier;
use mdp_editor::{BaseEngine, BuiltinMode, DrawEngine, builtin_modes};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

type Journal = Rc<RefCell<Vec<String>>>;

/// Records its lifecycle calls into a shared journal.
struct Journaled {
    name: &'static str,
    journal: Journal,
    reject: bool,
}

impl Mode for Journaled {
    fn setup(
        &mut self,
        id: ModeId,
        _params: &ModeParams,
        _ctx: &ModeContext<'_>,
    ) -> Result<(), ModeChangeError> {
        if self.reject {
            return Err(ModeChangeError::Rejected {
                mode: id,
                message: format!("{} refuses", self.name),
            });
        }
        Ok(())
    }

    fn on_enter(&mut self, _ctx: &mut ModeContext<'_>) {
        self.journal.borrow_mut().push(format!("{}:enter", self.name));
    }

    fn handle(&mut self, _event: &InputEvent, _ctx: &mut ModeContext<'_>) {}

    fn on_exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.journal.borrow_mut().push(format!("{}:exit", self.name));
    }
}

fn engine_with(journal: &Journal) -> DrawEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let journaled = |name: &'static str, reject: bool| {
        let journal = journal.clone();
        (
            ModeId::intern(name),
            mode_factory(move || Journaled {
                name,
                journal: journal.clone(),
                reject,
            }),
        )
    };
    let registry = ModeRegistry::merge(
        builtin_modes(),
        [journaled("journaled", false), journaled("picky", true)],
    );
    DrawEngine::new(
        registry,
        DrawOptions::default(),
        Rc::new(RecordingNotifier::new()),
    )
    .unwrap()
}

fn at(lng: f64, lat: f64) -> PointerPosition {
    PointerPosition::new(lng, lat, LngLat::new(lng, lat))
}

#[test]
fn rejected_change_runs_no_lifecycle_hooks() {
    let journal = Journal::default();
    let mut engine = engine_with(&journal);

    engine
        .change_mode(ModeId::intern("journaled"), ModeParams::new().with("k", 1))
        .unwrap();
    let err = engine
        .change_mode(ModeId::intern("picky"), ModeParams::new())
        .unwrap_err();

    assert_eq!(err.to_string(), "picky refuses");
    assert_eq!(*journal.borrow(), vec!["journaled:enter"]);
    assert_eq!(engine.active_mode(), ModeId::intern("journaled"));
    assert_eq!(engine.active_params(), &ModeParams::new().with("k", 1));
}

#[test]
fn successful_change_exits_then_enters() {
    let journal = Journal::default();
    let mut engine = engine_with(&journal);
    engine
        .change_mode(ModeId::intern("journaled"), ModeParams::new())
        .unwrap();
    engine
        .change_mode(ModeId::intern("journaled"), ModeParams::new())
        .unwrap();
    assert_eq!(
        *journal.borrow(),
        vec!["journaled:enter", "journaled:exit", "journaled:enter"]
    );
}

#[test]
fn unknown_mode_is_reported_with_its_name() {
    let journal = Journal::default();
    let mut engine = engine_with(&journal);
    let err = engine
        .change_mode(ModeId::intern("lasso"), ModeParams::new())
        .unwrap_err();
    assert_eq!(err.mode(), ModeId::intern("lasso"));
    assert_eq!(engine.active_mode(), ModeId::intern("simple_select"));
}

#[test]
fn unregistered_default_mode_fails_construction() {
    let options = DrawOptions::default().merge(
        OptionsOverrides::from_json(r#"{"defaultMode": "nowhere"}"#).unwrap(),
    );
    let result = DrawEngine::new(
        ModeRegistry::merge(builtin_modes(), []),
        options,
        Rc::new(RecordingNotifier::new()),
    );
    assert!(matches!(
        result,
        Err(ModeChangeError::UnknownMode { mode }) if mode == ModeId::intern("nowhere")
    ));
}

#[test]
fn every_builtin_is_registered() {
    let registry = ModeRegistry::merge(builtin_modes(), []);
    for mode in BuiltinMode::ALL {
        assert!(registry.contains(mode.id()), "{} missing", mode.name());
    }
}

#[test]
fn drawn_line_is_selected_after_returning_to_select() {
    let journal = Journal::default();
    let mut engine = engine_with(&journal);
    engine
        .change_mode(BuiltinMode::DrawLineString.id(), ModeParams::new())
        .unwrap();
    engine.handle_input(&InputEvent::click(at(0.0, 0.0)));
    engine.handle_input(&InputEvent::click(at(1.0, 1.0)));
    engine.handle_input(&InputEvent::DoubleClick { at: at(1.0, 1.0) });

    assert_eq!(engine.active_mode(), BuiltinMode::SimpleSelect.id());
    let mutations = engine.take_mutations();
    let [FeatureMutation::Add(feature)] = mutations.as_slice() else {
        panic!("expected one added feature, got {mutations:?}");
    };
    assert_eq!(
        feature.geometry,
        Geometry::LineString(vec![LngLat::new(0.0, 0.0), LngLat::new(1.0, 1.0)])
    );
    assert_eq!(engine.selected(), &[feature.id]);

    engine.trash();
    assert_eq!(
        engine.take_mutations(),
        vec![FeatureMutation::Remove(feature.id)]
    );
    assert!(engine.selected().is_empty());
}

#[test]
fn passing_polygon_is_not_added() {
    let journal = Journal::default();
    let mut engine = engine_with(&journal);
    engine
        .change_mode(BuiltinMode::PassingPolygon.id(), ModeParams::new())
        .unwrap();
    for (lng, lat) in [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)] {
        engine.handle_input(&InputEvent::click(at(lng, lat)));
    }
    engine.handle_input(&InputEvent::key("Enter"));

    let mutations = engine.take_mutations();
    assert!(matches!(mutations.as_slice(), [FeatureMutation::Passed(_)]));
    assert!(engine.selected().is_empty());
}

#[test]
fn scale_rotate_targets_selection_at_entry() {
    let journal = Journal::default();
    let mut engine = engine_with(&journal);
    let parcel = FeatureId::intern("parcel");
    engine.set_selected(vec![parcel]);
    let params = ModeParams::new()
        .with("canScale", true)
        .with("canRotate", false);
    engine
        .change_mode(BuiltinMode::ScaleRotate.id(), params)
        .unwrap();

    engine.handle_input(&InputEvent::PointerDown {
        at: at(0.0, 0.0),
        modifiers: mdp_core::Modifiers::NONE,
    });
    engine.handle_input(&InputEvent::PointerMove {
        at: at(1.0, 0.0),
        modifiers: mdp_core::Modifiers::NONE,
    });
    let mutations = engine.take_mutations();
    let [FeatureMutation::Request(mdp_core::EditRequest::Transform { targets, .. })] =
        mutations.as_slice()
    else {
        panic!("expected a transform, got {mutations:?}");
    };
    assert_eq!(targets, &vec![parcel]);
}

#[test]
fn scale_rotate_params_pass_through_unmodified() {
    let journal = Journal::default();
    let mut engine = engine_with(&journal);
    let params = ModeParams::new()
        .with("canScale", true)
        .with("canRotate", true)
        .with("canTrash", false);
    engine
        .change_mode(ModeId::intern("scaleRotateMode"), params.clone())
        .unwrap();

    assert_eq!(engine.active_mode(), ModeId::intern("scaleRotateMode"));
    assert_eq!(engine.active_params(), &params);
}

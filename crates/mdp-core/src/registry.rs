//! Mode registry: identifier → mode factory.
//!
//! Built once from two ordered sources. Builtins are inserted first and
//! caller overrides strictly after, so an override always replaces a builtin
//! with the same identifier. There is no error path: unknown identifiers in
//! the overrides are simply added.

use crate::error::ModeChangeError;
use crate::id::ModeId;
use crate::mode::Mode;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Produces a fresh mode object for each activation.
pub type ModeFactory = Rc<dyn Fn() -> Box<dyn Mode>>;

/// Wrap a constructor as a [`ModeFactory`].
pub fn mode_factory<M: Mode + 'static>(make: impl Fn() -> M + 'static) -> ModeFactory {
    Rc::new(move || Box::new(make()) as Box<dyn Mode>)
}

/// Immutable registry of the modes an engine can switch to.
#[derive(Clone, Default)]
pub struct ModeRegistry {
    factories: HashMap<ModeId, ModeFactory>,
    /// Identifiers in first-insertion order, for stable listings.
    order: Vec<ModeId>,
}

impl ModeRegistry {
    /// Merge builtin modes with caller overrides. Overrides win.
    pub fn merge(
        builtins: impl IntoIterator<Item = (ModeId, ModeFactory)>,
        overrides: impl IntoIterator<Item = (ModeId, ModeFactory)>,
    ) -> Self {
        let mut registry = Self::default();
        for (id, factory) in builtins {
            registry.insert(id, factory);
        }
        for (id, factory) in overrides {
            if registry.factories.contains_key(&id) {
                log::debug!("mode override replaces builtin {id}");
            }
            registry.insert(id, factory);
        }
        registry
    }

    fn insert(&mut self, id: ModeId, factory: ModeFactory) {
        if self.factories.insert(id, factory).is_none() {
            self.order.push(id);
        }
    }

    pub fn contains(&self, id: ModeId) -> bool {
        self.factories.contains_key(&id)
    }

    pub fn get(&self, id: ModeId) -> Option<&ModeFactory> {
        self.factories.get(&id)
    }

    /// Instantiate the mode registered under `id`.
    pub fn create(&self, id: ModeId) -> Result<Box<dyn Mode>, ModeChangeError> {
        self.factories
            .get(&id)
            .map(|factory| factory())
            .ok_or(ModeChangeError::UnknownMode { mode: id })
    }

    /// Registered identifiers in insertion order.
    pub fn ids(&self) -> &[ModeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.order).finish()
    }
}

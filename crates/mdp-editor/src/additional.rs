//! Measurement and combination tools on the current selection, mounted as
//! a sibling control next to the drawing toolbar.

use crate::actions::{ActionDescriptor, ActionSet};
use crate::dom::{CONTROL_GROUP_CLASSES, ElementId, ElementSpec};
use crate::engine::WeakEngine;
use crate::map::{HostMap, MapControl};
use crate::notify::Notifier;
use mdp_core::EditRequest;
use std::rc::Rc;

/// Union, buffer, length, area and centroid buttons. Each sends one
/// request for the selection to the host's geometry engine.
pub fn additional_tools() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::click(&["additional-tools", "union"], |cx| {
            let targets = cx.require_selection("union")?;
            cx.engine.request(EditRequest::Union { targets });
            Ok(())
        })
        .with_title("Union"),
        ActionDescriptor::click(&["additional-tools", "buffer"], |cx| {
            let targets = cx.require_selection("buffer")?;
            let (size, unit, steps) = cx
                .engine
                .options()
                .read(|o| (o.buffer_size, o.buffer_unit, o.buffer_steps));
            cx.engine.request(EditRequest::Buffer {
                targets,
                size,
                unit,
                steps,
            });
            Ok(())
        })
        .with_title("Buffer"),
        ActionDescriptor::click(&["additional-tools", "length"], |cx| {
            let targets = cx.require_selection("measure")?;
            let unit = cx.engine.options().read(|o| o.buffer_unit);
            cx.engine.request(EditRequest::Length { targets, unit });
            Ok(())
        })
        .with_title("Length"),
        ActionDescriptor::click(&["additional-tools", "area"], |cx| {
            let targets = cx.require_selection("measure")?;
            cx.engine.request(EditRequest::Area { targets });
            Ok(())
        })
        .with_title("Area"),
        ActionDescriptor::click(&["additional-tools", "centroid"], |cx| {
            let targets = cx.require_selection("find the centroid")?;
            cx.engine.request(EditRequest::Centroid { targets });
            Ok(())
        })
        .with_title("Centroid"),
    ]
}

pub struct AdditionalToolsBar {
    engine: WeakEngine,
    notifier: Rc<dyn Notifier>,
    actions: ActionSet,
    container: Option<ElementId>,
}

impl AdditionalToolsBar {
    pub fn new(engine: WeakEngine, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            engine,
            notifier,
            actions: ActionSet::new(additional_tools()),
            container: None,
        }
    }

    pub fn container(&self) -> Option<ElementId> {
        self.container
    }
}

impl MapControl for AdditionalToolsBar {
    fn on_add(&mut self, map: &mut dyn HostMap) -> ElementId {
        let dom = map.dom();
        let container = dom.create_element(&ElementSpec::container(&CONTROL_GROUP_CLASSES));
        self.actions
            .mount(dom, container, self.engine.clone(), self.notifier.clone());
        self.container = Some(container);
        container
    }

    fn on_remove(&mut self, map: &mut dyn HostMap) {
        let dom = map.dom();
        self.actions.unmount(dom);
        if let Some(container) = self.container.take() {
            dom.remove_element(container);
        }
    }
}

//! Repaint targets and per-tick repaint batching

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Identity of a repaintable component, used to coalesce repaints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

/// A component an animation can ask to be redrawn
///
/// The engine only holds components weakly; a component that has been
/// dropped silently ends the animations bound to it.
pub trait Repaint: Send + Sync {
    fn component_id(&self) -> ComponentId;

    /// Schedule a redraw. Called on the UI thread at most once per tick.
    fn repaint(&self);
}

/// Components touched during one tick, repainted once each in first-touch order
#[derive(Default)]
pub(crate) struct RepaintBatch {
    components: IndexMap<ComponentId, Arc<dyn Repaint>, FxBuildHasher>,
}

impl RepaintBatch {
    /// Add `component` unless it is already batched
    ///
    /// Returns false if asking the component for its id panicked; the
    /// component is then left out of the batch.
    pub(crate) fn push(&mut self, component: Arc<dyn Repaint>) -> bool {
        let id = match catch_unwind(AssertUnwindSafe(|| component.component_id())) {
            Ok(id) => id,
            Err(payload) => {
                tracing::warn!(
                    "Repaint target panicked while reporting its id: {}",
                    cadence_core::panic_message(payload.as_ref())
                );
                return false;
            }
        };
        self.components.entry(id).or_insert(component);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.components.len()
    }

    /// Repaint every batched component, returning how many were repainted
    pub(crate) fn flush(self) -> usize {
        let mut repainted = 0;
        for (id, component) in self.components {
            let result = catch_unwind(AssertUnwindSafe(|| component.repaint()));
            match result {
                Ok(()) => repainted += 1,
                Err(payload) => tracing::warn!(
                    component = id.0,
                    "Repaint panicked: {}",
                    cadence_core::panic_message(payload.as_ref())
                ),
            }
        }
        repainted
    }
}

//! Diffs successive descriptor lists by stable ID.
//!
//! The hosting view keeps one live element per ID; reconciliation tells it
//! which elements to create, update, remove and how to order the survivors.
//! Because IDs derive from source position, a streamed response that only
//! grows never recreates its earlier components, and caret, selection and
//! scroll state in the view survive every re-render.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::render::components::ComponentData;
use crate::render::id::ComponentId;

/// Instructions for the hosting view, in application order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "data")]
pub enum ViewOp {
    Remove {
        id: ComponentId,
    },
    Create {
        index: usize,
        component: ComponentData,
    },
    Update {
        id: ComponentId,
        component: ComponentData,
    },
    Reorder {
        order: Vec<ComponentId>,
    },
}

/// Holds the last-seen fingerprint per live component. Owned by the UI
/// thread; descriptor lists are processed in submission order and the
/// newest list always wins.
#[derive(Debug, Default)]
pub struct Reconciler {
    fingerprints: HashMap<ComponentId, String>,
    order: Vec<ComponentId>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// IDs of the currently live components, in display order.
    pub fn live_order(&self) -> &[ComponentId] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.fingerprints.clear();
        self.order.clear();
    }

    pub fn reconcile(&mut self, components: &[ComponentData]) -> Vec<ViewOp> {
        let mut ops = Vec::new();
        let new_ids: HashSet<ComponentId> = components.iter().map(ComponentData::id).collect();

        for id in &self.order {
            if !new_ids.contains(id) {
                ops.push(ViewOp::Remove { id: *id });
            }
        }

        for (index, component) in components.iter().enumerate() {
            match self.fingerprints.get(&component.id()) {
                None => ops.push(ViewOp::Create {
                    index,
                    component: component.clone(),
                }),
                Some(fingerprint) if *fingerprint != component.fingerprint() => {
                    ops.push(ViewOp::Update {
                        id: component.id(),
                        component: component.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let new_order: Vec<ComponentId> = components.iter().map(ComponentData::id).collect();
        if self.surviving_order_changed(&new_order, &new_ids) {
            ops.push(ViewOp::Reorder {
                order: new_order.clone(),
            });
        }

        self.fingerprints = components
            .iter()
            .map(|c| (c.id(), c.fingerprint()))
            .collect();
        self.order = new_order;

        ops
    }

    /// Creates carry their index, so a reorder is only needed when the
    /// components surviving from the previous list changed relative order.
    fn surviving_order_changed(
        &self,
        new_order: &[ComponentId],
        new_ids: &HashSet<ComponentId>,
    ) -> bool {
        let old_survivors: Vec<ComponentId> = self
            .order
            .iter()
            .copied()
            .filter(|id| new_ids.contains(id))
            .collect();
        let new_survivors: Vec<ComponentId> = new_order
            .iter()
            .copied()
            .filter(|id| self.fingerprints.contains_key(id))
            .collect();
        old_survivors != new_survivors
    }
}

//! Saved knowledge-graph node positions, one entry per document.

use std::sync::Arc;

use super::{KeyValueStore, KeyValueStoreExt, StoreError};
use crate::models::{GraphLayout, NodePosition};

pub fn layout_key(document_id: i64) -> String {
    format!("kg-layout-{}", document_id)
}

#[derive(Clone)]
pub struct GraphLayoutStore {
    store: Arc<dyn KeyValueStore>,
}

impl GraphLayoutStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved layout, empty when nothing was saved yet.
    pub fn load(&self, document_id: i64) -> Result<GraphLayout, StoreError> {
        Ok(self
            .store
            .get_json(&layout_key(document_id))?
            .unwrap_or_default())
    }

    pub fn save(&self, document_id: i64, layout: &GraphLayout) -> Result<(), StoreError> {
        self.store.set_json(&layout_key(document_id), layout)
    }

    /// Pin one node, keeping the rest of the layout.
    pub fn pin(&self, document_id: i64, node_id: i64, x: f64, y: f64) -> Result<(), StoreError> {
        let mut layout = self.load(document_id)?;
        layout.insert(node_id.to_string(), NodePosition::fixed(x, y));
        self.save(document_id, &layout)
    }

    /// Drop positions of nodes that no longer exist. Returns how many went.
    pub fn prune(&self, document_id: i64, live_nodes: &[i64]) -> Result<usize, StoreError> {
        let mut layout = self.load(document_id)?;
        let before = layout.len();
        layout.retain(|id, _| live_nodes.iter().any(|n| n.to_string() == *id));
        let removed = before - layout.len();
        if removed > 0 {
            self.save(document_id, &layout)?;
        }
        Ok(removed)
    }

    pub fn reset(&self, document_id: i64) -> Result<(), StoreError> {
        self.store.remove(&layout_key(document_id))
    }
}

//! Knowledge-graph editing for one document.

use tracing::{debug, info};

use crate::annotation::ValidationError;
use crate::api::GraphBackend;
use crate::models::{
    EntityItem, GraphLayout, KgEdge, KgEdgePayload, KgNode, KgNodePayload, Properties,
};
use crate::storage::GraphLayoutStore;

use super::ServiceError;

/// Node form contents before saving. `id` is set when editing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDraft {
    pub id: Option<i64>,
    pub name: String,
    /// Defaults to the name.
    pub text: Option<String>,
    pub entity_id: Option<i64>,
    pub label_id: Option<i64>,
    pub properties: Properties,
}

impl NodeDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A draft bound to an annotated entity, named after its text.
    pub fn from_entity(entity: &EntityItem) -> Self {
        Self {
            name: entity.text.clone(),
            entity_id: Some(entity.id),
            ..Self::default()
        }
    }

    /// Prefill a draft for editing an existing node.
    pub fn from_node(node: &KgNode) -> Self {
        Self {
            id: Some(node.id),
            name: node.name.clone(),
            text: None,
            entity_id: node.entity_id,
            label_id: node.label_id,
            properties: node.properties.clone().unwrap_or_default(),
        }
    }

    /// A label takes precedence over an entity binding; only one is sent.
    fn into_payload(self, document_id: i64) -> KgNodePayload {
        let (entity_id, label_id) = match (self.label_id, self.entity_id) {
            (Some(label), _) => (None, Some(label)),
            (None, entity) => (entity, None),
        };
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.name.clone());
        KgNodePayload {
            document_id,
            name: self.name,
            text,
            entity_id,
            label_id,
            properties: (!self.properties.is_empty()).then_some(self.properties),
        }
    }
}

/// Edge form contents before saving. `id` is set when editing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeDraft {
    pub id: Option<i64>,
    pub source_node_id: i64,
    pub target_node_id: i64,
    pub relation_label_id: Option<i64>,
    pub edge_name: Option<String>,
    pub properties: Properties,
}

pub struct GraphSession<'a, B: GraphBackend + ?Sized> {
    backend: &'a B,
    document_id: i64,
    nodes: Vec<KgNode>,
    edges: Vec<KgEdge>,
    layouts: GraphLayoutStore,
}

impl<'a, B: GraphBackend + ?Sized> GraphSession<'a, B> {
    pub async fn load(
        backend: &'a B,
        document_id: i64,
        layouts: GraphLayoutStore,
    ) -> Result<Self, ServiceError> {
        let (nodes, edges) =
            tokio::try_join!(backend.nodes(document_id), backend.edges(document_id))?;
        debug!(
            "Loaded graph of document {}: {} nodes, {} edges",
            document_id,
            nodes.len(),
            edges.len()
        );
        Ok(Self {
            backend,
            document_id,
            nodes,
            edges,
            layouts,
        })
    }

    pub fn nodes(&self) -> &[KgNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[KgEdge] {
        &self.edges
    }

    pub fn node(&self, id: i64) -> Option<&KgNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Node already bound to an entity, if any.
    pub fn node_for_entity(&self, entity_id: i64) -> Option<&KgNode> {
        self.nodes.iter().find(|n| n.entity_id == Some(entity_id))
    }

    /// Nodes whose name contains `query`, ignoring case.
    pub fn filter_nodes(&self, query: &str) -> Vec<&KgNode> {
        let query = query.to_lowercase();
        self.nodes
            .iter()
            .filter(|n| n.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Create or update a node.
    ///
    /// Binding an entity that another node already holds is refused with the
    /// holder's id, so the caller can open that node instead.
    pub async fn save_node(&mut self, draft: NodeDraft) -> Result<(), ServiceError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("node name").into());
        }
        let editing = draft.id;
        let payload = draft.into_payload(self.document_id);

        if let Some(entity_id) = payload.entity_id {
            if let Some(holder) = self.node_for_entity(entity_id) {
                if editing != Some(holder.id) {
                    return Err(ValidationError::EntityAlreadyBound {
                        entity_id,
                        node_id: holder.id,
                    }
                    .into());
                }
            }
        }

        match editing {
            Some(id) => self.backend.update_node(id, &payload).await?,
            None => {
                if let Some(label_id) = payload.label_id {
                    let duplicate = self.nodes.iter().any(|n| {
                        n.document_id == self.document_id
                            && n.label_id == Some(label_id)
                            && n.name == payload.name
                    });
                    if duplicate {
                        return Err(ValidationError::DuplicateNode(payload.name).into());
                    }
                }
                self.backend.create_node(&payload).await?;
                info!("Added node '{}' to document {}", payload.name, self.document_id);
            }
        }
        self.refresh_nodes().await
    }

    /// Delete a node. Its edges and saved position go with it.
    pub async fn delete_node(&mut self, id: i64) -> Result<(), ServiceError> {
        self.backend.delete_node(id).await?;
        self.refresh().await?;
        self.prune_layout()?;
        Ok(())
    }

    pub async fn save_edge(&mut self, draft: EdgeDraft) -> Result<(), ServiceError> {
        for id in [draft.source_node_id, draft.target_node_id] {
            if self.node(id).is_none() {
                return Err(ValidationError::EmptyField("edge endpoint").into());
            }
        }
        let payload = KgEdgePayload {
            document_id: self.document_id,
            source_node_id: draft.source_node_id,
            target_node_id: draft.target_node_id,
            relation_label_id: draft.relation_label_id,
            edge_name: draft.edge_name.filter(|n| !n.trim().is_empty()),
            properties: (!draft.properties.is_empty()).then_some(draft.properties),
        };
        match draft.id {
            Some(id) => self.backend.update_edge(id, &payload).await?,
            None => self.backend.create_edge(&payload).await?,
        }
        self.refresh_edges().await
    }

    pub async fn delete_edge(&mut self, id: i64) -> Result<(), ServiceError> {
        self.backend.delete_edge(id).await?;
        self.refresh_edges().await
    }

    pub async fn refresh(&mut self) -> Result<(), ServiceError> {
        let (nodes, edges) = tokio::try_join!(
            self.backend.nodes(self.document_id),
            self.backend.edges(self.document_id)
        )?;
        self.nodes = nodes;
        self.edges = edges;
        Ok(())
    }

    async fn refresh_nodes(&mut self) -> Result<(), ServiceError> {
        self.nodes = self.backend.nodes(self.document_id).await?;
        Ok(())
    }

    async fn refresh_edges(&mut self) -> Result<(), ServiceError> {
        self.edges = self.backend.edges(self.document_id).await?;
        Ok(())
    }

    pub fn layout(&self) -> Result<GraphLayout, ServiceError> {
        Ok(self.layouts.load(self.document_id)?)
    }

    pub fn pin_node(&self, node_id: i64, x: f64, y: f64) -> Result<(), ServiceError> {
        Ok(self.layouts.pin(self.document_id, node_id, x, y)?)
    }

    pub fn reset_layout(&self) -> Result<(), ServiceError> {
        Ok(self.layouts.reset(self.document_id)?)
    }

    /// Forget positions of nodes that no longer exist.
    pub fn prune_layout(&self) -> Result<usize, ServiceError> {
        let live: Vec<i64> = self.nodes.iter().map(|n| n.id).collect();
        Ok(self.layouts.prune(self.document_id, &live)?)
    }
}

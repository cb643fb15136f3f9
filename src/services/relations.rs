//! Relations between annotated entities of one document.

use tracing::info;

use crate::annotation::{check_relation, ValidationError};
use crate::api::{AnnotationBackend, RelationBackend};
use crate::models::{EntityItem, Relation, RelationLabel, RelationPayload};

use super::ServiceError;

/// A relation with its label and endpoints resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationView {
    pub relation: Relation,
    pub label: Option<String>,
    pub head: Option<String>,
    pub tail: Option<String>,
}

impl RelationView {
    /// `head --label--> tail`, with ids standing in for anything unresolved.
    pub fn describe(&self) -> String {
        let r = &self.relation;
        format!(
            "{} --{}--> {}",
            self.head
                .clone()
                .unwrap_or_else(|| format!("#{}", r.head_entity_id)),
            self.label
                .clone()
                .unwrap_or_else(|| format!("#{}", r.relation_label_id)),
            self.tail
                .clone()
                .unwrap_or_else(|| format!("#{}", r.tail_entity_id)),
        )
    }
}

pub struct RelationSession<'a, B: AnnotationBackend + RelationBackend + ?Sized> {
    backend: &'a B,
    document_id: i64,
    entities: Vec<EntityItem>,
    relations: Vec<Relation>,
    labels: Vec<RelationLabel>,
}

impl<'a, B: AnnotationBackend + RelationBackend + ?Sized> RelationSession<'a, B> {
    pub async fn load(backend: &'a B, document_id: i64) -> Result<Self, ServiceError> {
        let (entities, relations, labels) = tokio::try_join!(
            backend.entity_items(document_id),
            backend.relations(document_id),
            backend.relation_labels(),
        )?;
        Ok(Self {
            backend,
            document_id,
            entities,
            relations,
            labels,
        })
    }

    pub fn entities(&self) -> &[EntityItem] {
        &self.entities
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn labels(&self) -> &[RelationLabel] {
        &self.labels
    }

    pub fn views(&self) -> Vec<RelationView> {
        let entity_text = |id: i64| {
            self.entities
                .iter()
                .find(|e| e.id == id)
                .map(|e| e.text.clone())
        };
        self.relations
            .iter()
            .map(|r| RelationView {
                relation: r.clone(),
                label: self
                    .labels
                    .iter()
                    .find(|l| l.id == r.relation_label_id)
                    .map(|l| l.relation_name.clone()),
                head: entity_text(r.head_entity_id),
                tail: entity_text(r.tail_entity_id),
            })
            .collect()
    }

    pub async fn create(&mut self, label_id: i64, head: i64, tail: i64) -> Result<(), ServiceError> {
        let payload = self.payload(None, label_id, head, tail)?;
        self.backend.create_relation(&payload).await?;
        info!(
            "Linked entity {} to {} in document {}",
            head, tail, self.document_id
        );
        self.refresh().await
    }

    pub async fn update(
        &mut self,
        id: i64,
        label_id: i64,
        head: i64,
        tail: i64,
    ) -> Result<(), ServiceError> {
        let payload = self.payload(Some(id), label_id, head, tail)?;
        self.backend.update_relation(&payload).await?;
        self.refresh().await
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ServiceError> {
        self.backend.delete_relation(id).await?;
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<(), ServiceError> {
        self.relations = self.backend.relations(self.document_id).await?;
        Ok(())
    }

    fn payload(
        &self,
        id: Option<i64>,
        label_id: i64,
        head: i64,
        tail: i64,
    ) -> Result<RelationPayload, ValidationError> {
        if !self.labels.iter().any(|l| l.id == label_id) {
            return Err(ValidationError::EmptyField("relation label"));
        }
        check_relation(&self.entities, head, tail)?;
        Ok(RelationPayload {
            id,
            document_id: self.document_id,
            relation_label_id: label_id,
            head_entity_id: head,
            tail_entity_id: tail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake::FakeBackend;

    fn backend() -> FakeBackend {
        let backend = FakeBackend::with_tokens(&["Alice", " works at ", "Acme", "."]);
        backend.add_entity(1, 10, 0, 0);
        backend.add_entity(2, 11, 2, 2);
        {
            let mut state = backend.state.lock().unwrap();
            state.entities[0].text = "Alice".to_string();
            state.entities[1].text = "Acme".to_string();
            state.relation_labels.push(RelationLabel {
                id: 5,
                relation_name: "works_for".to_string(),
                description: None,
            });
        }
        backend
    }

    #[tokio::test]
    async fn test_create_and_describe() {
        let backend = backend();
        let mut session = RelationSession::load(&backend, 1).await.unwrap();
        session.create(5, 1, 2).await.unwrap();

        let views = session.views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].describe(), "Alice --works_for--> Acme");
    }

    #[tokio::test]
    async fn test_endpoints_are_validated_locally() {
        let backend = backend();
        let mut session = RelationSession::load(&backend, 1).await.unwrap();
        assert!(matches!(
            session.create(5, 1, 1).await,
            Err(ServiceError::Validation(ValidationError::SameEndpoints))
        ));
        assert!(matches!(
            session.create(5, 1, 99).await,
            Err(ServiceError::Validation(ValidationError::UnknownEntity(99)))
        ));
        assert!(session.create(6, 1, 2).await.unwrap_err().is_validation());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_id_in_body_then_delete() {
        let backend = backend();
        let mut session = RelationSession::load(&backend, 1).await.unwrap();
        session.create(5, 1, 2).await.unwrap();
        let id = session.relations()[0].id;

        session.update(id, 5, 2, 1).await.unwrap();
        assert_eq!(session.relations()[0].head_entity_id, 2);

        session.delete(id).await.unwrap();
        assert!(session.relations().is_empty());
        assert_eq!(
            backend.calls(),
            vec!["create_relation", "update_relation", "delete_relation"]
        );
    }

    #[test]
    fn test_unresolved_endpoints_fall_back_to_ids() {
        let view = RelationView {
            relation: Relation {
                id: 1,
                document_id: 1,
                relation_label_id: 3,
                head_entity_id: 7,
                tail_entity_id: 8,
                created_at: None,
            },
            label: None,
            head: Some("Alice".to_string()),
            tail: None,
        };
        assert_eq!(view.describe(), "Alice --#3--> #8");
    }
}

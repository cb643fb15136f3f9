//! Entity annotation of one document.

use tracing::{debug, info};

use crate::annotation::{
    check_label_name, check_range, paint_tokens, ColorAssigner, ColorAssignment, MatchOutcome,
    MatchProposal, PaintedRun, ResolvedSelection, Selection, SelectionResolver, TextMatcher,
    TokenOffsetIndex, TokenRange, ValidationError,
};
use crate::api::AnnotationBackend;
use crate::models::{DocumentToken, EntityItem, EntityItemPayload, EntityLabel, EntityLabelPayload};

use super::ServiceError;

/// What a create-by-text call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub outcome: MatchOutcome,
    /// Ranges the text mapped onto, including already annotated ones.
    pub matched: usize,
    /// Ranges created.
    pub created: Vec<TokenRange>,
}

/// Tokens, entities and labels of one document, plus the operations that
/// change them.
pub struct AnnotationSession<'a, B: AnnotationBackend + ?Sized> {
    backend: &'a B,
    document_id: i64,
    tokens: Vec<DocumentToken>,
    index: TokenOffsetIndex,
    text: String,
    entities: Vec<EntityItem>,
    labels: Vec<EntityLabel>,
}

impl<'a, B: AnnotationBackend + ?Sized> AnnotationSession<'a, B> {
    /// Fetch everything needed to annotate a document.
    pub async fn load(backend: &'a B, document_id: i64) -> Result<Self, ServiceError> {
        let (tokens, entities, labels) = tokio::try_join!(
            backend.tokens(document_id),
            backend.entity_items(document_id),
            backend.entity_labels(),
        )?;
        let index = TokenOffsetIndex::build(&tokens);
        let text = tokens.iter().map(|t| t.token_text.as_str()).collect();
        debug!(
            "Loaded document {}: {} tokens, {} entities, {} labels",
            document_id,
            tokens.len(),
            entities.len(),
            labels.len()
        );
        Ok(Self {
            backend,
            document_id,
            tokens,
            index,
            text,
            entities,
            labels,
        })
    }

    pub fn document_id(&self) -> i64 {
        self.document_id
    }

    pub fn tokens(&self) -> &[DocumentToken] {
        &self.tokens
    }

    pub fn index(&self) -> &TokenOffsetIndex {
        &self.index
    }

    /// Concatenated token text, as rendered.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entities(&self) -> &[EntityItem] {
        &self.entities
    }

    pub fn labels(&self) -> &[EntityLabel] {
        &self.labels
    }

    pub fn label(&self, id: i64) -> Option<&EntityLabel> {
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn entity(&self, id: i64) -> Option<&EntityItem> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Entities for listing: by label id, then by first token.
    pub fn sorted_entities(&self) -> Vec<&EntityItem> {
        let mut sorted: Vec<&EntityItem> = self.entities.iter().collect();
        sorted.sort_by_key(|e| (e.label_id, e.token_start, e.token_end, e.id));
        sorted
    }

    /// Text covered by a token range.
    pub fn range_text(&self, range: TokenRange) -> Option<String> {
        if range.start > range.end || range.end >= self.tokens.len() {
            return None;
        }
        Some(
            self.tokens[range.start..=range.end]
                .iter()
                .map(|t| t.token_text.as_str())
                .collect(),
        )
    }

    pub fn resolve(&self, selection: &Selection) -> Option<ResolvedSelection> {
        SelectionResolver::new(&self.index).resolve(selection)
    }

    /// Color indices for the current entities.
    pub fn colors(&self, palette_size: usize) -> ColorAssignment {
        let label_ids: Vec<i64> = self.labels.iter().map(|l| l.id).collect();
        ColorAssigner::new(palette_size, &label_ids).assign(&self.entities)
    }

    /// Token runs ready for colored rendering.
    pub fn painted(&self, palette_size: usize) -> Vec<PaintedRun> {
        let assignment = self.colors(palette_size);
        paint_tokens(self.tokens.iter().map(|t| t.token_text.as_str()), &assignment)
    }

    /// Propose ranges for every literal occurrence of `needle`.
    pub fn propose(&self, needle: &str) -> MatchProposal {
        TextMatcher::new(&self.index, &self.text).propose(needle, &self.entities)
    }

    /// Annotate a user selection with a label.
    pub async fn annotate_selection(
        &mut self,
        label_id: i64,
        selection: &Selection,
    ) -> Result<TokenRange, ServiceError> {
        let resolved = self
            .resolve(selection)
            .ok_or(ValidationError::MissingSelection)?;
        self.create_range(label_id, resolved.range, &resolved.text)
            .await?;
        Ok(resolved.range)
    }

    /// Annotate one explicit token range.
    pub async fn create_range(
        &mut self,
        label_id: i64,
        range: TokenRange,
        text: &str,
    ) -> Result<(), ServiceError> {
        let payload = self.payload(label_id, range, text)?;
        check_range(&self.entities, range, None)?;
        self.backend.create_entity_item(&payload).await?;
        info!("Annotated {} in document {}", range, self.document_id);
        self.refresh_entities().await
    }

    /// Annotate every not-yet-annotated occurrence of `text`.
    ///
    /// Zero occurrences and all-already-present are reported, not errors.
    pub async fn annotate_text(
        &mut self,
        label_id: i64,
        text: &str,
    ) -> Result<MatchReport, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyField("entity text").into());
        }
        self.require_label(label_id)?;

        let proposal = self.propose(text);
        let outcome = proposal.outcome();
        if proposal.proposed.is_empty() {
            return Ok(MatchReport {
                outcome,
                matched: proposal.mapped.len(),
                created: Vec::new(),
            });
        }

        let mut created = Vec::with_capacity(proposal.proposed.len());
        for range in &proposal.proposed {
            let payload = EntityItemPayload::new(self.document_id, label_id, text, *range);
            if let Err(e) = self.backend.create_entity_item(&payload).await {
                // Keep what did get created visible before reporting.
                if !created.is_empty() {
                    self.refresh_entities().await?;
                }
                return Err(e.into());
            }
            created.push(*range);
        }
        info!(
            "Annotated {} of {} occurrences of '{}' in document {}",
            created.len(),
            proposal.mapped.len(),
            text,
            self.document_id
        );
        self.refresh_entities().await?;
        Ok(MatchReport {
            outcome,
            matched: proposal.mapped.len(),
            created,
        })
    }

    /// Change an entity's label, range or text.
    pub async fn update_entity(
        &mut self,
        id: i64,
        label_id: i64,
        range: TokenRange,
        text: &str,
    ) -> Result<(), ServiceError> {
        if self.entity(id).is_none() {
            return Err(ValidationError::UnknownEntity(id).into());
        }
        let payload = self.payload(label_id, range, text)?;
        check_range(&self.entities, range, Some(id))?;
        self.backend.update_entity_item(id, &payload).await?;
        self.refresh_entities().await
    }

    pub async fn delete_entity(&mut self, id: i64) -> Result<(), ServiceError> {
        self.backend.delete_entity_item(id).await?;
        self.refresh_entities().await
    }

    /// Create a label (`editing = None`) or rename one.
    pub async fn save_label(
        &mut self,
        editing: Option<i64>,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), ServiceError> {
        let label_name = check_label_name(&self.labels, name, editing)?;
        let payload = EntityLabelPayload {
            label_name,
            description: description.map(str::to_string),
        };
        match editing {
            Some(id) => self.backend.update_entity_label(id, &payload).await?,
            None => self.backend.create_entity_label(&payload).await?,
        }
        self.refresh_all().await
    }

    pub async fn delete_label(&mut self, id: i64) -> Result<(), ServiceError> {
        self.backend.delete_entity_label(id).await?;
        self.refresh_all().await
    }

    pub async fn refresh_entities(&mut self) -> Result<(), ServiceError> {
        self.entities = self.backend.entity_items(self.document_id).await?;
        Ok(())
    }

    async fn refresh_all(&mut self) -> Result<(), ServiceError> {
        let (entities, labels) = tokio::try_join!(
            self.backend.entity_items(self.document_id),
            self.backend.entity_labels(),
        )?;
        self.entities = entities;
        self.labels = labels;
        Ok(())
    }

    fn require_label(&self, label_id: i64) -> Result<(), ValidationError> {
        if self.label(label_id).is_none() {
            return Err(ValidationError::UnknownLabel(label_id));
        }
        Ok(())
    }

    fn payload(
        &self,
        label_id: i64,
        range: TokenRange,
        text: &str,
    ) -> Result<EntityItemPayload, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyField("entity text"));
        }
        self.require_label(label_id)?;
        if range.start > range.end || range.end >= self.tokens.len() {
            return Err(ValidationError::RangeOutOfBounds {
                range,
                tokens: self.tokens.len(),
            });
        }
        Ok(EntityItemPayload::new(
            self.document_id,
            label_id,
            text.trim(),
            range,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake::FakeBackend;

    const BANK: [&str; 6] = ["Bank", " of ", "China", " is ", "big", "."];
    const PARIS: [&str; 16] = [
        "Paris", " ", "is", " ", "in", " ", "France", ".", " ", "Paris", " ", "has", " ", "a",
        " ", "tower.",
    ];

    fn bank() -> FakeBackend {
        let backend = FakeBackend::with_tokens(&BANK);
        backend.add_label(1, "ORG");
        backend.add_label(2, "LOC");
        backend
    }

    #[tokio::test]
    async fn test_nested_selections_coexist() {
        let backend = bank();
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();
        assert_eq!(session.text(), "Bank of China is big.");

        let inner = session
            .annotate_selection(2, &Selection::within(session.text(), 8, 13))
            .await
            .unwrap();
        assert_eq!(inner, TokenRange::single(2));

        let outer = session
            .annotate_selection(1, &Selection::within(session.text(), 0, 13))
            .await
            .unwrap();
        assert_eq!(outer, TokenRange::new(0, 2));
        assert_eq!(session.entities().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_range_never_reaches_backend() {
        let backend = bank();
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();
        session
            .create_range(2, TokenRange::single(2), "China")
            .await
            .unwrap();
        let calls_before = backend.calls().len();

        let err = session
            .create_range(1, TokenRange::single(2), "China")
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(backend.calls().len(), calls_before);
        assert_eq!(session.entities().len(), 1);
    }

    #[tokio::test]
    async fn test_collapsed_selection_is_rejected() {
        let backend = bank();
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();
        let err = session
            .annotate_selection(1, &Selection::new(3, ""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingSelection)
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_annotate_text_skips_existing_ranges() {
        let backend = FakeBackend::with_tokens(&PARIS);
        backend.add_label(3, "LOC");
        backend.add_entity(50, 3, 0, 0);
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();

        let report = session.annotate_text(3, "Paris").await.unwrap();
        assert_eq!(report.outcome, MatchOutcome::New(1));
        assert_eq!(report.matched, 2);
        assert_eq!(report.created, vec![TokenRange::single(9)]);
        assert_eq!(session.entities().len(), 2);

        let again = session.annotate_text(3, "Paris").await.unwrap();
        assert_eq!(again.outcome, MatchOutcome::AllExisting);
        assert!(again.created.is_empty());

        let missing = session.annotate_text(3, "London").await.unwrap();
        assert_eq!(missing.outcome, MatchOutcome::NoOccurrences);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_state_and_skips_refetch() {
        let backend = bank();
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();
        backend.state.lock().unwrap().fail_mutations = Some(503);

        let err = session
            .create_range(1, TokenRange::new(0, 2), "Bank of China")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "backend unavailable");
        assert!(session.entities().is_empty());
    }

    #[tokio::test]
    async fn test_update_may_keep_its_own_range() {
        let backend = bank();
        backend.add_entity(10, 1, 0, 2);
        backend.add_entity(11, 2, 4, 4);
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();

        session
            .update_entity(10, 2, TokenRange::new(0, 2), "Bank of China")
            .await
            .unwrap();
        assert_eq!(session.entity(10).unwrap().label_id, 2);

        let err = session
            .update_entity(10, 1, TokenRange::single(4), "big")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_out_of_bounds_and_unknown_label() {
        let backend = bank();
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();
        assert!(matches!(
            session.create_range(1, TokenRange::new(4, 9), "x").await,
            Err(ServiceError::Validation(ValidationError::RangeOutOfBounds { .. }))
        ));
        assert!(matches!(
            session.create_range(77, TokenRange::single(0), "Bank").await,
            Err(ServiceError::Validation(ValidationError::UnknownLabel(77)))
        ));
        let err = session.annotate_text(77, "Bank").await.unwrap_err();
        assert_eq!(err.to_string(), "no entity label with id 77");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_label_names_are_unique() {
        let backend = bank();
        let mut session = AnnotationSession::load(&backend, 1).await.unwrap();
        assert!(session.save_label(None, " org ", None).await.unwrap_err().is_validation());
        session.save_label(None, "PER", Some("people")).await.unwrap();
        assert_eq!(session.labels().len(), 3);
        session.save_label(Some(1), "org", None).await.unwrap();
        assert_eq!(session.label(1).unwrap().label_name, "org");
    }

    #[tokio::test]
    async fn test_painted_runs_follow_entities() {
        let backend = bank();
        backend.add_entity(10, 1, 0, 2);
        let session = AnnotationSession::load(&backend, 1).await.unwrap();
        let runs = session.painted(30);
        assert_eq!(runs[0].text, "Bank of China");
        assert_eq!(runs[0].color, Some(0));
        assert_eq!(session.range_text(TokenRange::new(2, 4)).as_deref(), Some("China is big"));
        assert_eq!(session.range_text(TokenRange::single(6)), None);
        assert_eq!(session.range_text(TokenRange { start: 4, end: 2 }), None);
    }

    #[tokio::test]
    async fn test_swapped_backend_entity_still_paints() {
        let backend = bank();
        backend.add_entity(12, 1, 2, 0);
        let session = AnnotationSession::load(&backend, 1).await.unwrap();
        let runs = session.painted(30);
        assert_eq!(runs[0].text, "Bank of China");
        assert!(runs[0].color.is_some());
        assert_eq!(session.colors(30).indices().len(), 1);
    }
}

//! Document listing, search and creation.

use std::path::Path;

use futures::future::join_all;
use tracing::{info, warn};

use crate::annotation::ValidationError;
use crate::api::{AnnotationBackend, DocumentBackend, RelationBackend};
use crate::import;
use crate::models::{Document, DocumentPayload, DocumentSummary};

use super::ServiceError;

/// Documents shown per page.
pub const PAGE_SIZE: usize = 6;

/// One page of a filtered document listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub items: Vec<DocumentSummary>,
    /// 1-based, clamped to the available pages.
    pub page: usize,
    pub total_pages: usize,
    /// Documents matching the filter.
    pub total: usize,
}

pub struct DocumentService<'a, B>
where
    B: DocumentBackend + AnnotationBackend + RelationBackend + ?Sized,
{
    backend: &'a B,
}

impl<'a, B> DocumentService<'a, B>
where
    B: DocumentBackend + AnnotationBackend + RelationBackend + ?Sized,
{
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Documents whose title contains `query` (ignoring case), paged.
    pub async fn page(&self, query: &str, page: usize) -> Result<DocumentPage, ServiceError> {
        let query = query.trim().to_lowercase();
        let matching: Vec<Document> = self
            .backend
            .documents()
            .await?
            .into_iter()
            .filter(|d| query.is_empty() || d.title.to_lowercase().contains(&query))
            .collect();

        let total = matching.len();
        let total_pages = total.div_ceil(PAGE_SIZE).max(1);
        let page = page.clamp(1, total_pages);
        let on_page: Vec<Document> = matching
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect();

        Ok(DocumentPage {
            items: self.summarize(on_page).await,
            page,
            total_pages,
            total,
        })
    }

    /// Attach entity and relation counts. A failed count reads as zero.
    pub async fn summarize(&self, documents: Vec<Document>) -> Vec<DocumentSummary> {
        let counts = join_all(documents.iter().map(|d| self.counts(d.id))).await;
        documents
            .into_iter()
            .zip(counts)
            .map(|(document, (entity_count, relation_count))| DocumentSummary {
                document,
                entity_count,
                relation_count,
            })
            .collect()
    }

    async fn counts(&self, document_id: i64) -> (usize, usize) {
        let (entities, relations) = tokio::join!(
            self.backend.entity_items(document_id),
            self.backend.relations(document_id)
        );
        let entities = entities.map(|e| e.len()).unwrap_or_else(|e| {
            warn!("Could not count entities of document {}: {}", document_id, e);
            0
        });
        let relations = relations.map(|r| r.len()).unwrap_or_else(|e| {
            warn!("Could not count relations of document {}: {}", document_id, e);
            0
        });
        (entities, relations)
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<Document, ServiceError> {
        let payload = validate(title, content)?;
        let document = self.backend.create_document(&payload).await?;
        info!("Created document {} '{}'", document.id, document.title);
        Ok(document)
    }

    /// Read a .txt, .docx or .pdf file and create a document from it.
    ///
    /// The title defaults to the file name without extension.
    pub async fn import(&self, path: &Path, title: Option<&str>) -> Result<Document, ServiceError> {
        let imported = import::import_file(path).await?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(imported.title.as_str());
        self.create(title, &imported.content).await
    }

    pub async fn update(&self, id: i64, title: &str, content: &str) -> Result<(), ServiceError> {
        let payload = validate(title, content)?;
        self.backend.update_document(id, &payload).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.backend.delete_document(id).await?;
        info!("Deleted document {}", id);
        Ok(())
    }
}

fn validate(title: &str, content: &str) -> Result<DocumentPayload, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyField("title"));
    }
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyField("content"));
    }
    Ok(DocumentPayload {
        title: title.to_string(),
        content: content.to_string(),
    })
}

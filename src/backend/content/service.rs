/**
 * Content Service
 *
 * Note creation, PDF upload and deletion. Reads stay on [`ContentCatalog`].
 *
 * Deleting content also deletes every invite that points at it. Invites
 * whose content disappears some other way are still caught at validation
 * time, which reports `ContentNotFound`.
 */

use std::sync::Arc;

use tracing::Span;

use crate::backend::clock::Clock;
use crate::backend::content::files::{upload_name, FileStore};
use crate::backend::content::{ContentCatalog, ContentRecord, ContentType, NewContent, StoredFile};
use crate::backend::error::ContentError;
use crate::backend::invites::model::InviteRepository;
use crate::backend::store::{ContentId, UserId};

/// Fields of a new note
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub is_public: bool,
}

/// Fields and bytes of an uploaded PDF
#[derive(Debug, Clone, Default)]
pub struct PdfDraft {
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub bytes: Vec<u8>,
}

pub struct ContentService {
    catalog: ContentCatalog,
    invites: Arc<dyn InviteRepository>,
    files: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl ContentService {
    pub fn new(
        catalog: ContentCatalog,
        invites: Arc<dyn InviteRepository>,
        files: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
        span: Span,
    ) -> Self {
        Self {
            catalog,
            invites,
            files,
            clock,
            span,
        }
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub async fn create_note(
        &self,
        owner_id: UserId,
        draft: NoteDraft,
    ) -> Result<ContentRecord, ContentError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ContentError::MissingTitle);
        }

        let note = self
            .catalog
            .store(ContentType::Note)
            .create(NewContent {
                owner_id,
                title: title.to_string(),
                body: draft.content,
                is_public: draft.is_public,
                file: None,
                created_at: self.clock.now(),
            })
            .await
            .map_err(ContentError::storage("creating note"))?;

        tracing::info!(parent: &self.span, content_id = note.id, user_id = owner_id, "note created");
        Ok(note)
    }

    /// Store the file, then the row
    ///
    /// The file is removed again when the row cannot be written.
    pub async fn upload_pdf(
        &self,
        owner_id: UserId,
        draft: PdfDraft,
    ) -> Result<ContentRecord, ContentError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ContentError::MissingTitle);
        }
        if draft.bytes.is_empty() {
            return Err(ContentError::MissingFile);
        }

        let size = draft.bytes.len() as i64;
        let path = self
            .files
            .save(&upload_name(owner_id), &draft.bytes)
            .await
            .map_err(ContentError::storage("saving upload"))?;

        let created = self
            .catalog
            .store(ContentType::Pdf)
            .create(NewContent {
                owner_id,
                title: title.to_string(),
                body: draft.description,
                is_public: draft.is_public,
                file: Some(StoredFile {
                    path: path.clone(),
                    size,
                }),
                created_at: self.clock.now(),
            })
            .await;

        let pdf = match created {
            Ok(pdf) => pdf,
            Err(e) => {
                self.discard_file(&path).await;
                return Err(ContentError::storage("creating pdf")(e));
            }
        };

        tracing::info!(parent: &self.span, content_id = pdf.id, user_id = owner_id, file_size = size, "pdf uploaded");
        Ok(pdf)
    }

    /// Delete content owned by `requester`, with its invites and file
    ///
    /// Returns how many invites went with it.
    ///
    /// # Errors
    /// * `ContentNotFound`, `NotAuthorized`
    pub async fn delete_content(
        &self,
        content_type: ContentType,
        content_id: ContentId,
        requester: UserId,
    ) -> Result<u64, ContentError> {
        let store = self.catalog.store(content_type);
        let content = store
            .find_by_id(content_id)
            .await
            .map_err(ContentError::storage("looking up content"))?
            .ok_or(ContentError::ContentNotFound)?;

        if content.owner_id != requester {
            tracing::info!(parent: &self.span, content_id, %content_type, user_id = requester, "content deletion by non-owner rejected");
            return Err(ContentError::NotAuthorized);
        }

        if !store
            .delete(content_id)
            .await
            .map_err(ContentError::storage("deleting content"))?
        {
            return Err(ContentError::ContentNotFound);
        }

        let invites_removed = self
            .invites
            .delete_by_content(content_id, content_type)
            .await
            .map_err(ContentError::storage("deleting invites for content"))?;

        if let Some(path) = content.file_path.as_deref().filter(|p| !p.is_empty()) {
            self.discard_file(path).await;
        }

        tracing::info!(parent: &self.span, content_id, %content_type, invites_removed, "content deleted");
        Ok(invites_removed)
    }

    async fn discard_file(&self, path: &str) {
        if let Err(e) = self.files.delete(path).await {
            tracing::warn!(parent: &self.span, error = %e, "failed to remove stored file");
        }
    }
}

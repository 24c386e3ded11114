/**
 * Content Handlers
 *
 * # Routes (under /api/v1)
 *
 * Optional authentication; private content is served to its owner only:
 * - `GET /notes/{id}`, `GET /pdfs/{id}`
 *
 * Authenticated:
 * - `POST /notes` - JSON body `{ title, content, isPublic }`
 * - `POST /pdfs` - multipart form with `file`, `title`, `description`, `isPublic`
 * - `DELETE /notes/{id}`, `DELETE /pdfs/{id}` - owner only; invites go too
 */

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::content::service::{ContentService, NoteDraft, PdfDraft};
use crate::backend::content::{ContentCatalog, ContentRecord, ContentType};
use crate::backend::error::{BackendError, InviteError};
use crate::backend::middleware::{AuthUser, OptionalAuthUser};
use crate::backend::store::ContentId;

/// Largest accepted PDF upload, in bytes
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub is_public: bool,
}

async fn read(
    catalog: &ContentCatalog,
    content_type: ContentType,
    id: ContentId,
    viewer: &OptionalAuthUser,
) -> Result<Json<ContentRecord>, BackendError> {
    let content = catalog.resolve(id, content_type).await?;
    if !content.viewable_by(viewer.user_id()) {
        tracing::debug!(content_id = id, %content_type, "private content requested by non-owner");
        return Err(InviteError::NotAuthorized.into());
    }
    Ok(Json(content))
}

pub async fn get_note(
    State(catalog): State<ContentCatalog>,
    viewer: OptionalAuthUser,
    Path(id): Path<ContentId>,
) -> Result<Json<ContentRecord>, BackendError> {
    read(&catalog, ContentType::Note, id, &viewer).await
}

pub async fn get_pdf(
    State(catalog): State<ContentCatalog>,
    viewer: OptionalAuthUser,
    Path(id): Path<ContentId>,
) -> Result<Json<ContentRecord>, BackendError> {
    read(&catalog, ContentType::Pdf, id, &viewer).await
}

pub async fn create_note(
    State(content): State<Arc<ContentService>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<ContentRecord>), BackendError> {
    let note = content
        .create_note(
            user.user_id,
            NoteDraft {
                title: request.title,
                content: request.content,
                is_public: request.is_public,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

fn bad_form(err: MultipartError) -> BackendError {
    BackendError::handler(err.status(), err.body_text())
}

/// Upload a PDF
///
/// Unknown form fields are ignored. `isPublic` is true only when it is the
/// literal string `true`.
pub async fn upload_pdf(
    State(content): State<Arc<ContentService>>,
    AuthUser(user): AuthUser,
    mut form: Multipart,
) -> Result<(StatusCode, Json<ContentRecord>), BackendError> {
    let mut draft = PdfDraft::default();

    while let Some(field) = form.next_field().await.map_err(bad_form)? {
        match field.name() {
            Some("file") => draft.bytes = field.bytes().await.map_err(bad_form)?.to_vec(),
            Some("title") => draft.title = field.text().await.map_err(bad_form)?,
            Some("description") => draft.description = field.text().await.map_err(bad_form)?,
            Some("isPublic") => draft.is_public = field.text().await.map_err(bad_form)? == "true",
            _ => {}
        }
    }

    let pdf = content.upload_pdf(user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(pdf)))
}

async fn delete_for(
    content: &ContentService,
    content_type: ContentType,
    id: ContentId,
    user: &AuthUser,
) -> Result<Json<Value>, BackendError> {
    content.delete_content(content_type, id, user.0.user_id).await?;
    Ok(Json(json!({ "message": format!("{} deleted", content_type) })))
}

pub async fn delete_note(
    State(content): State<Arc<ContentService>>,
    user: AuthUser,
    Path(id): Path<ContentId>,
) -> Result<Json<Value>, BackendError> {
    delete_for(&content, ContentType::Note, id, &user).await
}

pub async fn delete_pdf(
    State(content): State<Arc<ContentService>>,
    user: AuthUser,
    Path(id): Path<ContentId>,
) -> Result<Json<Value>, BackendError> {
    delete_for(&content, ContentType::Pdf, id, &user).await
}

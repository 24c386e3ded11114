//! Shared Content Access
//!
//! Notes and PDFs: an id, an owner, a title, a body and a visibility flag.
//! PDFs additionally carry the stored file. Creation and deletion go through
//! [`service::ContentService`]; this module answers "does it exist" and
//! "who may read it".
//!
//! Normal reads follow the owner-or-public rule in
//! [`ContentRecord::viewable_by`]. Reads through an invite token skip that
//! rule entirely; see `invites::handlers`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::backend::error::InviteError;
use crate::backend::store::{ContentId, StoreError, UserId};

/// Uploaded file storage
pub mod files;
/// Create, read and delete handlers
pub mod handlers;
/// Content creation and deletion
pub mod service;

/// Kind of shareable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Note,
    Pdf,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Pdf => "pdf",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Note => "notes",
            Self::Pdf => "pdfs",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = InviteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Self::Note),
            "pdf" => Ok(Self::Pdf),
            _ => Err(InviteError::InvalidContentType),
        }
    }
}

/// One note or PDF
///
/// `body` is the note text, or the description of a PDF. The on-disk path
/// of a PDF never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: ContentId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    pub title: String,
    pub body: String,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip)]
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A file already written to a [`files::FileStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub size: i64,
}

/// Row to insert; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewContent {
    pub owner_id: UserId,
    pub title: String,
    pub body: String,
    pub is_public: bool,
    /// Present for PDFs only
    pub file: Option<StoredFile>,
    pub created_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Normal-path read rule: public content, or the owner's own
    pub fn viewable_by(&self, viewer: Option<UserId>) -> bool {
        self.is_public || viewer == Some(self.owner_id)
    }
}

/// Content persistence contract, one instance per content table
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn find_by_id(&self, id: ContentId) -> Result<Option<ContentRecord>, StoreError>;

    async fn create(&self, content: NewContent) -> Result<ContentRecord, StoreError>;

    /// Remove one row; `false` when it was already gone
    async fn delete(&self, id: ContentId) -> Result<bool, StoreError>;
}

/// The note and PDF stores side by side
#[derive(Clone)]
pub struct ContentCatalog {
    notes: Arc<dyn ContentStore>,
    pdfs: Arc<dyn ContentStore>,
}

impl ContentCatalog {
    pub fn new(notes: Arc<dyn ContentStore>, pdfs: Arc<dyn ContentStore>) -> Self {
        Self { notes, pdfs }
    }

    pub fn store(&self, content_type: ContentType) -> &dyn ContentStore {
        match content_type {
            ContentType::Note => self.notes.as_ref(),
            ContentType::Pdf => self.pdfs.as_ref(),
        }
    }

    /// Look up one item; absence is `ContentNotFound`
    pub async fn resolve(
        &self,
        id: ContentId,
        content_type: ContentType,
    ) -> Result<ContentRecord, InviteError> {
        self.store(content_type)
            .find_by_id(id)
            .await
            .map_err(InviteError::storage("looking up content"))?
            .ok_or(InviteError::ContentNotFound)
    }
}

/// PostgreSQL store over `notes` or `pdfs`
///
/// The two tables name their text column differently and only `pdfs` has
/// file columns; both are read into the same `ContentRow` shape.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
    content_type: ContentType,
}

impl PgContentStore {
    pub fn new(pool: PgPool, content_type: ContentType) -> Self {
        Self { pool, content_type }
    }

    fn columns(&self) -> &'static str {
        match self.content_type {
            ContentType::Note => {
                "id, user_id, title, content AS body, is_public, \
                 NULL::BIGINT AS file_size, NULL::TEXT AS file_path, created_at"
            }
            ContentType::Pdf => {
                "id, user_id, title, description AS body, is_public, \
                 file_size, file_path, created_at"
            }
        }
    }

    fn record_from(&self, row: ContentRow) -> ContentRecord {
        ContentRecord {
            id: row.id,
            content_type: self.content_type,
            owner_id: row.user_id,
            title: row.title,
            body: row.body,
            is_public: row.is_public,
            file_size: row.file_size,
            file_path: row.file_path,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContentRow {
    id: ContentId,
    user_id: UserId,
    title: String,
    body: String,
    is_public: bool,
    file_size: Option<i64>,
    file_path: Option<String>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn find_by_id(&self, id: ContentId) -> Result<Option<ContentRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            self.columns(),
            self.content_type.table()
        );
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| self.record_from(row)))
    }

    async fn create(&self, content: NewContent) -> Result<ContentRecord, StoreError> {
        let row = match self.content_type {
            ContentType::Note => {
                let sql = format!(
                    "INSERT INTO notes (title, content, user_id, is_public, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $5) RETURNING {}",
                    self.columns()
                );
                sqlx::query_as::<_, ContentRow>(&sql)
                    .bind(&content.title)
                    .bind(&content.body)
                    .bind(content.owner_id)
                    .bind(content.is_public)
                    .bind(content.created_at)
                    .fetch_one(&self.pool)
                    .await
            }
            ContentType::Pdf => {
                let file = content.file.clone().unwrap_or(StoredFile {
                    path: String::new(),
                    size: 0,
                });
                let sql = format!(
                    "INSERT INTO pdfs (title, description, file_path, file_size, user_id, is_public, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {}",
                    self.columns()
                );
                sqlx::query_as::<_, ContentRow>(&sql)
                    .bind(&content.title)
                    .bind(&content.body)
                    .bind(&file.path)
                    .bind(file.size)
                    .bind(content.owner_id)
                    .bind(content.is_public)
                    .bind(content.created_at)
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(StoreError::from_write)?;

        Ok(self.record_from(row))
    }

    async fn delete(&self, id: ContentId) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.content_type.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

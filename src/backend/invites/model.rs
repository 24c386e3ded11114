/**
 * Invite Model and Database Operations
 *
 * An invite is a capability: whoever holds its token may read the referenced
 * note or PDF until the invite expires or its creator deactivates it.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::backend::content::ContentType;
use crate::backend::store::{ContentId, InviteId, StoreError, UserId};

/// A share link for one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: InviteId,
    pub content_id: ContentId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// 43-character URL-safe token, globally unique
    pub token: String,
    pub created_by: UserId,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invite {
    /// Still inside its lifetime at `now`; the bound is exclusive
    pub fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// An invite about to be persisted
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub content_id: ContentId,
    pub content_type: ContentType,
    pub token: String,
    pub created_by: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Invite store contract
#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn find_by_id(&self, id: InviteId) -> Result<Option<Invite>, StoreError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Invite>, StoreError>;
    /// Every invite for one content item, newest first
    async fn find_by_content(
        &self,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<Vec<Invite>, StoreError>;
    /// Insert; a duplicate token yields `StoreError::Conflict`
    async fn create(&self, invite: NewInvite) -> Result<Invite, StoreError>;
    /// Persist `is_active`, `expires_at` and `updated_at`
    async fn update(&self, invite: &Invite) -> Result<(), StoreError>;
    async fn delete(&self, id: InviteId) -> Result<(), StoreError>;
    /// Remove every invite pointing at one content item; returns the count
    async fn delete_by_content(
        &self,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<u64, StoreError>;
}

const INVITE_COLUMNS: &str =
    "id, content_id, type, token, created_by, expires_at, is_active, created_at, updated_at";

/// Map a row by hand so an unknown `type` string surfaces as `Corrupt`
fn invite_from_row(row: &PgRow) -> Result<Invite, StoreError> {
    let type_str: String = row.try_get("type")?;
    let content_type = type_str
        .parse::<ContentType>()
        .map_err(|_| StoreError::Corrupt(format!("invites.type = {type_str:?}")))?;

    Ok(Invite {
        id: row.try_get("id")?,
        content_id: row.try_get("content_id")?,
        content_type,
        token: row.try_get("token")?,
        created_by: row.try_get("created_by")?,
        expires_at: row.try_get("expires_at")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL-backed invite repository
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn find_by_id(&self, id: InviteId) -> Result<Option<Invite>, StoreError> {
        let sql = format!("SELECT {INVITE_COLUMNS} FROM invites WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(invite_from_row)
            .transpose()
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invite>, StoreError> {
        let sql = format!("SELECT {INVITE_COLUMNS} FROM invites WHERE token = $1");
        sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(invite_from_row)
            .transpose()
    }

    async fn find_by_content(
        &self,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<Vec<Invite>, StoreError> {
        let sql = format!(
            "SELECT {INVITE_COLUMNS} FROM invites \
             WHERE content_id = $1 AND type = $2 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(content_id)
            .bind(content_type.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(invite_from_row).collect()
    }

    async fn create(&self, invite: NewInvite) -> Result<Invite, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO invites (content_id, type, token, created_by, expires_at, is_active,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
            RETURNING {INVITE_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(invite.content_id)
            .bind(invite.content_type.as_str())
            .bind(&invite.token)
            .bind(invite.created_by)
            .bind(invite.expires_at)
            .bind(invite.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_write)?;

        invite_from_row(&row)
    }

    async fn update(&self, invite: &Invite) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE invites SET is_active = $1, expires_at = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(invite.is_active)
        .bind(invite.expires_at)
        .bind(invite.updated_at)
        .bind(invite.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: InviteId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM invites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_by_content(
        &self,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM invites WHERE content_id = $1 AND type = $2")
            .bind(content_id)
            .bind(content_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

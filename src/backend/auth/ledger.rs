/**
 * Token Ledger
 *
 * Persistence for revoked session tokens and the login-attempt audit log.
 * Both tables are append-mostly and are trimmed by timestamp-keyed deletes,
 * so sweeps never race with request-path reads.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::backend::store::{StoreError, UserId};

/// A session token that was explicitly invalidated before its expiry
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RevokedToken {
    /// The literal token string, unique in the ledger
    pub token: String,
    pub user_id: UserId,
    /// The token's own expiry; the row is useless after this instant
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}

/// One login attempt, successful or not
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LoginAttempt {
    pub ip: String,
    pub email: String,
    pub successful: bool,
    pub created_at: DateTime<Utc>,
}

/// Revoked-token ledger contract
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Record a revocation. Revoking an already revoked token is not an error.
    async fn revoke(&self, token: &RevokedToken) -> Result<(), StoreError>;
    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError>;
    /// Drop every row whose `expires_at` is strictly before `before`
    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Login-attempt ledger contract
#[async_trait]
pub trait LoginAttemptLedger: Send + Sync {
    async fn record(&self, attempt: &LoginAttempt) -> Result<(), StoreError>;
    /// Count unsuccessful attempts for the (ip, email) pair newer than `since`
    async fn count_failures_since(
        &self,
        ip: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
    /// Drop every attempt created strictly before `before`
    async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// PostgreSQL-backed revoked-token ledger
#[derive(Clone)]
pub struct PgTokenLedger {
    pool: PgPool,
}

impl PgTokenLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenLedger for PgTokenLedger {
    async fn revoke(&self, token: &RevokedToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (token, user_id, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let revoked: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token = $1)")
                .bind(token)
                .fetch_one(&self.pool)
                .await?;

        Ok(revoked)
    }

    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL-backed login-attempt ledger
#[derive(Clone)]
pub struct PgLoginAttemptLedger {
    pool: PgPool,
}

impl PgLoginAttemptLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginAttemptLedger for PgLoginAttemptLedger {
    async fn record(&self, attempt: &LoginAttempt) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO login_attempts (ip, email, successful, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&attempt.ip)
        .bind(&attempt.email)
        .bind(attempt.successful)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_failures_since(
        &self,
        ip: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM login_attempts
            WHERE ip = $1 AND email = $2 AND successful = FALSE AND created_at > $3
            "#,
        )
        .bind(ip)
        .bind(email)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE created_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/**
 * Invite Engine
 *
 * Creation, lookup, validation and deactivation of share links.
 *
 * Validation deliberately ignores who is asking: the token is the credential.
 * Ownership is enforced on the write paths only (creation by the content's
 * owner, deactivation by the invite's creator).
 */

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::Span;

use crate::backend::clock::Clock;
use crate::backend::content::{ContentCatalog, ContentRecord, ContentType};
use crate::backend::error::{InviteError, InviteRejection};
use crate::backend::invites::model::{Invite, InviteRepository, NewInvite};
use crate::backend::store::{ContentId, InviteId, UserId};

/// Lifetime of an invite created without an explicit expiry
pub const DEFAULT_INVITE_TTL_DAYS: i64 = 7;

const TOKEN_BYTES: usize = 32;

/// 32 bytes from the OS generator, URL-safe base64 without padding
pub fn generate_token() -> Result<String, InviteError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(InviteError::TokenGeneration)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

pub struct InviteService {
    invites: Arc<dyn InviteRepository>,
    content: ContentCatalog,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl InviteService {
    pub fn new(
        invites: Arc<dyn InviteRepository>,
        content: ContentCatalog,
        clock: Arc<dyn Clock>,
        span: Span,
    ) -> Self {
        Self {
            invites,
            content,
            clock,
            span,
        }
    }

    /// Look up the content an invite would point at
    pub async fn resolve_content(
        &self,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<ContentRecord, InviteError> {
        self.content.resolve(content_id, content_type).await
    }

    /// Create a share link for content owned by `creator`
    ///
    /// # Arguments
    /// * `content_type` - `"note"` or `"pdf"`
    /// * `expires_at` - explicit expiry; defaults to seven days from now.
    ///   A past instant is accepted and yields an invite that never validates.
    ///
    /// # Errors
    /// * `InvalidContentType`, `ContentNotFound`, `NotAuthorized`
    pub async fn create_invite(
        &self,
        content_id: ContentId,
        content_type: &str,
        creator: UserId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Invite, InviteError> {
        let content_type: ContentType = content_type.parse()?;
        let content = self.resolve_content(content_id, content_type).await?;

        if content.owner_id != creator {
            tracing::info!(parent: &self.span, content_id, %content_type, user_id = creator, "invite creation by non-owner rejected");
            return Err(InviteError::NotAuthorized);
        }

        let now = self.clock.now();
        let invite = self
            .invites
            .create(NewInvite {
                content_id,
                content_type,
                token: generate_token()?,
                created_by: creator,
                expires_at: expires_at.unwrap_or(now + Duration::days(DEFAULT_INVITE_TTL_DAYS)),
                created_at: now,
            })
            .await
            .map_err(InviteError::storage("creating invite"))?;

        tracing::info!(
            parent: &self.span,
            invite_id = invite.id,
            content_id,
            %content_type,
            expires_at = %invite.expires_at,
            "invite created"
        );
        Ok(invite)
    }

    pub async fn get_invite(&self, token: &str) -> Result<Invite, InviteError> {
        self.invites
            .find_by_token(token)
            .await
            .map_err(InviteError::storage("looking up invite by token"))?
            .ok_or(InviteError::InviteNotFound)
    }

    /// Every invite for one content item, after the same type and existence
    /// checks as creation
    pub async fn get_invites_by_content(
        &self,
        content_id: ContentId,
        content_type: &str,
    ) -> Result<Vec<Invite>, InviteError> {
        let content_type: ContentType = content_type.parse()?;
        self.resolve_content(content_id, content_type).await?;

        self.invites
            .find_by_content(content_id, content_type)
            .await
            .map_err(InviteError::storage("listing invites"))
    }

    /// Turn an invite off for good
    ///
    /// Only the creator may do this. Deactivating an inactive invite returns
    /// it unchanged.
    pub async fn deactivate_invite(
        &self,
        invite_id: InviteId,
        requester: UserId,
    ) -> Result<Invite, InviteError> {
        let mut invite = self
            .invites
            .find_by_id(invite_id)
            .await
            .map_err(InviteError::storage("looking up invite by id"))?
            .ok_or(InviteError::InviteNotFound)?;

        if invite.created_by != requester {
            tracing::info!(parent: &self.span, invite_id, user_id = requester, "invite deactivation by non-creator rejected");
            return Err(InviteError::NotAuthorized);
        }

        if !invite.is_active {
            return Ok(invite);
        }

        invite.is_active = false;
        invite.updated_at = self.clock.now();
        self.invites
            .update(&invite)
            .await
            .map_err(InviteError::storage("deactivating invite"))?;

        tracing::info!(parent: &self.span, invite_id, "invite deactivated");
        Ok(invite)
    }

    /// Check whether a token currently grants access
    ///
    /// `Ok` carries the valid invite. On rejection the invite is attached
    /// whenever the token resolved, with the first failing check as reason:
    /// inactive, then expired, then content gone.
    pub async fn validate_invite(&self, token: &str) -> Result<Invite, InviteRejection> {
        let invite = self.get_invite(token).await?;

        if !invite.is_active {
            return Err(InviteRejection::new(InviteError::InviteNotActive, Some(invite)));
        }

        if !invite.is_unexpired_at(self.clock.now()) {
            return Err(InviteRejection::new(InviteError::InviteExpired, Some(invite)));
        }

        if let Err(reason) = self.resolve_content(invite.content_id, invite.content_type).await {
            return Err(InviteRejection::new(reason, Some(invite)));
        }

        tracing::debug!(parent: &self.span, invite_id = invite.id, "invite validated");
        Ok(invite)
    }
}

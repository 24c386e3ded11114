/**
 * Auth Engine
 *
 * Registration, login with rate limiting, session token validation and
 * revocation, password changes and profile access. Persistence goes through
 * the repository traits; time comes from the injected clock; events are
 * emitted under the span handed in at construction.
 */

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use tracing::Span;

use crate::backend::auth::ledger::{LoginAttempt, LoginAttemptLedger, RevokedToken, TokenLedger};
use crate::backend::auth::sessions::{Claims, SessionSigner};
use crate::backend::auth::users::{NewUser, Profile, User, UserRepository};
use crate::backend::clock::Clock;
use crate::backend::error::AuthError;
use crate::backend::store::{StoreError, UserId};
use crate::shared::AuthSettings;

/// Login attempts older than this are purged by housekeeping
pub const LOGIN_ATTEMPT_RETENTION_DAYS: i64 = 30;

/// Input to [`AuthService::register`]
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile: Profile,
}

/// Repositories the Auth Engine persists through
#[derive(Clone)]
pub struct AuthStores {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenLedger>,
    pub attempts: Arc<dyn LoginAttemptLedger>,
}

pub(crate) fn to_chrono(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenLedger>,
    attempts: Arc<dyn LoginAttemptLedger>,
    clock: Arc<dyn Clock>,
    signer: SessionSigner,
    max_login_attempts: u64,
    login_window: chrono::Duration,
    bcrypt_cost: u32,
    span: Span,
}

impl AuthService {
    pub fn new(stores: AuthStores, clock: Arc<dyn Clock>, settings: &AuthSettings, span: Span) -> Self {
        Self {
            users: stores.users,
            tokens: stores.tokens,
            attempts: stores.attempts,
            clock,
            signer: SessionSigner::new(settings.jwt_secret.as_bytes(), to_chrono(settings.jwt_ttl)),
            max_login_attempts: u64::from(settings.max_login_attempts),
            login_window: to_chrono(settings.login_window),
            bcrypt_cost: settings.bcrypt_cost,
            span,
        }
    }

    /// Create an account
    ///
    /// Email and username are checked independently; either collision blocks
    /// registration. The plaintext password is hashed before anything is stored.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        if self
            .users
            .find_by_email(&registration.email)
            .await
            .map_err(AuthError::storage("checking email availability"))?
            .is_some()
        {
            tracing::info!(parent: &self.span, "registration rejected: email taken");
            return Err(AuthError::UserAlreadyExists);
        }

        if self
            .users
            .find_by_username(&registration.username)
            .await
            .map_err(AuthError::storage("checking username availability"))?
            .is_some()
        {
            tracing::info!(parent: &self.span, username = %registration.username, "registration rejected: username taken");
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash(&registration.password, self.bcrypt_cost)?;

        let user = self
            .users
            .create(NewUser {
                username: registration.username,
                email: registration.email,
                password_hash,
                profile: registration.profile,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|err| match err {
                // Lost a race with a concurrent registration
                StoreError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::storage("creating user")(other),
            })?;

        tracing::info!(parent: &self.span, user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Authenticate and mint a session token
    ///
    /// # Arguments
    /// * `email` - account email
    /// * `password` - plaintext password
    /// * `ip` - source address of the request, half of the rate-limit key
    ///
    /// # Errors
    /// * `TooManyAttempts` - the (ip, email) pair is over its failure budget;
    ///   credentials are not consulted and nothing is recorded
    /// * `InvalidCredentials` - unknown email or wrong password
    pub async fn login(&self, email: &str, password: &str, ip: &str) -> Result<String, AuthError> {
        let now = self.clock.now();
        // Windows reaching before the representable range count everything
        let since = now
            .checked_sub_signed(self.login_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let failures = self
            .attempts
            .count_failures_since(ip, email, since)
            .await
            .map_err(AuthError::storage("counting login attempts"))?;
        if failures >= self.max_login_attempts {
            tracing::warn!(parent: &self.span, %ip, failures, "login blocked by rate limit");
            return Err(AuthError::TooManyAttempts);
        }

        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(err) => {
                self.record_attempt(ip, email, false).await;
                return Err(AuthError::storage("looking up user by email")(err));
            }
        };

        let Some(user) = user else {
            self.record_attempt(ip, email, false).await;
            tracing::info!(parent: &self.span, %ip, "login failed: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        // A malformed stored hash is treated like a mismatch
        if !verify(password, &user.password_hash).unwrap_or(false) {
            self.record_attempt(ip, email, false).await;
            tracing::info!(parent: &self.span, user_id = user.id, %ip, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.record_attempt(ip, email, true).await;
        let token = self.signer.mint(&user, now)?;

        tracing::info!(parent: &self.span, user_id = user.id, %ip, "user logged in");
        Ok(token)
    }

    /// Append to the audit log; a failed write is logged, not surfaced
    async fn record_attempt(&self, ip: &str, email: &str, successful: bool) {
        let attempt = LoginAttempt {
            ip: ip.to_string(),
            email: email.to_string(),
            successful,
            created_at: self.clock.now(),
        };
        if let Err(err) = self.attempts.record(&attempt).await {
            tracing::error!(parent: &self.span, error = %err, %ip, "failed to record login attempt");
        }
    }

    /// Resolve a bearer token to its claims
    ///
    /// The revocation ledger is consulted before the signature, so a revoked
    /// token is reported as `TokenRevoked` even when it is otherwise sound.
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        if self
            .tokens
            .is_revoked(token)
            .await
            .map_err(AuthError::storage("checking token revocation"))?
        {
            return Err(AuthError::TokenRevoked);
        }

        self.signer.verify(token, self.clock.now())
    }

    /// Revoke a session token before its natural expiry
    ///
    /// Expired tokens are still accepted here as long as the signature holds.
    /// Revoking twice is harmless.
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.signer.inspect(token)?;

        let row = RevokedToken {
            token: token.to_string(),
            user_id: claims.user_id,
            expires_at: claims.expires_at(),
            revoked_at: self.clock.now(),
        };
        self.tokens
            .revoke(&row)
            .await
            .map_err(AuthError::storage("revoking token"))?;

        tracing::info!(parent: &self.span, user_id = claims.user_id, "session token revoked");
        Ok(())
    }

    /// Replace the password after verifying the current one
    ///
    /// Outstanding session tokens stay valid.
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(AuthError::storage("looking up user by id"))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify(old_password, &user.password_hash).unwrap_or(false) {
            tracing::info!(parent: &self.span, user_id, "password change rejected");
            return Err(AuthError::InvalidCredentials);
        }

        user.password_hash = hash(new_password, self.bcrypt_cost)?;
        user.updated_at = self.clock.now();
        self.users
            .update(&user)
            .await
            .map_err(AuthError::storage("updating password"))?;

        tracing::info!(parent: &self.span, user_id, "password changed");
        Ok(())
    }

    pub async fn get_profile(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(AuthError::storage("looking up user by id"))?
            .ok_or(AuthError::UserNotFound)
    }

    /// Overwrite profile fields; credentials are never touched
    pub async fn update_profile(&self, user_id: UserId, profile: Profile) -> Result<User, AuthError> {
        let mut user = self.get_profile(user_id).await?;
        user.apply_profile(profile);
        user.updated_at = self.clock.now();

        self.users
            .update(&user)
            .await
            .map_err(AuthError::storage("updating profile"))?;

        tracing::debug!(parent: &self.span, user_id, "profile updated");
        Ok(user)
    }

    /// Drop revocation rows whose token has expired on its own
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, AuthError> {
        let removed = self
            .tokens
            .delete_expired_before(self.clock.now())
            .await
            .map_err(AuthError::storage("sweeping revoked tokens"))?;
        tracing::debug!(parent: &self.span, removed, "revoked-token sweep finished");
        Ok(removed)
    }

    pub async fn cleanup_old_login_attempts(&self) -> Result<u64, AuthError> {
        let cutoff = self.clock.now() - chrono::Duration::days(LOGIN_ATTEMPT_RETENTION_DAYS);
        let removed = self
            .attempts
            .delete_before(cutoff)
            .await
            .map_err(AuthError::storage("sweeping login attempts"))?;
        tracing::debug!(parent: &self.span, removed, "login-attempt sweep finished");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::clock::ManualClock;
    use crate::backend::store::memory::{
        MemoryLoginAttemptLedger, MemoryTokenLedger, MemoryUserRepository,
    };
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use std::time::Duration as StdDuration;

    struct Harness {
        auth: AuthService,
        clock: Arc<ManualClock>,
        tokens: Arc<MemoryTokenLedger>,
        attempts: Arc<MemoryLoginAttemptLedger>,
    }

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "unit-test-secret".to_string(),
            jwt_ttl: StdDuration::from_secs(24 * 3600),
            max_login_attempts: 5,
            login_window: StdDuration::from_secs(15 * 60),
            bcrypt_cost: 4,
        }
    }

    fn harness() -> Harness {
        harness_with(settings())
    }

    fn harness_with(settings: AuthSettings) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let tokens = Arc::new(MemoryTokenLedger::new());
        let attempts = Arc::new(MemoryLoginAttemptLedger::new());
        let auth = AuthService::new(
            AuthStores {
                users: Arc::new(MemoryUserRepository::new()),
                tokens: tokens.clone(),
                attempts: attempts.clone(),
            },
            clock.clone(),
            &settings,
            Span::none(),
        );
        Harness {
            auth,
            clock,
            tokens,
            attempts,
        }
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            profile: Profile::default(),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_or_username() {
        let h = harness();
        let user = h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();
        assert_ne!(user.password_hash, "correct horse");
        assert!(user.password_hash.starts_with("$2"));

        assert_matches!(
            h.auth.register(registration("someone", "ayse@example.com")).await,
            Err(AuthError::UserAlreadyExists)
        );
        assert_matches!(
            h.auth.register(registration("ayse", "someone@example.com")).await,
            Err(AuthError::UserAlreadyExists)
        );
        assert!(h.auth.register(registration("burak", "burak@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_register_stamps_clock_time() {
        let h = harness();
        h.clock.advance(Duration::days(3));

        let user = h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();
        assert_eq!(user.created_at, h.clock.now());
        assert_eq!(user.updated_at, h.clock.now());
    }

    #[tokio::test]
    async fn test_login_token_resolves_to_user() {
        let h = harness();
        let user = h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();

        let token = h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.unwrap();
        let claims = h.auth.validate_token(&token).await.unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username, "ayse");

        let recorded = h.attempts.attempts();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].successful);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_the_same() {
        let h = harness();
        h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();

        let unknown = h.auth.login("nobody@example.com", "correct horse", "10.0.0.1").await;
        let wrong = h.auth.login("ayse@example.com", "wrong", "10.0.0.1").await;
        assert_matches!(unknown, Err(AuthError::InvalidCredentials));
        assert_matches!(wrong, Err(AuthError::InvalidCredentials));

        let recorded = h.attempts.attempts();
        assert_eq!(recorded.len(), 2);
        assert!(recorded.iter().all(|a| !a.successful));
    }

    #[tokio::test]
    async fn test_revoked_token_rejected_while_otherwise_valid() {
        let h = harness();
        h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();
        let token = h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.unwrap();

        h.auth.revoke_token(&token).await.unwrap();
        assert_matches!(h.auth.validate_token(&token).await, Err(AuthError::TokenRevoked));

        // Second revocation is a no-op
        h.auth.revoke_token(&token).await.unwrap();
        assert_eq!(h.tokens.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_token_can_still_be_revoked() {
        let h = harness();
        h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();
        let token = h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.unwrap();

        h.clock.advance(Duration::hours(25));
        assert_matches!(h.auth.validate_token(&token).await, Err(AuthError::ExpiredToken));

        h.auth.revoke_token(&token).await.unwrap();
        // Revocation wins over expiry in reporting
        assert_matches!(h.auth.validate_token(&token).await, Err(AuthError::TokenRevoked));
    }

    #[tokio::test]
    async fn test_garbage_tokens() {
        let h = harness();
        assert_matches!(h.auth.validate_token("not-a-jwt").await, Err(AuthError::InvalidToken));
        assert_matches!(h.auth.revoke_token("not-a-jwt").await, Err(AuthError::InvalidToken));
        assert!(h.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_then_window_elapses() {
        let h = harness();
        h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();

        for _ in 0..5 {
            assert_matches!(
                h.auth.login("ayse@example.com", "wrong", "10.0.0.1").await,
                Err(AuthError::InvalidCredentials)
            );
        }

        // Correct credentials do not help while blocked
        assert_matches!(
            h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await,
            Err(AuthError::TooManyAttempts)
        );
        // The blocked attempt is not recorded
        assert_eq!(h.attempts.attempts().len(), 5);

        // Another address is unaffected
        assert!(h.auth.login("ayse@example.com", "correct horse", "10.0.0.2").await.is_ok());

        h.clock.advance(Duration::minutes(16));
        assert!(h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.is_ok());
    }

    #[tokio::test]
    async fn test_unbounded_window_counts_every_failure() {
        let h = harness_with(AuthSettings {
            login_window: StdDuration::from_secs(u64::MAX),
            ..settings()
        });
        h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();

        for _ in 0..5 {
            assert_matches!(
                h.auth.login("ayse@example.com", "wrong", "10.0.0.1").await,
                Err(AuthError::InvalidCredentials)
            );
            h.clock.advance(Duration::days(365));
        }
        assert_matches!(
            h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await,
            Err(AuthError::TooManyAttempts)
        );
    }

    #[tokio::test]
    async fn test_successful_logins_do_not_count_toward_limit() {
        let h = harness();
        h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();

        for _ in 0..4 {
            let _ = h.auth.login("ayse@example.com", "wrong", "10.0.0.1").await;
        }
        for _ in 0..3 {
            assert!(h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = harness();
        let user = h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();
        let old_token = h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.unwrap();

        assert_matches!(
            h.auth.change_password(user.id, "wrong", "new password").await,
            Err(AuthError::InvalidCredentials)
        );
        h.auth.change_password(user.id, "correct horse", "new password").await.unwrap();

        assert_matches!(
            h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await,
            Err(AuthError::InvalidCredentials)
        );
        assert!(h.auth.login("ayse@example.com", "new password", "10.0.0.1").await.is_ok());

        // Sessions issued before the change remain usable
        assert!(h.auth.validate_token(&old_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let h = harness();
        assert_matches!(
            h.auth.change_password(99, "a", "b").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_update_profile_keeps_password() {
        let h = harness();
        let user = h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();

        let updated = h
            .auth
            .update_profile(
                user.id,
                Profile {
                    first_name: "Ayse".to_string(),
                    university: "METU".to_string(),
                    ..Profile::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Ayse");
        assert_eq!(updated.password_hash, user.password_hash);

        let fetched = h.auth.get_profile(user.id).await.unwrap();
        assert_eq!(fetched.university, "METU");
        assert!(h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.is_ok());

        assert_matches!(h.auth.get_profile(404).await, Err(AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_housekeeping_sweeps() {
        let h = harness();
        h.auth.register(registration("ayse", "ayse@example.com")).await.unwrap();
        let token = h.auth.login("ayse@example.com", "correct horse", "10.0.0.1").await.unwrap();
        let _ = h.auth.login("ayse@example.com", "wrong", "10.0.0.1").await;
        h.auth.revoke_token(&token).await.unwrap();

        assert_eq!(h.auth.cleanup_expired_tokens().await.unwrap(), 0);
        assert_eq!(h.auth.cleanup_old_login_attempts().await.unwrap(), 0);

        h.clock.advance(Duration::days(31));
        assert_eq!(h.auth.cleanup_expired_tokens().await.unwrap(), 1);
        assert_eq!(h.auth.cleanup_old_login_attempts().await.unwrap(), 2);
        assert!(h.tokens.is_empty());
    }
}

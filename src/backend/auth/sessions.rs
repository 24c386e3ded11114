/**
 * Session Management and JWT Tokens
 *
 * Signing and verification of session tokens. Tokens are HS256 JWTs carrying
 * a fixed claim set; the verifier accepts HS256 only, so a token whose header
 * names any other algorithm is rejected before its signature is looked at.
 *
 * Expiry is checked against the caller-supplied instant rather than the wall
 * clock, which keeps this module free of ambient time.
 */

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::backend::auth::users::User;
use crate::backend::error::AuthError;
use crate::backend::store::UserId;

/// JWT claims structure
///
/// Every field is required; a token missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub user_id: UserId,
    /// Username at issue time
    pub username: String,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Mints and verifies session tokens with a server-held secret
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
    validation: Validation,
}

impl SessionSigner {
    /// Create a signer
    ///
    /// # Arguments
    /// * `secret` - HMAC secret
    /// * `ttl` - lifetime of minted tokens
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared against the injected clock in `verify`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            validation,
        }
    }

    /// Create a JWT token for a user
    ///
    /// # Returns
    /// Signed token string with `exp = now + ttl`, saturating at the
    /// latest representable instant
    pub fn mint(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Check signature, algorithm and claim shape without looking at expiry
    pub fn inspect(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Verify and decode a token that must still be live at `now`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let claims = self.inspect(token)?;
        if now.timestamp() >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    const SECRET: &[u8] = b"test-secret";

    fn signer() -> SessionSigner {
        SessionSigner::new(SECRET, Duration::hours(24))
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 42,
            username: "mehmet".to_string(),
            email: "mehmet@example.com".to_string(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            university: String::new(),
            department: String::new(),
            class: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_mint_and_verify() {
        let now = Utc::now();
        let token = signer().mint(&user(), now).unwrap();
        assert!(!token.is_empty());

        let claims = signer().verify(&token, now).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "mehmet");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, (now + Duration::hours(24)).timestamp());
    }

    #[test]
    fn test_oversized_ttl_saturates() {
        let now = Utc::now();
        let signer = SessionSigner::new(SECRET, Duration::MAX);
        let token = signer.mint(&user(), now).unwrap();

        let claims = signer.verify(&token, now).unwrap();
        assert_eq!(claims.exp, DateTime::<Utc>::MAX_UTC.timestamp());
    }

    #[test]
    fn test_expired_token() {
        let issued = Utc::now() - Duration::hours(25);
        let token = signer().mint(&user(), issued).unwrap();
        assert_matches!(signer().verify(&token, Utc::now()), Err(AuthError::ExpiredToken));
        // Still readable for revocation purposes
        assert_eq!(signer().inspect(&token).unwrap().user_id, 42);
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let issued = Utc::now();
        let token = signer().mint(&user(), issued).unwrap();
        let at_expiry = issued + Duration::hours(24);
        assert_matches!(signer().verify(&token, at_expiry), Err(AuthError::ExpiredToken));
        let just_before = at_expiry - Duration::seconds(1);
        assert!(signer().verify(&token, just_before).is_ok());
    }

    #[test]
    fn test_verify_invalid_token() {
        assert_matches!(
            signer().verify("invalid.token.here", Utc::now()),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = SessionSigner::new(b"other-secret", Duration::hours(24));
        let token = other.mint(&user(), Utc::now()).unwrap();
        assert_matches!(signer().verify(&token, Utc::now()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let now = Utc::now();
        let claims = Claims {
            user_id: 42,
            username: "mehmet".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        // Same secret, different HMAC variant in the header
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_matches!(signer().verify(&token, now), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_missing_user_id_rejected() {
        #[derive(Serialize)]
        struct Partial {
            username: String,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                username: "mehmet".to_string(),
                iat: now.timestamp(),
                exp: (now + Duration::hours(1)).timestamp(),
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_matches!(signer().verify(&token, now), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_claims_expires_at() {
        let now = Utc::now();
        let token = signer().mint(&user(), now).unwrap();
        let claims = signer().inspect(&token).unwrap();
        assert_eq!(claims.expires_at().timestamp(), (now + Duration::hours(24)).timestamp());
    }
}

pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::database::{DatabaseError, UserRepository};

pub use password::{hash_password, verify_password, PasswordError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("Session TTL out of range: {0} hours")]
    InvalidTtl(u64),
}

/// Ten years
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

/// Why a request could not be tied to a user. Every variant is a 401 at the edge.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No session token presented")]
    Missing,
    #[error("Session token is malformed or has a bad signature")]
    Invalid,
    #[error("Session token has expired")]
    Expired,
    #[error("Session token names a user that no longer exists")]
    UnknownUser,
    #[error("User lookup failed: {0}")]
    Lookup(#[from] DatabaseError),
}

/// Issues and verifies the signed session token carried in the auth cookie.
/// Sessions are stateless: nothing is stored server-side, so verification only
/// checks the signature, the expiry and that the user still exists.
pub struct SessionAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionAuthority {
    pub fn new(secret: &str, ttl_hours: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl_hours) {
            return Err(JwtError::InvalidTtl(ttl_hours));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours as i64),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(&security.jwt_secret, security.session_ttl_hours)
    }

    /// Session lifetime in seconds, used for the cookie's Max-Age
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user_id: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Check signature and expiry only
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }

    /// Full gate: a token must be present, valid, unexpired and name a live user
    pub async fn verify(
        &self,
        token: Option<&str>,
        users: &UserRepository<'_>,
    ) -> Result<User, AuthError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::Missing)?;
        let claims = self.decode(token)?;
        users
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Database, DatabaseManager};

    fn authority() -> SessionAuthority {
        SessionAuthority::new("test-secret", 168).unwrap()
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            SessionAuthority::new("", 1),
            Err(JwtError::InvalidSecret)
        ));
    }

    #[test]
    fn out_of_range_ttl_is_rejected() {
        assert!(matches!(
            SessionAuthority::new("test-secret", 0),
            Err(JwtError::InvalidTtl(0))
        ));
        assert!(matches!(
            SessionAuthority::new("test-secret", u64::MAX),
            Err(JwtError::InvalidTtl(u64::MAX))
        ));
        assert!(matches!(
            SessionAuthority::new("test-secret", MAX_SESSION_TTL_HOURS + 1),
            Err(JwtError::InvalidTtl(_))
        ));

        let longest = SessionAuthority::new("test-secret", MAX_SESSION_TTL_HOURS).unwrap();
        assert_eq!(longest.ttl_seconds(), MAX_SESSION_TTL_HOURS as i64 * 3600);
        assert!(longest.issue("user-1").is_ok());
    }

    #[test]
    fn issued_token_decodes_to_subject() {
        let authority = authority();
        let token = authority.issue("user-1").unwrap();
        let claims = authority.decode(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let token = SessionAuthority::new("other-secret", 1)
            .unwrap()
            .issue("user-1")
            .unwrap();
        assert!(matches!(authority().decode(&token), Err(AuthError::Invalid)));
        assert!(matches!(authority().decode("not-a-jwt"), Err(AuthError::Invalid)));
    }

    #[test]
    fn past_expiry_is_expired() {
        let authority = authority();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &authority.encoding).unwrap();
        assert!(matches!(authority.decode(&token), Err(AuthError::Expired)));
    }

    #[tokio::test]
    async fn verify_requires_a_live_user() {
        let db = Database::new(DatabaseManager::in_memory().await.unwrap());
        let authority = authority();
        let user = db.users().create("ada@example.com", "h", None).await.unwrap();
        let token = authority.issue(&user.id).unwrap();

        let verified = authority.verify(Some(&token), &db.users()).await.unwrap();
        assert_eq!(verified.id, user.id);

        assert!(matches!(
            authority.verify(None, &db.users()).await,
            Err(AuthError::Missing)
        ));

        db.users().delete(&user.id).await.unwrap();
        assert!(matches!(
            authority.verify(Some(&token), &db.users()).await,
            Err(AuthError::UnknownUser)
        ));
    }
}

//! Bearer-token issuing/verification and password hashing.
//!
//! The checkout and cart services never see tokens: handlers obtain a
//! verified user id through [`crate::middleware::auth::AuthenticatedUser`].

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("expired token")]
    ExpiredToken,

    #[error("token error: {0}")]
    Token(jsonwebtoken::errors::Error),

    #[error("password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

/// HS256 signing material plus token lifetime.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, user_id: Uuid, role: &str) -> Result<String, AuthError> {
        let exp = (Utc::now().timestamp() + self.ttl_secs).max(0) as usize;
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(AuthError::Token)
    }

    /// Every decode failure is the caller's fault, so all of them are
    /// credential errors; only an expired signature is told apart.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidCredentials,
            }
        })?;
        Ok(data.claims)
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// A malformed stored hash counts as a mismatch rather than an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    #[test]
    fn test_issue_and_verify_token() {
        let keys = TokenKeys::new("test-secret", 3600);
        let user_id = Uuid::new_v4();

        let token = keys.issue(user_id, "customer").unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "customer");
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let issuer = TokenKeys::new("secret-a", 3600);
        let verifier = TokenKeys::new("secret-b", 3600);
        let token = issuer.issue(Uuid::new_v4(), "customer").unwrap();

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway.
        let keys = TokenKeys::new("test-secret", -120);
        let token = keys.issue(Uuid::new_v4(), "customer").unwrap();

        assert!(matches!(keys.verify(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let keys = TokenKeys::new("test-secret", 3600);
        assert!(matches!(
            keys.verify("not.a.jwt"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_token_with_other_algorithm_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: "customer".to_string(),
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let keys = TokenKeys::new("test-secret", 3600);
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_token_without_exp_rejected() {
        #[derive(Serialize)]
        struct NoExp {
            sub: Uuid,
            role: String,
        }

        let token = encode(
            &Header::default(),
            &NoExp {
                sub: Uuid::new_v4(),
                role: "customer".to_string(),
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let keys = TokenKeys::new("test-secret", 3600);
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-bcrypt-hash"));
    }
}

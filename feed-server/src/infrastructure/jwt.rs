use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum JwtError {
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("token rejected")]
    Verify(#[source] jsonwebtoken::errors::Error),
}

/// Bearer token claims. `sub` carries the user id; nothing else is trusted
/// from the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: i64,
    pub(crate) exp: i64,
}

pub(crate) struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtService {
    const FALLBACK_TTL_SECONDS: i64 = 24 * 60 * 60;
    const LEEWAY_SECONDS: u64 = 10;

    pub(crate) fn new(secret: &str, ttl_seconds: i64) -> Self {
        let ttl_seconds = if ttl_seconds > 0 {
            ttl_seconds
        } else {
            Self::FALLBACK_TTL_SECONDS
        };

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub(crate) fn issue(&self, user_id: i64) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user_id,
            exp: (Utc::now() + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Sign)
    }

    pub(crate) fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = Self::LEEWAY_SECONDS;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::Verify)
    }
}

#[cfg(test)]
mod tests {
    use super::JwtService;

    fn service() -> JwtService {
        JwtService::new("0123456789abcdef0123456789abcdef", 3600)
    }

    #[test]
    fn issued_token_verifies_back_to_the_same_subject() {
        let jwt = service();

        let token = jwt.issue(42).expect("token must be issued");
        let claims = jwt.verify(&token).expect("token must verify");

        assert_eq!(claims.sub, 42);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = JwtService::new("another-secret-another-secret-xx", 3600)
            .issue(42)
            .expect("token must be issued");

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // TTL far enough in the past to clear the verification leeway.
        let jwt = JwtService::new("0123456789abcdef0123456789abcdef", 1);
        let token = {
            let claims = super::Claims {
                sub: 42,
                exp: (chrono::Utc::now() - chrono::Duration::seconds(60)).timestamp(),
            };
            jsonwebtoken::encode(
                &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
                &claims,
                &jsonwebtoken::EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
            )
            .expect("token must encode")
        };

        assert!(jwt.verify(&token).is_err());
    }
}

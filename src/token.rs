use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of a session token. There is no refresh; users log in again.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Claims
///
/// Payload signed into every session token. The email is the identity the
/// access guard hands to handlers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    /// Issued At, seconds since the epoch.
    pub iat: u64,
    /// Expiration, seconds since the epoch.
    pub exp: u64,
}

/// Why a token could not be issued or accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    SignatureMismatch,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// TokenService
///
/// Issues and verifies HS256 session tokens with the server-held secret.
/// Both keys are derived once at construction.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Signs a token for `email` expiring `SESSION_TTL_HOURS` from now.
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp() as u64,
            exp: (now + Duration::hours(SESSION_TTL_HOURS)).timestamp() as u64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks signature and expiry and returns the decoded payload.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_round_trips_email_with_day_long_expiry() {
        let service = TokenService::new("secret");
        let token = service.issue("hr@corp.com").unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.email, "hr@corp.com");
        assert_eq!(claims.exp - claims.iat, (SESSION_TTL_HOURS * 3600) as u64);
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp() as u64;
        let token = sign(
            "secret",
            &Claims {
                email: "a@x.com".into(),
                iat: now - 7200,
                exp: now - 3600,
            },
        );

        assert_eq!(
            TokenService::new("secret").verify(&token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = TokenService::new("someone-else").issue("a@x.com").unwrap();

        assert_eq!(
            TokenService::new("secret").verify(&token),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            TokenService::new("secret").verify("not-a-jwt"),
            Err(TokenError::Malformed)
        );
    }
}

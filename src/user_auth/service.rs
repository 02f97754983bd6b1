use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::UserId;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user_id as string)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// Verified caller, inserted into request extensions by the auth middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
}

/// HS256 bearer-token verification. Tokens are issued by the login flow,
/// which lives outside this service and shares the secret.
pub struct TokenVerifier {
    jwt_secret: String,
}

impl TokenVerifier {
    pub fn new(jwt_secret: impl Into<String>) -> Result<Self, AuthError> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        Ok(Self { jwt_secret })
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        let user_id = token_data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidSubject(token_data.claims.sub.clone()))?;
        Ok(CallerIdentity { user_id })
    }

    /// Sign a token the way the login flow does (local tooling and tests)
    pub fn issue_token(&self, user_id: UserId, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }
}

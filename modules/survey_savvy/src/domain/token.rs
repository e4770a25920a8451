//! HS256 bearer tokens carrying the caller's identity.
//!
//! Claims are flat: `{ email, name, iat, exp }`.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::contract::model::Identity;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs,
        }
    }

    /// Sign `identity` with a fixed expiry of `ttl_secs` from now.
    pub fn issue(&self, identity: &Identity) -> Result<String, DomainError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            email: identity.email.clone(),
            name: identity.name.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::token_signing(e.to_string()))
    }

    /// Check signature and expiry of a raw token.
    pub fn verify(&self, token: &str) -> Result<Identity, DomainError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| DomainError::invalid_token(e.to_string()))?;
        Ok(Identity {
            email: data.claims.email,
            name: data.claims.name,
        })
    }

    /// Verify the value of an `Authorization` header.
    ///
    /// The header is split on whitespace and the second segment is the token.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Identity, DomainError> {
        let header = header.ok_or(DomainError::MissingToken)?;
        let token = header
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| DomainError::invalid_token("malformed authorization header"))?;
        self.verify(token)
    }
}

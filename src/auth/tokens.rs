//! Portal session tokens.
//!
//! After Google sign-in the portal issues an HS256 access/refresh pair. The
//! `typ` claim keeps the two from being used interchangeably. Tokens carry
//! only the account ID; role and active status are re-read on every request.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::TokenConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub typ: TokenKind,
}

/// Access/refresh pair returned by sign-in and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_ttl_secs: i64::try_from(config.access_ttl_secs).unwrap_or(i64::MAX),
            refresh_ttl_secs: i64::try_from(config.refresh_ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn issue_pair(&self, account_id: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(account_id, TokenKind::Access)?,
            refresh: self.issue(account_id, TokenKind::Refresh)?,
        })
    }

    fn issue(&self, account_id: Uuid, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = SessionClaims {
            sub: account_id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now.saturating_add(ttl),
            iss: self.issuer.clone(),
            typ: kind,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign session token: {e}")))
    }

    /// Returns the account ID of a valid access token.
    pub fn verify_access(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    /// Returns the account ID of a valid refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?
            .claims;

        if claims.typ != expected {
            tracing::debug!(expected = ?expected, actual = ?claims.typ, "Session token of wrong kind");
            return Err(AuthError::InvalidToken);
        }
        Ok(claims.sub)
    }
}

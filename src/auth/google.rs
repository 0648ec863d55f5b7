//! Google ID token verification against Google's published JWKS.
//!
//! Signing keys are cached and refetched when they age past
//! `jwks_refresh_secs` or when a token names an unknown key ID.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm},
};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::AuthError;
use crate::{config::GoogleAuthConfig, models::VerifiedIdentity};

/// An unknown `kid` triggers a refetch at most this often.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// Claims read from a Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    pub sub: String,
    pub iss: String,
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<EmailVerified>,
    #[serde(default)]
    pub name: Option<String>,
    /// Hosted domain of a Workspace account
    #[serde(default)]
    pub hd: Option<String>,
}

/// Google has sent `email_verified` both as a boolean and as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EmailVerified {
    Bool(bool),
    Text(String),
}

impl EmailVerified {
    fn is_false(&self) -> bool {
        match self {
            EmailVerified::Bool(v) => !v,
            EmailVerified::Text(s) => s.eq_ignore_ascii_case("false"),
        }
    }
}

struct CachedJwks {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// Verifies Google-issued ID tokens for the configured OAuth client.
pub struct GoogleIdTokenVerifier {
    config: GoogleAuthConfig,
    http_client: reqwest::Client,
    jwks_cache: RwLock<Option<CachedJwks>>,
}

pub type SharedGoogleVerifier = Arc<GoogleIdTokenVerifier>;

impl GoogleIdTokenVerifier {
    pub fn new(config: GoogleAuthConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
            jwks_cache: RwLock::new(None),
        }
    }

    /// Verify signature, issuer, audience and expiry, then extract the identity.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::IdentityRejected(format!("malformed header: {e}")))?;

        // Reject `none`, HMAC and anything else outside the allowlist before key lookup
        if !self.is_algorithm_allowed(header.alg) {
            tracing::warn!(algorithm = ?header.alg, "ID token algorithm not in allowlist");
            return Err(AuthError::IdentityRejected(format!(
                "algorithm {:?} not allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| AuthError::IdentityRejected("missing key ID".into()))?;
        let decoding_key = self.get_decoding_key(kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&self.config.issuers);
        validation.set_audience(&[&self.config.client_id]);
        if self.config.allow_expired {
            validation.validate_exp = false;
        }

        let claims = decode::<GoogleClaims>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::IdentityRejected(e.to_string()))?
            .claims;

        identity_from_claims(claims)
    }

    fn is_algorithm_allowed(&self, alg: Algorithm) -> bool {
        self.config
            .allowed_algorithms
            .iter()
            .any(|allowed| allowed.matches(alg))
    }

    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < Duration::from_secs(self.config.jwks_refresh_secs) {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                    if age < MIN_REFETCH_INTERVAL {
                        return Err(AuthError::IdentityRejected(format!("unknown key ID {kid}")));
                    }
                }
            }
        }

        self.refresh_jwks().await?;

        let cache = self.jwks_cache.read().await;
        cache
            .as_ref()
            .and_then(|c| c.keys.get(kid).cloned())
            .ok_or_else(|| {
                tracing::warn!(kid = kid, "Key ID not found in Google JWKS");
                AuthError::IdentityRejected(format!("unknown key ID {kid}"))
            })
    }

    async fn refresh_jwks(&self) -> Result<(), AuthError> {
        let url = &self.config.jwks_url;
        tracing::debug!(url = %url, "Fetching Google JWKS");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::IdentityProviderUnavailable(format!("JWKS fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::IdentityProviderUnavailable(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::IdentityProviderUnavailable(format!("invalid JWKS: {e}")))?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = &jwk.common.key_id else {
                continue;
            };
            match jwk_to_decoding_key(jwk) {
                Ok(key) => {
                    keys.insert(kid.clone(), key);
                }
                Err(reason) => {
                    tracing::warn!(kid = %kid, reason = %reason, "Skipping unusable JWK");
                }
            }
        }

        tracing::info!(keys_count = keys.len(), "Google JWKS refreshed");
        *self.jwks_cache.write().await = Some(CachedJwks {
            keys,
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}

fn identity_from_claims(claims: GoogleClaims) -> Result<VerifiedIdentity, AuthError> {
    if claims
        .email_verified
        .as_ref()
        .is_some_and(EmailVerified::is_false)
    {
        return Err(AuthError::IdentityRejected("email not verified".into()));
    }

    let email = claims
        .email
        .map(|e| e.trim().to_ascii_lowercase())
        .filter(|e| e.contains('@'))
        .ok_or_else(|| AuthError::IdentityRejected("token carries no email".into()))?;

    Ok(VerifiedIdentity {
        email,
        name: claims.name.filter(|n| !n.trim().is_empty()),
    })
}

/// Only asymmetric keys are accepted; Google publishes RSA.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, String> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            DecodingKey::from_rsa_components(&rsa.n, &rsa.e).map_err(|e| e.to_string())
        }
        AlgorithmParameters::EllipticCurve(ec) => match jwk.common.key_algorithm {
            Some(KeyAlgorithm::ES256) | Some(KeyAlgorithm::ES384) | None => {
                DecodingKey::from_ec_components(&ec.x, &ec.y).map_err(|e| e.to_string())
            }
            Some(alg) => Err(format!("unsupported EC algorithm {alg:?}")),
        },
        _ => Err("unsupported key type".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::{
        config::JwtAlgorithm,
        tests::support::{CLIENT_ID, GoogleToken, jwks_body},
    };

    fn config(jwks_url: String) -> GoogleAuthConfig {
        GoogleAuthConfig {
            client_id: CLIENT_ID.to_string(),
            issuers: vec![
                "accounts.google.com".into(),
                "https://accounts.google.com".into(),
            ],
            jwks_url,
            jwks_refresh_secs: 3600,
            allowed_algorithms: vec![JwtAlgorithm::RS256],
            allow_expired: false,
        }
    }

    async fn verifier_with_jwks() -> (MockServer, GoogleIdTokenVerifier) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .expect(1)
            .mount(&server)
            .await;
        let verifier =
            GoogleIdTokenVerifier::new(config(format!("{}/certs", server.uri())), reqwest::Client::new());
        (server, verifier)
    }

    #[tokio::test]
    async fn test_valid_token_yields_lowercased_email() {
        let (_server, verifier) = verifier_with_jwks().await;
        let token = GoogleToken::new("Student@College.edu").name("Asha").sign();

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.email, "student@college.edu");
        assert_eq!(identity.name.as_deref(), Some("Asha"));

        // Second verification is served from the cache (mock expects one fetch)
        verifier.verify(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let (_server, verifier) = verifier_with_jwks().await;
        let token = GoogleToken::new("a@college.edu").audience("someone-else").sign();

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::IdentityRejected(_)));
    }

    #[tokio::test]
    async fn test_wrong_issuer_rejected() {
        let (_server, verifier) = verifier_with_jwks().await;
        let token = GoogleToken::new("a@college.edu").issuer("https://evil.example").sign();

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::IdentityRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (_server, verifier) = verifier_with_jwks().await;
        let token = GoogleToken::new("a@college.edu").expired().sign();

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::IdentityRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_unverified_email_rejected() {
        let (_server, verifier) = verifier_with_jwks().await;
        let token = GoogleToken::new("a@college.edu")
            .claim("email_verified", json!("false"))
            .sign();

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::IdentityRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_jwks_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let verifier =
            GoogleIdTokenVerifier::new(config(format!("{}/certs", server.uri())), reqwest::Client::new());
        let token = GoogleToken::new("a@college.edu").sign();

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::IdentityProviderUnavailable(_))
        ));
    }

    #[test]
    fn test_hmac_tokens_never_allowed() {
        let verifier = GoogleIdTokenVerifier::new(
            config("http://unused".into()),
            reqwest::Client::new(),
        );
        assert!(verifier.is_algorithm_allowed(Algorithm::RS256));
        assert!(!verifier.is_algorithm_allowed(Algorithm::HS256));
    }

    #[test]
    fn test_email_verified_forms() {
        let claims = |v: serde_json::Value| -> GoogleClaims {
            serde_json::from_value(json!({
                "sub": "1", "iss": "accounts.google.com", "exp": 1,
                "email": "a@b.c", "email_verified": v
            }))
            .unwrap()
        };
        assert!(identity_from_claims(claims(json!(true))).is_ok());
        assert!(identity_from_claims(claims(json!("true"))).is_ok());
        assert!(identity_from_claims(claims(json!(false))).is_err());
        assert!(identity_from_claims(claims(json!("False"))).is_err());
    }
}

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Authentication configuration.
///
/// Sign-in happens with a Google ID token; the portal then issues its own
/// access/refresh token pair which every protected route validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Email domain of the institution (e.g. `nitc.ac.in`). Google identities in
    /// this domain are provisioned as students on first sign-in; identities
    /// outside it must already have an account (or a matching backup email).
    pub institution_domain: String,

    /// Google identity provider settings.
    pub google: GoogleAuthConfig,

    /// Session token settings.
    pub tokens: TokenConfig,
}

impl AuthConfig {
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let domain = self
            .institution_domain
            .trim()
            .trim_start_matches('@')
            .to_ascii_lowercase();
        if domain.is_empty() || !domain.contains('.') {
            return Err(ConfigError::Validation(format!(
                "auth.institution_domain '{}' is not a valid domain",
                self.institution_domain
            )));
        }
        self.institution_domain = domain;

        self.google.validate()?;
        self.tokens.validate()?;
        Ok(())
    }

    /// Suffix that institutional email addresses end with, e.g. `@nitc.ac.in`.
    pub fn institution_email_suffix(&self) -> String {
        format!("@{}", self.institution_domain)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Google ID tokens
// ─────────────────────────────────────────────────────────────────────────────

/// Google ID token verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleAuthConfig {
    /// OAuth client ID of the frontend; must equal the token's `aud` claim.
    pub client_id: String,

    /// Accepted `iss` values.
    #[serde(default = "default_google_issuers")]
    pub issuers: Vec<String>,

    /// JWKS URL for fetching Google's signing keys.
    #[serde(default = "default_google_jwks_url")]
    pub jwks_url: String,

    /// How often to refresh the JWKS in seconds.
    #[serde(default = "default_jwks_refresh")]
    pub jwks_refresh_secs: u64,

    /// Allowed signing algorithms.
    #[serde(default = "default_allowed_algorithms")]
    pub allowed_algorithms: Vec<JwtAlgorithm>,

    /// Allow expired tokens (for testing only!).
    #[serde(default)]
    pub allow_expired: bool,
}

impl GoogleAuthConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::Validation(
                "auth.google.client_id cannot be empty".into(),
            ));
        }
        if self.issuers.is_empty() {
            return Err(ConfigError::Validation(
                "auth.google.issuers must list at least one issuer".into(),
            ));
        }
        if self.jwks_url.is_empty() {
            return Err(ConfigError::Validation("JWKS URL cannot be empty".into()));
        }
        if self.allowed_algorithms.is_empty() {
            return Err(ConfigError::Validation(
                "At least one JWT algorithm must be allowed".into(),
            ));
        }
        if self.allow_expired {
            tracing::warn!("auth.google.allow_expired is set; expired ID tokens will be accepted");
        }
        Ok(())
    }
}

fn default_google_issuers() -> Vec<String> {
    vec![
        "accounts.google.com".to_string(),
        "https://accounts.google.com".to_string(),
    ]
}

fn default_google_jwks_url() -> String {
    "https://www.googleapis.com/oauth2/v3/certs".to_string()
}

fn default_jwks_refresh() -> u64 {
    3600 // 1 hour
}

fn default_allowed_algorithms() -> Vec<JwtAlgorithm> {
    vec![JwtAlgorithm::RS256]
}

/// Asymmetric JWT signing algorithm accepted for identity provider tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
    PS256,
    PS384,
    PS512,
}

impl JwtAlgorithm {
    /// Convert to jsonwebtoken Algorithm.
    pub fn to_jwt_algorithm(self) -> jsonwebtoken::Algorithm {
        match self {
            JwtAlgorithm::RS256 => jsonwebtoken::Algorithm::RS256,
            JwtAlgorithm::RS384 => jsonwebtoken::Algorithm::RS384,
            JwtAlgorithm::RS512 => jsonwebtoken::Algorithm::RS512,
            JwtAlgorithm::ES256 => jsonwebtoken::Algorithm::ES256,
            JwtAlgorithm::ES384 => jsonwebtoken::Algorithm::ES384,
            JwtAlgorithm::PS256 => jsonwebtoken::Algorithm::PS256,
            JwtAlgorithm::PS384 => jsonwebtoken::Algorithm::PS384,
            JwtAlgorithm::PS512 => jsonwebtoken::Algorithm::PS512,
        }
    }

    /// Check if this algorithm matches a jsonwebtoken Algorithm.
    pub fn matches(self, alg: jsonwebtoken::Algorithm) -> bool {
        self.to_jwt_algorithm() == alg
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session tokens
// ─────────────────────────────────────────────────────────────────────────────

/// Minimum HMAC secret length in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Session token issuance settings (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// HMAC signing secret. Use `${PORTAL_TOKEN_SECRET}` rather than a literal.
    pub secret: String,

    /// `iss` claim written into and required on session tokens.
    #[serde(default = "default_token_issuer")]
    pub issuer: String,

    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,
}

impl TokenConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Validation(format!(
                "auth.tokens.secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "auth.tokens TTLs must be greater than zero".into(),
            ));
        }
        if self.refresh_ttl_secs < self.access_ttl_secs {
            return Err(ConfigError::Validation(
                "auth.tokens.refresh_ttl_secs cannot be shorter than access_ttl_secs".into(),
            ));
        }
        Ok(())
    }
}

fn default_token_issuer() -> String {
    "alumni-portal".to_string()
}

fn default_access_ttl() -> u64 {
    3600 // 1 hour
}

fn default_refresh_ttl() -> u64 {
    7 * 24 * 3600 // 7 days
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn parse(toml_str: &str) -> Result<AuthConfig, ConfigError> {
        let mut config: AuthConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults_and_domain_normalization() {
        let config = parse(&format!(
            r#"
            institution_domain = "@NITC.ac.in"
            [google]
            client_id = "client-123.apps.googleusercontent.com"
            [tokens]
            secret = "{SECRET}"
        "#
        ))
        .unwrap();

        assert_eq!(config.institution_domain, "nitc.ac.in");
        assert_eq!(config.institution_email_suffix(), "@nitc.ac.in");
        assert_eq!(config.google.issuers.len(), 2);
        assert_eq!(config.google.allowed_algorithms, vec![JwtAlgorithm::RS256]);
        assert_eq!(config.tokens.access_ttl_secs, 3600);
        assert_eq!(config.tokens.issuer, "alumni-portal");
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = parse(
            r#"
            institution_domain = "nitc.ac.in"
            [google]
            client_id = "client"
            [tokens]
            secret = "short"
        "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 32 bytes"));
    }

    #[test]
    fn test_empty_client_id_rejected() {
        let err = parse(&format!(
            r#"
            institution_domain = "nitc.ac.in"
            [google]
            client_id = ""
            [tokens]
            secret = "{SECRET}"
        "#
        ))
        .unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let err = parse(&format!(
            r#"
            institution_domain = "localhost"
            [google]
            client_id = "client"
            [tokens]
            secret = "{SECRET}"
        "#
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_algorithm_matches() {
        assert!(JwtAlgorithm::RS256.matches(jsonwebtoken::Algorithm::RS256));
        assert!(!JwtAlgorithm::RS256.matches(jsonwebtoken::Algorithm::HS256));
    }
}

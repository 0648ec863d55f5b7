//! Configuration module for the alumni portal.
//!
//! The portal is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! type = "sqlite"
//! path = "portal.db"
//!
//! [auth]
//! institution_domain = "nitc.ac.in"
//!
//! [auth.google]
//! client_id = "${GOOGLE_CLIENT_ID}"
//!
//! [auth.tokens]
//! secret = "${PORTAL_TOKEN_SECRET}"
//! ```

mod auth;
mod database;
mod observability;
mod server;

use std::{path::Path, sync::LazyLock};

pub use auth::*;
pub use database::*;
pub use observability::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
pub use server::*;

/// Root configuration for the portal.
///
/// Every section except `auth` has defaults; a database section is required
/// before the server will start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration for persistent storage.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication configuration (Google sign-in and session tokens).
    pub auth: AuthConfig,

    /// Observability configuration (logging, metrics).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl PortalConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        let mut config: PortalConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.database.is_none() {
            return Err(ConfigError::Validation(
                "A [database] section is required; the portal keeps all state in it".into(),
            ));
        }

        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::Validation(
                "server.body_limit_bytes must be greater than zero".into(),
            ));
        }

        self.database.validate()?;
        self.auth.validate()?;

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

static ENV_VAR_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").ok());

/// Replace `${VAR_NAME}` with the variable's value. Anything after a `#` on a
/// line is left untouched so commented-out settings never require their
/// variables to be set.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let Some(re) = ENV_VAR_REGEX.as_ref() else {
        return Err(ConfigError::Validation(
            "environment variable pattern failed to compile".into(),
        ));
    };

    let mut expanded = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        let (code, comment) = line.split_at(line.find('#').unwrap_or(line.len()));

        let mut last_end = 0;
        for cap in re.captures_iter(code) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let value = std::env::var(name.as_str())
                .map_err(|_| ConfigError::EnvVarNotFound(name.as_str().to_string()))?;
            expanded.push_str(&code[last_end..whole.start()]);
            expanded.push_str(&value);
            last_end = whole.end();
        }
        expanded.push_str(&code[last_end..]);
        expanded.push_str(comment);
    }

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"
        [database]
        type = "sqlite"
        path = "portal.db"

        [auth]
        institution_domain = "nitc.ac.in"

        [auth.google]
        client_id = "client-123"

        [auth.tokens]
        secret = "0123456789abcdef0123456789abcdef"
    "#;

    #[test]
    fn test_minimal_config() {
        let config = PortalConfig::from_str(MINIMAL).unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.database.is_none());
        assert_eq!(config.auth.institution_domain, "nitc.ac.in");
    }

    #[test]
    fn test_database_required() {
        let err = PortalConfig::from_str(
            r#"
            [auth]
            institution_domain = "nitc.ac.in"
            [auth.google]
            client_id = "client-123"
            [auth.tokens]
            secret = "0123456789abcdef0123456789abcdef"
        "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("[database]"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let input = format!("{MINIMAL}\n[placements]\nseason = 2024\n");
        assert!(matches!(
            PortalConfig::from_str(&input),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = PortalConfig::from_file(file.path()).unwrap();
        assert_eq!(config.auth.google.client_id, "client-123");
    }

    #[test]
    fn test_from_missing_file() {
        let err = PortalConfig::from_file("/nonexistent/alumni-portal.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_CLIENT_ID", Some("client-from-env"), || {
            let result = expand_env_vars("client_id = \"${TEST_CLIENT_ID}\"").unwrap();
            assert_eq!(result, "client_id = \"client-from-env\"");
        });
    }

    #[test]
    fn test_missing_env_var() {
        temp_env::with_var_unset("PORTAL_TEST_MISSING", || {
            let err = expand_env_vars("secret = \"${PORTAL_TEST_MISSING}\"").unwrap_err();
            assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "PORTAL_TEST_MISSING"));
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# secret = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# secret = \"${NONEXISTENT_VAR}\"");
    }

    #[test]
    fn test_env_var_after_comment_ignored() {
        let result = expand_env_vars("key = \"value\" # ${NONEXISTENT_VAR}").unwrap();
        assert_eq!(result, "key = \"value\" # ${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_multiline_with_comments() {
        temp_env::with_var("TEST_MULTI", Some("value1"), || {
            let input = r#"key1 = "${TEST_MULTI}"
# key2 = "${NONEXISTENT}"
key3 = "literal""#;
            let result = expand_env_vars(input).unwrap();
            assert_eq!(
                result,
                r#"key1 = "value1"
# key2 = "${NONEXISTENT}"
key3 = "literal""#
            );
        });
    }
}

//! Global subscriber setup.

use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig, ObservabilityConfig};

/// Dependencies that are chatty at `info`.
const QUIET_DEPENDENCIES: &str = "hyper=warn,h2=warn,sqlx=warn,reqwest=warn";

/// Install the global subscriber in the configured format.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TracingError> {
    let logging = &config.logging;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_env_filter(logging))
        .try_init()
        .map_err(|e| TracingError::Init(e.to_string()))
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let base_level = config.level.as_str();

    if let Ok(directives) = std::env::var("RUST_LOG") {
        return EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(base_level));
    }

    let directives = match &config.filter {
        Some(filter) => format!("{base_level},{filter}"),
        None => format!("{base_level},{QUIET_DEPENDENCIES}"),
    };
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(base_level))
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    #[serial]
    fn test_filter_from_config() {
        temp_env::with_var_unset("RUST_LOG", || {
            let config = LoggingConfig {
                level: LogLevel::Debug,
                filter: Some("sqlx=info".into()),
                ..Default::default()
            };
            let filter = build_env_filter(&config).to_string();
            assert!(filter.contains("debug"));
            assert!(filter.contains("sqlx=info"));
        });
    }

    #[test]
    #[serial]
    fn test_default_filter_quiets_dependencies() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = build_env_filter(&LoggingConfig::default()).to_string();
            assert!(filter.contains("hyper=warn"));
            assert!(filter.contains("sqlx=warn"));
        });
    }

    #[test]
    #[serial]
    fn test_rust_log_takes_precedence() {
        temp_env::with_var("RUST_LOG", Some("alumni_portal=trace"), || {
            let config = LoggingConfig {
                filter: Some("sqlx=info".into()),
                ..Default::default()
            };
            let filter = build_env_filter(&config).to_string();
            assert!(filter.contains("alumni_portal=trace"));
            assert!(!filter.contains("sqlx=info"));
        });
    }
}

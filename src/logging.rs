//! # Logging
//!
//! Tracing subscriber setup for the `manifestctl` binary.
//!
//! Logs go to stderr so stdout can carry manifest output untouched.

use crate::config::{EngineConfig, LogFormat};
use crate::constants::{BINARY_LOG_TARGET, DEFAULT_LOG_TARGET};
use tracing_subscriber::EnvFilter;

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level
/// applied to the library and binary targets.
pub fn build_env_filter(config: &EngineConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config)))
}

/// Filter directives used when `RUST_LOG` is not set.
fn default_directives(config: &EngineConfig) -> String {
    let level = config.log_level.to_lowercase();
    format!("{DEFAULT_LOG_TARGET}={level},{BINARY_LOG_TARGET}={level}")
}

/// Install the global tracing subscriber.
///
/// Returns an error if a global subscriber was already installed.
pub fn init_logging(config: &EngineConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config))
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logging: {e}")),
        LogFormat::Text => builder
            .with_ansi(config.log_enable_color)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_library_and_binary() {
        let config = EngineConfig {
            log_level: "DEBUG".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(
            default_directives(&config),
            "manifest_engine=debug,manifestctl=debug"
        );
    }

    #[test]
    fn test_default_directives_parse_as_filter() {
        let filter = EnvFilter::new(default_directives(&EngineConfig::default()));
        let rendered = filter.to_string().to_lowercase();
        assert!(rendered.contains("manifest_engine=info"));
        assert!(rendered.contains("manifestctl=info"));
    }
}

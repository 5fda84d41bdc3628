//! Logging setup and configuration
//!
//! tracing is developer diagnostics only; the operator-facing record is
//! the [`SessionLog`](crate::SessionLog). A `RUST_LOG` filter in the
//! environment overrides the configured default level.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Result, SessionError};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Setup tracing subscriber for the application
pub fn setup_logging(default_level: &str) -> Result<()> {
    let level = validate_level(default_level)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    Ok(())
}

/// Normalize and validate a configured level string
fn validate_level(level: &str) -> Result<String> {
    let normalized = level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&normalized.as_str()) {
        return Err(SessionError::Config(format!(
            "Invalid log level '{}', must be one of: {}",
            level,
            LEVELS.join(", ")
        )));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_level_accepts_known_levels() {
        for level in LEVELS {
            assert_eq!(validate_level(level).unwrap(), level);
        }
    }

    #[test]
    fn test_validate_level_normalizes_case_and_whitespace() {
        assert_eq!(validate_level(" DEBUG ").unwrap(), "debug");
    }

    #[test]
    fn test_validate_level_rejects_unknown() {
        let err = validate_level("verbose").unwrap_err();
        assert!(matches!(err, SessionError::Config(ref m) if m.contains("verbose")));
    }
}

//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERCATO_API_URL` - Base URL of the commerce API (e.g., `https://api.mercato.example`)
//!
//! ## Optional
//! - `MERCATO_DATA_DIR` - Directory for the local cart and token files (default: `.mercato`)
//! - `MERCATO_SYNC_FAILURE_POLICY` - What to do with entries that fail to
//!   migrate during login sync: `discard` (default) or `requeue`
//! - `MERCATO_NOTIFICATION_DISMISS_MS` - Toast auto-dismiss duration (default: 3000)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Policy for local entries whose remote add fails during login migration.
///
/// The historical product behavior is to drop them silently; `Requeue` keeps
/// failed entries in the local store for a later attempt instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncFailurePolicy {
    /// Failed entries are logged and dropped with the rest of the batch.
    #[default]
    Discard,
    /// Failed entries (and only those) are written back to the local store.
    Requeue,
}

impl FromStr for SyncFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "requeue" => Ok(Self::Requeue),
            other => Err(format!("expected 'discard' or 'requeue', got '{other}'")),
        }
    }
}

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the commerce API.
    pub api_url: Url,
    /// Directory holding the local cart and token files.
    pub data_dir: PathBuf,
    /// Policy for entries that fail to migrate during login sync.
    pub sync_failure_policy: SyncFailurePolicy,
    /// Toast auto-dismiss duration.
    pub notification_dismiss: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("MERCATO_API_URL")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("MERCATO_API_URL".to_string(), e.to_string()))?;
        let data_dir = PathBuf::from(get_env_or_default("MERCATO_DATA_DIR", ".mercato"));
        let sync_failure_policy = get_env_or_default("MERCATO_SYNC_FAILURE_POLICY", "discard")
            .parse::<SyncFailurePolicy>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MERCATO_SYNC_FAILURE_POLICY".to_string(), e)
            })?;
        let notification_dismiss = Duration::from_millis(
            get_env_or_default("MERCATO_NOTIFICATION_DISMISS_MS", "3000")
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "MERCATO_NOTIFICATION_DISMISS_MS".to_string(),
                        e.to_string(),
                    )
                })?,
        );

        Ok(Self {
            api_url,
            data_dir,
            sync_failure_policy,
            notification_dismiss,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_failure_policy_parse() {
        assert_eq!(
            "discard".parse::<SyncFailurePolicy>().unwrap(),
            SyncFailurePolicy::Discard
        );
        assert_eq!(
            "REQUEUE".parse::<SyncFailurePolicy>().unwrap(),
            SyncFailurePolicy::Requeue
        );
        assert!("keep".parse::<SyncFailurePolicy>().is_err());
    }

    #[test]
    fn test_sync_failure_policy_default_is_discard() {
        assert_eq!(SyncFailurePolicy::default(), SyncFailurePolicy::Discard);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("MERCATO_API_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: MERCATO_API_URL"
        );
    }
}

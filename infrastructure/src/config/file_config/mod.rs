//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; [`FileConfig::validate`] checks the
//! values the console cannot start without.

mod backend;
mod logging;
mod repl;

pub use backend::{DEFAULT_BASE_URL, FileBackendConfig};
pub use logging::FileLoggingConfig;
pub use repl::FileReplConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("backend.base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("backend.user_id cannot be empty (set it in kubechat.toml, KUBECHAT_BACKEND__USER_ID or --user-id)")]
    EmptyUserId,

    #[error("backend.connect_timeout_seconds cannot be 0")]
    InvalidTimeout,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Backend connection
    pub backend: FileBackendConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Conversation log settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if self.backend.base_url.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyBaseUrl);
        }
        if self.backend.user_id.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyUserId);
        }
        if self.backend.connect_timeout_seconds == 0 {
            errors.push(ConfigValidationError::InvalidTimeout);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

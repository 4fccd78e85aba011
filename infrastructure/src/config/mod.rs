//! Configuration file loading for kubechat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Command line flags (`--base-url`, `--user-id`)
//! 2. Environment variables prefixed `KUBECHAT_` (`__` separates sections)
//! 3. `--config <path>` specified file
//! 4. Project root: `./kubechat.toml` or `./.kubechat.toml`
//! 5. XDG config: `$XDG_CONFIG_HOME/kubechat/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBackendConfig, FileConfig, FileLoggingConfig, FileReplConfig,
};
pub use loader::{ConfigLoader, ConfigOverrides};

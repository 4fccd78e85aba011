//! Infrastructure layer for kubechat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod backend;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use backend::{BackendClient, BackendError};
pub use config::{
    ConfigLoader, ConfigOverrides, ConfigValidationError, FileBackendConfig, FileConfig,
    FileLoggingConfig, FileReplConfig,
};
pub use logging::JsonlConversationLogger;

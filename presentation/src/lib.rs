//! Presentation layer for kubechat
//!
//! This crate contains the CLI definition, the console renderer and the
//! interactive chat REPL.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::Cli;
pub use config::ReplConfig;
pub use output::console::ConsoleRenderer;

//! Interactive chat module
//!
//! Provides a readline-based interactive console for the ops assistant.

mod repl;

pub use repl::ChatRepl;

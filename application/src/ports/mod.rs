//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod chat_stream;
pub mod chat_update;
pub mod conversation_logger;
pub mod session_api;

//! HTTP adapter for the chat backend
//!
//! [`BackendClient`] implements both the chat stream port and the session
//! API port over one `reqwest` client. The streamed response body goes
//! through the [`sse`] frame decoder before it reaches the application.

pub mod client;
pub mod error;
pub mod protocol;
pub mod sse;

pub use client::BackendClient;
pub use error::BackendError;

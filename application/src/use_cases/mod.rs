//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_controller;
pub mod send_message;
pub mod session_lifecycle;

#[cfg(test)]
pub(crate) mod test_support;

//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] — domain-level validation errors
//! - [`string`] — title derivation and text helpers

pub mod error;
pub mod string;

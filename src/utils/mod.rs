//! Shared utilities.
//!
//! - [`mask`]: email redaction for log output
//! - [`password`]: bcrypt on the blocking pool
//! - [`tracing`]: span and event helpers

pub mod mask;
pub mod password;
pub mod tracing;

pub use mask::mask_email;

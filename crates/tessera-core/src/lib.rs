//! # Tessera Core
//!
//! Foundational types shared across the Tessera workspace:
//!
//! - [`errors`]: [`AppError`] and the [`RpcCode`] status taxonomy
//! - [`password`]: bcrypt hashing and constant-time verification

pub mod errors;
pub mod password;

pub use errors::{AppError, RpcCode};
pub use password::{PasswordError, hash_password_with_cost, verify_password};

//! # Tessera Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`token`]: signing key, token lifetime and token scheme
//! - [`server`]: listener, storage, observability and access-table settings
//!
//! Every type exposes `from_env()` plus `from_lookup()`, which reads through an
//! arbitrary closure so tests never touch the process environment.
//!
//! # Example
//!
//! ```ignore
//! use tessera_config::{ServerConfig, TokenConfig};
//!
//! let token_config = TokenConfig::from_env()?;
//! let server_config = ServerConfig::from_env()?;
//! ```

pub mod error;
pub mod server;
pub mod token;

pub use error::ConfigError;
pub use server::{Environment, ServerConfig};
pub use token::{TokenConfig, TokenScheme};

//! # Tessera Auth
//!
//! Credential issuance and verification for the Tessera user service.
//!
//! - [`payload`]: the claims a token carries and the [`Role`] enumeration
//! - [`codec`]: AES-256-GCM authenticated token encoding
//! - [`jwt`]: HS256 JWT alternative
//! - [`maker`]: the [`TokenMaker`] abstraction both schemes implement
//!
//! # Example
//!
//! ```ignore
//! use tessera_auth::{Role, SymmetricTokenMaker, TokenMaker};
//!
//! let maker = SymmetricTokenMaker::new(key_bytes)?;
//! let (token, payload) = maker.create_token("a@x.com", Role::Standard, duration)?;
//! let verified = maker.verify_token(&token)?;
//! assert_eq!(verified.subject(), payload.subject());
//! ```

pub mod codec;
pub mod error;
pub mod jwt;
pub mod maker;
pub mod payload;

pub use codec::SigningKey;
pub use error::TokenError;
pub use jwt::JwtMaker;
pub use maker::{SymmetricTokenMaker, TokenMaker, token_maker_from_config};
pub use payload::{Role, TokenPayload};

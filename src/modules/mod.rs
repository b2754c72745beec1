//! `UserService` operations, split the same way as the routes they serve.
//!
//! - [`auth`]: `LoginUser`
//! - [`users`]: `CreateUser`, `CreateAdmin`, `GetUser`, `UpdateUser`, `DeleteUser`
//!
//! Each module has a `controller.rs` (handlers), `service.rs` (logic),
//! `model.rs` (types) and `router.rs` (route table).

pub mod auth;
pub mod users;

//! # Tessera Models
//!
//! Domain records and wire DTOs for the Tessera user service.
//!
//! - [`users`]: the stored user record, its public profile and the request and
//!   response bodies of every `UserService` operation
//! - [`validation`]: field rules shared by the request DTOs

pub mod users;
pub mod validation;

pub use tessera_auth::Role;
pub use users::{
    CreateUserRequest, DeleteUserRequest, DeleteUserResponse, GetUserRequest, LoginUserRequest,
    LoginUserResponse, UpdateUserRequest, User, UserProfile, UserResponse,
};

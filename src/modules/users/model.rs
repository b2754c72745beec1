//! Types used by the user management operations.
//!
//! Defined in `tessera-models` so the storage crate and the service share one
//! `User` record.

pub use tessera_models::users::{
    CreateUserRequest, DeleteUserRequest, DeleteUserResponse, GetUserRequest, UpdateUserRequest,
    User, UserProfile, UserResponse,
};
pub use tessera_models::Role;

pub use tessera_models::users::{LoginUserRequest, LoginUserResponse};

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::model::{LoginUserRequest, LoginUserResponse};
use crate::modules::users::controller::ErrorResponse;
use crate::modules::users::model::{
    CreateUserRequest, DeleteUserRequest, DeleteUserResponse, GetUserRequest, Role,
    UpdateUserRequest, UserProfile, UserResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::create_admin,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::auth::controller::login_user,
    ),
    components(
        schemas(
            Role,
            UserProfile,
            UserResponse,
            CreateUserRequest,
            GetUserRequest,
            UpdateUserRequest,
            DeleteUserRequest,
            DeleteUserResponse,
            LoginUserRequest,
            LoginUserResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "UserService", description = "User registration, login and account management")
    ),
    info(
        title = "Tessera API",
        version = "0.1.0",
        description = "User service with per-operation role checks. Gated operations take the raw access token in the `authorization` header.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "authorization",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("authorization"))),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_operation() {
        let doc = ApiDoc::openapi();
        for op in crate::middleware::policy::Operation::ALL {
            let path = format!("/rpc/UserService/{}", op.name());
            assert!(doc.paths.paths.contains_key(&path), "missing {path}");
        }
    }

    #[test]
    fn test_security_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("authorization"));
    }
}

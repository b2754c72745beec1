use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tessera_core::AppError;
use tracing::instrument;
use utoipa::ToSchema;

use super::model::{
    CreateUserRequest, DeleteUserRequest, DeleteUserResponse, GetUserRequest, Role,
    UpdateUserRequest, UserProfile, UserResponse,
};
use super::service::UserService;
use crate::middleware::gate::AuthorizedPrincipal;
use crate::middleware::interceptor::CallContext;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Error body of every failed call.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Status category, e.g. `permission_denied`.
    pub code: String,
    pub error: String,
}

/// Register a standard user
#[utoipa::path(
    post,
    path = "/rpc/UserService/CreateUser",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "UserService"
)]
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    ctx: CallContext,
    ValidatedJson(dto): ValidatedJson<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user =
        UserService::create_user(&*state.users, &ctx, dto, Role::Standard, state.bcrypt_cost)
            .await?;
    Ok(Json(UserResponse {
        user: UserProfile::from(user),
    }))
}

/// Create a user carrying the caller's role
///
/// The new account is given the role of the issuing principal.
#[utoipa::path(
    post,
    path = "/rpc/UserService/CreateAdmin",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("authorization" = [])),
    tag = "UserService"
)]
#[instrument(skip_all)]
pub async fn create_admin(
    State(state): State<AppState>,
    principal: AuthorizedPrincipal,
    ctx: CallContext,
    ValidatedJson(dto): ValidatedJson<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user =
        UserService::create_user(&*state.users, &ctx, dto, principal.role(), state.bcrypt_cost)
            .await?;
    Ok(Json(UserResponse {
        user: UserProfile::from(user),
    }))
}

/// Fetch a user by id
#[utoipa::path(
    post,
    path = "/rpc/UserService/GetUser",
    request_body = GetUserRequest,
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("authorization" = [])),
    tag = "UserService"
)]
#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    ctx: CallContext,
    ValidatedJson(dto): ValidatedJson<GetUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = dto
        .id()
        .ok_or_else(|| AppError::invalid_argument("user_id must be a positive integer"))?;
    let user = UserService::get_user(&*state.users, &ctx, user_id).await?;
    Ok(Json(UserResponse {
        user: UserProfile::from(user),
    }))
}

/// Rename a user
#[utoipa::path(
    post,
    path = "/rpc/UserService/UpdateUser",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 403, description = "Caller may not modify this user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("authorization" = [])),
    tag = "UserService"
)]
#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    principal: AuthorizedPrincipal,
    ctx: CallContext,
    ValidatedJson(dto): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::update_user(&*state.users, &ctx, &principal, dto).await?;
    Ok(Json(UserResponse {
        user: UserProfile::from(user),
    }))
}

/// Delete a user
#[utoipa::path(
    post,
    path = "/rpc/UserService/DeleteUser",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "User deleted", body = DeleteUserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 403, description = "Caller may not delete this user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("authorization" = [])),
    tag = "UserService"
)]
#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    principal: AuthorizedPrincipal,
    ctx: CallContext,
    ValidatedJson(dto): ValidatedJson<DeleteUserRequest>,
) -> Result<Json<DeleteUserResponse>, AppError> {
    UserService::delete_user(&*state.users, &ctx, &principal, dto).await?;
    Ok(Json(DeleteUserResponse { success: true }))
}

use axum::Json;
use axum::extract::State;
use tessera_core::AppError;
use tracing::instrument;

use super::model::{LoginUserRequest, LoginUserResponse};
use super::service::AuthService;
use crate::middleware::interceptor::CallContext;
use crate::modules::users::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Login and receive an access token
#[utoipa::path(
    post,
    path = "/rpc/UserService/LoginUser",
    request_body = LoginUserRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginUserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "UserService"
)]
#[instrument(skip_all)]
pub async fn login_user(
    State(state): State<AppState>,
    ctx: CallContext,
    ValidatedJson(dto): ValidatedJson<LoginUserRequest>,
) -> Result<Json<LoginUserResponse>, AppError> {
    let response = AuthService::login_user(&state, &ctx, dto).await?;
    Ok(Json(response))
}

use crate::docs::ApiDoc;
use crate::middleware::interceptor::rpc_interceptor;
use crate::modules::auth::router::init_auth_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;
use axum::{Router, middleware};
use tessera_core::AppError;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Path prefix of every `UserService` operation.
pub const SERVICE_PREFIX: &str = "/rpc/UserService";

async fn unknown_operation() -> AppError {
    AppError::not_found("unknown operation")
}

/// Routes of the `UserService`, wrapped by the RPC interceptor.
///
/// The fallback sits inside the interceptor so unknown operation names go
/// through the role table too.
pub fn init_service_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(init_users_router())
        .merge(init_auth_router())
        .fallback(unknown_operation)
        .layer(middleware::from_fn_with_state(state, rpc_interceptor))
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(SERVICE_PREFIX, init_service_router(state.clone()))
        .with_state(state)
}

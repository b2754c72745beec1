use tessera_core::AppError;
use tessera_db::RepositoryError;
use tracing::instrument;

use crate::middleware::interceptor::CallContext;
use crate::modules::auth::model::{LoginUserRequest, LoginUserResponse};
use crate::modules::users::model::UserProfile;
use crate::modules::users::service::repository_error;
use crate::state::AppState;
use crate::utils::mask_email;
use crate::utils::password::{check_password, hash_password};
use crate::{audit_event, security_event};

/// Returned for an unknown email and for a wrong password alike.
pub const INCORRECT_CREDENTIALS: &str = "incorrect email or password";

pub struct AuthService;

impl AuthService {
    /// Checks the password and issues an access token for the configured duration.
    #[instrument(
        parent = &ctx.span,
        skip(state, ctx, dto),
        fields(email = %mask_email(&dto.email))
    )]
    pub async fn login_user(
        state: &AppState,
        ctx: &CallContext,
        dto: LoginUserRequest,
    ) -> Result<LoginUserResponse, AppError> {
        let user = match state.users.find_user_by_email(&dto.email).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => {
                // Same bcrypt work as a real check, result discarded
                let _ = hash_password(dto.password, state.bcrypt_cost).await;
                ctx.metrics.login_failed("unknown_email");
                security_event!(
                    "login_failed",
                    email = %mask_email(&dto.email),
                    reason = "unknown_email",
                    "Login failed"
                );
                return Err(AppError::unauthenticated(INCORRECT_CREDENTIALS));
            }
            Err(e) => return Err(repository_error(e)),
        };

        if !check_password(dto.password, user.hashed_password.clone()).await? {
            ctx.metrics.login_failed("wrong_password");
            security_event!(
                "login_failed",
                email = %mask_email(&user.email),
                reason = "wrong_password",
                "Login failed"
            );
            return Err(AppError::unauthenticated(INCORRECT_CREDENTIALS));
        }

        let (access_token, payload) = state
            .token_maker
            .create_token(&user.email, user.role, state.token_duration)
            .map_err(AppError::internal)?;

        ctx.metrics.token_issued(user.role);
        ctx.metrics.login_succeeded(user.role);
        audit_event!(
            "login",
            "user",
            request_id = %ctx.request_id,
            user_id = user.id,
            token_id = %payload.id(),
            "User logged in"
        );

        Ok(LoginUserResponse {
            user: UserProfile::from(user),
            access_token,
            access_token_expires_at: payload.expires_at(),
        })
    }
}

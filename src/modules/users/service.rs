use tessera_core::AppError;
use tessera_db::{CreateUserParams, RepositoryError, UserRepository};
use tracing::instrument;

use crate::audit_event;
use crate::middleware::gate::AuthorizedPrincipal;
use crate::middleware::interceptor::CallContext;
use crate::modules::users::model::{
    CreateUserRequest, DeleteUserRequest, Role, UpdateUserRequest, User,
};
use crate::utils::mask_email;
use crate::utils::password::hash_password;

pub const USER_NOT_FOUND: &str = "user not found";

/// Maps storage failures onto caller-facing codes.
pub(crate) fn repository_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found(USER_NOT_FOUND),
        RepositoryError::AlreadyExists => {
            AppError::already_exists("a user with this email already exists")
        }
        other if other.is_unavailable() => AppError::unavailable(other),
        other => AppError::internal(other),
    }
}

pub struct UserService;

impl UserService {
    /// Hashes the password and stores a new user with `role`.
    #[instrument(
        parent = &ctx.span,
        skip(repo, ctx, dto, bcrypt_cost),
        fields(email = %mask_email(&dto.email))
    )]
    pub async fn create_user(
        repo: &dyn UserRepository,
        ctx: &CallContext,
        dto: CreateUserRequest,
        role: Role,
        bcrypt_cost: u32,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(dto.password, bcrypt_cost).await?;

        let user = repo
            .create_user(CreateUserParams {
                name: dto.name,
                email: dto.email,
                role,
                hashed_password,
            })
            .await
            .map_err(repository_error)?;

        ctx.metrics.user_created(user.role);
        audit_event!(
            "create",
            "user",
            request_id = %ctx.request_id,
            user_id = user.id,
            role = %user.role,
            "User created"
        );

        Ok(user)
    }

    #[instrument(parent = &ctx.span, skip(repo, ctx))]
    pub async fn get_user(
        repo: &dyn UserRepository,
        ctx: &CallContext,
        user_id: i64,
    ) -> Result<User, AppError> {
        repo.find_user_by_id(user_id)
            .await
            .map_err(repository_error)
    }

    /// Renames the target user; callers that are not admins may only rename themselves.
    #[instrument(
        parent = &ctx.span,
        skip(repo, ctx, principal, dto),
        fields(target = %mask_email(&dto.email))
    )]
    pub async fn update_user(
        repo: &dyn UserRepository,
        ctx: &CallContext,
        principal: &AuthorizedPrincipal,
        dto: UpdateUserRequest,
    ) -> Result<User, AppError> {
        principal.ensure_can_act_on(&dto.email)?;

        let user = repo
            .update_user_name(&dto.email, &dto.name)
            .await
            .map_err(repository_error)?;

        audit_event!(
            "update",
            "user",
            request_id = %ctx.request_id,
            user_id = user.id,
            actor = %mask_email(principal.email()),
            "User renamed"
        );

        Ok(user)
    }

    /// Deletes the target user; callers that are not admins may only delete themselves.
    #[instrument(
        parent = &ctx.span,
        skip(repo, ctx, principal, dto),
        fields(target = %mask_email(&dto.email))
    )]
    pub async fn delete_user(
        repo: &dyn UserRepository,
        ctx: &CallContext,
        principal: &AuthorizedPrincipal,
        dto: DeleteUserRequest,
    ) -> Result<(), AppError> {
        principal.ensure_can_act_on(&dto.email)?;

        repo.delete_user_by_email(&dto.email)
            .await
            .map_err(repository_error)?;

        audit_event!(
            "delete",
            "user",
            request_id = %ctx.request_id,
            target = %mask_email(&dto.email),
            actor = %mask_email(principal.email()),
            "User deleted"
        );

        Ok(())
    }
}

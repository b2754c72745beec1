use tessera_core::{AppError, PasswordError, hash_password_with_cost, verify_password};

/// Hashes on the blocking pool so bcrypt never stalls the runtime.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

/// `Ok(false)` on a mismatch; other bcrypt failures are internal errors.
pub async fn check_password(password: String, hashed: String) -> Result<bool, AppError> {
    let result = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
        .await
        .map_err(AppError::internal)?;

    match result {
        Ok(()) => Ok(true),
        Err(PasswordError::Mismatch) => Ok(false),
        Err(e) => Err(AppError::internal(e)),
    }
}

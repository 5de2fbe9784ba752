/// Password Reset Tokens
///
/// Single-use recovery tokens with a short expiry. A token is created on a
/// recovery request, mailed to the user, and deleted once consumed. The
/// plaintext token is the UUID string itself; unlike refresh tokens these
/// never grant API access, only the right to set a new password once.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Create and persist a reset token for a user, returning the plaintext
/// token to be mailed.
pub async fn create_reset_token(pool: &PgPool, user_id: Uuid) -> Result<String, AppError> {
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    sqlx::query(
        r#"
        INSERT INTO password_resets (id, user_id, token, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&token)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(token)
}

/// Validate a presented reset token and return the owning user's ID.
///
/// Unknown and expired tokens both produce the uniform authentication
/// failure.
pub async fn validate_reset_token(pool: &PgPool, token: &str) -> Result<Uuid, AppError> {
    let row = sqlx::query_as::<_, (Uuid, chrono::DateTime<Utc>)>(
        r#"
        SELECT user_id, expires_at
        FROM password_resets
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match row {
        None => {
            tracing::warn!("Presented password reset token not found");
            Err(AppError::Auth(AuthError::TokenInvalid))
        }
        Some((user_id, expires_at)) => {
            if expires_at < Utc::now() {
                tracing::info!(user_id = %user_id, "Password reset token expired");
                return Err(AppError::Auth(AuthError::TokenInvalid));
            }
            Ok(user_id)
        }
    }
}

/// Delete a consumed reset token so it cannot be replayed.
pub async fn delete_reset_token(pool: &PgPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM password_resets WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

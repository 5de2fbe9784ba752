/// Refresh Token Store
///
/// Refresh tokens are opaque 64-character random strings, not JWTs. Only a
/// SHA-256 hash of the token is persisted; the plaintext exists solely in
/// the client's hands. Rows carry an expiry and a revocation flag; revoked
/// rows are swept periodically by the cleanup worker.

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

const REFRESH_TOKEN_LENGTH: usize = 64;

/// Generate a new cryptographically random opaque refresh token.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persist a newly issued refresh token.
pub async fn save_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
    expiry_seconds: i64,
) -> Result<(), AppError> {
    let token_hash = hash_token(token);
    let expires_at = Utc::now() + Duration::seconds(expiry_seconds);

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked, created_at)
        VALUES ($1, $2, $3, $4, false, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Validate a presented refresh token and return the owning user's ID.
///
/// Not-found, revoked, and expired all produce the same uniform
/// authentication failure; the distinction is only logged.
pub async fn validate_refresh_token(pool: &PgPool, token: &str) -> Result<Uuid, AppError> {
    let token_hash = hash_token(token);

    let row = sqlx::query_as::<_, (Uuid, chrono::DateTime<Utc>, bool)>(
        r#"
        SELECT user_id, expires_at, revoked
        FROM refresh_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    match row {
        None => {
            tracing::warn!("Presented refresh token not found");
            Err(AppError::Auth(AuthError::TokenInvalid))
        }
        Some((user_id, expires_at, revoked)) => {
            if revoked {
                tracing::warn!(user_id = %user_id, "Attempt to use revoked refresh token");
                return Err(AppError::Auth(AuthError::TokenInvalid));
            }

            if expires_at < Utc::now() {
                tracing::info!(user_id = %user_id, "Refresh token expired");
                return Err(AppError::Auth(AuthError::TokenInvalid));
            }

            Ok(user_id)
        }
    }
}

/// Revoke a refresh token.
///
/// Idempotent: revoking an already-revoked or unknown token is a no-op, not
/// an error. Returns the number of rows flipped; zero means the token was
/// already revoked (or never existed). The atomic UPDATE is what resolves
/// races between concurrent logout and refresh for the same token — the
/// caller that sees zero lost the race.
pub async fn revoke_refresh_token(pool: &PgPool, token: &str) -> Result<u64, AppError> {
    let token_hash = hash_token(token);

    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true
        WHERE token_hash = $1 AND revoked = false
        "#,
    )
    .bind(token_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Bulk-delete every revoked refresh token row.
///
/// Returns the number of rows removed. Deleting when no revoked rows exist
/// is a clean no-op returning zero.
pub async fn delete_revoked_tokens(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE revoked = true")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_opaque_alphanumeric() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), REFRESH_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn generated_tokens_are_unique() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[test]
    fn token_hashing_is_deterministic_and_one_way() {
        let token = generate_refresh_token();
        let hash1 = hash_token(&token);
        let hash2 = hash_token(&token);

        assert_eq!(hash1, hash2);
        assert_ne!(token, hash1);
        assert_eq!(hash1.len(), 64); // SHA-256 hex
    }
}

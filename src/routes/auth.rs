/// Authentication Routes
///
/// Sign-up, sign-in, token refresh, logout, and the password recovery flow.

use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    create_reset_token, delete_reset_token, generate_access_token, generate_refresh_token,
    hash_password, revoke_refresh_token, save_refresh_token, validate_password_policy,
    validate_refresh_token, validate_reset_token, verify_password, Claims, ROLE_USER,
};
use crate::configuration::JwtSettings;
use crate::email_client::EmailClient;
use crate::error::{AppError, AuthError};
use crate::validators::{is_valid_email, is_valid_name};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct RecoverPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Token bundle returned by sign-in and refresh.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: String,
    pub email: String,
    pub name: String,
}

async fn issue_token_pair(
    pool: &PgPool,
    jwt_config: &JwtSettings,
    user_id: Uuid,
    role: &str,
) -> Result<AuthResponse, AppError> {
    let access_token = generate_access_token(user_id, role, jwt_config)?;
    let refresh_token = generate_refresh_token();

    save_refresh_token(pool, user_id, &refresh_token, jwt_config.refresh_token_expiry).await?;

    let expires_at = Utc::now() + Duration::seconds(jwt_config.access_token_expiry);

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_at: expires_at.to_rfc3339(),
    })
}

/// POST /auth/signup
///
/// Register a new user. No tokens are issued at this stage; the client is
/// expected to sign in afterwards.
///
/// # Errors
/// - 400: invalid email, name, or password policy violation (field-level detail)
/// - 409: email already registered
pub async fn signup(
    form: web::Json<SignupRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    let password_hash = hash_password(&form.password)?;

    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(user_id)
    .bind(&email)
    .bind(&name)
    .bind(&password_hash)
    .bind(ROLE_USER)
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(user_id = %user_id, "User registered");

    Ok(HttpResponse::Created().json(SignupResponse {
        id: user_id.to_string(),
        email,
        name,
    }))
}

/// POST /auth/signin
///
/// Authenticate with email and password, returning an access token and a
/// refresh token.
///
/// # Security
/// Unknown email and wrong password produce byte-identical 401 responses so
/// accounts cannot be enumerated.
pub async fn signin(
    form: web::Json<SigninRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let user = sqlx::query_as::<_, (Uuid, String, String)>(
        "SELECT id, password_hash, role FROM users WHERE email = $1",
    )
    .bind(form.email.trim())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    let (user_id, password_hash, role) = user;

    // A malformed stored hash surfaces as a 500, never as bad credentials
    if !verify_password(&form.password, &password_hash)? {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let response = issue_token_pair(pool.get_ref(), jwt_config.get_ref(), user_id, &role).await?;

    tracing::info!(user_id = %user_id, "User signed in");

    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/refresh
///
/// Exchange a valid refresh token for a new access token. The presented
/// refresh token is rotated: it is revoked and a fresh one is issued, so a
/// stolen token stops working as soon as the legitimate client refreshes.
///
/// # Errors
/// - 401: token unknown, revoked, or expired (uniform)
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let user_id = validate_refresh_token(pool.get_ref(), &form.refresh_token).await?;

    // The atomic revoke decides who wins a concurrent double-exchange: a
    // token is only rotated by the caller that actually flipped the flag
    let revoked = revoke_refresh_token(pool.get_ref(), &form.refresh_token).await?;
    if revoked == 0 {
        tracing::warn!(user_id = %user_id, "Refresh token already rotated by a concurrent request");
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await?;

    let response = issue_token_pair(pool.get_ref(), jwt_config.get_ref(), user_id, &role).await?;

    tracing::info!(user_id = %user_id, "Tokens refreshed");

    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/logout (bearer-protected)
///
/// Revoke the presented refresh token. Idempotent: logging out twice with
/// the same token, or with a token that was never issued, succeeds and
/// leaves nothing usable behind.
pub async fn logout(
    claims: web::ReqData<Claims>,
    form: web::Json<LogoutRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    revoke_refresh_token(pool.get_ref(), &form.refresh_token).await?;

    tracing::info!(user_id = %claims.sub, "User logged out");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out"
    })))
}

/// POST /auth/recover-password
///
/// Start the password recovery flow. The response is identical whether or
/// not the email is registered; when the account exists, a single-use reset
/// token is persisted and mailed. A mail delivery failure is logged but
/// still answered uniformly.
pub async fn recover_password(
    form: web::Json<RecoverPasswordRequest>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, AppError> {
    let uniform_response = HttpResponse::Ok().json(serde_json::json!({
        "message": "If the email is registered, a recovery message has been sent"
    }));

    let email = match is_valid_email(&form.email) {
        Ok(email) => email,
        // malformed input gets the same answer as an unknown account
        Err(_) => return Ok(uniform_response),
    };

    let user_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await?;

    if let Some(user_id) = user_id {
        let token = create_reset_token(pool.get_ref(), user_id).await?;

        if let Err(e) = email_client.send_password_reset(&email, &token).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to send recovery mail");
        } else {
            tracing::info!(user_id = %user_id, "Password recovery mail sent");
        }
    }

    Ok(uniform_response)
}

/// PUT /auth/update-password
///
/// Complete the recovery flow: consume the reset token and set the new
/// password.
///
/// # Errors
/// - 400: passwords do not match, or the new password fails the policy
/// - 401: token unknown or expired (uniform)
pub async fn update_password(
    form: web::Json<UpdatePasswordRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = validate_reset_token(pool.get_ref(), &form.token).await?;

    if form.new_password != form.confirm_password {
        return Err(AppError::Validation(
            crate::error::ValidationError::Mismatch(
                "new password and confirmation do not match".to_string(),
            ),
        ));
    }
    validate_password_policy(&form.new_password)?;

    let password_hash = hash_password(&form.new_password)?;

    sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(&password_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    delete_reset_token(pool.get_ref(), &form.token).await?;

    tracing::info!(user_id = %user_id, "Password updated via recovery token");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password updated"
    })))
}

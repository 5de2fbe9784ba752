/// Access Token Generation and Validation
///
/// Access tokens are HS256 JWTs signed with a symmetric key loaded once at
/// startup. Validation is strict: issuer, audience, and expiry are all
/// enforced with zero clock-skew leeway, and every failure collapses into
/// the same uniform authentication error.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Generate a new access token for a user.
pub fn generate_access_token(
    user_id: Uuid,
    role: &str,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        user_id,
        role.to_string(),
        config.access_token_expiry,
        config.issuer.clone(),
        config.audience.clone(),
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and extract its claims.
///
/// Checks signature, issuer, audience, and expiry. The reason for a failure
/// is logged server-side but never returned to the caller; every failing
/// check yields the same `TokenInvalid` result.
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.leeway = 0; // no grace window for expired tokens

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Access token validation failed: {}", e);
        AppError::Auth(AuthError::TokenInvalid)
    })
}

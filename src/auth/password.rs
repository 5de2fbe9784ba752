/// Password Hashing and Verification
///
/// Credentials are stored as `base64(salt || derived_key)` where the key is
/// derived with PBKDF2-HMAC-SHA256. Verification re-derives with the
/// embedded salt and compares in constant time.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, ValidationError};

const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;
const PBKDF2_ITERATIONS: u32 = 10_000;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;
const SPECIAL_CHARACTERS: &str = r##"!@#$%^&*()-_=+[]{};:'",.<>/?\|~"##;

/// Hash a password for storage.
///
/// Generates a fresh random 16-byte salt per call, so hashing the same
/// password twice yields different stored values.
///
/// # Errors
/// Returns a validation error if the password fails the policy check.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_policy(password)?;

    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut key);

    let mut stored = Vec::with_capacity(SALT_LENGTH + KEY_LENGTH);
    stored.extend_from_slice(&salt);
    stored.extend_from_slice(&key);

    Ok(BASE64.encode(stored))
}

/// Verify a password against a stored hash.
///
/// Returns `Ok(false)` for a wrong password. A stored hash that cannot be
/// decoded or has the wrong length is an internal error, not a failed
/// verification; callers must not map the two to the same client message.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let decoded = BASE64
        .decode(stored_hash)
        .map_err(|_| AppError::Internal("Malformed password hash in storage".to_string()))?;

    if decoded.len() != SALT_LENGTH + KEY_LENGTH {
        return Err(AppError::Internal(
            "Malformed password hash in storage".to_string(),
        ));
    }

    let (salt, stored_key) = decoded.split_at(SALT_LENGTH);

    let mut derived = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut derived);

    Ok(derived.as_slice().ct_eq(stored_key).into())
}

/// Validate a plaintext password against the complexity policy.
///
/// Requirements: at least 8 characters, at most 128, with an uppercase
/// letter, a lowercase letter, a digit, and a special character. Empty or
/// whitespace-only input is rejected outright.
pub fn validate_password_policy(password: &str) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "password".to_string(),
        )));
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_special = password.chars().any(|c| SPECIAL_CHARACTERS.contains(c));

    if !has_upper || !has_lower || !has_digit || !has_special {
        return Err(AppError::Validation(ValidationError::PolicyViolation(
            "password must contain at least one uppercase letter, one lowercase letter, one digit, and one special character"
                .to_string(),
        )));
    }

    Ok(())
}

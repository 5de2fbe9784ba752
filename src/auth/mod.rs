/// Authentication module
///
/// Password hashing and policy, access-token issuance/validation,
/// refresh-token storage, and password reset tokens.

mod claims;
mod jwt;
mod password;
mod password_reset;
mod refresh_token;

pub use claims::{Claims, ROLE_ADMIN, ROLE_USER};
pub use jwt::generate_access_token;
pub use jwt::validate_access_token;
pub use password::hash_password;
pub use password::validate_password_policy;
pub use password::verify_password;
pub use password_reset::create_reset_token;
pub use password_reset::delete_reset_token;
pub use password_reset::validate_reset_token;
pub use refresh_token::delete_revoked_tokens;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::revoke_refresh_token;
pub use refresh_token::save_refresh_token;
pub use refresh_token::validate_refresh_token;

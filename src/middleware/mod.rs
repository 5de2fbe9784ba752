/// HTTP middleware
///
/// Bearer-token authentication for protected route scopes.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;

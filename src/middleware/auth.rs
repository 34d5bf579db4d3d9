use axum::{extract::Request, middleware::Next, response::Response};

use crate::auth::{cookie::extract_token, verify_jwt, AuthError};
use crate::config;
use crate::error::ApiError;
use crate::scope::Identity;

/// Session middleware: reads the JWT from the session cookie (or a Bearer
/// header), verifies it and injects the caller's [`Identity`].
///
/// Missing token is 401, an invalid or expired one is 403.
pub async fn session_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let cookie_name = &config::config().security.cookie_name;

    let token = extract_token(request.headers(), cookie_name).ok_or(AuthError::MissingToken)?;
    let claims = verify_jwt(&token)?;

    tracing::debug!(caller = claims.id, role = %claims.role, "session verified");
    request.extensions_mut().insert(Identity::from(claims));

    Ok(next.run(request).await)
}

//! Authentication Middleware
//!
//! Bearer JWT validation for customer and admin routes.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::application::services::{decode_access_token, AuthError};
use crate::domain::UserRole;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))
}

fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthUser, AppError> {
    let token = bearer_token(headers)?;
    let claims = decode_access_token(token, secret)?;
    let user_id = claims.user_id()?;

    Ok(AuthUser {
        user_id,
        role: claims.role(),
    })
}

/// Reject requests without a valid access token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(request.headers(), &state.settings.jwt.secret)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Attach the user when a valid token is present; anonymous requests pass through
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.headers().contains_key(AUTHORIZATION) {
        match authenticate(request.headers(), &state.settings.jwt.secret) {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid optional token"),
        }
    }

    next.run(request).await
}

/// Must run inside `auth_middleware`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin() => Ok(next.run(request).await),
        Some(user) => {
            tracing::warn!(user_id = user.user_id, "Non-admin user hit an admin route");
            Err(AppError::Forbidden("Admin access required".into()))
        }
        None => Err(AuthError::InvalidToken.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::auth_service::issue_access_token;
    use crate::config::test_support::test_settings;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_unauthorized() {
        let err = authenticate(&HeaderMap::new(), "secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_wrong_scheme_unauthorized() {
        let err = authenticate(&headers("Basic dXNlcjpwYXNz"), "secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_valid_token_carries_role() {
        let settings = test_settings();
        let token = issue_access_token(77, UserRole::Admin, &settings.jwt).unwrap();

        let user = authenticate(&headers(&format!("Bearer {}", token)), &settings.jwt.secret)
            .unwrap();
        assert_eq!(user.user_id, 77);
        assert!(user.is_admin());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let settings = test_settings();
        let token = issue_access_token(77, UserRole::Customer, &settings.jwt).unwrap();

        let err = authenticate(
            &headers(&format!("Bearer {}", token)),
            "another-secret-that-is-long-enough-to-pass",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}

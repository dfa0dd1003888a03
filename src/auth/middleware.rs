//! Authentication Middleware
//! Mission: Gate protected endpoints behind JWT validation

use crate::auth::jwt::{JwtHandler, TokenError};
use crate::auth::models::{Claims, Role};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

/// Access gate failure
///
/// `MissingToken` is reported before any signature work happens, so a
/// tokenless request can never surface as `Forbidden`.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidToken => (StatusCode::FORBIDDEN, "Invalid token"),
            AuthError::ExpiredToken => (StatusCode::FORBIDDEN, "Token expired"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

/// Middleware that authenticates every request on a protected route.
///
/// Reads `Authorization: Bearer <token>`, validates signature and expiry,
/// and inserts the decoded claims into request extensions so downstream
/// handlers receive the principal without re-parsing the token.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AuthError::MissingToken)?;

    let claims = jwt_handler.validate(&token).map_err(|e| match e {
        TokenError::Expired => AuthError::ExpiredToken,
        TokenError::Invalid => AuthError::InvalidToken,
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Authorization check: only reachable once authentication has succeeded.
pub fn require_role(claims: &Claims, role: Role) -> Result<(), AuthError> {
    if claims.role == role {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

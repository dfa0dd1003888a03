//! Authentication API Endpoints
//! Mission: Registration, login, profile, and admin user management

use crate::app::AppState;
use crate::auth::{
    middleware::{require_role, AuthError},
    models::{
        Claims, CreateUserRequest, LoginRequest, LoginResponse, RegisterRequest, Role,
        UpdateProfileRequest, UserResponse,
    },
    password,
    user_store::{NewUser, UserStoreError},
};
use crate::market::store::MarketStoreError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Current principal, rebuilt from JWT claims with no database lookup.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Register endpoint - POST /api/register
///
/// Always creates a `user` role account; elevated roles come only from the
/// admin-gated creation path. An optional stall_number resolves to a stall
/// association at registration time.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.name.trim().is_empty() {
        return Err(AuthApiError::MissingFields);
    }
    if payload.password.len() < 8 {
        return Err(AuthApiError::WeakPassword);
    }

    let stall_id = match payload.stall_number.as_deref() {
        Some(number) => {
            let stall = state
                .market_store
                .get_stall_by_number(number)
                .map_err(AuthApiError::from_market)?
                .ok_or(AuthApiError::StallNotFound)?;
            Some(stall.id)
        }
        None => None,
    };

    let user = state
        .user_store
        .create_user(NewUser {
            email,
            password: &payload.password,
            name: payload.name.trim(),
            phone: payload.phone.as_deref(),
            role: Role::User,
            stall_id,
        })
        .map_err(AuthApiError::from_store)?;

    info!("Registered user: {}", user.email);

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Login endpoint - POST /api/login
///
/// Unknown email and wrong password produce the same error so the endpoint
/// cannot be used to enumerate registered identifiers.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let user = state
        .user_store
        .get_user_by_email(payload.email.trim())
        .map_err(AuthApiError::from_store)?;

    let user = match user {
        Some(u) if password::verify(&payload.password, &u.password_hash) => u,
        _ => {
            warn!("Failed login attempt: {}", payload.email);
            return Err(AuthApiError::InvalidCredentials);
        }
    };

    let (token, expires_in) = state
        .jwt_handler
        .issue(&user)
        .map_err(|_| AuthApiError::Internal)?;

    info!("Login successful: {} ({})", user.email, user.role.as_str());

    Ok(Json(LoginResponse {
        token,
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Current principal - GET /api/auth/me
///
/// Built from the verified claims alone; no database lookup.
pub async fn get_current_user(
    Extension(claims): Extension<Claims>,
) -> Json<MeResponse> {
    Json(MeResponse {
        id: claims.sub.clone(),
        email: claims.email.clone(),
        role: claims.role,
    })
}

/// Full profile - GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthApiError::Internal)?;
    let user = state
        .user_store
        .get_user_by_id(&id)
        .map_err(AuthApiError::from_store)?
        .ok_or(AuthApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Profile update - PUT /api/profile
///
/// Only name and phone are mutable; credentials and role are untouchable
/// through this path.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthApiError::Internal)?;
    let user = state
        .user_store
        .update_profile(&id, payload.name.as_deref(), payload.phone.as_deref())
        .map_err(AuthApiError::from_store)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// List all users - GET /api/admin/users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserResponse>>, AuthApiError> {
    require_role(&claims, Role::Admin)?;

    let users = state.user_store.list_users().map_err(AuthApiError::from_store)?;
    let response = users.iter().map(UserResponse::from_user).collect();

    Ok(Json(response))
}

/// Create user - POST /api/admin/users (admin only)
///
/// The one path that can mint elevated accounts.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthApiError> {
    require_role(&claims, Role::Admin)?;

    if payload.email.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(AuthApiError::MissingFields);
    }
    if payload.password.len() < 8 {
        return Err(AuthApiError::WeakPassword);
    }

    let user = state
        .user_store
        .create_user(NewUser {
            email: payload.email.trim(),
            password: &payload.password,
            name: payload.name.trim(),
            phone: None,
            role: payload.role,
            stall_id: None,
        })
        .map_err(AuthApiError::from_store)?;

    info!("User created by admin: {} ({})", user.email, user.role.as_str());

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Delete user - DELETE /api/admin/users/:id (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AuthApiError> {
    require_role(&claims, Role::Admin)?;

    let id = Uuid::parse_str(&user_id).map_err(|_| AuthApiError::InvalidUserId)?;

    if id.to_string() == claims.sub {
        return Err(AuthApiError::CannotDeleteSelf);
    }

    state.user_store.delete_user(&id).map_err(AuthApiError::from_store)?;

    info!("User deleted: {}", user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    MissingFields,
    WeakPassword,
    DuplicateEmail,
    StallNotFound,
    InvalidCredentials,
    Forbidden,
    UserNotFound,
    InvalidUserId,
    CannotDeleteSelf,
    Internal,
}

impl AuthApiError {
    fn from_store(e: UserStoreError) -> Self {
        match e {
            UserStoreError::DuplicateEmail => AuthApiError::DuplicateEmail,
            UserStoreError::NotFound => AuthApiError::UserNotFound,
            other => {
                tracing::error!("User store error: {}", other);
                AuthApiError::Internal
            }
        }
    }

    fn from_market(e: MarketStoreError) -> Self {
        tracing::error!("Market store error: {}", e);
        AuthApiError::Internal
    }
}

// Token failures terminate in the middleware; the only gate error a handler
// can see is the role check's Forbidden.
impl From<AuthError> for AuthApiError {
    fn from(_: AuthError) -> Self {
        AuthApiError::Forbidden
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::MissingFields => (StatusCode::BAD_REQUEST, "Missing required fields"),
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters",
            ),
            AuthApiError::DuplicateEmail => (StatusCode::BAD_REQUEST, "Email already registered"),
            AuthApiError::StallNotFound => (StatusCode::BAD_REQUEST, "Stall not found"),
            AuthApiError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "Invalid email or password")
            }
            AuthApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::InvalidUserId => (StatusCode::BAD_REQUEST, "Invalid user ID format"),
            AuthApiError::CannotDeleteSelf => {
                (StatusCode::BAD_REQUEST, "Cannot delete your own account")
            }
            AuthApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

//! Market API Endpoints
//! Mission: Stall and booking CRUD behind the access gate

use crate::app::AppState;
use crate::auth::middleware::{require_role, AuthError};
use crate::auth::models::{Claims, Role};
use crate::market::models::{
    Booking, BookingStatus, CreateBookingRequest, CreateStallRequest, Stall,
    UpdateBookingStatusRequest, UpdateStallRequest,
};
use crate::market::store::MarketStoreError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;

// ===== Stalls =====

/// GET /api/stalls
pub async fn list_stalls(State(state): State<AppState>) -> Result<Json<Vec<Stall>>, ApiError> {
    let stalls = state.market_store.list_stalls()?;
    Ok(Json(stalls))
}

/// GET /api/stalls/:id
pub async fn get_stall(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Stall>, ApiError> {
    state
        .market_store
        .get_stall(id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Stall not found"))
}

/// POST /api/stalls (admin only)
pub async fn create_stall(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateStallRequest>,
) -> Result<(StatusCode, Json<Stall>), ApiError> {
    require_role(&claims, Role::Admin)?;

    if payload.stall_number.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing stall_number"));
    }
    if payload.price_per_day < 0.0 {
        return Err(ApiError::BadRequest("price_per_day must be non-negative"));
    }

    let stall = state.market_store.create_stall(
        payload.stall_number.trim(),
        &payload.size,
        payload.price_per_day,
        payload.image_url.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(stall)))
}

/// PUT /api/stalls/:id (admin only)
pub async fn update_stall(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStallRequest>,
) -> Result<Json<Stall>, ApiError> {
    require_role(&claims, Role::Admin)?;

    let stall = state.market_store.update_stall(
        id,
        payload.stall_number.as_deref(),
        payload.size.as_deref(),
        payload.price_per_day,
        payload.status,
        payload.image_url.as_deref(),
    )?;

    Ok(Json(stall))
}

/// DELETE /api/stalls/:id (admin only)
pub async fn delete_stall(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_role(&claims, Role::Admin)?;

    state.market_store.delete_stall(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Bookings =====

/// POST /api/bookings
///
/// Books for the authenticated principal; the subject id comes from the
/// verified claims, never from the request body.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    if payload.start_date.trim().is_empty() || payload.end_date.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing start_date or end_date"));
    }

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Internal)?;
    let booking = state.market_store.create_booking(
        &user_id,
        payload.stall_id,
        payload.start_date.trim(),
        payload.end_date.trim(),
    )?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings/me
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Internal)?;
    let bookings = state.market_store.list_bookings_for_user(&user_id)?;
    Ok(Json(bookings))
}

/// GET /api/bookings (admin only)
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    require_role(&claims, Role::Admin)?;

    let bookings = state.market_store.list_bookings()?;
    Ok(Json(bookings))
}

/// PATCH /api/bookings/:id/status (admin only)
pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> Result<Json<Booking>, ApiError> {
    require_role(&claims, Role::Admin)?;

    let status = BookingStatus::from_str(&payload.status)
        .ok_or(ApiError::BadRequest("Invalid booking status"))?;

    let booking = state.market_store.update_booking_status(id, status)?;
    Ok(Json(booking))
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    NotFound(&'static str),
    Forbidden,
    Internal,
}

impl From<MarketStoreError> for ApiError {
    fn from(e: MarketStoreError) -> Self {
        match e {
            MarketStoreError::DuplicateStallNumber => {
                ApiError::BadRequest("Stall number already exists")
            }
            MarketStoreError::StallNotFound => ApiError::NotFound("Stall not found"),
            MarketStoreError::BookingNotFound => ApiError::NotFound("Booking not found"),
            MarketStoreError::Db(err) => {
                tracing::error!("Database error: {}", err);
                ApiError::Internal
            }
        }
    }
}

// Token failures terminate in the middleware; the only gate error a handler
// can see is the role check's Forbidden.
impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::Forbidden
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

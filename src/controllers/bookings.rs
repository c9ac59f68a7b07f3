use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::Role;
use crate::services::reservation::ReservationContext;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(get_user_bookings))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/confirm", patch(confirm_booking))
        .route("/bookings/{id}/cancel", patch(cancel_booking))
        .route("/bookings/{id}/checkin", patch(check_in_booking))
        .route("/bookings/{id}/refund", patch(refund_booking))
        .route("/bookings/{id}/qr", get(booking_qr))
        .route("/bookings/validate-qr", post(validate_qr))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    event_id: i64,
    seats: Vec<String>,
    attendee_info: Option<String>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.event_id <= 0 {
        return Err(ApiError::Validation("event_id must be > 0".into()));
    }

    let booking = state
        .coordinator
        .reserve(
            req.event_id,
            &req.seats,
            ReservationContext {
                user_id: auth.user.user_id,
                attendee_info: req.attendee_info,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.store.bookings_for_user(auth.user.user_id).await;
    Ok(Json(bookings))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .store
        .booking(id)
        .await
        .map_err(|_| ApiError::NotFound("booking"))?;

    let caller = &auth.user;
    if booking.user_id != caller.user_id && !caller.role.can_check_in() {
        return Err(ApiError::Unauthorized("not the booking owner"));
    }
    Ok(Json(booking))
}

// PATCH /api/bookings/{id}/confirm
#[derive(Debug, Deserialize)]
struct ConfirmBookingRequest {
    transaction_id: String,
    payment_method: String,
}

async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ConfirmBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.transaction_id.trim().is_empty() || req.payment_method.trim().is_empty() {
        return Err(ApiError::Validation(
            "transaction_id and payment_method are required".into(),
        ));
    }

    let booking = state
        .lifecycle
        .confirm(id, &auth.user, req.transaction_id, req.payment_method)
        .await?;
    Ok(Json(booking))
}

// PATCH /api/bookings/{id}/cancel
#[derive(Debug, Default, Deserialize)]
struct CancelBookingRequest {
    reason: Option<String>,
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .lifecycle
        .cancel(id, &auth.user, req.reason, Utc::now())
        .await?;
    Ok(Json(booking))
}

// PATCH /api/bookings/{id}/checkin
async fn check_in_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.lifecycle.check_in(id, &auth.user).await?;
    Ok(Json(booking))
}

// PATCH /api/bookings/{id}/refund
#[derive(Debug, Default, Deserialize)]
struct RefundBookingRequest {
    reason: Option<String>,
}

async fn refund_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RefundBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.lifecycle.refund(id, &auth.user, req.reason).await?;
    Ok(Json(booking))
}

// GET /api/bookings/{id}/qr
async fn booking_qr(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .store
        .booking(id)
        .await
        .map_err(|_| ApiError::NotFound("booking"))?;

    let caller = &auth.user;
    if booking.user_id != caller.user_id && !caller.role.can_check_in() {
        return Err(ApiError::Unauthorized("not the booking owner"));
    }

    let token = state.qr.issue(&booking);
    Ok(Json(json!({ "qr_token": token })))
}

// POST /api/bookings/validate-qr
#[derive(Debug, Deserialize)]
struct ValidateQrRequest {
    qr_data: String,
}

async fn validate_qr(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<ValidateQrRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.user.role == Role::Attendee {
        return Err(ApiError::Unauthorized("staff role required"));
    }
    let validation = state.qr.validate(&req.qr_data, &state.store).await;
    Ok(Json(validation))
}

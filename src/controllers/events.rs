use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{Role, SeatStatus, SectionLayout};
use crate::store::NewEvent;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/{id}/seats", get(get_seats))
        .route("/events/{id}/summary", get(get_summary))
        .route("/events/{id}/ledger", get(get_ledger))
}

/* ---------- EVENTS ---------- */

// POST /api/events
#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    title: String,
    starts_at: DateTime<Utc>,
    currency: String,
    layout: Vec<SectionLayout>,
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.user.role != Role::Admin {
        return Err(ApiError::Unauthorized("admin role required"));
    }
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    if req.layout.is_empty() {
        return Err(ApiError::Validation("layout must not be empty".into()));
    }
    for section in &req.layout {
        if section.rows == 0 || section.seats_per_row == 0 {
            return Err(ApiError::Validation(
                "rows and seats_per_row must be > 0".into(),
            ));
        }
        if section.price < 0.0 {
            return Err(ApiError::Validation("price must not be negative".into()));
        }
    }

    let event = state
        .store
        .create_event(NewEvent {
            title: req.title,
            starts_at: req.starts_at,
            currency: req.currency,
            layout: req.layout,
        })
        .await;

    Ok((StatusCode::CREATED, Json(event)))
}

/* ---------- SEATS ---------- */

#[derive(Debug, Deserialize)]
struct SeatsQuery {
    page: Option<u32>,
    #[serde(rename = "pageSize")]
    page_size: Option<u32>,
    row: Option<i32>,
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct SeatResponse {
    seat_number: String,
    row: i32,
    section: String,
    price: f64,
    status: SeatStatus,
}

// GET /api/events/{id}/seats
async fn get_seats(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    Query(params): Query<SeatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(r) = params.row {
        if r <= 0 {
            return Err(ApiError::Validation("row must be > 0".into()));
        }
    }
    let status = match params.status.as_deref() {
        None => None,
        Some(s) => Some(SeatStatus::parse(s).ok_or_else(|| {
            ApiError::Validation("status must be available | held | booked | reserved".into())
        })?),
    };

    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 20);
    // Widen before multiplying; page comes straight off the query string.
    let offset = (page as usize - 1) * page_size as usize;

    let seats = state
        .store
        .list_seats(event_id, params.row, status, offset, page_size as usize)
        .await
        .map_err(|_| ApiError::NotFound("event"))?;

    let payload: Vec<SeatResponse> = seats
        .into_iter()
        .map(|s| SeatResponse {
            seat_number: s.seat_number,
            row: s.row,
            section: s.section,
            price: s.price,
            status: s.status,
        })
        .collect();

    Ok(Json(payload))
}

// GET /api/events/{id}/summary
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .store
        .capacity_summary(event_id)
        .await
        .map_err(|_| ApiError::NotFound("event"))?;
    Ok(Json(summary))
}

// GET /api/events/{id}/ledger
async fn get_ledger(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.user.role != Role::Admin {
        return Err(ApiError::Unauthorized("admin role required"));
    }
    // Existence check first so a bad id is a 404, not an empty log.
    state
        .store
        .event(event_id)
        .await
        .map_err(|_| ApiError::NotFound("event"))?;

    let entries = state.store.ledger_for_event(event_id).await;
    Ok(Json(entries))
}

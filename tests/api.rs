//! End-to-end tests over the axum router, in process via `tower::ServiceExt`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ticketgate::config::Config;
use ticketgate::models::user::password_digest;
use ticketgate::models::{Role, User};
use ticketgate::AppState;

const ADMIN: (&str, &str) = ("admin@example.com", "admin-pw");
const ALICE: (&str, &str) = ("alice@example.com", "alice-pw");
const STAFF: (&str, &str) = ("door@example.com", "door-pw");

async fn app() -> Router {
    let state = AppState::new(Config::for_tests());
    for (id, (email, password), role) in [
        (1, ADMIN, Role::Admin),
        (2, ALICE, Role::Attendee),
        (3, STAFF, Role::Staff),
    ] {
        state
            .store
            .insert_user(User {
                user_id: id,
                email: email.to_string(),
                password_digest: password_digest(password),
                first_name: "T".into(),
                surname: format!("{id}"),
                role,
                is_active: true,
                registered_at: Utc::now(),
            })
            .await;
    }

    Router::new()
        .nest("/api", ticketgate::controllers::routes())
        .with_state(state)
}

fn basic(creds: (&str, &str)) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{}:{}", creds.0, creds.1))
    )
}

fn request(method: &str, uri: &str, creds: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(creds) = creds {
        builder = builder.header(header::AUTHORIZATION, basic(creds));
    }
    match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_event(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/events",
            Some(ADMIN),
            Some(json!({
                "title": "Rust Meetup",
                "starts_at": (Utc::now() + Duration::days(30)).to_rfc3339(),
                "currency": "EUR",
                "layout": [{"section": "main", "rows": 1, "seats_per_row": 4, "price": 20.0}],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn booking_happy_path_through_check_in() {
    let app = app().await;
    let event_id = create_event(&app).await;

    // Book two seats.
    let (status, booking) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(json!({"event_id": event_id, "seats": ["A1", "A2"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["total_amount"], 40.0);
    let booking_id = booking["id"].as_str().unwrap().to_string();

    // Inventory reflects the claim.
    let (status, summary) =
        send(&app, request("GET", &format!("/api/events/{event_id}/summary"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["booked"], 2);
    assert_eq!(summary["available"], 2);

    // Confirm payment.
    let (status, confirmed) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{booking_id}/confirm"),
            Some(ALICE),
            Some(json!({"transaction_id": "txn-1", "payment_method": "card"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{confirmed}");
    assert_eq!(confirmed["status"], "confirmed");

    // Second confirm is a state error.
    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{booking_id}/confirm"),
            Some(ALICE),
            Some(json!({"transaction_id": "txn-2", "payment_method": "card"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state_transition");

    // Issue and validate the QR token.
    let (status, qr) = send(
        &app,
        request("GET", &format!("/api/bookings/{booking_id}/qr"), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = qr["qr_token"].as_str().unwrap().to_string();

    let (status, validation) = send(
        &app,
        request(
            "POST",
            "/api/bookings/validate-qr",
            Some(STAFF),
            Some(json!({"qr_data": token})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["is_valid"], true);
    assert_eq!(validation["can_check_in"], true);

    // Check in at the door.
    let (status, checked) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{booking_id}/checkin"),
            Some(STAFF),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{checked}");
    assert_eq!(checked["status"], "checked_in");
    assert_eq!(checked["check_in_details"]["is_checked_in"], true);

    // Same token again: still valid, no longer eligible.
    let (_, validation) = send(
        &app,
        request(
            "POST",
            "/api/bookings/validate-qr",
            Some(STAFF),
            Some(json!({"qr_data": token})),
        ),
    )
    .await;
    assert_eq!(validation["is_valid"], true);
    assert_eq!(validation["can_check_in"], false);

    // Cancelling a checked-in booking is refused; the seats stay consumed.
    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(ALICE),
            Some(json!({"reason": "changed my mind"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state_transition");
}

#[tokio::test]
async fn overlapping_booking_reports_unavailable_seats() {
    let app = app().await;
    let event_id = create_event(&app).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(json!({"event_id": event_id, "seats": ["A1", "A2"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(STAFF),
            Some(json!({"event_id": event_id, "seats": ["A2", "A3"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "seats_unavailable");
    assert_eq!(body["unavailable_seats"], json!(["A2"]));
}

#[tokio::test]
async fn auth_and_role_guards() {
    let app = app().await;
    let event_id = create_event(&app).await;

    // No credentials at all.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            None,
            Some(json!({"event_id": event_id, "seats": ["A1"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong password.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(("alice@example.com", "nope")),
            Some(json!({"event_id": event_id, "seats": ["A1"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Attendees cannot create events or validate QR codes.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/events",
            Some(ALICE),
            Some(json!({
                "title": "x",
                "starts_at": (Utc::now() + Duration::days(1)).to_rfc3339(),
                "currency": "EUR",
                "layout": [{"section": "a", "rows": 1, "seats_per_row": 1, "price": 1.0}],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings/validate-qr",
            Some(ALICE),
            Some(json!({"qr_data": "whatever"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Staff may read a foreign booking but not confirm it.
    let (_, booking) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(json!({"event_id": event_id, "seats": ["A1"]})),
        ),
    )
    .await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request(
            "GET",
            &format!("/api/bookings/{booking_id}"),
            Some(STAFF),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{booking_id}/confirm"),
            Some(STAFF),
            Some(json!({"transaction_id": "t", "payment_method": "card"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn validate_qr_fails_closed_on_garbage() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/bookings/validate-qr",
            Some(STAFF),
            Some(json!({"qr_data": "not-a-token"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["can_check_in"], false);
}

#[tokio::test]
async fn unknown_booking_is_404_and_unknown_seats_400() {
    let app = app().await;
    let event_id = create_event(&app).await;

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{}/cancel", uuid::Uuid::new_v4()),
            Some(ALICE),
            Some(json!({"reason": "x"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(json!({"event_id": event_id, "seats": ["Z99"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn seat_listing_filters_and_paginates() {
    let app = app().await;
    let event_id = create_event(&app).await;

    let (_, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(json!({"event_id": event_id, "seats": ["A1"]})),
        ),
    )
    .await;

    let (status, seats) = send(
        &app,
        request(
            "GET",
            &format!("/api/events/{event_id}/seats?status=available"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seats.as_array().unwrap().len(), 3);

    let (status, seats) = send(
        &app,
        request(
            "GET",
            &format!("/api/events/{event_id}/seats?page=2&pageSize=3"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seats.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/events/{event_id}/seats?status=bogus"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // A page far past the end, u32::MAX included, is just an empty page.
    let (status, seats) = send(
        &app,
        request(
            "GET",
            &format!("/api/events/{event_id}/seats?page=4294967295&pageSize=20"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(seats.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn ledger_is_admin_only_and_append_only_per_transition() {
    let app = app().await;
    let event_id = create_event(&app).await;

    let (_, booking) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(json!({"event_id": event_id, "seats": ["A1", "A2"]})),
        ),
    )
    .await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(ALICE),
            Some(json!({"reason": "x"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/events/{event_id}/ledger"), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, entries) = send(
        &app,
        request("GET", &format!("/api/events/{event_id}/ledger"), Some(ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Two claims plus two releases.
    assert_eq!(entries.as_array().unwrap().len(), 4);
}

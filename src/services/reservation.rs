//! Reservation coordinator: the only path by which seats leave and re-enter
//! the available pool.
//!
//! The claim protocol is optimistic: read status+version for every requested
//! seat, reject early if anything is already taken, then attempt one
//! multi-seat conditional update that commits only if every version still
//! matches. A concurrent writer makes the whole batch fail, and we retry from
//! a fresh snapshot with jittered backoff so racing requests for a hot event
//! do not stampede in lockstep. The budget is bounded; exhaustion surfaces as
//! a retryable `ReservationConflict`, never as a silent partial booking.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ReservationConfig;
use crate::error::ApiError;
use crate::models::{Booking, BookingStatus, CheckInDetails, SeatStatus};
use crate::store::{SeatClaim, Store, StoreError};

use super::map_store_err;

/// Who is booking, threaded through to the booking row and the ledger.
#[derive(Debug, Clone)]
pub struct ReservationContext {
    pub user_id: i64,
    pub attendee_info: Option<String>,
}

#[derive(Clone)]
pub struct ReservationCoordinator {
    store: Arc<Store>,
    policy: ReservationConfig,
}

impl ReservationCoordinator {
    pub fn new(store: Arc<Store>, policy: ReservationConfig) -> Self {
        Self { store, policy }
    }

    /// Atomically claims every requested seat for a new pending booking, or
    /// fails leaving the seat map untouched. All-or-nothing: there is no
    /// partial success for the disjoint subset.
    pub async fn reserve(
        &self,
        event_id: i64,
        seat_numbers: &[String],
        ctx: ReservationContext,
    ) -> Result<Booking, ApiError> {
        if seat_numbers.is_empty() {
            return Err(ApiError::Validation("no seats requested".into()));
        }
        let distinct: HashSet<&String> = seat_numbers.iter().collect();
        if distinct.len() != seat_numbers.len() {
            return Err(ApiError::Validation(
                "duplicate seat numbers in request".into(),
            ));
        }

        let event = self.store.event(event_id).await.map_err(map_store_err)?;
        let now = Utc::now();
        if !event.accepts_bookings(now) {
            return Err(ApiError::Validation(
                "event is not open for booking".into(),
            ));
        }

        let booking_id = Uuid::new_v4();
        let actor = format!("user:{}", ctx.user_id);

        for attempt in 1..=self.policy.max_attempts {
            let snapshot = self
                .store
                .snapshot_seats(event_id, seat_numbers)
                .await
                .map_err(map_store_err)?;

            let taken: Vec<String> = snapshot
                .iter()
                .filter(|s| s.status != SeatStatus::Available)
                .map(|s| s.seat_number.clone())
                .collect();
            if !taken.is_empty() {
                return Err(ApiError::SeatsUnavailable(taken));
            }

            let total_amount: f64 = snapshot.iter().map(|s| s.price).sum();
            let claims: Vec<SeatClaim> = snapshot
                .iter()
                .map(|s| SeatClaim {
                    seat_number: s.seat_number.clone(),
                    expected_version: s.version,
                })
                .collect();

            match self
                .store
                .claim_seats(event_id, &claims, SeatStatus::Booked, booking_id, &actor)
                .await
            {
                Ok(()) => {
                    // Claim first, booking row second; if the insert could
                    // fail the compensating release below would undo the
                    // claim rather than leak held seats.
                    let booking = Booking {
                        id: booking_id,
                        user_id: ctx.user_id,
                        event_id,
                        seats: seat_numbers.to_vec(),
                        total_amount,
                        currency: event.currency.clone(),
                        status: BookingStatus::Pending,
                        attendee_info: ctx.attendee_info.clone(),
                        cancellation_reason: None,
                        payment_details: None,
                        check_in_details: CheckInDetails::default(),
                        created_at: now,
                    };
                    self.store.insert_booking(booking.clone()).await;
                    info!(
                        booking_id = %booking_id,
                        event_id,
                        seats = seat_numbers.len(),
                        attempt,
                        "seats claimed"
                    );
                    return Ok(booking);
                }
                Err(StoreError::VersionConflict { seats }) => {
                    debug!(
                        event_id,
                        attempt,
                        conflicting = ?seats,
                        "claim lost against concurrent writer, retrying"
                    );
                    if attempt < self.policy.max_attempts {
                        self.backoff().await;
                    }
                }
                Err(e) => return Err(map_store_err(e)),
            }
        }

        Err(ApiError::ReservationConflict {
            attempts: self.policy.max_attempts,
        })
    }

    /// Returns a booking's seats to the pool. Idempotent: seats already
    /// available are skipped, so a double release (or a release racing the
    /// reaper) is a no-op rather than an error.
    pub async fn release(
        &self,
        event_id: i64,
        seat_numbers: &[String],
        booking_id: Uuid,
        actor: &str,
    ) -> Result<Vec<String>, ApiError> {
        self.store
            .release_seats(event_id, seat_numbers, Some(booking_id), actor)
            .await
            .map_err(map_store_err)
    }

    async fn backoff(&self) {
        let ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.policy.backoff_min_ms..=self.policy.backoff_max_ms)
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

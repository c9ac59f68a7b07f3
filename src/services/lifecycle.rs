//! Booking lifecycle: guarded transitions over the closed table in
//! [`BookingStatus::can_transition`].
//!
//! Every transition is checked and applied under the store's booking lock in
//! one step, so two racing calls can never both observe the old state. For
//! the terminating paths (cancel/refund/expiry) the status flip is the commit
//! point and the seat release runs after it: once a booking is terminal no
//! other transition can interleave, and the release itself is idempotent.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::error::ApiError;
use crate::models::{Booking, BookingStatus, PaymentDetails, Role, User};
use crate::store::Store;

use super::map_store_err;
use super::reservation::ReservationCoordinator;

#[derive(Clone)]
pub struct BookingLifecycle {
    store: Arc<Store>,
    coordinator: ReservationCoordinator,
    policy: BookingConfig,
}

impl BookingLifecycle {
    pub fn new(store: Arc<Store>, coordinator: ReservationCoordinator, policy: BookingConfig) -> Self {
        Self {
            store,
            coordinator,
            policy,
        }
    }

    pub fn cancel_cutoff(&self) -> Duration {
        Duration::hours(self.policy.cancel_cutoff_hours)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::minutes(self.policy.pending_ttl_minutes)
    }

    /// Payment confirmation: `pending -> confirmed`. Does not touch the seat
    /// map; the seats were booked at claim time.
    pub async fn confirm(
        &self,
        booking_id: Uuid,
        caller: &User,
        transaction_id: String,
        payment_method: String,
    ) -> Result<Booking, ApiError> {
        self.authorize_owner(booking_id, caller).await?;

        let paid_at = Utc::now();
        self.store
            .update_booking(booking_id, |b| {
                if !b.status.can_transition(BookingStatus::Confirmed) {
                    return Err(ApiError::InvalidStateTransition {
                        from: b.status.as_str(),
                        to: "confirmed",
                    });
                }
                b.status = BookingStatus::Confirmed;
                b.payment_details = Some(PaymentDetails {
                    transaction_id,
                    payment_method,
                    paid_at,
                });
                Ok(())
            })
            .await
            .map_err(map_store_err)?
    }

    /// `pending|confirmed -> cancelled`, rejected inside the cutoff window
    /// before event start. Exactly at the cutoff still succeeds.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        caller: &User,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, ApiError> {
        let booking = self.authorize_owner(booking_id, caller).await?;

        let event = self
            .store
            .event(booking.event_id)
            .await
            .map_err(map_store_err)?;
        if event.starts_at - now < self.cancel_cutoff() {
            return Err(ApiError::CancellationWindowClosed);
        }

        let actor = format!("user:{}", caller.user_id);
        self.terminate(booking_id, BookingStatus::Cancelled, reason, &actor)
            .await
    }

    /// Admin-driven refund, not subject to the cancellation cutoff.
    pub async fn refund(
        &self,
        booking_id: Uuid,
        caller: &User,
        reason: Option<String>,
    ) -> Result<Booking, ApiError> {
        if caller.role != Role::Admin {
            return Err(ApiError::Unauthorized("admin role required"));
        }
        let actor = format!("admin:{}", caller.user_id);
        self.terminate(booking_id, BookingStatus::Refunded, reason, &actor)
            .await
    }

    /// Door check-in: `confirmed -> checked_in`, once. Seats stay booked.
    pub async fn check_in(&self, booking_id: Uuid, staff: &User) -> Result<Booking, ApiError> {
        if !staff.role.can_check_in() {
            return Err(ApiError::Unauthorized("staff role required"));
        }

        let checked_in_at = Utc::now();
        let staff_id = staff.user_id;
        let booking = self
            .store
            .update_booking(booking_id, |b| {
                if !b.status.can_transition(BookingStatus::CheckedIn)
                    || b.check_in_details.is_checked_in
                {
                    return Err(ApiError::InvalidStateTransition {
                        from: b.status.as_str(),
                        to: "checked_in",
                    });
                }
                b.status = BookingStatus::CheckedIn;
                b.check_in_details.is_checked_in = true;
                b.check_in_details.checked_in_at = Some(checked_in_at);
                b.check_in_details.checked_in_by = Some(staff_id);
                Ok(())
            })
            .await
            .map_err(map_store_err)??;

        info!(booking_id = %booking_id, staff_id, "booking checked in");
        Ok(booking)
    }

    /// Reaper path for abandoned pending bookings: same terminating sequence
    /// as a user cancellation, bypassing ownership and the cutoff. Returns
    /// `None` when the booking moved on (e.g. got confirmed) in the meantime.
    pub async fn expire(&self, booking_id: Uuid) -> Result<Option<Booking>, ApiError> {
        let flipped = self
            .store
            .update_booking(booking_id, |b| {
                if b.status != BookingStatus::Pending {
                    return Err(());
                }
                b.status = BookingStatus::Cancelled;
                b.cancellation_reason = Some("pending booking expired".into());
                Ok(())
            })
            .await
            .map_err(map_store_err)?;

        match flipped {
            Ok(booking) => {
                self.coordinator
                    .release(booking.event_id, &booking.seats, booking.id, "reaper")
                    .await?;
                Ok(Some(booking))
            }
            Err(()) => Ok(None),
        }
    }

    /// Guarded flip into a terminal state, then seat release. The flip is the
    /// commit point; a crash between the two leaves seats claimed by a
    /// terminal booking, which the ledger makes visible for repair.
    async fn terminate(
        &self,
        booking_id: Uuid,
        to: BookingStatus,
        reason: Option<String>,
        actor: &str,
    ) -> Result<Booking, ApiError> {
        let booking = self
            .store
            .update_booking(booking_id, |b| {
                if !b.status.can_transition(to) {
                    return Err(ApiError::InvalidStateTransition {
                        from: b.status.as_str(),
                        to: to.as_str(),
                    });
                }
                b.status = to;
                b.cancellation_reason = reason;
                Ok(())
            })
            .await
            .map_err(map_store_err)??;

        let released = self
            .coordinator
            .release(booking.event_id, &booking.seats, booking.id, actor)
            .await?;
        info!(
            booking_id = %booking_id,
            status = to.as_str(),
            released = released.len(),
            "booking terminated"
        );
        Ok(booking)
    }

    /// Owner or admin; staff may read but not mutate through this guard.
    async fn authorize_owner(&self, booking_id: Uuid, caller: &User) -> Result<Booking, ApiError> {
        let booking = self.store.booking(booking_id).await.map_err(map_store_err)?;
        if booking.user_id != caller.user_id && caller.role != Role::Admin {
            return Err(ApiError::Unauthorized("not the booking owner"));
        }
        Ok(booking)
    }
}

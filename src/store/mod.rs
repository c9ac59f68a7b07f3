//! Datastore-of-record for events, seats, bookings and the ledger.
//!
//! The public API is deliberately shaped like the primitive set a relational
//! backend would offer: snapshot reads, one atomic multi-seat conditional
//! update (`claim_seats`), one atomic idempotent release, booking CRUD and
//! ledger append. Atomicity of a single call is a store-internal property
//! (per-event inventory lock, the way a database serializes one UPDATE); no
//! lock is ever held across the coordinator's read -> check -> write cycle.

mod memory;

pub use memory::Store;

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("event {0} not found")]
    EventNotFound(i64),

    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("unknown seats for event {event_id}: {seats:?}")]
    SeatNotFound { event_id: i64, seats: Vec<String> },

    /// A conditional update named the same seat twice. The batch is rejected
    /// whole: applying it would double-count the capacity counters.
    #[error("duplicate seats in claim: {seats:?}")]
    DuplicateSeats { seats: Vec<String> },

    /// The conditional update lost against a concurrent writer: at least one
    /// targeted seat no longer carries the expected version/status. Nothing
    /// was mutated.
    #[error("version conflict on seats {seats:?}")]
    VersionConflict { seats: Vec<String> },
}

/// One seat in a multi-seat conditional update, with the version observed at
/// snapshot time. The whole batch commits only if every seat still matches.
#[derive(Debug, Clone)]
pub struct SeatClaim {
    pub seat_number: String,
    pub expected_version: u64,
}

/// Denormalized per-event counters, kept in lockstep with seat statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacitySummary {
    pub total: u32,
    pub available: u32,
    pub held: u32,
    pub booked: u32,
    pub reserved: u32,
}

/// Parameters for creating an event together with its generated seat layout.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub currency: String,
    pub layout: Vec<crate::models::SectionLayout>,
}

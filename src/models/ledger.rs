use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::seat::SeatStatus;

/// One seat-state transition. Entries are append-only: the store offers no
/// update or delete for them, so the log can always be replayed to audit the
/// denormalized counters or to find a double-allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub event_id: i64,
    pub seat_number: String,
    pub from_status: SeatStatus,
    pub to_status: SeatStatus,
    pub booking_id: Option<Uuid>,
    pub at: DateTime<Utc>,
    /// Who drove the transition: a user id, "reaper", or "admin:<id>".
    pub actor: String,
}

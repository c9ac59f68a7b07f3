pub mod lifecycle;
pub mod qr;
pub mod reaper;
pub mod reservation;

use crate::error::ApiError;
use crate::store::StoreError;

/// Store errors surfaced straight to callers. `VersionConflict` never takes
/// this path: the coordinator's retry loop owns it.
pub(crate) fn map_store_err(e: StoreError) -> ApiError {
    match e {
        StoreError::EventNotFound(_) => ApiError::NotFound("event"),
        StoreError::BookingNotFound(_) => ApiError::NotFound("booking"),
        StoreError::SeatNotFound { seats, .. } => {
            ApiError::Validation(format!("unknown seats: {}", seats.join(", ")))
        }
        StoreError::DuplicateSeats { seats } => {
            ApiError::Validation(format!("duplicate seats: {}", seats.join(", ")))
        }
        StoreError::VersionConflict { .. } => ApiError::ReservationConflict { attempts: 0 },
    }
}

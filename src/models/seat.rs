use serde::{Deserialize, Serialize};

/// Seat lifecycle status. A seat only ever moves between `Available` and one
/// of the claimed states, through the conditional-update path in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Held,
    Booked,
    Reserved,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Held => "held",
            SeatStatus::Booked => "booked",
            SeatStatus::Reserved => "reserved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SeatStatus::Available),
            "held" => Some(SeatStatus::Held),
            "booked" => Some(SeatStatus::Booked),
            "reserved" => Some(SeatStatus::Reserved),
            _ => None,
        }
    }

    /// True for every status that counts against capacity.
    pub fn is_claimed(&self) -> bool {
        !matches!(self, SeatStatus::Available)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub seat_number: String,
    pub row: i32,
    pub section: String,
    pub price: f64,
    pub status: SeatStatus,
    /// Bumped on every status change; the claim protocol compares against it.
    pub version: u64,
    pub booking_id: Option<uuid::Uuid>,
}

/// Read-side projection handed to the coordinator: just enough to run the
/// compare-and-swap loop without holding any lock between read and write.
#[derive(Debug, Clone)]
pub struct SeatSnapshot {
    pub seat_number: String,
    pub status: SeatStatus,
    pub version: u64,
    pub price: f64,
}

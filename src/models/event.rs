use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Published,
    Closed,
    Cancelled,
}

impl EventStatus {
    /// Only published events accept new seat claims.
    pub fn is_sellable(&self) -> bool {
        matches!(self, EventStatus::Published)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub is_active: bool,
    pub status: EventStatus,
    pub currency: String,
    pub capacity: u32,
}

impl Event {
    pub fn accepts_bookings(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.status.is_sellable() && self.starts_at > now
    }
}

/// Seat layout generator input: one block of identical rows in a section.
/// An event's SeatMap is produced from these when the event is created and
/// never restructured afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionLayout {
    pub section: String,
    pub rows: u32,
    pub seats_per_row: u32,
    pub price: f64,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle. The transition table in [`BookingStatus::can_transition`]
/// is the single authority; controllers and services never compare raw
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::CheckedIn | BookingStatus::Cancelled | BookingStatus::Refunded
        )
    }

    /// Closed transition table:
    /// pending -> confirmed | cancelled | refunded
    /// confirmed -> checked_in | cancelled | refunded
    pub fn can_transition(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, Refunded)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub transaction_id: String,
    pub payment_method: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckInDetails {
    pub is_checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_in_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Externally facing, unguessable identifier.
    pub id: Uuid,
    pub user_id: i64,
    pub event_id: i64,
    /// Immutable after creation; a booking is only ever cancelled whole.
    pub seats: Vec<String>,
    pub total_amount: f64,
    pub currency: String,
    pub status: BookingStatus,
    pub attendee_info: Option<String>,
    pub cancellation_reason: Option<String>,
    pub payment_details: Option<PaymentDetails>,
    pub check_in_details: CheckInDetails,
    pub created_at: DateTime<Utc>,
}

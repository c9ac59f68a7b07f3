//! QR token issue/validation for door check-in.
//!
//! The token is `base64url(booking_id:issued_at:sig)` where `sig` is a
//! SHA-256 digest over the secret and the payload. It is derived, not stored:
//! the booking row stays authoritative and tokens can be re-issued at will.
//! Validation fails closed on any malformed or tampered input, and a valid
//! token does not by itself grant check-in; eligibility is reported
//! separately from the booking's own state.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};
use crate::store::Store;

#[derive(Clone)]
pub struct QrService {
    secret: String,
}

#[derive(Debug, Serialize)]
pub struct QrValidation {
    pub booking: Option<Booking>,
    pub is_valid: bool,
    pub can_check_in: bool,
}

impl QrValidation {
    fn invalid() -> Self {
        QrValidation {
            booking: None,
            is_valid: false,
            can_check_in: false,
        }
    }
}

impl QrService {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn issue(&self, booking: &Booking) -> String {
        let issued_at = chrono::Utc::now().timestamp();
        let payload = format!("{}:{}", booking.id, issued_at);
        let sig = self.sign(&payload);
        URL_SAFE_NO_PAD.encode(format!("{payload}:{sig}"))
    }

    /// Never errors past this boundary: anything that does not parse and
    /// verify comes back as `is_valid = false` with no side effects.
    pub async fn validate(&self, token: &str, store: &Arc<Store>) -> QrValidation {
        let Some((booking_id, payload, sig)) = self.parse(token) else {
            return QrValidation::invalid();
        };
        if self.sign(&payload) != sig {
            return QrValidation::invalid();
        }
        let Ok(booking) = store.booking(booking_id).await else {
            return QrValidation::invalid();
        };

        let can_check_in = booking.status == BookingStatus::Confirmed
            && !booking.check_in_details.is_checked_in;
        QrValidation {
            booking: Some(booking),
            is_valid: true,
            can_check_in,
        }
    }

    fn parse(&self, token: &str) -> Option<(Uuid, String, String)> {
        let decoded = URL_SAFE_NO_PAD.decode(token).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let mut parts = decoded.splitn(3, ':');
        let id = parts.next()?;
        let issued_at = parts.next()?;
        let sig = parts.next()?;
        issued_at.parse::<i64>().ok()?;
        let booking_id = Uuid::parse_str(id).ok()?;
        Some((booking_id, format!("{id}:{issued_at}"), sig.to_string()))
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckInDetails;
    use proptest::prelude::*;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user_id: 7,
            event_id: 1,
            seats: vec!["A1".into()],
            total_amount: 25.0,
            currency: "EUR".into(),
            status,
            attendee_info: None,
            cancellation_reason: None,
            payment_details: None,
            check_in_details: CheckInDetails::default(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn round_trip_for_confirmed_booking() {
        let store = Arc::new(Store::new());
        let qr = QrService::new("s".into());
        let b = booking(BookingStatus::Confirmed);
        store.insert_booking(b.clone()).await;

        let res = qr.validate(&qr.issue(&b), &store).await;
        assert!(res.is_valid);
        assert!(res.can_check_in);
        assert_eq!(res.booking.map(|x| x.id), Some(b.id));
    }

    #[tokio::test]
    async fn valid_token_for_pending_booking_is_not_eligible() {
        let store = Arc::new(Store::new());
        let qr = QrService::new("s".into());
        let b = booking(BookingStatus::Pending);
        store.insert_booking(b.clone()).await;

        let res = qr.validate(&qr.issue(&b), &store).await;
        assert!(res.is_valid);
        assert!(!res.can_check_in);
    }

    #[tokio::test]
    async fn unknown_booking_fails_closed() {
        let store = Arc::new(Store::new());
        let qr = QrService::new("s".into());
        let res = qr.validate(&qr.issue(&booking(BookingStatus::Confirmed)), &store).await;
        assert!(!res.is_valid);
        assert!(res.booking.is_none());
    }

    #[tokio::test]
    async fn wrong_secret_fails_closed() {
        let store = Arc::new(Store::new());
        let b = booking(BookingStatus::Confirmed);
        store.insert_booking(b.clone()).await;
        let token = QrService::new("a".into()).issue(&b);
        let res = QrService::new("b".into()).validate(&token, &store).await;
        assert!(!res.is_valid);
    }

    proptest! {
        // Arbitrary garbage never validates and never panics.
        #[test]
        fn garbage_tokens_fail_closed(token in ".*") {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            let store = Arc::new(Store::new());
            let qr = QrService::new("s".into());
            let res = rt.block_on(qr.validate(&token, &store));
            prop_assert!(!res.is_valid);
            prop_assert!(!res.can_check_in);
        }
    }
}

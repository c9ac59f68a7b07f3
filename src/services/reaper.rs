//! Expiry sweep for abandoned pending bookings.
//!
//! A booking that claims seats and never reaches `confirmed` would otherwise
//! hold them forever. The reaper runs on a fixed interval, finds pending
//! bookings older than the configured TTL, cancels them and returns their
//! seats through the same release path a user cancellation takes.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::services::lifecycle::BookingLifecycle;
use crate::store::Store;

pub struct ReaperService {
    store: Arc<Store>,
    lifecycle: BookingLifecycle,
}

#[derive(Debug, Default)]
pub struct SweepStats {
    pub examined: usize,
    pub expired: usize,
    pub skipped: usize,
}

impl ReaperService {
    pub fn new(store: Arc<Store>, lifecycle: BookingLifecycle) -> Self {
        Self { store, lifecycle }
    }

    /// One pass over stale pending bookings. Bookings that moved on between
    /// the query and the guarded flip (e.g. a confirm racing the sweep) are
    /// counted as skipped, not failures.
    pub async fn run_sweep(&self) -> SweepStats {
        let cutoff = Utc::now() - self.lifecycle.pending_ttl();
        let stale = self.store.expired_pending(cutoff).await;

        let mut stats = SweepStats {
            examined: stale.len(),
            ..SweepStats::default()
        };

        if stale.is_empty() {
            return stats;
        }
        info!(count = stale.len(), "reaper found stale pending bookings");

        for booking in stale {
            match self.lifecycle.expire(booking.id).await {
                Ok(Some(_)) => {
                    stats.expired += 1;
                    info!(booking_id = %booking.id, event_id = booking.event_id, "expired pending booking");
                }
                Ok(None) => stats.skipped += 1,
                Err(e) => {
                    error!(booking_id = %booking.id, error = %e, "failed to expire booking");
                }
            }
        }

        info!(
            expired = stats.expired,
            skipped = stats.skipped,
            "reaper sweep completed"
        );
        stats
    }
}

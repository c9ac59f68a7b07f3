use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;
use uuid::Uuid;

use crate::models::{
    Booking, BookingStatus, Event, EventStatus, LedgerEntry, Seat, SeatSnapshot, SeatStatus, User,
};

use super::{CapacitySummary, NewEvent, SeatClaim, StoreError};

/// Per-event inventory: the seats plus the denormalized counters that must
/// move in the same atomic unit as any status flip.
struct Inventory {
    seats: BTreeMap<String, Seat>,
    available: u32,
    held: u32,
    booked: u32,
    reserved: u32,
}

impl Inventory {
    fn counter_mut(&mut self, status: SeatStatus) -> &mut u32 {
        match status {
            SeatStatus::Available => &mut self.available,
            SeatStatus::Held => &mut self.held,
            SeatStatus::Booked => &mut self.booked,
            SeatStatus::Reserved => &mut self.reserved,
        }
    }

    fn recount(&self) -> CapacitySummary {
        let mut s = CapacitySummary {
            total: self.seats.len() as u32,
            available: 0,
            held: 0,
            booked: 0,
            reserved: 0,
        };
        for seat in self.seats.values() {
            match seat.status {
                SeatStatus::Available => s.available += 1,
                SeatStatus::Held => s.held += 1,
                SeatStatus::Booked => s.booked += 1,
                SeatStatus::Reserved => s.reserved += 1,
            }
        }
        s
    }

    fn summary(&self) -> CapacitySummary {
        CapacitySummary {
            total: self.seats.len() as u32,
            available: self.available,
            held: self.held,
            booked: self.booked,
            reserved: self.reserved,
        }
    }
}

pub struct Store {
    events: RwLock<HashMap<i64, Event>>,
    inventories: RwLock<HashMap<i64, Arc<Mutex<Inventory>>>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
    users: RwLock<HashMap<i64, User>>,
    ledger: Mutex<Vec<LedgerEntry>>,
    next_event_id: AtomicI64,
    summary_reads: AtomicU64,
}

/// Every Nth summary read recounts seat statuses and repairs counter drift.
const DRIFT_CHECK_INTERVAL: u64 = 16;

impl Store {
    pub fn new() -> Self {
        Store {
            events: RwLock::new(HashMap::new()),
            inventories: RwLock::new(HashMap::new()),
            bookings: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            ledger: Mutex::new(Vec::new()),
            next_event_id: AtomicI64::new(1),
            summary_reads: AtomicU64::new(0),
        }
    }

    /* ---------- events & layout ---------- */

    /// Creates the event and generates its SeatMap from the section layout.
    /// Rows are labelled A, B, ... AA continuing across sections, seats
    /// within a row are numbered from 1, so the first seats come out as
    /// "A1", "A2", ...
    pub async fn create_event(&self, new: NewEvent) -> Event {
        let id = self.next_event_id.fetch_add(1, Ordering::Relaxed);

        let mut seats = BTreeMap::new();
        let mut global_row = 0u32;
        for section in &new.layout {
            for _ in 0..section.rows {
                global_row += 1;
                let label = row_label(global_row);
                for n in 1..=section.seats_per_row {
                    let seat_number = format!("{label}{n}");
                    seats.insert(
                        seat_number.clone(),
                        Seat {
                            seat_number,
                            row: global_row as i32,
                            section: section.section.clone(),
                            price: section.price,
                            status: SeatStatus::Available,
                            version: 0,
                            booking_id: None,
                        },
                    );
                }
            }
        }

        let capacity = seats.len() as u32;
        let event = Event {
            id,
            title: new.title,
            starts_at: new.starts_at,
            is_active: true,
            status: EventStatus::Published,
            currency: new.currency,
            capacity,
        };

        let inventory = Inventory {
            available: capacity,
            held: 0,
            booked: 0,
            reserved: 0,
            seats,
        };

        self.events.write().await.insert(id, event.clone());
        self.inventories
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(inventory)));
        event
    }

    pub async fn event(&self, event_id: i64) -> Result<Event, StoreError> {
        self.events
            .read()
            .await
            .get(&event_id)
            .cloned()
            .ok_or(StoreError::EventNotFound(event_id))
    }

    async fn inventory(&self, event_id: i64) -> Result<Arc<Mutex<Inventory>>, StoreError> {
        self.inventories
            .read()
            .await
            .get(&event_id)
            .cloned()
            .ok_or(StoreError::EventNotFound(event_id))
    }

    /* ---------- seat reads ---------- */

    pub async fn list_seats(
        &self,
        event_id: i64,
        row: Option<i32>,
        status: Option<SeatStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Seat>, StoreError> {
        let inv = self.inventory(event_id).await?;
        let inv = inv.lock().await;
        Ok(inv
            .seats
            .values()
            .filter(|s| row.map_or(true, |r| s.row == r))
            .filter(|s| status.map_or(true, |st| s.status == st))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    /// Current status + version for each requested seat. Fails if any
    /// identifier is absent from the configured layout.
    pub async fn snapshot_seats(
        &self,
        event_id: i64,
        seat_numbers: &[String],
    ) -> Result<Vec<SeatSnapshot>, StoreError> {
        let inv = self.inventory(event_id).await?;
        let inv = inv.lock().await;

        let missing: Vec<String> = seat_numbers
            .iter()
            .filter(|n| !inv.seats.contains_key(*n))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::SeatNotFound {
                event_id,
                seats: missing,
            });
        }

        Ok(seat_numbers
            .iter()
            .map(|n| {
                let s = &inv.seats[n];
                SeatSnapshot {
                    seat_number: s.seat_number.clone(),
                    status: s.status,
                    version: s.version,
                    price: s.price,
                }
            })
            .collect())
    }

    /// Counter-backed summary, O(1) on the hot path. Every
    /// `DRIFT_CHECK_INTERVAL`th read recounts the seat statuses and repairs
    /// the counters in place (with a warning) if they drifted.
    pub async fn capacity_summary(&self, event_id: i64) -> Result<CapacitySummary, StoreError> {
        let inv = self.inventory(event_id).await?;
        let reads = self.summary_reads.fetch_add(1, Ordering::Relaxed);

        let mut inv = inv.lock().await;
        if reads % DRIFT_CHECK_INTERVAL != 0 {
            return Ok(inv.summary());
        }

        let counted = inv.recount();
        if counted != inv.summary() {
            warn!(
                event_id,
                ?counted,
                "capacity counters drifted from seat statuses, repairing"
            );
            inv.available = counted.available;
            inv.held = counted.held;
            inv.booked = counted.booked;
            inv.reserved = counted.reserved;
        }
        Ok(counted)
    }

    /* ---------- seat writes (the conditional-update primitives) ---------- */

    /// Atomic multi-seat compare-and-swap: every targeted seat must still be
    /// `available` and carry the snapshotted version, or the whole batch
    /// fails with `VersionConflict` and nothing is mutated. On success the
    /// status flips, counter updates and ledger appends all land before the
    /// inventory lock is dropped.
    pub async fn claim_seats(
        &self,
        event_id: i64,
        claims: &[SeatClaim],
        to: SeatStatus,
        booking_id: Uuid,
        actor: &str,
    ) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(claims.len());
        let duplicates: Vec<String> = claims
            .iter()
            .filter(|c| !seen.insert(c.seat_number.as_str()))
            .map(|c| c.seat_number.clone())
            .collect();
        if !duplicates.is_empty() {
            return Err(StoreError::DuplicateSeats { seats: duplicates });
        }

        let inv = self.inventory(event_id).await?;
        let mut inv = inv.lock().await;

        let missing: Vec<String> = claims
            .iter()
            .filter(|c| !inv.seats.contains_key(&c.seat_number))
            .map(|c| c.seat_number.clone())
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::SeatNotFound {
                event_id,
                seats: missing,
            });
        }

        let stale: Vec<String> = claims
            .iter()
            .filter(|c| {
                let s = &inv.seats[&c.seat_number];
                s.status != SeatStatus::Available || s.version != c.expected_version
            })
            .map(|c| c.seat_number.clone())
            .collect();
        if !stale.is_empty() {
            return Err(StoreError::VersionConflict { seats: stale });
        }

        let now = Utc::now();
        let mut entries = Vec::with_capacity(claims.len());
        for claim in claims {
            // Presence was verified above, under the same lock.
            let Some(seat) = inv.seats.get_mut(&claim.seat_number) else {
                continue;
            };
            let from = seat.status;
            seat.status = to;
            seat.version += 1;
            seat.booking_id = Some(booking_id);
            entries.push(LedgerEntry {
                event_id,
                seat_number: claim.seat_number.clone(),
                from_status: from,
                to_status: to,
                booking_id: Some(booking_id),
                at: now,
                actor: actor.to_string(),
            });
        }
        inv.available -= claims.len() as u32;
        *inv.counter_mut(to) += claims.len() as u32;

        self.ledger.lock().await.extend(entries);
        Ok(())
    }

    /// Symmetric transition back to `available`, atomic and idempotent: a
    /// seat that is already available, or claimed by a different live
    /// booking, is skipped rather than treated as an error. Returns the
    /// seats actually released.
    pub async fn release_seats(
        &self,
        event_id: i64,
        seat_numbers: &[String],
        booking_id: Option<Uuid>,
        actor: &str,
    ) -> Result<Vec<String>, StoreError> {
        let inv = self.inventory(event_id).await?;
        let mut inv = inv.lock().await;

        let missing: Vec<String> = seat_numbers
            .iter()
            .filter(|n| !inv.seats.contains_key(*n))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::SeatNotFound {
                event_id,
                seats: missing,
            });
        }

        let now = Utc::now();
        let mut released = Vec::new();
        let mut entries = Vec::new();
        for n in seat_numbers {
            let Some(seat) = inv.seats.get_mut(n) else {
                continue;
            };
            if !seat.status.is_claimed() {
                continue;
            }
            if booking_id.is_some() && seat.booking_id != booking_id {
                continue;
            }
            let from = seat.status;
            seat.status = SeatStatus::Available;
            seat.version += 1;
            let owner = seat.booking_id.take();
            entries.push(LedgerEntry {
                event_id,
                seat_number: n.clone(),
                from_status: from,
                to_status: SeatStatus::Available,
                booking_id: owner,
                at: now,
                actor: actor.to_string(),
            });
            *inv.counter_mut(from) -= 1;
            inv.available += 1;
            released.push(n.clone());
        }

        self.ledger.lock().await.extend(entries);
        Ok(released)
    }

    /* ---------- bookings ---------- */

    pub async fn insert_booking(&self, booking: Booking) {
        self.bookings.write().await.insert(booking.id, booking);
    }

    pub async fn booking(&self, id: Uuid) -> Result<Booking, StoreError> {
        self.bookings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::BookingNotFound(id))
    }

    pub async fn bookings_for_user(&self, user_id: i64) -> Vec<Booking> {
        let mut out: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Applies `f` to the booking under the write lock, so a lifecycle guard
    /// inside `f` and its mutation are a single atomic step against other
    /// transitions. `f`'s own error is passed through untouched.
    pub async fn update_booking<F, E>(
        &self,
        id: Uuid,
        f: F,
    ) -> Result<Result<Booking, E>, StoreError>
    where
        F: FnOnce(&mut Booking) -> Result<(), E>,
    {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or(StoreError::BookingNotFound(id))?;
        match f(booking) {
            Ok(()) => Ok(Ok(booking.clone())),
            Err(e) => Ok(Err(e)),
        }
    }

    /// Pending bookings created before `cutoff`, for the reaper sweep.
    pub async fn expired_pending(&self, cutoff: DateTime<Utc>) -> Vec<Booking> {
        self.bookings
            .read()
            .await
            .values()
            .filter(|b| b.status == BookingStatus::Pending && b.created_at < cutoff)
            .cloned()
            .collect()
    }

    /* ---------- ledger & users ---------- */

    pub async fn ledger_for_event(&self, event_id: i64) -> Vec<LedgerEntry> {
        self.ledger
            .lock()
            .await
            .iter()
            .filter(|e| e.event_id == event_id)
            .cloned()
            .collect()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.user_id, user);
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Spreadsheet-style row labels: 1 -> A, 26 -> Z, 27 -> AA.
fn row_label(row: u32) -> String {
    let mut n = row;
    let mut label = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        label.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

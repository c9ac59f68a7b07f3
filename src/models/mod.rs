pub mod booking;
pub mod event;
pub mod ledger;
pub mod seat;
pub mod user;

pub use booking::{Booking, BookingStatus, CheckInDetails, PaymentDetails};
pub use event::{Event, EventStatus, SectionLayout};
pub use ledger::LedgerEntry;
pub use seat::{Seat, SeatSnapshot, SeatStatus};
pub use user::{Role, User};

//! Shared types for the PG rental platform.

mod caller;
mod money;
mod status;
mod types;

pub use caller::{Caller, UserRole};
pub use money::Money;
pub use status::{BookingStatus, RoomStatus, UnknownStatus};
pub use types::{BookingId, LocationId, PaymentId, RoomId, UserId};

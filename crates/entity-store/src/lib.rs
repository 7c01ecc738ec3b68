//! Entity store for the PG rental platform.
//!
//! Persists users, locations, rooms, bookings and payments, and hands out
//! all-or-nothing transactions for the multi-record booking workflow.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{FaultPoint, InMemoryStore, InMemoryTransaction};
pub use postgres::{DEFAULT_LOCK_TIMEOUT, PgStoreTransaction, PostgresStore};
pub use record::{
    Booking, Location, NewBooking, NewLocation, NewPayment, NewRoom, NewUser, Payment, Room,
    RoomDetails, User,
};
pub use store::{EntityStore, StoreTransaction};

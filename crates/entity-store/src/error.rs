use common::{RoomId, UnknownStatus};
use thiserror::Error;

use crate::memory::FaultPoint;

/// SQLSTATE codes for failures that a caller may reasonably retry.
const TRANSIENT_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
    "57014", // query_canceled (statement_timeout)
];

/// Errors that can occur when interacting with the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A room already has a pending or confirmed booking.
    #[error("Room {0} already has an active booking")]
    ActiveBookingExists(RoomId),

    /// The room is still referenced by bookings and cannot be deleted.
    #[error("Room {0} is referenced by bookings")]
    RoomInUse(RoomId),

    /// A write referenced a record that does not exist.
    #[error("Missing referenced record: {0}")]
    ForeignKey(String),

    /// A persisted value could not be decoded.
    #[error("Corrupt stored value: {0}")]
    CorruptValue(#[from] UnknownStatus),

    /// A failure injected through the in-memory store's fault hooks.
    #[error("Injected storage fault at {0:?}")]
    Injected(FaultPoint),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if the failure is environmental (lock contention, lost
    /// connection, pool exhaustion) rather than a property of the request.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Injected(_) => true,
            StoreError::Database(err) => is_transient_sqlx(err),
            _ => false,
        }
    }
}

fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

/// Result type for entity store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

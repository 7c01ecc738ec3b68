//! Workflow error types.

use common::{BookingId, BookingStatus, LocationId, PaymentId, RoomId, RoomStatus};
use entity_store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`WorkflowError`], used by callers to decide
/// how to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Validation,
    Forbidden,
    /// Stored data contradicts itself. Always logged.
    Integrity,
    /// The storage layer failed in a way the caller may retry.
    Transient,
}

/// Errors that can occur while running a booking workflow operation.
///
/// Any error aborts the enclosing transaction; nothing is partially applied.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("PG location not found: {0}")]
    LocationNotFound(LocationId),

    /// The room already has an active booking.
    #[error("Room {room_id} is not available for booking (status {status})")]
    RoomNotAvailable { room_id: RoomId, status: RoomStatus },

    /// The booking has already been confirmed or cancelled.
    #[error("Booking {booking_id} is not pending (status {status})")]
    BookingNotPending {
        booking_id: BookingId,
        status: BookingStatus,
    },

    /// A newer payment was submitted for the same booking.
    #[error("Payment {payment_id} was superseded by payment {latest}")]
    PaymentSuperseded {
        payment_id: PaymentId,
        latest: PaymentId,
    },

    /// The room is referenced by bookings and cannot be deleted.
    #[error("Room {0} is referenced by bookings")]
    RoomInUse(RoomId),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Storage failure the caller may retry.
    #[error("Temporary storage failure: {0}")]
    Transient(#[source] StoreError),

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl WorkflowError {
    /// Returns the category this error falls into.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::RoomNotFound(_)
            | WorkflowError::BookingNotFound(_)
            | WorkflowError::PaymentNotFound(_)
            | WorkflowError::LocationNotFound(_) => ErrorCategory::NotFound,
            WorkflowError::RoomNotAvailable { .. }
            | WorkflowError::BookingNotPending { .. }
            | WorkflowError::PaymentSuperseded { .. }
            | WorkflowError::RoomInUse(_) => ErrorCategory::Conflict,
            WorkflowError::Validation(_) => ErrorCategory::Validation,
            WorkflowError::Forbidden(_) => ErrorCategory::Forbidden,
            WorkflowError::Integrity(_) | WorkflowError::Storage(_) => ErrorCategory::Integrity,
            WorkflowError::Transient(_) => ErrorCategory::Transient,
        }
    }

    pub(crate) fn integrity(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "data integrity violation");
        WorkflowError::Integrity(message)
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            // The store refused a second active booking: someone else won the room.
            StoreError::ActiveBookingExists(room_id) => WorkflowError::RoomNotAvailable {
                room_id,
                status: RoomStatus::Pending,
            },
            StoreError::RoomInUse(room_id) => WorkflowError::RoomInUse(room_id),
            StoreError::ForeignKey(what) => {
                WorkflowError::Validation(format!("unknown reference: {what}"))
            }
            e if e.is_transient() => WorkflowError::Transient(e),
            e => WorkflowError::Storage(e),
        }
    }
}

//! Room and booking status state machines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a persisted status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

/// Availability status of a room.
///
/// State transitions:
/// ```text
/// Available ──submit──► Pending ──verify──► Booked
///     ▲                    │
///     └──reject/cancel─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RoomStatus {
    /// Open for booking.
    #[default]
    Available,

    /// A booking has been submitted and awaits payment verification.
    Pending,

    /// The booking against this room has been confirmed.
    Booked,
}

impl RoomStatus {
    /// Returns true if a new booking may be created against the room.
    pub fn is_available(&self) -> bool {
        matches!(self, RoomStatus::Available)
    }

    /// Returns true if the room is held by a pending or confirmed booking.
    pub fn is_held(&self) -> bool {
        matches!(self, RoomStatus::Pending | RoomStatus::Booked)
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "Available",
            RoomStatus::Pending => "Pending",
            RoomStatus::Booked => "Booked",
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(RoomStatus::Available),
            "Pending" => Ok(RoomStatus::Pending),
            "Booked" => Ok(RoomStatus::Booked),
            other => Err(UnknownStatus {
                kind: "room",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a booking.
///
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingStatus {
    /// Submitted, awaiting admin verification of the payment claim.
    #[default]
    Pending,

    /// Payment verified (terminal state).
    Confirmed,

    /// Rejected or withdrawn (terminal state).
    Cancelled,
}

impl BookingStatus {
    /// Returns true if the booking can be confirmed in this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking still holds its room.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus {
                kind: "booking",
                value: other.to_string(),
            }),
        }
    }
}

//! Persisted records and their insert/update inputs.
//!
//! Records are immutable snapshots of a row at read time. Changing state
//! always goes back through the store; mutating a returned value persists
//! nothing.

use chrono::{DateTime, Utc};
use common::{
    BookingId, BookingStatus, LocationId, Money, PaymentId, RoomId, RoomStatus, UserId, UserRole,
};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl NewUser {
    pub fn customer(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: UserRole::Customer,
        }
    }

    pub fn admin(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: UserRole::Admin,
        }
    }
}

/// A PG location (property) that holds rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub address: String,
    pub maps_url: String,
    pub thumbnail_url: Option<String>,
    pub price_range_start: Money,
    pub price_range_end: Money,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub name: String,
    pub description: String,
    pub address: String,
    pub maps_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub price_range_start: Money,
    pub price_range_end: Money,
}

/// A bookable room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    #[serde(rename = "pgLocationId")]
    pub location_id: LocationId,
    pub room_number: String,
    pub price: Money,
    pub with_attached_bath: bool,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a room. New rooms always start `Available`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    #[serde(rename = "pgLocationId")]
    pub location_id: LocationId,
    pub room_number: String,
    pub price: Money,
    pub with_attached_bath: bool,
}

/// Partial update of a room's descriptive fields.
///
/// Status is deliberately absent: it only moves through the booking workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetails {
    #[serde(default)]
    pub room_number: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub with_attached_bath: Option<bool>,
}

impl RoomDetails {
    pub fn is_empty(&self) -> bool {
        self.room_number.is_none() && self.price.is_none() && self.with_attached_bath.is_none()
    }

    pub(crate) fn apply_to(&self, room: &mut Room) {
        if let Some(ref number) = self.room_number {
            room.room_number = number.clone();
        }
        if let Some(price) = self.price {
            room.price = price;
        }
        if let Some(bath) = self.with_attached_bath {
            room.with_attached_bath = bath;
        }
    }
}

/// A booking of a room by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    #[serde(rename = "notesOrRequests")]
    pub notes: Option<String>,
}

/// Input for creating a booking. New bookings always start `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub notes: Option<String>,
}

/// A user's claim of having paid for a booking out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub upi_reference: String,
    pub screenshot_url: Option<String>,
    #[serde(rename = "verifiedByAdmin")]
    pub verified: bool,
    #[serde(rename = "verifiedById")]
    pub verified_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a payment claim. New payments are always unverified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub booking_id: BookingId,
    pub amount: Money,
    pub upi_reference: String,
    pub screenshot_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room {
            id: RoomId::new(1),
            location_id: LocationId::new(1),
            room_number: "R101".to_string(),
            price: Money::from_minor(10000),
            with_attached_bath: false,
            status: RoomStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn room_details_only_touch_given_fields() {
        let mut room = room();
        let details = RoomDetails {
            price: Some(Money::from_minor(12000)),
            ..Default::default()
        };
        details.apply_to(&mut room);

        assert_eq!(room.price, Money::from_minor(12000));
        assert_eq!(room.room_number, "R101");
        assert_eq!(room.status, RoomStatus::Pending);
    }

    #[test]
    fn empty_room_details() {
        assert!(RoomDetails::default().is_empty());
        assert!(
            !RoomDetails {
                with_attached_bath: Some(true),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn room_serializes_with_wire_names() {
        let json = serde_json::to_value(room()).unwrap();
        assert_eq!(json["pgLocationId"], 1);
        assert_eq!(json["roomNumber"], "R101");
        assert_eq!(json["withAttachedBath"], false);
        assert_eq!(json["status"], "Pending");
    }
}

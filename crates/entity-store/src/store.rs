use async_trait::async_trait;
use common::{BookingId, BookingStatus, LocationId, PaymentId, RoomId, RoomStatus, UserId};

use crate::Result;
use crate::record::{
    Booking, Location, NewBooking, NewLocation, NewPayment, NewRoom, NewUser, Payment, Room,
    RoomDetails, User,
};

/// Core trait for entity store implementations.
///
/// Single-statement reads and catalogue writes live directly on the store.
/// Anything that must move several records together goes through
/// [`EntityStore::begin`]. All implementations must be thread-safe.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// The unit-of-work type handed out by [`EntityStore::begin`].
    type Tx: StoreTransaction;

    /// Opens a transaction.
    ///
    /// Writes made through the transaction become visible together on
    /// [`StoreTransaction::commit`]. Dropping it without committing discards
    /// every write.
    async fn begin(&self) -> Result<Self::Tx>;

    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn insert_location(&self, location: NewLocation) -> Result<Location>;

    async fn get_location(&self, id: LocationId) -> Result<Option<Location>>;

    /// Lists all locations in creation order.
    async fn list_locations(&self) -> Result<Vec<Location>>;

    /// Inserts a room with status `Available`.
    async fn insert_room(&self, room: NewRoom) -> Result<Room>;

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>>;

    /// Lists the rooms of a location in creation order.
    async fn rooms_by_location(&self, location_id: LocationId) -> Result<Vec<Room>>;

    /// Applies a partial update to a room's descriptive fields.
    ///
    /// Returns None if the room doesn't exist.
    async fn update_room_details(&self, id: RoomId, details: RoomDetails) -> Result<Option<Room>>;

    /// Deletes a room.
    ///
    /// Fails with `RoomInUse` while any booking references the room, since
    /// bookings are never deleted. Returns false if the room doesn't exist.
    async fn delete_room(&self, id: RoomId) -> Result<bool>;

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Bookings made by a user, most recent first.
    async fn bookings_by_user(&self, user_id: UserId) -> Result<Vec<Booking>>;

    /// Bookings against a room, most recent first.
    async fn bookings_by_room(&self, room_id: RoomId) -> Result<Vec<Booking>>;

    /// Bookings in the given status, most recent first.
    async fn bookings_with_status(&self, status: BookingStatus) -> Result<Vec<Booking>>;

    /// Every booking, most recent first.
    async fn all_bookings(&self) -> Result<Vec<Booking>>;

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    /// Payments recorded for a booking, most recent first.
    async fn payments_by_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>>;
}

/// An open all-or-nothing unit of work against the store.
///
/// The `lock_*` reads take a row lock (or equivalent) held until the
/// transaction ends, so a check performed on the returned value stays true
/// for the subsequent writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Reads a room and locks it for the rest of the transaction.
    async fn lock_room(&mut self, id: RoomId) -> Result<Option<Room>>;

    /// Overwrites a room's status without any further validation.
    ///
    /// Returns None if the room doesn't exist.
    async fn set_room_status(&mut self, id: RoomId, status: RoomStatus) -> Result<Option<Room>>;

    /// Inserts a booking with status `Pending`.
    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking>;

    /// Reads a booking and locks it for the rest of the transaction.
    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>>;

    /// Overwrites a booking's status. Returns None if the booking doesn't exist.
    async fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Option<Booking>>;

    /// Inserts an unverified payment.
    async fn insert_payment(&mut self, payment: NewPayment) -> Result<Payment>;

    /// Reads a payment and locks it for the rest of the transaction.
    async fn lock_payment(&mut self, id: PaymentId) -> Result<Option<Payment>>;

    /// Returns the most recently recorded payment for a booking.
    async fn latest_payment_for_booking(
        &mut self,
        booking_id: BookingId,
    ) -> Result<Option<Payment>>;

    /// Marks a payment verified by the given administrator.
    ///
    /// Returns None if the payment doesn't exist.
    async fn mark_payment_verified(
        &mut self,
        id: PaymentId,
        admin_id: UserId,
    ) -> Result<Option<Payment>>;

    /// Makes every write of this transaction durable and visible.
    async fn commit(self) -> Result<()>;
}

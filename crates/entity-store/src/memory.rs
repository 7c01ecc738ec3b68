use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use common::{BookingId, BookingStatus, LocationId, PaymentId, RoomId, RoomStatus, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result, StoreError,
    record::{
        Booking, Location, NewBooking, NewLocation, NewPayment, NewRoom, NewUser, Payment, Room,
        RoomDetails, User,
    },
    store::{EntityStore, StoreTransaction},
};

/// Points inside a transaction where the in-memory store can be told to fail.
///
/// Used to prove that a failure part-way through a workflow leaves no trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    InsertBooking,
    SetRoomStatus,
    InsertPayment,
    SetBookingStatus,
    VerifyPayment,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Faults(Arc<StdMutex<HashSet<FaultPoint>>>);

impl Faults {
    fn arm(&self, point: FaultPoint) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point);
    }

    fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Fails once if the point is armed, disarming it.
    fn trip(&self, point: FaultPoint) -> Result<()> {
        let fired = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&point);
        if fired {
            tracing::debug!(?point, "injected storage fault");
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    locations: BTreeMap<LocationId, Location>,
    rooms: BTreeMap<RoomId, Room>,
    bookings: BTreeMap<BookingId, Booking>,
    payments: BTreeMap<PaymentId, Payment>,
    user_seq: i64,
    location_seq: i64,
    room_seq: i64,
    booking_seq: i64,
    payment_seq: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

fn newest_bookings_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| {
        b.booking_date
            .cmp(&a.booking_date)
            .then(b.id.cmp(&a.id))
    });
    bookings
}

fn newest_payments_first(mut payments: Vec<Payment>) -> Vec<Payment> {
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    payments
}

impl Tables {
    fn insert_booking(&mut self, new: NewBooking) -> Result<Booking> {
        if !self.users.contains_key(&new.user_id) {
            return Err(StoreError::ForeignKey(format!("user {}", new.user_id)));
        }
        if !self.rooms.contains_key(&new.room_id) {
            return Err(StoreError::ForeignKey(format!("room {}", new.room_id)));
        }
        // Mirrors the partial unique index on bookings(room_id).
        if self
            .bookings
            .values()
            .any(|b| b.room_id == new.room_id && b.status.is_active())
        {
            return Err(StoreError::ActiveBookingExists(new.room_id));
        }

        let booking = Booking {
            id: BookingId::new(next(&mut self.booking_seq)),
            user_id: new.user_id,
            room_id: new.room_id,
            booking_date: Utc::now(),
            status: BookingStatus::Pending,
            notes: new.notes,
        };
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn insert_payment(&mut self, new: NewPayment) -> Result<Payment> {
        if !self.bookings.contains_key(&new.booking_id) {
            return Err(StoreError::ForeignKey(format!("booking {}", new.booking_id)));
        }

        let payment = Payment {
            id: PaymentId::new(next(&mut self.payment_seq)),
            booking_id: new.booking_id,
            amount: new.amount,
            upi_reference: new.upi_reference,
            screenshot_url: new.screenshot_url,
            verified: false,
            verified_by: None,
            created_at: Utc::now(),
        };
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    fn payments_for(&self, booking_id: BookingId) -> Vec<Payment> {
        newest_payments_first(
            self.payments
                .values()
                .filter(|p| p.booking_id == booking_id)
                .cloned()
                .collect(),
        )
    }
}

/// In-memory entity store for tests and local runs.
///
/// Provides the same interface and transactional guarantees as the
/// PostgreSQL implementation. A transaction holds the store's lock for its
/// whole lifetime, so transactions are fully serialized and reads made
/// outside one wait until it finishes.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Faults,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure at the given point of the next transaction
    /// that reaches it.
    pub fn fail_at(&self, point: FaultPoint) {
        self.faults.arm(point);
    }

    /// Disarms every pending fault.
    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Returns the total number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.tables.lock().await.bookings.len()
    }

    /// Returns the total number of payments stored.
    pub async fn payment_count(&self) -> usize {
        self.tables.lock().await.payments.len()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let committed = self.tables.clone().lock_owned().await;
        let working = committed.clone();
        Ok(InMemoryTransaction {
            committed,
            working,
            faults: self.faults.clone(),
        })
    }

    async fn insert_user(&self, new: NewUser) -> Result<User> {
        let mut tables = self.tables.lock().await;
        let user = User {
            id: UserId::new(next(&mut tables.user_seq)),
            name: new.name,
            email: new.email,
            role: new.role,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn insert_location(&self, new: NewLocation) -> Result<Location> {
        let mut tables = self.tables.lock().await;
        let location = Location {
            id: LocationId::new(next(&mut tables.location_seq)),
            name: new.name,
            description: new.description,
            address: new.address,
            maps_url: new.maps_url,
            thumbnail_url: new.thumbnail_url,
            price_range_start: new.price_range_start,
            price_range_end: new.price_range_end,
            created_at: Utc::now(),
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn get_location(&self, id: LocationId) -> Result<Option<Location>> {
        Ok(self.tables.lock().await.locations.get(&id).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        Ok(self.tables.lock().await.locations.values().cloned().collect())
    }

    async fn insert_room(&self, new: NewRoom) -> Result<Room> {
        let mut tables = self.tables.lock().await;
        if !tables.locations.contains_key(&new.location_id) {
            return Err(StoreError::ForeignKey(format!(
                "location {}",
                new.location_id
            )));
        }

        let room = Room {
            id: RoomId::new(next(&mut tables.room_seq)),
            location_id: new.location_id,
            room_number: new.room_number,
            price: new.price,
            with_attached_bath: new.with_attached_bath,
            status: RoomStatus::Available,
            created_at: Utc::now(),
        };
        tables.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.tables.lock().await.rooms.get(&id).cloned())
    }

    async fn rooms_by_location(&self, location_id: LocationId) -> Result<Vec<Room>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rooms
            .values()
            .filter(|r| r.location_id == location_id)
            .cloned()
            .collect())
    }

    async fn update_room_details(&self, id: RoomId, details: RoomDetails) -> Result<Option<Room>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.rooms.get_mut(&id).map(|room| {
            details.apply_to(room);
            room.clone()
        }))
    }

    async fn delete_room(&self, id: RoomId) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.bookings.values().any(|b| b.room_id == id) {
            return Err(StoreError::RoomInUse(id));
        }
        Ok(tables.rooms.remove(&id).is_some())
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn bookings_by_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let tables = self.tables.lock().await;
        Ok(newest_bookings_first(
            tables
                .bookings
                .values()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn bookings_by_room(&self, room_id: RoomId) -> Result<Vec<Booking>> {
        let tables = self.tables.lock().await;
        Ok(newest_bookings_first(
            tables
                .bookings
                .values()
                .filter(|b| b.room_id == room_id)
                .cloned()
                .collect(),
        ))
    }

    async fn bookings_with_status(&self, status: BookingStatus) -> Result<Vec<Booking>> {
        let tables = self.tables.lock().await;
        Ok(newest_bookings_first(
            tables
                .bookings
                .values()
                .filter(|b| b.status == status)
                .cloned()
                .collect(),
        ))
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        let tables = self.tables.lock().await;
        Ok(newest_bookings_first(
            tables.bookings.values().cloned().collect(),
        ))
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.tables.lock().await.payments.get(&id).cloned())
    }

    async fn payments_by_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>> {
        Ok(self.tables.lock().await.payments_for(booking_id))
    }
}

/// A serialized transaction over an [`InMemoryStore`].
///
/// Writes land in a private copy of the tables that replaces the shared
/// state on commit. Dropping the transaction discards the copy.
pub struct InMemoryTransaction {
    committed: OwnedMutexGuard<Tables>,
    working: Tables,
    faults: Faults,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn lock_room(&mut self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.working.rooms.get(&id).cloned())
    }

    async fn set_room_status(&mut self, id: RoomId, status: RoomStatus) -> Result<Option<Room>> {
        self.faults.trip(FaultPoint::SetRoomStatus)?;
        Ok(self.working.rooms.get_mut(&id).map(|room| {
            room.status = status;
            room.clone()
        }))
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking> {
        self.faults.trip(FaultPoint::InsertBooking)?;
        self.working.insert_booking(booking)
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.working.bookings.get(&id).cloned())
    }

    async fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Option<Booking>> {
        self.faults.trip(FaultPoint::SetBookingStatus)?;
        Ok(self.working.bookings.get_mut(&id).map(|booking| {
            booking.status = status;
            booking.clone()
        }))
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<Payment> {
        self.faults.trip(FaultPoint::InsertPayment)?;
        self.working.insert_payment(payment)
    }

    async fn lock_payment(&mut self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.working.payments.get(&id).cloned())
    }

    async fn latest_payment_for_booking(
        &mut self,
        booking_id: BookingId,
    ) -> Result<Option<Payment>> {
        Ok(self.working.payments_for(booking_id).into_iter().next())
    }

    async fn mark_payment_verified(
        &mut self,
        id: PaymentId,
        admin_id: UserId,
    ) -> Result<Option<Payment>> {
        self.faults.trip(FaultPoint::VerifyPayment)?;
        if !self.working.users.contains_key(&admin_id) {
            return Err(StoreError::ForeignKey(format!("user {admin_id}")));
        }
        Ok(self.working.payments.get_mut(&id).map(|payment| {
            payment.verified = true;
            payment.verified_by = Some(admin_id);
            payment.clone()
        }))
    }

    async fn commit(self) -> Result<()> {
        self.faults.trip(FaultPoint::Commit)?;
        let Self {
            mut committed,
            working,
            ..
        } = self;
        *committed = working;
        Ok(())
    }
}

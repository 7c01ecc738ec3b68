//! Read-side views over bookings.
//!
//! Views are assembled from store-level reads and never open a transaction.

use common::{BookingId, Caller};
use entity_store::{Booking, EntityStore, Location, Payment, Room, User};
use serde::Serialize;

use crate::error::WorkflowError;

/// A room together with the location it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub pg_location: Option<Location>,
}

/// A booking with its user, room, location and payments (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub user: Option<User>,
    pub room: Option<RoomView>,
    pub payments: Vec<Payment>,
}

impl BookingView {
    /// The payment an administrator would act on, if any.
    pub fn active_payment(&self) -> Option<&Payment> {
        self.payments.first()
    }
}

/// Loads the records a [`BookingView`] is made of.
pub(crate) async fn enrich<S>(store: &S, booking: Booking) -> Result<BookingView, WorkflowError>
where
    S: EntityStore + ?Sized,
{
    let user = store.get_user(booking.user_id).await?;
    let room = match store.get_room(booking.room_id).await? {
        Some(room) => {
            let pg_location = store.get_location(room.location_id).await?;
            Some(RoomView { room, pg_location })
        }
        None => None,
    };
    let payments = store.payments_by_booking(booking.id).await?;

    Ok(BookingView {
        booking,
        user,
        room,
        payments,
    })
}

pub(crate) async fn enrich_all<S>(
    store: &S,
    bookings: Vec<Booking>,
) -> Result<Vec<BookingView>, WorkflowError>
where
    S: EntityStore + ?Sized,
{
    let mut views = Vec::with_capacity(bookings.len());
    for booking in bookings {
        views.push(enrich(store, booking).await?);
    }
    Ok(views)
}

/// Customer-facing booking queries.
#[derive(Clone)]
pub struct BookingQueries<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> BookingQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The caller's own bookings, most recent first.
    #[tracing::instrument(skip(self))]
    pub async fn bookings_for_user(&self, caller: Caller) -> Result<Vec<BookingView>, WorkflowError> {
        let bookings = self.store.bookings_by_user(caller.user_id).await?;
        enrich_all(&self.store, bookings).await
    }

    /// A single booking, visible to its owner and to administrators.
    #[tracing::instrument(skip(self))]
    pub async fn booking_details(
        &self,
        caller: Caller,
        booking_id: BookingId,
    ) -> Result<BookingView, WorkflowError> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or(WorkflowError::BookingNotFound(booking_id))?;
        if !caller.may_act_for(booking.user_id) {
            return Err(WorkflowError::Forbidden(
                "bookings are only visible to their owner",
            ));
        }
        enrich(&self.store, booking).await
    }
}

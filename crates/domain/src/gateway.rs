//! Admin verification gateway.
//!
//! Every operation here requires an administrator caller. Verification
//! decisions are delegated to the [`BookingWorkflow`]; the gateway adds the
//! role check, dashboard reads and catalogue maintenance.

use common::{BookingStatus, Caller, LocationId, PaymentId, RoomId};
use entity_store::{EntityStore, Location, NewLocation, NewRoom, Room, RoomDetails};
use serde::Serialize;

use crate::error::WorkflowError;
use crate::queries::{BookingView, enrich_all};
use crate::workflow::{BookingWorkflow, PaymentDecision};

/// Booking counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookingStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
}

impl BookingStats {
    fn count(&mut self, status: BookingStatus) {
        self.total += 1;
        match status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Confirmed => self.confirmed += 1,
            BookingStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Room occupancy of one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRoomCount {
    pub id: LocationId,
    pub name: String,
    pub total_rooms: usize,
    pub available_rooms: usize,
}

/// Privileged surface for administrators.
#[derive(Clone)]
pub struct AdminGateway<S: EntityStore> {
    workflow: BookingWorkflow<S>,
}

impl<S: EntityStore> AdminGateway<S> {
    pub fn new(workflow: BookingWorkflow<S>) -> Self {
        Self { workflow }
    }

    fn store(&self) -> &S {
        self.workflow.store()
    }

    fn require_admin(caller: &Caller) -> Result<(), WorkflowError> {
        if caller.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user_id = %caller.user_id, "non-admin attempted an admin operation");
            Err(WorkflowError::Forbidden("administrator role required"))
        }
    }

    /// Pending bookings, newest first, with room, location and payments.
    #[tracing::instrument(skip(self))]
    pub async fn list_pending_bookings(
        &self,
        caller: Caller,
    ) -> Result<Vec<BookingView>, WorkflowError> {
        Self::require_admin(&caller)?;
        let bookings = self
            .store()
            .bookings_with_status(BookingStatus::Pending)
            .await?;
        enrich_all(self.store(), bookings).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn verify_payment(
        &self,
        caller: Caller,
        payment_id: PaymentId,
    ) -> Result<PaymentDecision, WorkflowError> {
        Self::require_admin(&caller)?;
        self.workflow
            .verify_payment(payment_id, caller.user_id)
            .await
    }

    #[tracing::instrument(skip(self, reason))]
    pub async fn reject_payment(
        &self,
        caller: Caller,
        payment_id: PaymentId,
        reason: Option<String>,
    ) -> Result<PaymentDecision, WorkflowError> {
        Self::require_admin(&caller)?;
        self.workflow
            .reject_payment(payment_id, caller.user_id, reason)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn booking_stats(&self, caller: Caller) -> Result<BookingStats, WorkflowError> {
        Self::require_admin(&caller)?;
        let mut stats = BookingStats::default();
        for booking in self.store().all_bookings().await? {
            stats.count(booking.status);
        }
        Ok(stats)
    }

    #[tracing::instrument(skip(self))]
    pub async fn location_room_counts(
        &self,
        caller: Caller,
    ) -> Result<Vec<LocationRoomCount>, WorkflowError> {
        Self::require_admin(&caller)?;
        let mut counts = Vec::new();
        for location in self.store().list_locations().await? {
            let rooms = self.store().rooms_by_location(location.id).await?;
            counts.push(LocationRoomCount {
                id: location.id,
                name: location.name,
                total_rooms: rooms.len(),
                available_rooms: rooms.iter().filter(|r| r.status.is_available()).count(),
            });
        }
        Ok(counts)
    }

    #[tracing::instrument(skip(self, location), fields(name = %location.name))]
    pub async fn create_location(
        &self,
        caller: Caller,
        location: NewLocation,
    ) -> Result<Location, WorkflowError> {
        Self::require_admin(&caller)?;
        if location.name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "location name is required".to_string(),
            ));
        }
        if location.price_range_start.minor() < 0
            || location.price_range_start > location.price_range_end
        {
            return Err(WorkflowError::Validation(format!(
                "invalid price range {}..{}",
                location.price_range_start, location.price_range_end
            )));
        }

        let location = self.store().insert_location(location).await?;
        tracing::info!(location_id = %location.id, "location created");
        Ok(location)
    }

    #[tracing::instrument(skip(self, room), fields(location_id = %room.location_id))]
    pub async fn create_room(&self, caller: Caller, room: NewRoom) -> Result<Room, WorkflowError> {
        Self::require_admin(&caller)?;
        validate_room_number(&room.room_number)?;
        if !room.price.is_positive() {
            return Err(WorkflowError::Validation(
                "room price must be positive".to_string(),
            ));
        }
        if self.store().get_location(room.location_id).await?.is_none() {
            return Err(WorkflowError::LocationNotFound(room.location_id));
        }

        let room = self.store().insert_room(room).await?;
        tracing::info!(room_id = %room.id, "room created");
        Ok(room)
    }

    /// Changes a room's number, price or bath flag. Status is never touched.
    #[tracing::instrument(skip(self, details))]
    pub async fn update_room(
        &self,
        caller: Caller,
        room_id: RoomId,
        details: RoomDetails,
    ) -> Result<Room, WorkflowError> {
        Self::require_admin(&caller)?;
        if details.is_empty() {
            return Err(WorkflowError::Validation(
                "no room fields to update".to_string(),
            ));
        }
        if let Some(ref number) = details.room_number {
            validate_room_number(number)?;
        }
        if details.price.is_some_and(|price| !price.is_positive()) {
            return Err(WorkflowError::Validation(
                "room price must be positive".to_string(),
            ));
        }

        self.store()
            .update_room_details(room_id, details)
            .await?
            .ok_or(WorkflowError::RoomNotFound(room_id))
    }

    /// Deletes a room no booking has ever referenced.
    #[tracing::instrument(skip(self))]
    pub async fn delete_room(&self, caller: Caller, room_id: RoomId) -> Result<(), WorkflowError> {
        Self::require_admin(&caller)?;
        if !self.store().delete_room(room_id).await? {
            return Err(WorkflowError::RoomNotFound(room_id));
        }
        tracing::info!(%room_id, "room deleted");
        Ok(())
    }
}

fn validate_room_number(number: &str) -> Result<(), WorkflowError> {
    if number.trim().is_empty() {
        return Err(WorkflowError::Validation(
            "room number is required".to_string(),
        ));
    }
    Ok(())
}

//! Booking workflow engine.
//!
//! Each operation moves a room, a booking and (where involved) a payment
//! together inside a single store transaction. Room and booking lifecycles:
//!
//! ```text
//! Room:    Available ──submit──► Pending ──verify──► Booked
//!                                   │
//!                                   └──reject/cancel──► Available
//!
//! Booking: Pending ──verify──► Confirmed
//!             │
//!             └──reject/cancel──► Cancelled
//! ```

use std::time::Instant;

use common::{BookingId, BookingStatus, Caller, PaymentId, RoomId, RoomStatus, UserId};
use entity_store::{Booking, EntityStore, NewBooking, Payment, Room, StoreTransaction};
use serde::Serialize;

use crate::availability;
use crate::claim::PaymentClaim;
use crate::error::WorkflowError;

/// Outcome of a successful booking submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub booking_id: BookingId,
    pub status: BookingStatus,
}

/// Outcome of an additional payment submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment_id: PaymentId,
    pub booking_id: BookingId,
}

/// The records touched by an admin verify or reject decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDecision {
    pub room_id: RoomId,
    pub booking_id: BookingId,
    pub payment_id: PaymentId,
}

/// The records a payment decision operates on, read under lock.
struct PendingPayment {
    payment: Payment,
    booking: Booking,
    room: Room,
}

/// Drives the booking and payment state machines.
///
/// Holds no state of its own beyond the store handle; every call reloads the
/// records it needs.
#[derive(Clone)]
pub struct BookingWorkflow<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> BookingWorkflow<S> {
    /// Creates a workflow engine over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Books an available room and records the user's payment claim.
    ///
    /// The booking starts `Pending` and the room moves to `Pending` until an
    /// administrator verifies or rejects the payment.
    #[tracing::instrument(skip(self, claim, notes))]
    pub async fn submit_booking(
        &self,
        user_id: UserId,
        room_id: RoomId,
        claim: PaymentClaim,
        notes: Option<String>,
    ) -> Result<BookingReceipt, WorkflowError> {
        let started = Instant::now();
        let result = self.try_submit_booking(user_id, room_id, claim, notes).await;
        record_duration("submit_booking", started);

        match &result {
            Ok(receipt) => {
                metrics::counter!("bookings_submitted_total").increment(1);
                tracing::info!(booking_id = %receipt.booking_id, "booking submitted");
            }
            Err(WorkflowError::RoomNotAvailable { status, .. }) => {
                metrics::counter!("booking_conflicts_total").increment(1);
                tracing::info!(%status, "room not available");
            }
            Err(_) => {}
        }
        result
    }

    async fn try_submit_booking(
        &self,
        user_id: UserId,
        room_id: RoomId,
        claim: PaymentClaim,
        notes: Option<String>,
    ) -> Result<BookingReceipt, WorkflowError> {
        let mut tx = self.store.begin().await?;

        let room = availability::get_room(&mut tx, room_id).await?;
        if !availability::is_available(&room) {
            return Err(WorkflowError::RoomNotAvailable {
                room_id,
                status: room.status,
            });
        }

        let booking = tx
            .insert_booking(NewBooking {
                user_id,
                room_id,
                notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            })
            .await?;
        availability::set_status(&mut tx, room_id, RoomStatus::Pending).await?;
        tx.insert_payment(claim.into_payment(booking.id)).await?;

        tx.commit().await?;

        Ok(BookingReceipt {
            booking_id: booking.id,
            status: booking.status,
        })
    }

    /// Accepts a payment: the payment is marked verified, its booking
    /// confirmed and the room booked.
    #[tracing::instrument(skip(self))]
    pub async fn verify_payment(
        &self,
        payment_id: PaymentId,
        admin_id: UserId,
    ) -> Result<PaymentDecision, WorkflowError> {
        let started = Instant::now();
        let result = self.try_verify_payment(payment_id, admin_id).await;
        record_duration("verify_payment", started);

        if let Ok(decision) = &result {
            metrics::counter!("payments_verified_total").increment(1);
            tracing::info!(
                booking_id = %decision.booking_id,
                room_id = %decision.room_id,
                "payment verified, booking confirmed"
            );
        }
        result
    }

    async fn try_verify_payment(
        &self,
        payment_id: PaymentId,
        admin_id: UserId,
    ) -> Result<PaymentDecision, WorkflowError> {
        let mut tx = self.store.begin().await?;
        let PendingPayment {
            payment,
            booking,
            room,
        } = load_pending_payment(&mut tx, payment_id).await?;

        tx.mark_payment_verified(payment.id, admin_id)
            .await?
            .ok_or(WorkflowError::PaymentNotFound(payment.id))?;
        set_booking_status(&mut tx, booking.id, BookingStatus::Confirmed).await?;
        availability::set_status(&mut tx, room.id, RoomStatus::Booked).await?;

        tx.commit().await?;

        Ok(PaymentDecision {
            room_id: room.id,
            booking_id: booking.id,
            payment_id: payment.id,
        })
    }

    /// Refuses a payment: the booking is cancelled and the room released.
    ///
    /// The payment itself stays unverified as a record of the claim.
    #[tracing::instrument(skip(self, reason))]
    pub async fn reject_payment(
        &self,
        payment_id: PaymentId,
        admin_id: UserId,
        reason: Option<String>,
    ) -> Result<PaymentDecision, WorkflowError> {
        let started = Instant::now();
        let result = self.try_reject_payment(payment_id).await;
        record_duration("reject_payment", started);

        if let Ok(decision) = &result {
            metrics::counter!("payments_rejected_total").increment(1);
            tracing::info!(
                booking_id = %decision.booking_id,
                room_id = %decision.room_id,
                reason = reason.as_deref().unwrap_or(""),
                "payment rejected, booking cancelled"
            );
        }
        result
    }

    async fn try_reject_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<PaymentDecision, WorkflowError> {
        let mut tx = self.store.begin().await?;
        let PendingPayment {
            payment,
            booking,
            room,
        } = load_pending_payment(&mut tx, payment_id).await?;

        set_booking_status(&mut tx, booking.id, BookingStatus::Cancelled).await?;
        availability::set_status(&mut tx, room.id, RoomStatus::Available).await?;

        tx.commit().await?;

        Ok(PaymentDecision {
            room_id: room.id,
            booking_id: booking.id,
            payment_id: payment.id,
        })
    }

    /// Cancels a pending booking on behalf of its owner or an administrator,
    /// releasing the room.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        caller: Caller,
    ) -> Result<Booking, WorkflowError> {
        let started = Instant::now();
        let result = self.try_cancel_booking(booking_id, caller).await;
        record_duration("cancel_booking", started);

        if let Ok(booking) = &result {
            metrics::counter!("bookings_cancelled_total").increment(1);
            tracing::info!(room_id = %booking.room_id, "booking cancelled");
        }
        result
    }

    async fn try_cancel_booking(
        &self,
        booking_id: BookingId,
        caller: Caller,
    ) -> Result<Booking, WorkflowError> {
        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or(WorkflowError::BookingNotFound(booking_id))?;
        if !caller.may_act_for(booking.user_id) {
            return Err(WorkflowError::Forbidden(
                "only the booking owner or an administrator may cancel it",
            ));
        }
        if !booking.status.can_cancel() {
            return Err(WorkflowError::BookingNotPending {
                booking_id,
                status: booking.status,
            });
        }
        let room = lock_held_room(&mut tx, &booking).await?;

        let cancelled = set_booking_status(&mut tx, booking.id, BookingStatus::Cancelled).await?;
        availability::set_status(&mut tx, room.id, RoomStatus::Available).await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    /// Records a further payment claim for the caller's pending booking.
    ///
    /// The new payment becomes the active one; earlier payments for the same
    /// booking can no longer be verified.
    #[tracing::instrument(skip(self, claim))]
    pub async fn submit_payment(
        &self,
        booking_id: BookingId,
        caller: Caller,
        claim: PaymentClaim,
    ) -> Result<PaymentReceipt, WorkflowError> {
        let started = Instant::now();
        let result = self.try_submit_payment(booking_id, caller, claim).await;
        record_duration("submit_payment", started);

        if let Ok(receipt) = &result {
            tracing::info!(payment_id = %receipt.payment_id, "payment submitted");
        }
        result
    }

    async fn try_submit_payment(
        &self,
        booking_id: BookingId,
        caller: Caller,
        claim: PaymentClaim,
    ) -> Result<PaymentReceipt, WorkflowError> {
        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or(WorkflowError::BookingNotFound(booking_id))?;
        if booking.user_id != caller.user_id {
            return Err(WorkflowError::Forbidden(
                "payments can only be submitted for your own bookings",
            ));
        }
        if !booking.status.can_confirm() {
            return Err(WorkflowError::BookingNotPending {
                booking_id,
                status: booking.status,
            });
        }

        let payment = tx.insert_payment(claim.into_payment(booking.id)).await?;
        tx.commit().await?;

        Ok(PaymentReceipt {
            payment_id: payment.id,
            booking_id,
        })
    }
}

fn record_duration(operation: &'static str, started: Instant) {
    metrics::histogram!("workflow_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// Locks a payment, its booking and its room, checking that the payment can
/// still be decided on.
async fn load_pending_payment<T>(
    tx: &mut T,
    payment_id: PaymentId,
) -> Result<PendingPayment, WorkflowError>
where
    T: StoreTransaction + ?Sized,
{
    let payment = tx
        .lock_payment(payment_id)
        .await?
        .ok_or(WorkflowError::PaymentNotFound(payment_id))?;

    let booking = match tx.lock_booking(payment.booking_id).await? {
        Some(booking) => booking,
        None => {
            tracing::error!(
                %payment_id,
                booking_id = %payment.booking_id,
                "payment references a missing booking"
            );
            return Err(WorkflowError::BookingNotFound(payment.booking_id));
        }
    };
    if !booking.status.can_confirm() {
        return Err(WorkflowError::BookingNotPending {
            booking_id: booking.id,
            status: booking.status,
        });
    }
    if payment.verified {
        return Err(WorkflowError::integrity(format!(
            "payment {payment_id} is verified but booking {} is still pending",
            booking.id
        )));
    }

    let latest = tx.latest_payment_for_booking(booking.id).await?;
    if let Some(latest) = latest.filter(|latest| latest.id != payment.id) {
        return Err(WorkflowError::PaymentSuperseded {
            payment_id,
            latest: latest.id,
        });
    }

    let room = lock_held_room(tx, &booking).await?;
    Ok(PendingPayment {
        payment,
        booking,
        room,
    })
}

/// Locks the room of a pending booking and checks that it is held for it.
async fn lock_held_room<T>(tx: &mut T, booking: &Booking) -> Result<Room, WorkflowError>
where
    T: StoreTransaction + ?Sized,
{
    let room = match tx.lock_room(booking.room_id).await? {
        Some(room) => room,
        None => {
            tracing::error!(
                booking_id = %booking.id,
                room_id = %booking.room_id,
                "booking references a missing room"
            );
            return Err(WorkflowError::RoomNotFound(booking.room_id));
        }
    };
    if room.status != RoomStatus::Pending {
        return Err(WorkflowError::integrity(format!(
            "booking {} is pending but room {} is {}",
            booking.id, room.id, room.status
        )));
    }
    Ok(room)
}

async fn set_booking_status<T>(
    tx: &mut T,
    booking_id: BookingId,
    status: BookingStatus,
) -> Result<Booking, WorkflowError>
where
    T: StoreTransaction + ?Sized,
{
    tx.set_booking_status(booking_id, status)
        .await?
        .ok_or_else(|| {
            WorkflowError::integrity(format!("booking {booking_id} vanished while locked"))
        })
}

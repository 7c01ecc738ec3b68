//! Room availability tracking.
//!
//! A room's status is the single source of truth for whether it can be
//! booked. The helpers here operate inside a store transaction so the check
//! and the write that follows it happen under the same room lock.

use common::{RoomId, RoomStatus};
use entity_store::{Room, StoreTransaction};

use crate::error::WorkflowError;

/// Returns true if the room can take a new booking.
pub fn is_available(room: &Room) -> bool {
    room.status.is_available()
}

/// Reads and locks a room for the rest of the transaction.
pub async fn get_room<T>(tx: &mut T, room_id: RoomId) -> Result<Room, WorkflowError>
where
    T: StoreTransaction + ?Sized,
{
    tx.lock_room(room_id)
        .await?
        .ok_or(WorkflowError::RoomNotFound(room_id))
}

/// Overwrites a room's status.
///
/// No transition rules are checked here; callers decide which transitions
/// are legal.
pub async fn set_status<T>(
    tx: &mut T,
    room_id: RoomId,
    status: RoomStatus,
) -> Result<Room, WorkflowError>
where
    T: StoreTransaction + ?Sized,
{
    let room = tx
        .set_room_status(room_id, status)
        .await?
        .ok_or(WorkflowError::RoomNotFound(room_id))?;
    tracing::debug!(%room_id, %status, "room status updated");
    Ok(room)
}

//! Admin endpoints: payment verification, dashboard and catalogue.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{PaymentId, RoomId};
use domain::{BookingStats, BookingView, LocationRoomCount, PaymentDecision};
use entity_store::{EntityStore, Location, NewLocation, NewRoom, Room, RoomDetails};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::AuthenticatedCaller;
use crate::error::ApiError;
use crate::extract::ApiJson;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct RejectParams {
    pub reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct DecisionResponse {
    #[serde(flatten)]
    pub decision: PaymentDecision,
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub bookings: BookingStats,
    pub pg_locations: Vec<LocationRoomCount>,
}

// -- Handlers --

/// GET /api/admin/pending-bookings: bookings awaiting a payment decision.
#[tracing::instrument(skip(state))]
pub async fn pending_bookings<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    Ok(Json(state.gateway.list_pending_bookings(caller).await?))
}

/// POST /api/admin/verify-payment/{id}: accept a payment and confirm its booking.
#[tracing::instrument(skip(state))]
pub async fn verify_payment<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<i64>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let decision = state
        .gateway
        .verify_payment(caller, PaymentId::new(id))
        .await?;
    Ok(Json(DecisionResponse {
        decision,
        message: "Payment verified successfully, booking confirmed",
    }))
}

/// POST /api/admin/reject-payment/{id}: refuse a payment and release the room.
#[tracing::instrument(skip(state, params))]
pub async fn reject_payment<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<i64>,
    Query(params): Query<RejectParams>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let decision = state
        .gateway
        .reject_payment(caller, PaymentId::new(id), params.reason)
        .await?;
    Ok(Json(DecisionResponse {
        decision,
        message: "Payment rejected, booking cancelled",
    }))
}

/// GET /api/admin/stats: booking counts and per-location room occupancy.
#[tracing::instrument(skip(state))]
pub async fn stats<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<Json<StatsResponse>, ApiError> {
    let bookings = state.gateway.booking_stats(caller).await?;
    let pg_locations = state.gateway.location_room_counts(caller).await?;
    Ok(Json(StatsResponse {
        bookings,
        pg_locations,
    }))
}

/// POST /api/admin/add-pg: create a PG location.
#[tracing::instrument(skip(state, req))]
pub async fn add_location<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    ApiJson(req): ApiJson<NewLocation>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    let location = state.gateway.create_location(caller, req).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// POST /api/admin/add-room: create a room in a location.
#[tracing::instrument(skip(state, req))]
pub async fn add_room<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    ApiJson(req): ApiJson<NewRoom>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let room = state.gateway.create_room(caller, req).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// PUT /api/admin/update-room/{id}: change a room's number, price or bath flag.
#[tracing::instrument(skip(state, req))]
pub async fn update_room<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<RoomDetails>,
) -> Result<Json<Room>, ApiError> {
    let room = state
        .gateway
        .update_room(caller, RoomId::new(id), req)
        .await?;
    Ok(Json(room))
}

/// DELETE /api/admin/room/{id}: delete a room no booking references.
#[tracing::instrument(skip(state))]
pub async fn delete_room<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.gateway.delete_room(caller, RoomId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

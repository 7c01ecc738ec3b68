//! Customer booking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BookingId, RoomId};
use domain::{BookingReceipt, BookingView, PaymentClaim, PaymentReceipt};
use entity_store::{Booking, EntityStore};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::AuthenticatedCaller;
use crate::error::ApiError;
use crate::extract::ApiJson;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: i64,
    pub upi_reference: String,
    #[serde(default)]
    pub screenshot_url: Option<String>,
}

impl PaymentRequest {
    fn into_claim(self) -> Result<PaymentClaim, ApiError> {
        Ok(PaymentClaim::parse(
            self.amount,
            &self.upi_reference,
            self.screenshot_url,
        )?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRoomRequest {
    pub room_id: RoomId,
    #[serde(default)]
    pub notes_or_requests: Option<String>,
    pub payment: PaymentRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPaymentRequest {
    pub booking_id: BookingId,
    #[serde(flatten)]
    pub payment: PaymentRequest,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    #[serde(flatten)]
    pub receipt: BookingReceipt,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct PaymentCreatedResponse {
    #[serde(flatten)]
    pub receipt: PaymentReceipt,
    pub message: &'static str,
}

// -- Handlers --

/// POST /api/book-room: book an available room with a payment claim.
#[tracing::instrument(skip(state, req), fields(room_id = %req.room_id))]
pub async fn book_room<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    ApiJson(req): ApiJson<BookRoomRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), ApiError> {
    let claim = req.payment.into_claim()?;
    let receipt = state
        .workflow
        .submit_booking(caller.user_id, req.room_id, claim, req.notes_or_requests)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            receipt,
            message: "Booking submitted successfully and awaiting payment verification",
        }),
    ))
}

/// POST /api/upload-payment: add a payment claim to a pending booking.
#[tracing::instrument(skip(state, req), fields(booking_id = %req.booking_id))]
pub async fn upload_payment<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    ApiJson(req): ApiJson<UploadPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentCreatedResponse>), ApiError> {
    let claim = req.payment.into_claim()?;
    let receipt = state
        .workflow
        .submit_payment(req.booking_id, caller, claim)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentCreatedResponse {
            receipt,
            message: "Payment information submitted successfully and awaiting verification",
        }),
    ))
}

/// GET /api/bookings: the caller's bookings, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    Ok(Json(state.queries.bookings_for_user(caller).await?))
}

/// GET /api/booking/{id}: one booking with room, location and payments.
#[tracing::instrument(skip(state))]
pub async fn get<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<i64>,
) -> Result<Json<BookingView>, ApiError> {
    let view = state
        .queries
        .booking_details(caller, BookingId::new(id))
        .await?;
    Ok(Json(view))
}

/// POST /api/booking/{id}/cancel: cancel a pending booking.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .workflow
        .cancel_booking(BookingId::new(id), caller)
        .await?;
    Ok(Json(booking))
}

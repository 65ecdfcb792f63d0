use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{BookingStatus, PaymentStatus};
use crate::entities::payment::{self, PaymentState};
use crate::error::AppResult;
use crate::services::payments::{ProcessPayment, RefundPayment};
use crate::services::{self, Pagination};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<PaymentState>,
}

#[derive(Debug, Serialize)]
pub struct PaymentSummary {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub amount: f64,
    pub method: String,
    pub status: PaymentState,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<&payment::Model> for PaymentSummary {
    fn from(p: &payment::Model) -> Self {
        Self {
            id: p.id,
            transaction_id: p.transaction_id.clone(),
            amount: p.amount,
            method: p.method.clone(),
            status: p.status,
            paid_at: p.paid_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub payment: PaymentSummary,
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub payment_id: Uuid,
    pub refund_amount: Option<f64>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_reason: Option<String>,
    pub booking_id: Uuid,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment: Option<PaymentSummary>,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<payment::Model>,
    pub pagination: Pagination,
}

/// Attempt settlement for a booking through the simulated gateway
pub async fn process_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ProcessPayment>,
) -> AppResult<Json<SettlementResponse>> {
    let outcome =
        services::payments::process_payment(&state.db, &state.config, claims.sub, payload).await?;

    Ok(Json(SettlementResponse {
        payment: PaymentSummary::from(&outcome.payment),
        booking_id: outcome.booking.id,
        booking_reference: outcome.booking.booking_reference,
        booking_status: outcome.booking.status,
        payment_status: outcome.booking.payment_status,
    }))
}

/// List the caller's payments
pub async fn my_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<PaymentListResponse>> {
    let (page, limit) = services::normalize_paging(query.page, query.limit);
    let (payments, pagination) =
        services::payments::list_payments(&state.db, claims.sub, query.status, page, limit)
            .await?;

    Ok(Json(PaymentListResponse {
        payments,
        pagination,
    }))
}

/// Get one of the caller's payments
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<payment::Model>> {
    let found = services::payments::get_payment(&state.db, claims.sub, payment_id).await?;
    Ok(Json(found))
}

/// Refund a completed payment; cancels the booking and releases its seats
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<RefundPayment>,
) -> AppResult<Json<RefundResponse>> {
    let outcome =
        services::payments::refund_payment(&state.db, claims.sub, payment_id, payload).await?;

    Ok(Json(RefundResponse {
        payment_id: outcome.payment.id,
        refund_amount: outcome.payment.refund_amount,
        refunded_at: outcome.payment.refunded_at.map(|t| t.with_timezone(&Utc)),
        refund_reason: outcome.payment.refund_reason,
        booking_id: outcome.booking.id,
        booking_status: outcome.booking.status,
        payment_status: outcome.booking.payment_status,
    }))
}

/// Payment status projection for one of the caller's bookings
pub async fn booking_payment_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<PaymentStatusResponse>> {
    let (found, linked) =
        services::payments::payment_status(&state.db, claims.sub, booking_id).await?;

    Ok(Json(PaymentStatusResponse {
        booking_status: found.status,
        payment_status: found.payment_status,
        payment: linked.as_ref().map(PaymentSummary::from),
    }))
}

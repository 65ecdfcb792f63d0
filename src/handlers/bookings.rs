use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::error::AppResult;
use crate::services::bookings::{CreateBooking, UpdateBooking};
use crate::services::{self, Pagination};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<booking::Model>,
    pub pagination: Pagination,
}

/// Create a booking: seats are held at creation time, before payment
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBooking>,
) -> AppResult<Json<booking::Model>> {
    let created = services::bookings::create_booking(&state.db, claims.sub, payload).await?;
    Ok(Json(created))
}

/// List the caller's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<BookingListResponse>> {
    let (page, limit) = services::normalize_paging(query.page, query.limit);
    let (bookings, pagination) =
        services::bookings::list_bookings(&state.db, claims.sub, query.status, page, limit)
            .await?;

    Ok(Json(BookingListResponse {
        bookings,
        pagination,
    }))
}

/// Get one of the caller's bookings
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let found = services::bookings::get_booking(&state.db, claims.sub, booking_id).await?;
    Ok(Json(found))
}

/// Update booking status or special requests
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateBooking>,
) -> AppResult<Json<booking::Model>> {
    let updated =
        services::bookings::update_booking(&state.db, claims.sub, booking_id, payload).await?;
    Ok(Json(updated))
}

/// Cancel a booking and release its seats
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let cancelled = services::bookings::cancel_booking(&state.db, claims.sub, booking_id).await?;
    Ok(Json(cancelled))
}

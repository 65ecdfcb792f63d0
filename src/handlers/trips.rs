use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::trip::{self, TripStatus};
use crate::error::AppResult;
use crate::services::trips::{SeatAvailability, TripSearch};
use crate::services::{self, Pagination};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Trip summary without the seat map; listings stay light.
#[derive(Debug, Serialize)]
pub struct TripSummary {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub status: TripStatus,
}

impl From<trip::Model> for TripSummary {
    fn from(t: trip::Model) -> Self {
        Self {
            id: t.id,
            origin: t.origin,
            destination: t.destination,
            departure_time: t.departure_time.with_timezone(&Utc),
            price: t.price,
            original_price: t.original_price,
            discount_percent: t.discount_percent,
            total_seats: t.total_seats,
            available_seats: t.available_seats,
            status: t.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TripListResponse {
    pub trips: Vec<TripSummary>,
    pub pagination: Pagination,
}

/// List upcoming bookable trips
pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<TripListResponse>> {
    let (page, limit) = services::normalize_paging(query.page, query.limit);
    let (trips, pagination) = services::trips::list_trips(&state.db, page, limit).await?;

    Ok(Json(TripListResponse {
        trips: trips.into_iter().map(TripSummary::from).collect(),
        pagination,
    }))
}

/// Search trips by route prefix and departure day
pub async fn search_trips(
    State(state): State<AppState>,
    Query(search): Query<TripSearch>,
) -> AppResult<Json<TripListResponse>> {
    let (trips, pagination) = services::trips::search_trips(&state.db, search).await?;

    Ok(Json(TripListResponse {
        trips: trips.into_iter().map(TripSummary::from).collect(),
        pagination,
    }))
}

/// Get trip details including the full seat map
pub async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<trip::Model>> {
    let trip = services::trips::get_trip(&state.db, trip_id).await?;
    Ok(Json(trip))
}

/// Get available and booked seat lists for a trip
pub async fn trip_seats(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<SeatAvailability>> {
    let availability = services::trips::seat_availability(&state.db, trip_id).await?;
    Ok(Json(availability))
}

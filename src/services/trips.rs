//! Trip catalog: admin-managed trip records plus the public query layer
//! (search, listing, seat availability). Seat-state mutation lives in
//! [`crate::inventory`], not here.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::trip::{self, TripStatus};
use crate::error::{AppError, AppResult};
use crate::seats::{generate_seat_map, MAX_TOTAL_SEATS};
use crate::services::Pagination;

#[derive(Debug, Deserialize)]
pub struct CreateTrip {
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub total_seats: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTrip {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub status: Option<TripStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TripSearch {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SeatAvailability {
    pub available_seats: Vec<String>,
    pub booked_seats: Vec<String>,
    pub total_seats: i32,
    pub available_count: i32,
}

fn validate_commercials(price: f64, discount_percent: Option<f64>) -> AppResult<()> {
    if price <= 0.0 {
        return Err(AppError::Validation("Price must be positive".to_string()));
    }
    if let Some(discount) = discount_percent {
        if !(0.0..=100.0).contains(&discount) {
            return Err(AppError::Validation(
                "Discount percent must be between 0 and 100".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn create_trip(
    db: &DatabaseConnection,
    created_by: Uuid,
    input: CreateTrip,
) -> AppResult<trip::Model> {
    let origin = input.origin.trim().to_string();
    let destination = input.destination.trim().to_string();
    if origin.is_empty() || destination.is_empty() {
        return Err(AppError::Validation(
            "Origin and destination are required".to_string(),
        ));
    }

    validate_commercials(input.price, input.discount_percent)?;

    if input.total_seats < 1 {
        return Err(AppError::Validation(
            "Trip must have at least one seat".to_string(),
        ));
    }
    if input.total_seats > MAX_TOTAL_SEATS {
        return Err(AppError::Validation(format!(
            "Trip cannot have more than {} seats",
            MAX_TOTAL_SEATS
        )));
    }

    let seat_map = generate_seat_map(input.total_seats);

    let created = trip::ActiveModel {
        id: Set(Uuid::new_v4()),
        origin: Set(origin),
        destination: Set(destination),
        departure_time: Set(input.departure_time.fixed_offset()),
        price: Set(input.price),
        original_price: Set(input.original_price),
        discount_percent: Set(input.discount_percent),
        total_seats: Set(input.total_seats),
        available_seats: Set(input.total_seats),
        seat_map: Set(seat_map),
        status: Set(TripStatus::Active),
        is_deleted: Set(false),
        created_by: Set(Some(created_by)),
        version: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(trip_id = %created.id, "trip created");

    Ok(created)
}

pub async fn get_trip(db: &DatabaseConnection, trip_id: Uuid) -> AppResult<trip::Model> {
    trip::Entity::find_by_id(trip_id)
        .filter(trip::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))
}

/// Update commercial/schedule fields. Total seats are immutable after
/// creation; the seat map is only ever touched by the inventory store. The
/// write is conditional on the version observed here so it cannot clobber a
/// concurrent seat reservation.
pub async fn update_trip(
    db: &DatabaseConnection,
    trip_id: Uuid,
    input: UpdateTrip,
) -> AppResult<trip::Model> {
    let current = get_trip(db, trip_id).await?;

    if let Some(price) = input.price {
        validate_commercials(price, input.discount_percent.or(current.discount_percent))?;
    } else if input.discount_percent.is_some() {
        validate_commercials(current.price, input.discount_percent)?;
    }

    let mut changes = trip::ActiveModel {
        version: Set(current.version + 1),
        ..Default::default()
    };
    if let Some(origin) = input.origin {
        changes.origin = Set(origin.trim().to_string());
    }
    if let Some(destination) = input.destination {
        changes.destination = Set(destination.trim().to_string());
    }
    if let Some(departure_time) = input.departure_time {
        changes.departure_time = Set(departure_time.fixed_offset());
    }
    if let Some(price) = input.price {
        changes.price = Set(price);
    }
    if let Some(original_price) = input.original_price {
        changes.original_price = Set(Some(original_price));
    }
    if let Some(discount_percent) = input.discount_percent {
        changes.discount_percent = Set(Some(discount_percent));
    }
    if let Some(status) = input.status {
        changes.status = Set(status);
    }

    let result = trip::Entity::update_many()
        .set(changes)
        .filter(trip::Column::Id.eq(trip_id))
        .filter(trip::Column::Version.eq(current.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Trip was updated concurrently, please retry".to_string(),
        ));
    }

    get_trip(db, trip_id).await
}

/// Soft-delete a trip. Rejected while any non-cancelled booking still
/// references it.
pub async fn delete_trip(db: &DatabaseConnection, trip_id: Uuid) -> AppResult<()> {
    let current = get_trip(db, trip_id).await?;

    let active_bookings = booking::Entity::find()
        .filter(booking::Column::TripId.eq(trip_id))
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled))
        .count(db)
        .await?;

    if active_bookings > 0 {
        return Err(AppError::Conflict(format!(
            "Cannot delete trip with {} active booking(s)",
            active_bookings
        )));
    }

    let mut active: trip::ActiveModel = current.into();
    active.is_deleted = Set(true);
    active.status = Set(TripStatus::Inactive);
    active.update(db).await?;

    tracing::info!(trip_id = %trip_id, "trip soft-deleted");

    Ok(())
}

/// Public listing: active, non-deleted trips ordered by departure.
pub async fn list_trips(
    db: &DatabaseConnection,
    page: u64,
    limit: u64,
) -> AppResult<(Vec<trip::Model>, Pagination)> {
    let paginator = trip::Entity::find()
        .filter(trip::Column::IsDeleted.eq(false))
        .filter(trip::Column::Status.eq(TripStatus::Active))
        .order_by_asc(trip::Column::DepartureTime)
        .paginate(db, limit);

    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok((
        items,
        Pagination::new(page, totals.number_of_pages, totals.number_of_items),
    ))
}

/// Case-insensitive prefix search on origin/destination plus an optional
/// departure-day filter.
pub async fn search_trips(
    db: &DatabaseConnection,
    search: TripSearch,
) -> AppResult<(Vec<trip::Model>, Pagination)> {
    let (page, limit) = crate::services::normalize_paging(search.page, search.limit);

    let mut query = trip::Entity::find()
        .filter(trip::Column::IsDeleted.eq(false))
        .filter(trip::Column::Status.eq(TripStatus::Active));

    if let Some(origin) = search.origin.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(Expr::col(trip::Column::Origin).ilike(format!("{}%", origin)));
    }
    if let Some(destination) = search
        .destination
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        query =
            query.filter(Expr::col(trip::Column::Destination).ilike(format!("{}%", destination)));
    }
    if let Some(date) = search.date {
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Days::new(1);
        query = query
            .filter(trip::Column::DepartureTime.gte(day_start))
            .filter(trip::Column::DepartureTime.lt(day_end));
    }

    let paginator = query
        .order_by_asc(trip::Column::DepartureTime)
        .order_by_asc(trip::Column::Price)
        .paginate(db, limit);

    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok((
        items,
        Pagination::new(page, totals.number_of_pages, totals.number_of_items),
    ))
}

/// Seat lists and counts derived from the trip's current seat map.
pub async fn seat_availability(
    db: &DatabaseConnection,
    trip_id: Uuid,
) -> AppResult<SeatAvailability> {
    let current = get_trip(db, trip_id).await?;

    let (booked, available): (Vec<_>, Vec<_>) =
        current.seat_map.0.iter().partition(|s| s.is_booked);

    Ok(SeatAvailability {
        available_seats: available.iter().map(|s| s.seat_number.clone()).collect(),
        booked_seats: booked.iter().map(|s| s.seat_number.clone()).collect(),
        total_seats: current.total_seats,
        available_count: current.available_seats,
    })
}

//! Trip inventory store: the authoritative seat state per trip.
//!
//! All seat-map writes go through a compare-and-swap on the trip's `version`
//! column, so two concurrent bookings racing for the same seats can never
//! both commit. The loser of a race re-reads fresh state and re-validates;
//! if its seats are gone it gets the precise seat conflict, otherwise it
//! retries the conditional write.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::trip;
use crate::error::{AppError, AppResult};
use crate::seats::{validate_selection, SeatMap};

/// Bounded retries for version conflicts that are not seat conflicts
/// (e.g. two bookings for disjoint seat sets on the same trip).
const MAX_WRITE_ATTEMPTS: usize = 5;

async fn load_trip<C: ConnectionTrait>(db: &C, trip_id: Uuid) -> AppResult<trip::Model> {
    trip::Entity::find_by_id(trip_id)
        .filter(trip::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))
}

/// Conditionally write `seat_map` back to the trip row, keyed on the version
/// the caller observed. Returns the updated model on success, `None` on a
/// lost race. `available_seats` is always recomputed from the map itself.
async fn try_commit_seat_map<C: ConnectionTrait>(
    db: &C,
    observed: &trip::Model,
    seat_map: SeatMap,
) -> AppResult<Option<trip::Model>> {
    let available_seats = seat_map.available_count();

    let result = trip::Entity::update_many()
        .set(trip::ActiveModel {
            seat_map: Set(seat_map.clone()),
            available_seats: Set(available_seats),
            version: Set(observed.version + 1),
            ..Default::default()
        })
        .filter(trip::Column::Id.eq(observed.id))
        .filter(trip::Column::Version.eq(observed.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    Ok(Some(trip::Model {
        seat_map,
        available_seats,
        version: observed.version + 1,
        ..observed.clone()
    }))
}

/// Validate and mark the requested seats booked, as one atomically applied
/// read-modify-write. Exactly one of two racing reservations for an
/// intersecting seat set succeeds; the other observes the seat conflict.
pub async fn reserve_seats<C: ConnectionTrait>(
    db: &C,
    trip_id: Uuid,
    requested: &[String],
) -> AppResult<trip::Model> {
    for attempt in 0..MAX_WRITE_ATTEMPTS {
        let current = load_trip(db, trip_id).await?;

        validate_selection(
            current.is_bookable(),
            current.available_seats,
            &current.seat_map,
            requested,
        )?;

        let mut seat_map = current.seat_map.clone();
        seat_map.mark_booked(requested);

        if let Some(updated) = try_commit_seat_map(db, &current, seat_map).await? {
            return Ok(updated);
        }

        tracing::debug!(
            trip_id = %trip_id,
            attempt,
            "seat reservation lost a version race, retrying against fresh state"
        );
    }

    Err(AppError::Conflict(
        "Trip inventory is being updated concurrently, please retry".to_string(),
    ))
}

/// Release previously reserved seats, e.g. on cancellation or refund.
///
/// Callers pass the booking's own recorded seat list, never one re-derived
/// from the trip, so seats reserved by later bookings are untouched. Double
/// release cannot drift the counter: it is recomputed from the map.
pub async fn release_seats<C: ConnectionTrait>(
    db: &C,
    trip_id: Uuid,
    seat_numbers: &[String],
) -> AppResult<trip::Model> {
    for attempt in 0..MAX_WRITE_ATTEMPTS {
        let current = load_trip(db, trip_id).await?;

        let mut seat_map = current.seat_map.clone();
        seat_map.release(seat_numbers);

        if let Some(updated) = try_commit_seat_map(db, &current, seat_map).await? {
            return Ok(updated);
        }

        tracing::debug!(
            trip_id = %trip_id,
            attempt,
            "seat release lost a version race, retrying against fresh state"
        );
    }

    Err(AppError::Conflict(
        "Trip inventory is being updated concurrently, please retry".to_string(),
    ))
}

//! Booking lifecycle manager: the single authoritative path for creating,
//! updating, and cancelling bookings, and for keeping booking state and trip
//! seat state consistent with each other.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::error::{AppError, AppResult};
use crate::inventory;
use crate::seats::SelectedSeats;
use crate::services::Pagination;
use crate::utils::reference;

#[derive(Debug, Deserialize)]
pub struct CreateBooking {
    pub trip_id: Uuid,
    pub seats: Vec<String>,
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBooking {
    pub status: Option<BookingStatus>,
    pub special_requests: Option<String>,
}

/// Price snapshot taken at booking time; later trip price changes never
/// touch an existing booking.
fn booking_amount(price_per_seat: f64, seats: &[String]) -> f64 {
    price_per_seat * seats.len() as f64
}

/// Create a booking and reserve its seats as one logical transaction.
///
/// The seat reservation is a conditional write (see [`crate::inventory`]);
/// the booking row is inserted in the same database transaction, so a failed
/// insert rolls the seat marks back and a lost seat race aborts before any
/// booking exists.
pub async fn create_booking(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: CreateBooking,
) -> AppResult<booking::Model> {
    if input.seats.is_empty() {
        return Err(AppError::Validation(
            "At least one seat must be selected".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let trip = inventory::reserve_seats(&txn, input.trip_id, &input.seats).await?;

    let total_amount = booking_amount(trip.price, &input.seats);

    let created = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_reference: Set(reference::booking_reference()),
        trip_id: Set(trip.id),
        user_id: Set(user_id),
        seats: Set(SelectedSeats(input.seats)),
        total_amount: Set(total_amount),
        status: Set(BookingStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        payment_id: Set(None),
        special_requests: Set(input.special_requests),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = %created.id,
        booking_reference = %created.booking_reference,
        trip_id = %created.trip_id,
        "booking created"
    );

    Ok(created)
}

/// Ownership-scoped lookup: a non-owner asking for someone else's booking
/// gets the same not-found as a bogus id, so booking ids never leak.
pub async fn get_booking(
    db: &DatabaseConnection,
    user_id: Uuid,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .filter(booking::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

pub async fn list_bookings(
    db: &DatabaseConnection,
    user_id: Uuid,
    status: Option<BookingStatus>,
    page: u64,
    limit: u64,
) -> AppResult<(Vec<booking::Model>, Pagination)> {
    let mut query = booking::Entity::find()
        .filter(booking::Column::UserId.eq(user_id))
        .order_by_desc(booking::Column::CreatedAt);

    if let Some(status) = status {
        query = query.filter(booking::Column::Status.eq(status));
    }

    let paginator = query.paginate(db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok((
        items,
        Pagination::new(page, totals.number_of_pages, totals.number_of_items),
    ))
}

/// Guard for cancellation (shared by the cancel and update paths).
fn ensure_cancellable(current: &booking::Model) -> AppResult<()> {
    if current.status == BookingStatus::Cancelled {
        return Err(AppError::InvalidTransition(
            "Booking is already cancelled".to_string(),
        ));
    }
    if current.status == BookingStatus::Completed {
        return Err(AppError::InvalidTransition(
            "Completed bookings cannot be cancelled".to_string(),
        ));
    }
    if current.payment_status == PaymentStatus::Paid {
        return Err(AppError::InvalidTransition(
            "Cannot cancel a paid booking; request a refund instead".to_string(),
        ));
    }
    Ok(())
}

/// Forward-only status transitions; `cancelled` is handled separately
/// because it releases seats.
fn ensure_transition(from: BookingStatus, to: BookingStatus) -> AppResult<()> {
    let allowed = matches!(
        (from, to),
        (BookingStatus::Pending, BookingStatus::Confirmed)
            | (BookingStatus::Confirmed, BookingStatus::Completed)
    );
    if !allowed {
        return Err(AppError::InvalidTransition(format!(
            "Cannot move booking from {:?} to {:?}",
            from, to
        )));
    }
    Ok(())
}

/// Build the cancellation update: the status flip and any accompanying notes
/// land in the same write.
fn apply_cancellation(current: booking::Model, notes: Option<String>) -> booking::ActiveModel {
    let mut active: booking::ActiveModel = current.into();
    active.status = Set(BookingStatus::Cancelled);
    if let Some(notes) = notes {
        active.special_requests = Set(Some(notes));
    }
    active
}

/// Flip the booking to cancelled and release its recorded seats, atomically.
async fn cancel_within_txn(
    db: &DatabaseConnection,
    current: booking::Model,
    notes: Option<String>,
) -> AppResult<booking::Model> {
    let seat_numbers = current.seats.0.clone();
    let trip_id = current.trip_id;

    let txn = db.begin().await?;

    let updated = apply_cancellation(current, notes).update(&txn).await?;

    // The booking's own seat list, not the trip's current map: seats taken
    // by bookings created since then must survive this release.
    inventory::release_seats(&txn, trip_id, &seat_numbers).await?;

    txn.commit().await?;

    tracing::info!(booking_id = %updated.id, "booking cancelled, seats released");

    Ok(updated)
}

pub async fn cancel_booking(
    db: &DatabaseConnection,
    user_id: Uuid,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    let current = get_booking(db, user_id, booking_id).await?;
    ensure_cancellable(&current)?;
    cancel_within_txn(db, current, None).await
}

/// Update the caller-editable fields (status, special requests). A status
/// change to `cancelled` obeys the same guards as plain cancellation and
/// goes through the same seat-releasing path.
pub async fn update_booking(
    db: &DatabaseConnection,
    user_id: Uuid,
    booking_id: Uuid,
    input: UpdateBooking,
) -> AppResult<booking::Model> {
    let current = get_booking(db, user_id, booking_id).await?;

    if let Some(new_status) = input.status {
        if new_status != current.status {
            if new_status == BookingStatus::Cancelled {
                ensure_cancellable(&current)?;
            } else {
                ensure_transition(current.status, new_status)?;
            }
        }
    }

    let cancelling = input.status == Some(BookingStatus::Cancelled)
        && current.status != BookingStatus::Cancelled;

    if cancelling {
        return cancel_within_txn(db, current, input.special_requests).await;
    }

    let mut active: booking::ActiveModel = current.into();
    if let Some(status) = input.status {
        active.status = Set(status);
    }
    if let Some(notes) = input.special_requests {
        active.special_requests = Set(Some(notes));
    }

    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    use sea_orm::ActiveValue;

    use super::*;
    use crate::seats::{generate_seat_map, validate_selection, SelectedSeats};

    fn booking_with(status: BookingStatus, payment_status: PaymentStatus) -> booking::Model {
        booking::Model {
            id: Uuid::new_v4(),
            booking_reference: "BK-TEST0001".to_string(),
            trip_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            seats: SelectedSeats(vec!["A1".to_string(), "A2".to_string()]),
            total_amount: 100.0,
            status,
            payment_status,
            payment_id: None,
            special_requests: None,
            created_at: chrono::Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_booking_amount_snapshots_price_per_seat() {
        let seats = vec!["A1".to_string(), "A2".to_string()];
        assert_eq!(booking_amount(50.0, &seats), 100.0);
    }

    #[test]
    fn test_book_then_refund_restores_inventory() {
        let mut map = generate_seat_map(4);
        let requested = vec!["A1".to_string(), "A2".to_string()];

        validate_selection(true, map.available_count(), &map, &requested).unwrap();
        map.mark_booked(&requested);
        assert_eq!(map.available_count(), 2);
        assert_eq!(booking_amount(50.0, &requested), 100.0);

        // refund releases the booking's recorded seats
        map.release(&requested);
        assert_eq!(map.available_count(), 4);
        assert!(!map.is_booked("A1"));
        assert!(!map.is_booked("A2"));
    }

    #[test]
    fn test_cancellation_carries_notes_in_one_update() {
        let b = booking_with(BookingStatus::Pending, PaymentStatus::Pending);
        let active = apply_cancellation(b, Some("missed the departure".to_string()));

        assert!(matches!(
            active.status,
            ActiveValue::Set(BookingStatus::Cancelled)
        ));
        assert!(matches!(active.special_requests, ActiveValue::Set(Some(_))));
    }

    #[test]
    fn test_cancellation_without_notes_keeps_existing_requests() {
        let b = booking_with(BookingStatus::Pending, PaymentStatus::Pending);
        let active = apply_cancellation(b, None);

        assert!(matches!(
            active.status,
            ActiveValue::Set(BookingStatus::Cancelled)
        ));
        assert!(matches!(
            active.special_requests,
            ActiveValue::Unchanged(None)
        ));
    }

    #[test]
    fn test_pending_unpaid_booking_is_cancellable() {
        let b = booking_with(BookingStatus::Pending, PaymentStatus::Pending);
        assert!(ensure_cancellable(&b).is_ok());
    }

    #[test]
    fn test_paid_booking_cannot_be_cancelled_directly() {
        let b = booking_with(BookingStatus::Confirmed, PaymentStatus::Paid);
        let err = ensure_cancellable(&b).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_cancelled_booking_cannot_be_cancelled_twice() {
        let b = booking_with(BookingStatus::Cancelled, PaymentStatus::Pending);
        assert!(matches!(
            ensure_cancellable(&b),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_completed_booking_cannot_be_cancelled() {
        let b = booking_with(BookingStatus::Completed, PaymentStatus::Paid);
        assert!(matches!(
            ensure_cancellable(&b),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(ensure_transition(BookingStatus::Pending, BookingStatus::Confirmed).is_ok());
        assert!(ensure_transition(BookingStatus::Confirmed, BookingStatus::Completed).is_ok());
    }

    #[test]
    fn test_backward_and_skipping_transitions_rejected() {
        for (from, to) in [
            (BookingStatus::Confirmed, BookingStatus::Pending),
            (BookingStatus::Pending, BookingStatus::Completed),
            (BookingStatus::Completed, BookingStatus::Confirmed),
            (BookingStatus::Cancelled, BookingStatus::Confirmed),
        ] {
            assert!(
                matches!(ensure_transition(from, to), Err(AppError::InvalidTransition(_))),
                "{:?} -> {:?} should be rejected",
                from,
                to
            );
        }
    }
}

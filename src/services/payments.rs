//! Payment settlement simulator: stands in for an external gateway with
//! realistic latency and partial-failure behavior. One payment row per
//! settlement attempt; the booking/payment status flip is a single database
//! transaction.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::entities::payment::{self, PaymentState};
use crate::error::{AppError, AppResult};
use crate::inventory;
use crate::services::Pagination;
use crate::utils::reference;

#[derive(Debug, Deserialize)]
pub struct ProcessPayment {
    pub booking_id: Uuid,
    pub method: String,
    pub card_number: Option<String>,
    pub card_holder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefundPayment {
    pub amount: Option<f64>,
    pub reason: Option<String>,
}

pub struct SettlementOutcome {
    pub payment: payment::Model,
    pub booking: booking::Model,
}

pub struct RefundOutcome {
    pub payment: payment::Model,
    pub booking: booking::Model,
}

/// Booking states a settlement may still finalize from after the simulated
/// gateway round-trip. Anything else (cancelled meanwhile, paid by a
/// concurrent attempt) aborts the attempt.
const FINALIZABLE_BOOKING_STATUSES: [BookingStatus; 2] =
    [BookingStatus::Pending, BookingStatus::Confirmed];
const FINALIZABLE_PAYMENT_STATUSES: [PaymentStatus; 2] =
    [PaymentStatus::Pending, PaymentStatus::Failed];

fn can_finalize(status: BookingStatus, payment_status: PaymentStatus) -> bool {
    FINALIZABLE_BOOKING_STATUSES.contains(&status)
        && FINALIZABLE_PAYMENT_STATUSES.contains(&payment_status)
}

/// Guard for starting a settlement attempt.
fn ensure_payable(current: &booking::Model) -> AppResult<()> {
    if current.payment_status == PaymentStatus::Paid {
        return Err(AppError::InvalidTransition(
            "Payment already completed for this booking".to_string(),
        ));
    }
    if !can_finalize(current.status, current.payment_status) {
        return Err(AppError::InvalidTransition(
            "Booking is not in a payable state".to_string(),
        ));
    }
    Ok(())
}

/// Resolve the refund amount: defaults to the full payment, never exceeds it.
fn resolve_refund_amount(requested: Option<f64>, paid: f64) -> AppResult<f64> {
    let amount = requested.unwrap_or(paid);
    if amount <= 0.0 {
        return Err(AppError::Validation(
            "Refund amount must be positive".to_string(),
        ));
    }
    if amount > paid {
        return Err(AppError::Validation(
            "Refund amount cannot exceed payment amount".to_string(),
        ));
    }
    Ok(amount)
}

fn card_last4(card_number: Option<&str>) -> Option<String> {
    card_number.map(|n| {
        let digits: String = n.chars().filter(|c| c.is_ascii_digit()).collect();
        let start = digits.len().saturating_sub(4);
        digits[start..].to_string()
    })
}

/// Attempt settlement for a booking.
///
/// The attempt is recorded in `processing` before the simulated gateway
/// round-trip, finalized to `completed` or `failed` after it. Success flips
/// booking status/payment-status and links the payment in one transaction,
/// conditional on the booking still being payable at finalize time; failure
/// leaves the booking untouched so the caller can retry.
pub async fn process_payment(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Uuid,
    input: ProcessPayment,
) -> AppResult<SettlementOutcome> {
    let current = booking::Entity::find_by_id(input.booking_id)
        .filter(booking::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    ensure_payable(&current)?;

    let attempt = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(current.id),
        user_id: Set(user_id),
        amount: Set(current.total_amount),
        method: Set(input.method),
        card_last4: Set(card_last4(input.card_number.as_deref())),
        card_holder: Set(input.card_holder),
        status: Set(PaymentState::Processing),
        transaction_id: Set(None),
        failure_reason: Set(None),
        refund_amount: Set(None),
        refund_reason: Set(None),
        paid_at: Set(None),
        refunded_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    // Simulated gateway latency. Touches no shared seat state; the attempt
    // is non-cancelable once started.
    tokio::time::sleep(Duration::from_millis(config.payment_delay_ms)).await;

    let approved = { rand::thread_rng().gen_bool(config.payment_success_rate) };

    if !approved {
        let reason = "Card declined by issuer (simulated)".to_string();

        let mut failed: payment::ActiveModel = attempt.into();
        failed.status = Set(PaymentState::Failed);
        failed.failure_reason = Set(Some(reason.clone()));
        let failed = failed.update(db).await?;

        tracing::info!(
            payment_id = %failed.id,
            booking_id = %current.id,
            "settlement attempt declined"
        );

        return Err(AppError::PaymentDeclined(reason));
    }

    // The booking may have been cancelled, or paid by a concurrent attempt,
    // while this one slept in the gateway round-trip. The flip is conditional
    // on the booking still being payable; an unconditional write here could
    // resurrect a cancelled booking whose seats were already released.
    let txn = db.begin().await?;

    let flipped = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Confirmed),
            payment_status: Set(PaymentStatus::Paid),
            payment_id: Set(Some(attempt.id)),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(current.id))
        .filter(booking::Column::Status.is_in(FINALIZABLE_BOOKING_STATUSES))
        .filter(booking::Column::PaymentStatus.is_in(FINALIZABLE_PAYMENT_STATUSES))
        .exec(&txn)
        .await?;

    if flipped.rows_affected == 0 {
        txn.rollback().await?;

        let reason = "Booking state changed while the payment was processing".to_string();
        let mut voided: payment::ActiveModel = attempt.into();
        voided.status = Set(PaymentState::Cancelled);
        voided.failure_reason = Set(Some(reason.clone()));
        voided.update(db).await?;

        tracing::warn!(booking_id = %current.id, "settlement aborted: {}", reason);

        return Err(AppError::Conflict(reason));
    }

    let mut completed: payment::ActiveModel = attempt.into();
    completed.status = Set(PaymentState::Completed);
    completed.transaction_id = Set(Some(reference::transaction_id()));
    completed.paid_at = Set(Some(Utc::now().fixed_offset()));
    let completed = completed.update(&txn).await?;

    let paid = booking::Entity::find_by_id(current.id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    txn.commit().await?;

    tracing::info!(
        payment_id = %completed.id,
        booking_id = %paid.id,
        transaction_id = ?completed.transaction_id,
        "settlement completed"
    );

    Ok(SettlementOutcome {
        payment: completed,
        booking: paid,
    })
}

/// Refund a completed payment: the one legitimate way to cancel a paid
/// booking. Payment and booking flip together; the booking's recorded seats
/// are released in the same transaction.
pub async fn refund_payment(
    db: &DatabaseConnection,
    user_id: Uuid,
    payment_id: Uuid,
    input: RefundPayment,
) -> AppResult<RefundOutcome> {
    let current = payment::Entity::find_by_id(payment_id)
        .filter(payment::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    if current.status != PaymentState::Completed {
        return Err(AppError::InvalidTransition(
            "Only completed payments can be refunded".to_string(),
        ));
    }

    let refund_amount = resolve_refund_amount(input.amount, current.amount)?;

    let booking = booking::Entity::find_by_id(current.booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let seat_numbers = booking.seats.0.clone();
    let trip_id = booking.trip_id;

    let txn = db.begin().await?;

    let mut refunded: payment::ActiveModel = current.into();
    refunded.status = Set(PaymentState::Refunded);
    refunded.refund_amount = Set(Some(refund_amount));
    refunded.refund_reason = Set(input.reason);
    refunded.refunded_at = Set(Some(Utc::now().fixed_offset()));
    let refunded = refunded.update(&txn).await?;

    let mut cancelled: booking::ActiveModel = booking.into();
    cancelled.status = Set(BookingStatus::Cancelled);
    cancelled.payment_status = Set(PaymentStatus::Refunded);
    let cancelled = cancelled.update(&txn).await?;

    inventory::release_seats(&txn, trip_id, &seat_numbers).await?;

    txn.commit().await?;

    tracing::info!(
        payment_id = %refunded.id,
        booking_id = %cancelled.id,
        refund_amount,
        "payment refunded, booking cancelled, seats released"
    );

    Ok(RefundOutcome {
        payment: refunded,
        booking: cancelled,
    })
}

pub async fn get_payment(
    db: &DatabaseConnection,
    user_id: Uuid,
    payment_id: Uuid,
) -> AppResult<payment::Model> {
    payment::Entity::find_by_id(payment_id)
        .filter(payment::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
}

pub async fn list_payments(
    db: &DatabaseConnection,
    user_id: Uuid,
    status: Option<PaymentState>,
    page: u64,
    limit: u64,
) -> AppResult<(Vec<payment::Model>, Pagination)> {
    let mut query = payment::Entity::find()
        .filter(payment::Column::UserId.eq(user_id))
        .order_by_desc(payment::Column::CreatedAt);

    if let Some(status) = status {
        query = query.filter(payment::Column::Status.eq(status));
    }

    let paginator = query.paginate(db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok((
        items,
        Pagination::new(page, totals.number_of_pages, totals.number_of_items),
    ))
}

/// Read-only projection of a booking's payment state.
pub async fn payment_status(
    db: &DatabaseConnection,
    user_id: Uuid,
    booking_id: Uuid,
) -> AppResult<(booking::Model, Option<payment::Model>)> {
    let current = booking::Entity::find_by_id(booking_id)
        .filter(booking::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let linked = match current.payment_id {
        Some(id) => payment::Entity::find_by_id(id).one(db).await?,
        None => None,
    };

    Ok((current, linked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seats::SelectedSeats;

    fn booking_with(status: BookingStatus, payment_status: PaymentStatus) -> booking::Model {
        booking::Model {
            id: Uuid::new_v4(),
            booking_reference: "BK-TEST0001".to_string(),
            trip_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            seats: SelectedSeats(vec!["A1".to_string()]),
            total_amount: 50.0,
            status,
            payment_status,
            payment_id: None,
            special_requests: None,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_pending_booking_is_payable() {
        let b = booking_with(BookingStatus::Pending, PaymentStatus::Pending);
        assert!(ensure_payable(&b).is_ok());
    }

    #[test]
    fn test_failed_payment_leaves_booking_retryable() {
        // A prior declined attempt leaves payment_status at pending/failed,
        // not paid, so a retry passes the guard.
        let b = booking_with(BookingStatus::Pending, PaymentStatus::Failed);
        assert!(ensure_payable(&b).is_ok());
    }

    #[test]
    fn test_already_paid_booking_rejected() {
        let b = booking_with(BookingStatus::Confirmed, PaymentStatus::Paid);
        assert!(matches!(
            ensure_payable(&b),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_cancelled_booking_rejected() {
        let b = booking_with(BookingStatus::Cancelled, PaymentStatus::Pending);
        assert!(matches!(
            ensure_payable(&b),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_settlement_finalizes_from_unpaid_states() {
        assert!(can_finalize(BookingStatus::Pending, PaymentStatus::Pending));
        assert!(can_finalize(BookingStatus::Confirmed, PaymentStatus::Pending));
        // a declined attempt leaves payment_status at failed; retry must finalize
        assert!(can_finalize(BookingStatus::Pending, PaymentStatus::Failed));
    }

    #[test]
    fn test_settlement_aborts_when_booking_cancelled_during_processing() {
        // the booking was cancelled (seats released) while this attempt slept
        assert!(!can_finalize(BookingStatus::Cancelled, PaymentStatus::Pending));
    }

    #[test]
    fn test_settlement_aborts_when_concurrent_attempt_already_paid() {
        // a racing attempt finalized first; this one must not double-pay
        assert!(!can_finalize(BookingStatus::Confirmed, PaymentStatus::Paid));
        assert!(!can_finalize(BookingStatus::Completed, PaymentStatus::Paid));
    }

    #[test]
    fn test_refunded_booking_not_payable_again() {
        let b = booking_with(BookingStatus::Cancelled, PaymentStatus::Refunded);
        assert!(matches!(
            ensure_payable(&b),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_refund_defaults_to_full_amount() {
        assert_eq!(resolve_refund_amount(None, 120.0).unwrap(), 120.0);
    }

    #[test]
    fn test_partial_refund_allowed() {
        assert_eq!(resolve_refund_amount(Some(40.0), 120.0).unwrap(), 40.0);
    }

    #[test]
    fn test_refund_cannot_exceed_payment() {
        assert!(matches!(
            resolve_refund_amount(Some(121.0), 120.0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_refund_must_be_positive() {
        assert!(matches!(
            resolve_refund_amount(Some(0.0), 120.0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_card_last4_strips_separators() {
        assert_eq!(
            card_last4(Some("4111 1111 1111 1234")).as_deref(),
            Some("1234")
        );
        assert_eq!(card_last4(Some("89")).as_deref(), Some("89"));
        assert_eq!(card_last4(None), None);
    }
}

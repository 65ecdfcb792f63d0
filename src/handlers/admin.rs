use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentState};
use crate::entities::trip::{self, TripStatus};
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::services::trips::{CreateTrip, UpdateTrip};
use crate::services::{self, Pagination};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Trip Management ============

/// Create a trip; the seat map is generated from the seat count
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTrip>,
) -> AppResult<Json<trip::Model>> {
    let created = services::trips::create_trip(&state.db, claims.sub, payload).await?;
    Ok(Json(created))
}

/// Update trip commercial and schedule fields
pub async fn update_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<UpdateTrip>,
) -> AppResult<Json<trip::Model>> {
    let updated = services::trips::update_trip(&state.db, trip_id, payload).await?;
    Ok(Json(updated))
}

/// Soft-delete a trip without active bookings
pub async fn delete_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    services::trips::delete_trip(&state.db, trip_id).await?;
    Ok(Json(serde_json::json!({ "message": "Trip deleted" })))
}

// ============ Dashboard ============

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_trips: u64,
    pub total_bookings: u64,
    pub total_users: u64,
    pub total_revenue: f64,
}

pub async fn dashboard_stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let total_trips = trip::Entity::find()
        .filter(trip::Column::IsDeleted.eq(false))
        .filter(trip::Column::Status.eq(TripStatus::Active))
        .count(&state.db)
        .await?;

    let total_bookings = booking::Entity::find().count(&state.db).await?;
    let total_users = user::Entity::find().count(&state.db).await?;

    let total_revenue: f64 = payment::Entity::find()
        .filter(payment::Column::Status.eq(PaymentState::Completed))
        .all(&state.db)
        .await?
        .iter()
        .map(|p| p.amount)
        .sum();

    Ok(Json(DashboardStats {
        total_trips,
        total_bookings,
        total_users,
        total_revenue,
    }))
}

// ============ User Management ============

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<UserListResponse>> {
    let (page, limit) = services::normalize_paging(query.page, query.limit);

    let mut finder = user::Entity::find().order_by_desc(user::Column::CreatedAt);
    if let Some(role) = query.role {
        finder = finder.filter(user::Column::Role.eq(role));
    }

    let paginator = finder.paginate(&state.db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let users = paginator.fetch_page(page - 1).await?;

    Ok(Json(UserListResponse {
        users: users
            .into_iter()
            .map(|u| UserResponse {
                id: u.id,
                email: u.email,
                name: u.name,
                role: u.role,
                created_at: u.created_at.with_timezone(&Utc),
            })
            .collect(),
        pagination: Pagination::new(page, totals.number_of_pages, totals.number_of_items),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let account = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = account.into();
    active.role = Set(payload.role.clone());
    let updated = active.update(&state.db).await?;

    Ok(Json(UserResponse {
        id: updated.id,
        email: updated.email,
        name: updated.name,
        role: updated.role,
        created_at: updated.created_at.with_timezone(&Utc),
    }))
}

/// Delete a user account. Rejected while the user still holds active
/// bookings, since their seats would be stranded.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let account = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let active_bookings = booking::Entity::find()
        .filter(booking::Column::UserId.eq(user_id))
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled))
        .count(&state.db)
        .await?;

    if active_bookings > 0 {
        return Err(AppError::Conflict(format!(
            "Cannot delete user with {} active booking(s)",
            active_bookings
        )));
    }

    user::Entity::delete_by_id(account.id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Booking / Payment Oversight ============

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Serialize)]
pub struct AdminBookingListResponse {
    pub bookings: Vec<booking::Model>,
    pub pagination: Pagination,
}

pub async fn list_all_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<AdminBookingListResponse>> {
    let (page, limit) = services::normalize_paging(query.page, query.limit);

    let mut finder = booking::Entity::find().order_by_desc(booking::Column::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(booking::Column::Status.eq(status));
    }

    let paginator = finder.paginate(&state.db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let bookings = paginator.fetch_page(page - 1).await?;

    Ok(Json(AdminBookingListResponse {
        bookings,
        pagination: Pagination::new(page, totals.number_of_pages, totals.number_of_items),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<PaymentState>,
}

#[derive(Debug, Serialize)]
pub struct AdminPaymentListResponse {
    pub payments: Vec<payment::Model>,
    pub pagination: Pagination,
}

pub async fn list_all_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<AdminPaymentListResponse>> {
    let (page, limit) = services::normalize_paging(query.page, query.limit);

    let mut finder = payment::Entity::find().order_by_desc(payment::Column::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(payment::Column::Status.eq(status));
    }

    let paginator = finder.paginate(&state.db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let payments = paginator.fetch_page(page - 1).await?;

    Ok(Json(AdminPaymentListResponse {
        payments,
        pagination: Pagination::new(page, totals.number_of_pages, totals.number_of_items),
    }))
}

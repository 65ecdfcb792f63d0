use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, bookings, payments, trips};
use crate::middleware::auth::{auth_middleware, require_admin, require_traveller};
use crate::middleware::rate_limit::create_public_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();

    // Public routes (rate limited per IP)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let public_routes = Router::new()
        .route("/trips", get(trips::list_trips))
        .route("/trips/search", get(trips::search_trips))
        .route("/trips/{id}", get(trips::get_trip))
        .route("/trips/{id}/seats", get(trips::trip_seats))
        .layer(public_governor);

    // Traveller booking routes (requires auth + traveller role)
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/", get(bookings::my_bookings))
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}", put(bookings::update_booking))
        .route("/{id}", delete(bookings::cancel_booking))
        .layer(middleware::from_fn(require_traveller))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Traveller payment routes (requires auth + traveller role)
    let payment_routes = Router::new()
        .route("/", post(payments::process_payment))
        .route("/", get(payments::my_payments))
        .route("/{id}", get(payments::get_payment))
        .route("/{id}/refund", post(payments::refund_payment))
        .route("/booking/{booking_id}", get(payments::booking_payment_status))
        .layer(middleware::from_fn(require_traveller))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        // Trip management
        .route("/trips", post(admin::create_trip))
        .route("/trips/{id}", put(admin::update_trip))
        .route("/trips/{id}", delete(admin::delete_trip))
        // Oversight
        .route("/stats", get(admin::dashboard_stats))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/bookings", get(admin::list_all_bookings))
        .route("/payments", get(admin::list_all_payments))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}

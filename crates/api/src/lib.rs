//! HTTP API server for the PG rental booking platform.
//!
//! Provides REST endpoints for booking rooms, submitting payments and the
//! admin verification dashboard, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use entity_store::EntityStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::{AppState, admin, bookings};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EntityStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/book-room", post(bookings::book_room::<S>))
        .route("/upload-payment", post(bookings::upload_payment::<S>))
        .route("/bookings", get(bookings::list::<S>))
        .route("/booking/{id}", get(bookings::get::<S>))
        .route("/booking/{id}/cancel", post(bookings::cancel::<S>))
        .route("/admin/pending-bookings", get(admin::pending_bookings::<S>))
        .route("/admin/verify-payment/{id}", post(admin::verify_payment::<S>))
        .route("/admin/reject-payment/{id}", post(admin::reject_payment::<S>))
        .route("/admin/stats", get(admin::stats::<S>))
        .route("/admin/add-pg", post(admin::add_location::<S>))
        .route("/admin/add-room", post(admin::add_room::<S>))
        .route("/admin/update-room/{id}", put(admin::update_room::<S>))
        .route("/admin/room/{id}", delete(admin::delete_room::<S>));

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
pub fn create_state<S: EntityStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}

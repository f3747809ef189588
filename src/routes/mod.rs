use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod availability;
pub mod booking;
pub mod business;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod notification;
pub mod params;
pub mod search;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/business", business::router(max_upload_bytes))
        .nest("/businesses", availability::router())
        .nest("/booking", booking::router())
        // clients call the listing with a trailing slash
        .route("/booking/", get(booking::list_bookings))
        .nest("/favorite", favorites::router())
        .nest("/notification", notification::router())
        .nest("/search", search::router())
}

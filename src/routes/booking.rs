use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::booking::{
        BookingView, BusinessClient, CancelledBooking, CreateBookingRequest, CreatedBooking,
        OwnerBookingView,
    },
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/create", post(create_booking))
        .route("/getBookings", get(list_owner_bookings))
        .route("/clients/{business_id}", get(list_business_clients))
        .route("/{id}", get(get_booking))
        .route("/{id}/cancel", put(cancel_booking))
}

#[utoipa::path(
    post,
    path = "/api/booking/create",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<CreatedBooking>),
        (status = 400, description = "Invalid request or unknown service title"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Business not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Booking"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedBooking>>)> {
    let resp = booking_service::create_booking(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/booking/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking detail", body = ApiResponse<BookingView>),
        (status = 404, description = "Booking not found")
    ),
    tag = "Booking"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingView>>> {
    let resp = booking_service::get_booking(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/booking/",
    responses(
        (status = 200, description = "Caller's bookings from the last 7 days", body = ApiResponse<Vec<BookingView>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Booking"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<BookingView>>>> {
    let resp = booking_service::list_client_bookings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/booking/getBookings",
    responses(
        (status = 200, description = "Bookings across the caller's businesses", body = ApiResponse<Vec<OwnerBookingView>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Booking"
)]
pub async fn list_owner_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<OwnerBookingView>>>> {
    let resp = booking_service::list_owner_bookings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/booking/clients/{business_id}",
    params(
        ("business_id" = Uuid, Path, description = "Business ID")
    ),
    responses(
        (status = 200, description = "Clients that booked the business", body = ApiResponse<Vec<BusinessClient>>),
        (status = 403, description = "Caller does not own the business"),
        (status = 404, description = "Business not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Booking"
)]
pub async fn list_business_clients(
    State(state): State<AppState>,
    user: AuthUser,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<BusinessClient>>>> {
    let resp = booking_service::list_business_clients(&state, &user, business_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/booking/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<CancelledBooking>),
        (status = 400, description = "Booking already cancelled"),
        (status = 403, description = "Caller is neither the client nor the owner"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Booking"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CancelledBooking>>> {
    let resp = booking_service::cancel_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

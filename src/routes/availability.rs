use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::availability::{AvailabilityEntryRequest, AvailabilityView, DayHoursRequest},
    error::AppResult,
    middleware::json::ApiJson,
    response::ApiResponse,
    services::availability_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{business_id}/availability",
            get(get_availability).post(upsert_availability),
        )
        .route(
            "/{business_id}/availability/{day}",
            put(update_day).delete(delete_day),
        )
}

#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/availability",
    params(
        ("business_id" = Uuid, Path, description = "Business ID")
    ),
    responses(
        (status = 200, description = "Weekly hours, Monday first", body = ApiResponse<Vec<AvailabilityView>>),
        (status = 404, description = "Business not found")
    ),
    tag = "Availability"
)]
pub async fn get_availability(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<AvailabilityView>>>> {
    let resp = availability_service::get_availability(&state, business_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/businesses/{business_id}/availability",
    params(
        ("business_id" = Uuid, Path, description = "Business ID")
    ),
    request_body = Vec<AvailabilityEntryRequest>,
    responses(
        (status = 200, description = "Availability saved", body = ApiResponse<Vec<AvailabilityView>>),
        (status = 400, description = "Invalid entry; nothing was saved"),
        (status = 404, description = "Business not found")
    ),
    tag = "Availability"
)]
pub async fn upsert_availability(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
    ApiJson(entries): ApiJson<Vec<AvailabilityEntryRequest>>,
) -> AppResult<Json<ApiResponse<Vec<AvailabilityView>>>> {
    let resp = availability_service::upsert_availability(&state, business_id, entries).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/businesses/{business_id}/availability/{day}",
    params(
        ("business_id" = Uuid, Path, description = "Business ID"),
        ("day" = String, Path, description = "Weekday name")
    ),
    request_body = DayHoursRequest,
    responses(
        (status = 200, description = "Day updated", body = ApiResponse<AvailabilityView>),
        (status = 400, description = "Invalid day or hours"),
        (status = 404, description = "Business or day not found")
    ),
    tag = "Availability"
)]
pub async fn update_day(
    State(state): State<AppState>,
    Path((business_id, day)): Path<(Uuid, String)>,
    ApiJson(payload): ApiJson<DayHoursRequest>,
) -> AppResult<Json<ApiResponse<AvailabilityView>>> {
    let resp = availability_service::update_day(&state, business_id, &day, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/businesses/{business_id}/availability/{day}",
    params(
        ("business_id" = Uuid, Path, description = "Business ID"),
        ("day" = String, Path, description = "Weekday name")
    ),
    responses(
        (status = 200, description = "Day removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Business or day not found")
    ),
    tag = "Availability"
)]
pub async fn delete_day(
    State(state): State<AppState>,
    Path((business_id, day)): Path<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = availability_service::delete_day(&state, business_id, &day).await?;
    Ok(Json(resp))
}

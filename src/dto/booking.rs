use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::amount::Amount,
    error::{AppError, AppResult},
    models::{BookingStatus, Coordinates},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub business_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub datetime: Option<DateTime<Utc>>,
    pub services: Option<Vec<BookingServiceRequest>>,
    pub total_price: Option<Amount>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookingServiceRequest {
    pub title: Option<String>,
    pub price: Option<Amount>,
    /// Duration in minutes.
    pub time: Option<i32>,
}

/// A booking request that passed validation; every field is present.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub datetime: DateTime<Utc>,
    pub services: Vec<RequestedService>,
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestedService {
    pub title: String,
    pub price: i64,
    pub duration: i32,
}

impl CreateBookingRequest {
    pub fn validate(self) -> AppResult<NewBooking> {
        let business_id = self
            .business_id
            .ok_or_else(|| AppError::bad_request("business_id is required"))?;
        let datetime = self
            .datetime
            .ok_or_else(|| AppError::bad_request("datetime is required"))?;
        let total_price = self
            .total_price
            .ok_or_else(|| AppError::bad_request("total_price is required"))?
            .0;
        let requested = self
            .services
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::bad_request("services must contain at least one service"))?;

        let services = requested
            .into_iter()
            .enumerate()
            .map(|(i, service)| service.validate(i))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(NewBooking {
            business_id,
            staff_id: self.staff_id,
            datetime,
            services,
            total_price,
        })
    }
}

impl BookingServiceRequest {
    fn validate(self, index: usize) -> AppResult<RequestedService> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::bad_request(format!("services[{index}].title is required")))?;
        let price = self
            .price
            .ok_or_else(|| AppError::bad_request(format!("services[{index}].price is required")))?
            .0;
        let duration = self.time.filter(|t| *t > 0).ok_or_else(|| {
            AppError::bad_request(format!(
                "services[{index}].time must be a positive number of minutes"
            ))
        })?;
        Ok(RequestedService {
            title,
            price,
            duration,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedBooking {
    pub booking_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BookedService {
    pub title: String,
    /// Minutes, as booked.
    pub time: i32,
    /// Price as booked.
    pub price: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffSummary {
    pub id: Uuid,
    pub name: String,
    pub rating: Option<f64>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingBusiness {
    pub id: Uuid,
    pub name: String,
    pub phone_number: Option<String>,
    pub image: Vec<String>,
    pub rating: f64,
    pub coordinates: Coordinates,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingView {
    pub id: Uuid,
    pub business: BookingBusiness,
    pub service: Vec<BookedService>,
    pub staff: Option<StaffSummary>,
    pub datetime: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub total: i64,
    pub status: BookingStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientSummary {
    pub id: Uuid,
    pub name: String,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerBookingView {
    pub id: Uuid,
    pub client: ClientSummary,
    pub business_id: Uuid,
    pub business_name: String,
    pub staff: Option<StaffSummary>,
    pub status: BookingStatus,
    pub datetime: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub service: Vec<BookedService>,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelledBooking {
    pub id: Uuid,
    pub status: BookingStatus,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct BusinessClient {
    pub id: Uuid,
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> CreateBookingRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn valid_request_keeps_submitted_prices() {
        let business_id = Uuid::new_v4();
        let booking = parse(json!({
            "business_id": business_id,
            "datetime": "2026-10-20T10:00:00Z",
            "services": [{ "title": " Cut ", "price": "20", "time": 30 }],
            "total_price": 20
        }))
        .validate()
        .unwrap();

        assert_eq!(booking.business_id, business_id);
        assert_eq!(booking.staff_id, None);
        assert_eq!(
            booking.services,
            vec![RequestedService {
                title: "Cut".into(),
                price: 20,
                duration: 30
            }]
        );
    }

    #[test]
    fn missing_fields_are_named() {
        let err = parse(json!({
            "datetime": "2026-10-20T10:00:00Z",
            "services": [],
            "total_price": 20
        }))
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "business_id is required");

        let err = parse(json!({
            "business_id": Uuid::new_v4(),
            "datetime": "2026-10-20T10:00:00Z",
            "services": [],
            "total_price": 20
        }))
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "services must contain at least one service");
    }

    #[test]
    fn line_item_errors_point_at_the_entry() {
        let err = parse(json!({
            "business_id": Uuid::new_v4(),
            "datetime": "2026-10-20T10:00:00Z",
            "services": [
                { "title": "Cut", "price": 20, "time": 30 },
                { "title": "Shave", "price": 10, "time": 0 }
            ],
            "total_price": 30
        }))
        .validate()
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "services[1].time must be a positive number of minutes"
        );
    }
}

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QuerySelect,
    RelationTrait, Set, TransactionTrait,
    sea_query::{JoinType, LockType},
};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    dto::booking::{
        BookedService, BookingBusiness, BookingView, BusinessClient, CancelledBooking,
        ClientSummary, CreateBookingRequest, CreatedBooking, OwnerBookingView, RequestedService,
        StaffSummary,
    },
    entity::{
        BookingServices, Bookings, BusinessProfiles, BusinessStaff, Services, booking_services,
        bookings, service_categories, services, users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BookingStatus, Coordinates},
    notifications::{BookingEvent, BookingNotice, spawn_booking_notices},
    response::ApiResponse,
    state::AppState,
};

/// Bookings older than this drop out of the client's own listing.
const RECENT_BOOKINGS_DAYS: i64 = 7;

/// A service offered by the business being booked.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogService {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Match every requested title (ignoring case) against the business catalog.
///
/// Fails on the first title with no match; nothing is partially resolved.
pub fn resolve_services<'a>(
    catalog: &'a [CatalogService],
    requested: &[RequestedService],
) -> AppResult<Vec<&'a CatalogService>> {
    requested
        .iter()
        .map(|wanted| {
            catalog
                .iter()
                .find(|s| s.title.trim().to_lowercase() == wanted.title.to_lowercase())
                .ok_or_else(|| {
                    AppError::bad_request(format!("Service not found: {}", wanted.title))
                })
        })
        .collect()
}

pub async fn create_booking(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<CreatedBooking>> {
    let booking = payload.validate()?;
    let txn = state.orm.begin().await?;

    BusinessProfiles::find_by_id(booking.business_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Business"))?;

    if let Some(staff_id) = booking.staff_id {
        let staff = BusinessStaff::find_by_id(staff_id).one(&txn).await?;
        if staff.is_none_or(|s| s.business_id != booking.business_id) {
            return Err(AppError::bad_request(
                "Staff member does not belong to this business",
            ));
        }
    }

    let catalog: Vec<CatalogService> = Services::find()
        .select_only()
        .column(services::Column::Id)
        .column(services::Column::Title)
        .column(services::Column::Description)
        .join(JoinType::InnerJoin, services::Relation::ServiceCategories.def())
        .filter(service_categories::Column::BusinessId.eq(booking.business_id))
        .into_tuple::<(Uuid, String, Option<String>)>()
        .all(&txn)
        .await?
        .into_iter()
        .map(|(id, title, description)| CatalogService {
            id,
            title,
            description,
        })
        .collect();
    let matched = resolve_services(&catalog, &booking.services)?;

    let booking_id = Uuid::new_v4();
    bookings::ActiveModel {
        id: Set(booking_id),
        user_id: Set(user.user_id),
        business_id: Set(booking.business_id),
        staff_id: Set(booking.staff_id),
        datetime: Set(booking.datetime.into()),
        status: Set(BookingStatus::Confirmed.as_str().to_string()),
        total_price: Set(booking.total_price),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let line_items = booking
        .services
        .iter()
        .zip(matched)
        .map(|(requested, service)| booking_services::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            service_id: Set(Some(service.id)),
            title: Set(service.title.clone()),
            description: Set(service.description.clone()),
            price: Set(requested.price),
            duration: Set(requested.duration),
            created_at: NotSet,
        });
    BookingServices::insert_many(line_items)
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;
    tracing::info!(
        booking_id = %booking_id,
        business_id = %booking.business_id,
        user_id = %user.user_id,
        services = booking.services.len(),
        "booking created"
    );

    spawn_booking_notices(
        state.pool.clone(),
        state.notifier.clone(),
        BookingNotice {
            booking_id,
            client_id: user.user_id,
            business_id: booking.business_id,
            event: BookingEvent::Created,
        },
    );

    Ok(ApiResponse::ok(
        "Booking created",
        CreatedBooking { booking_id },
    ))
}

pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
) -> AppResult<ApiResponse<CancelledBooking>> {
    let txn = state.orm.begin().await?;

    users::Entity::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;

    let booking = Bookings::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Booking"))?;

    let owner_id = BusinessProfiles::find_by_id(booking.business_id)
        .one(&txn)
        .await?
        .map(|business| business.user_id);
    if booking.user_id != user.user_id && owner_id != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }

    let current: BookingStatus = booking
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    if !current.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::Conflict("Booking is already cancelled".into()));
    }

    let client_id = booking.user_id;
    let business_id = booking.business_id;
    let mut active: bookings::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Cancelled.as_str().to_string());
    active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %booking_id, cancelled_by = %user.user_id, "booking cancelled");

    spawn_booking_notices(
        state.pool.clone(),
        state.notifier.clone(),
        BookingNotice {
            booking_id,
            client_id,
            business_id,
            event: BookingEvent::Cancelled,
        },
    );

    Ok(ApiResponse::ok(
        "Booking cancelled",
        CancelledBooking {
            id: booking_id,
            status: BookingStatus::Cancelled,
            message: "Booking cancelled successfully".into(),
        },
    ))
}

// One row per booking; line items are folded with json_agg and business
// images come from a subquery so they do not multiply the line items.
const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.datetime, b.created_at, b.total_price, b.status,
           bp.id AS business_id, bp.name AS business_name, bp.phone_number,
           bp.rating AS business_rating, bp.latitude, bp.longitude, bp.location,
           COALESCE(
               (SELECT array_agg(bi.image ORDER BY bi.created_at)
                FROM business_images bi WHERE bi.business_id = bp.id),
               '{}'::text[]
           ) AS images,
           st.id AS staff_id, st.name AS staff_name, st.rating AS staff_rating,
           st.image AS staff_image,
           cl.name AS client_name, cl.last_name AS client_last_name,
           COALESCE(
               json_agg(json_build_object(
                   'title', bs.title,
                   'time', bs.duration,
                   'price', bs.price,
                   'description', bs.description
               ) ORDER BY bs.created_at) FILTER (WHERE bs.id IS NOT NULL),
               '[]'::json
           ) AS services
    FROM bookings b
    JOIN business_profiles bp ON bp.id = b.business_id
    JOIN users cl ON cl.id = b.user_id
    LEFT JOIN business_staff st ON st.id = b.staff_id
    LEFT JOIN booking_services bs ON bs.booking_id = b.id
"#;

const BOOKING_GROUP_BY: &str = "GROUP BY b.id, bp.id, st.id, cl.id";

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    datetime: DateTime<Utc>,
    created_at: DateTime<Utc>,
    total_price: i64,
    status: String,
    business_id: Uuid,
    business_name: String,
    phone_number: Option<String>,
    business_rating: f64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location: Option<String>,
    images: Vec<String>,
    staff_id: Option<Uuid>,
    staff_name: Option<String>,
    staff_rating: Option<f64>,
    staff_image: Option<String>,
    client_name: String,
    client_last_name: Option<String>,
    services: Json<Vec<BookedService>>,
}

impl BookingRow {
    fn status(&self) -> AppResult<BookingStatus> {
        self.status
            .parse()
            .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))
    }

    fn staff(&self) -> Option<StaffSummary> {
        let id = self.staff_id?;
        Some(StaffSummary {
            id,
            name: self.staff_name.clone().unwrap_or_default(),
            rating: self.staff_rating,
            image: self.staff_image.clone(),
        })
    }

    fn into_view(self) -> AppResult<BookingView> {
        let status = self.status()?;
        let staff = self.staff();
        Ok(BookingView {
            id: self.id,
            business: BookingBusiness {
                id: self.business_id,
                name: self.business_name,
                phone_number: self.phone_number,
                image: self.images,
                rating: self.business_rating,
                coordinates: Coordinates {
                    latitude: self.latitude,
                    longitude: self.longitude,
                    location: self.location,
                },
            },
            service: self.services.0,
            staff,
            datetime: self.datetime,
            created_at: self.created_at,
            total: self.total_price,
            status,
        })
    }

    fn into_owner_view(self) -> AppResult<OwnerBookingView> {
        let status = self.status()?;
        let staff = self.staff();
        Ok(OwnerBookingView {
            id: self.id,
            client: ClientSummary {
                id: self.user_id,
                name: self.client_name,
                last_name: self.client_last_name,
            },
            business_id: self.business_id,
            business_name: self.business_name,
            staff,
            status,
            datetime: self.datetime,
            created_at: self.created_at,
            service: self.services.0,
            total: self.total_price,
        })
    }
}

pub async fn get_booking(
    state: &AppState,
    booking_id: Uuid,
) -> AppResult<ApiResponse<BookingView>> {
    let sql = format!("{BOOKING_SELECT} WHERE b.id = $1 {BOOKING_GROUP_BY}");
    let row = sqlx::query_as::<_, BookingRow>(&sql)
        .bind(booking_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Booking"))?;

    Ok(ApiResponse::ok("OK", row.into_view()?))
}

pub async fn list_client_bookings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<BookingView>>> {
    let since = Utc::now() - Duration::days(RECENT_BOOKINGS_DAYS);
    let sql = format!(
        "{BOOKING_SELECT} WHERE b.user_id = $1 AND b.created_at >= $2 {BOOKING_GROUP_BY} ORDER BY b.created_at DESC"
    );
    let rows = sqlx::query_as::<_, BookingRow>(&sql)
        .bind(user.user_id)
        .bind(since)
        .fetch_all(&state.pool)
        .await?;

    let bookings = rows
        .into_iter()
        .map(BookingRow::into_view)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok("OK", bookings))
}

pub async fn list_owner_bookings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<OwnerBookingView>>> {
    let sql = format!(
        "{BOOKING_SELECT} WHERE bp.user_id = $1 {BOOKING_GROUP_BY} ORDER BY b.created_at DESC"
    );
    let rows = sqlx::query_as::<_, BookingRow>(&sql)
        .bind(user.user_id)
        .fetch_all(&state.pool)
        .await?;

    let bookings = rows
        .into_iter()
        .map(BookingRow::into_owner_view)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok("OK", bookings))
}

pub async fn list_business_clients(
    state: &AppState,
    user: &AuthUser,
    business_id: Uuid,
) -> AppResult<ApiResponse<Vec<BusinessClient>>> {
    let owner: Option<(Uuid,)> =
        sqlx::query_as("SELECT user_id FROM business_profiles WHERE id = $1")
            .bind(business_id)
            .fetch_optional(&state.pool)
            .await?;
    match owner {
        None => return Err(AppError::NotFound("Business")),
        Some((owner_id,)) if owner_id != user.user_id => return Err(AppError::Forbidden),
        Some(_) => {}
    }

    let clients = sqlx::query_as::<_, BusinessClient>(
        r#"
        SELECT DISTINCT u.id, u.name, u.last_name, u.email
        FROM bookings b
        JOIN users u ON u.id = b.user_id
        WHERE b.business_id = $1
        ORDER BY u.name, u.id
        "#,
    )
    .bind(business_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok("OK", clients))
}

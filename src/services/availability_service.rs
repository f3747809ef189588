use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    dto::availability::{
        AvailabilityEntryRequest, AvailabilityView, DayHours, DayHoursRequest, parse_day,
    },
    entity::{BusinessAvailability, BusinessProfiles, business_availability},
    error::{AppError, AppResult},
    response::ApiResponse,
    state::AppState,
};

async fn ensure_business<C: ConnectionTrait>(conn: &C, business_id: Uuid) -> AppResult<()> {
    BusinessProfiles::find_by_id(business_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Business"))?;
    Ok(())
}

async fn load_week(state: &AppState, business_id: Uuid) -> AppResult<Vec<AvailabilityView>> {
    let rows = BusinessAvailability::find()
        .filter(business_availability::Column::BusinessId.eq(business_id))
        .all(&state.orm)
        .await?;
    let mut week: Vec<AvailabilityView> = rows
        .into_iter()
        .filter_map(AvailabilityView::from_model)
        .collect();
    week.sort_by_key(|entry| entry.day);
    Ok(week)
}

pub async fn get_availability(
    state: &AppState,
    business_id: Uuid,
) -> AppResult<ApiResponse<Vec<AvailabilityView>>> {
    ensure_business(&state.orm, business_id).await?;
    Ok(ApiResponse::ok("OK", load_week(state, business_id).await?))
}

fn upsert_model(business_id: Uuid, hours: &DayHours) -> business_availability::ActiveModel {
    business_availability::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(business_id),
        day: Set(hours.day.as_str().to_string()),
        is_closed: Set(hours.hours.is_closed()),
        open_time: Set(hours.hours.open_time()),
        close_time: Set(hours.hours.close_time()),
        updated_at: Set(Utc::now().into()),
    }
}

/// Replace the stored hours of every submitted day. One bad entry rolls the
/// whole batch back.
pub async fn upsert_availability(
    state: &AppState,
    business_id: Uuid,
    entries: Vec<AvailabilityEntryRequest>,
) -> AppResult<ApiResponse<Vec<AvailabilityView>>> {
    if entries.is_empty() {
        return Err(AppError::bad_request(
            "availability must contain at least one day",
        ));
    }

    let txn = state.orm.begin().await?;
    ensure_business(&txn, business_id).await?;

    for entry in &entries {
        let hours = entry.validate()?;
        BusinessAvailability::insert(upsert_model(business_id, &hours))
            .on_conflict(
                OnConflict::columns([
                    business_availability::Column::BusinessId,
                    business_availability::Column::Day,
                ])
                .update_columns([
                    business_availability::Column::IsClosed,
                    business_availability::Column::OpenTime,
                    business_availability::Column::CloseTime,
                    business_availability::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    tracing::info!(business_id = %business_id, days = entries.len(), "availability saved");
    Ok(ApiResponse::ok(
        "Availability saved",
        load_week(state, business_id).await?,
    ))
}

pub async fn update_day(
    state: &AppState,
    business_id: Uuid,
    day: &str,
    payload: DayHoursRequest,
) -> AppResult<ApiResponse<AvailabilityView>> {
    let day = parse_day(day)?;
    ensure_business(&state.orm, business_id).await?;
    let hours = payload.validate(day)?;

    let existing = BusinessAvailability::find()
        .filter(business_availability::Column::BusinessId.eq(business_id))
        .filter(business_availability::Column::Day.eq(day.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Availability"))?;

    let mut active: business_availability::ActiveModel = existing.into();
    active.is_closed = Set(hours.hours.is_closed());
    active.open_time = Set(hours.hours.open_time());
    active.close_time = Set(hours.hours.close_time());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    let view = AvailabilityView::from_model(updated)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("stored day is not a weekday")))?;
    Ok(ApiResponse::ok("Availability updated", view))
}

pub async fn delete_day(
    state: &AppState,
    business_id: Uuid,
    day: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let day = parse_day(day)?;
    ensure_business(&state.orm, business_id).await?;

    let result = BusinessAvailability::delete_many()
        .filter(business_availability::Column::BusinessId.eq(business_id))
        .filter(business_availability::Column::Day.eq(day.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Availability"));
    }
    Ok(ApiResponse::ok(
        "Availability deleted",
        serde_json::json!({ "day": day }),
    ))
}

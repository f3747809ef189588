use uuid::Uuid;

use crate::{
    dto::search::{RecentSearch, SaveSearchRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    state::AppState,
};

const RECENT_SEARCH_LIMIT: i64 = 10;

fn required<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(value)
}

/// Store a search, or refresh the timestamp of an identical one.
pub async fn save_search(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: SaveSearchRequest,
) -> AppResult<ApiResponse<RecentSearch>> {
    let from_city = required(&payload.from, "from")?;
    let to_city = required(&payload.to, "to")?;
    let from_entity_id = required(&payload.from_entity_id, "fromEntityId")?;
    let to_entity_id = required(&payload.to_entity_id, "toEntityId")?;
    let cabin_class = required(&payload.cabin_class, "cabinClass")?;
    let passengers = payload.passengers;
    if passengers.adult < 1 || passengers.child < 0 || passengers.infant < 0 {
        return Err(AppError::bad_request(
            "passengers needs at least one adult and no negative counts",
        ));
    }
    if payload.return_date.is_some_and(|r| r < payload.departure) {
        return Err(AppError::bad_request("return must not be before departure"));
    }

    let search = sqlx::query_as::<_, RecentSearch>(
        r#"
        INSERT INTO recent_searches (
            id, user_id, from_city, to_city, from_entity_id, to_entity_id,
            from_sky_id, to_sky_id, departure_date, return_date, cabin_class,
            adults, children, infants, book_type
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT ON CONSTRAINT unique_search_per_user DO UPDATE
        SET created_at = NOW(),
            adults = EXCLUDED.adults,
            children = EXCLUDED.children,
            infants = EXCLUDED.infants,
            book_type = EXCLUDED.book_type
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.map(|u| u.user_id))
    .bind(from_city)
    .bind(to_city)
    .bind(from_entity_id)
    .bind(to_entity_id)
    .bind(payload.from_sky_id.as_deref())
    .bind(payload.to_sky_id.as_deref())
    .bind(payload.departure)
    .bind(payload.return_date)
    .bind(cabin_class)
    .bind(passengers.adult)
    .bind(passengers.child)
    .bind(passengers.infant)
    .bind(payload.book_type.as_deref())
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::ok("Search saved", search))
}

pub async fn recent_searches(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<RecentSearch>>> {
    let searches = sqlx::query_as::<_, RecentSearch>(
        r#"
        SELECT *
        FROM recent_searches
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.user_id)
    .bind(RECENT_SEARCH_LIMIT)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok("OK", searches))
}

pub async fn delete_search(
    state: &AppState,
    user: &AuthUser,
    search_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM recent_searches WHERE id = $1 AND user_id = $2")
        .bind(search_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Search"));
    }
    Ok(ApiResponse::ok("Search deleted", serde_json::json!({ "id": search_id })))
}

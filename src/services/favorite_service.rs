use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    dto::favorites::{AddFavoriteRequest, FavoriteBusiness},
    entity::{BusinessProfiles, Favorites, favorites},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Coordinates,
    response::ApiResponse,
    state::AppState,
};

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    id: Uuid,
    name: String,
    rating: f64,
    tag: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location: Option<String>,
    images: Vec<String>,
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<FavoriteBusiness>>> {
    let rows = sqlx::query_as::<_, FavoriteRow>(
        r#"
        SELECT bp.id, bp.name, bp.rating, bp.tag, bp.latitude, bp.longitude, bp.location,
               COALESCE(
                   (SELECT array_agg(bi.image ORDER BY bi.created_at)
                    FROM business_images bi WHERE bi.business_id = bp.id),
                   '{}'::text[]
               ) AS images
        FROM favorites f
        JOIN business_profiles bp ON bp.id = f.business_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let data = rows
        .into_iter()
        .map(|row| FavoriteBusiness {
            id: row.id,
            name: row.name,
            rating: row.rating,
            tag: row.tag,
            image: row.images,
            coordinates: Coordinates {
                latitude: row.latitude,
                longitude: row.longitude,
                location: row.location,
            },
        })
        .collect();
    Ok(ApiResponse::ok("OK", data))
}

/// Adding a business that is already a favorite is a no-op.
pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    BusinessProfiles::find_by_id(payload.business_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Business"))?;

    let inserted = Favorites::insert(favorites::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        business_id: Set(payload.business_id),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([favorites::Column::UserId, favorites::Column::BusinessId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    tracing::debug!(
        user_id = %user.user_id,
        business_id = %payload.business_id,
        inserted,
        "favorite added"
    );
    Ok(ApiResponse::ok(
        "Added to favorites",
        serde_json::json!({ "business_id": payload.business_id }),
    ))
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    business_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    Favorites::delete_many()
        .filter(favorites::Column::UserId.eq(user.user_id))
        .filter(favorites::Column::BusinessId.eq(business_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::ok(
        "Removed from favorites",
        serde_json::json!({ "business_id": business_id }),
    ))
}

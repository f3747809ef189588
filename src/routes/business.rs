use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State,
        multipart::{Field, MultipartRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    dto::business::{BusinessView, CreateBusinessRequest, CreatedBusiness},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::business_service::{self, MAX_IMAGES_PER_FIELD},
    state::AppState,
    storage::UploadedFile,
};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/create",
            post(create_business).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/businesses", get(list_businesses))
        .route("/item/{id}", get(get_business))
        .route("/{user_id}", get(list_by_owner))
}

/// Parsed multipart submission: the text fields plus both image lists.
#[derive(Debug, Default)]
pub struct BusinessForm {
    pub fields: CreateBusinessRequest,
    pub images: Vec<UploadedFile>,
    pub staff_images: Vec<UploadedFile>,
}

fn multipart_error(err: impl std::fmt::Display) -> AppError {
    AppError::bad_request(format!("Invalid multipart body: {err}"))
}

fn json_field<T: DeserializeOwned>(name: &str, raw: &str) -> AppResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::bad_request(format!("{name} must be valid JSON: {e}")))
}

async fn read_file(field: Field<'_>) -> AppResult<UploadedFile> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok(UploadedFile {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}

fn push_file(list: &mut Vec<UploadedFile>, file: UploadedFile, field: &str) -> AppResult<()> {
    if list.len() >= MAX_IMAGES_PER_FIELD {
        return Err(AppError::bad_request(format!(
            "At most {MAX_IMAGES_PER_FIELD} files allowed in {field}"
        )));
    }
    list.push(file);
    Ok(())
}

pub async fn read_business_form(mut multipart: Multipart) -> AppResult<BusinessForm> {
    let mut form = BusinessForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let file = read_file(field).await?;
                push_file(&mut form.images, file, "images")?;
            }
            "staffImages" => {
                let file = read_file(field).await?;
                push_file(&mut form.staff_images, file, "staffImages")?;
            }
            _ => {
                let text = field.text().await.map_err(multipart_error)?;
                let fields = &mut form.fields;
                match name.as_str() {
                    "name" => fields.name = Some(text),
                    "tag" => fields.tag = Some(text),
                    "about" => fields.about = Some(text),
                    "phone_number" => fields.phone_number = Some(text),
                    "coordinates" => fields.coordinates = Some(json_field(&name, &text)?),
                    "staff" => fields.staff = json_field(&name, &text)?,
                    "categories" => fields.categories = json_field(&name, &text)?,
                    other => tracing::debug!(field = %other, "ignoring unknown form field"),
                }
            }
        }
    }
    Ok(form)
}

#[utoipa::path(
    post,
    path = "/api/business/create",
    request_body(
        content = CreateBusinessRequest,
        content_type = "multipart/form-data",
        description = "Text fields plus `images` and `staffImages` file parts (up to 10 each)"
    ),
    responses(
        (status = 201, description = "Business created", body = ApiResponse<CreatedBusiness>),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a business account")
    ),
    security(("bearer_auth" = [])),
    tag = "Business"
)]
pub async fn create_business(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedBusiness>>)> {
    let multipart = multipart.map_err(|e| multipart_error(e.body_text()))?;
    let form = read_business_form(multipart).await?;
    let business = form.fields.validate()?;
    let resp = business_service::create_business(
        &state,
        &user,
        business,
        form.images,
        form.staff_images,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/business/businesses",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "All businesses", body = ApiResponse<Vec<BusinessView>>)
    ),
    tag = "Business"
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<BusinessView>>>> {
    let resp = business_service::list_businesses(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/business/item/{id}",
    params(
        ("id" = Uuid, Path, description = "Business ID")
    ),
    responses(
        (status = 200, description = "Business profile", body = ApiResponse<BusinessView>),
        (status = 404, description = "Business not found")
    ),
    tag = "Business"
)]
pub async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BusinessView>>> {
    let resp = business_service::get_business(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/business/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Owner user ID")
    ),
    responses(
        (status = 200, description = "Businesses owned by the user", body = ApiResponse<Vec<BusinessView>>)
    ),
    tag = "Business"
)]
pub async fn list_by_owner(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<BusinessView>>>> {
    let resp = business_service::list_by_owner(&state, user_id).await?;
    Ok(Json(resp))
}

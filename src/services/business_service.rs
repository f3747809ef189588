use std::collections::{BTreeMap, HashMap};

use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::business::{
        BusinessView, CategoryView, CreatedBusiness, NewBusiness, ServiceView, StaffView,
    },
    entity::{
        BusinessImages, BusinessProfiles, BusinessStaff, ServiceCategories, Services,
        business_images, business_profiles, business_staff, service_categories, services,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::{Coordinates, Role},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::load_caller,
    state::AppState,
    storage::{UploadedFile, discard_blobs},
};

pub const MAX_IMAGES_PER_FIELD: usize = 10;

pub async fn create_business(
    state: &AppState,
    user: &AuthUser,
    business: NewBusiness,
    images: Vec<UploadedFile>,
    staff_images: Vec<UploadedFile>,
) -> AppResult<ApiResponse<CreatedBusiness>> {
    ensure_role(user, Role::Business)?;
    load_caller(state, user).await?;

    let business_id = Uuid::new_v4();
    let mut uploaded = Vec::with_capacity(images.len() + staff_images.len());

    let image_urls = upload_all(state, "business", business_id, &images, &mut uploaded).await?;
    let staff_urls = upload_all(state, "staff", business_id, &staff_images, &mut uploaded).await?;

    let txn = state.orm.begin().await?;
    let inserted = insert_business(
        &txn,
        business_id,
        user.user_id,
        &business,
        &image_urls,
        &staff_urls,
    )
    .await;
    let written = match inserted {
        Ok(()) => txn.commit().await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        tracing::warn!(
            business_id = %business_id,
            error = %err,
            "business insert failed; discarding uploads"
        );
        discard_blobs(state.blobs.as_ref(), &uploaded).await;
        return Err(err.into());
    }

    tracing::info!(
        business_id = %business_id,
        owner = %user.user_id,
        images = image_urls.len(),
        staff = business.staff.iter().flatten().count(),
        categories = business.categories.len(),
        "business created"
    );
    Ok(ApiResponse::ok(
        "Business created",
        CreatedBusiness { business_id },
    ))
}

async fn upload_all(
    state: &AppState,
    folder: &str,
    business_id: Uuid,
    files: &[UploadedFile],
    uploaded: &mut Vec<String>,
) -> AppResult<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        match state.blobs.store(folder, business_id, file).await {
            Ok(url) => {
                uploaded.push(url.clone());
                urls.push(url);
            }
            Err(err) => {
                discard_blobs(state.blobs.as_ref(), uploaded).await;
                return Err(AppError::Internal(anyhow::anyhow!(err)));
            }
        }
    }
    Ok(urls)
}

// Profile first, then its children; everything or nothing.
async fn insert_business(
    txn: &DatabaseTransaction,
    business_id: Uuid,
    owner_id: Uuid,
    business: &NewBusiness,
    image_urls: &[String],
    staff_urls: &[String],
) -> Result<(), DbErr> {
    BusinessProfiles::insert(business_profiles::ActiveModel {
        id: Set(business_id),
        user_id: Set(owner_id),
        name: Set(business.name.clone()),
        about: Set(business.about.clone()),
        latitude: Set(business.coordinates.latitude),
        longitude: Set(business.coordinates.longitude),
        location: Set(business.coordinates.location.clone()),
        phone_number: Set(business.phone_number.clone()),
        tag: Set(business.tag.clone()),
        rating: NotSet,
        created_at: NotSet,
    })
    .exec_without_returning(txn)
    .await?;

    if !image_urls.is_empty() {
        BusinessImages::insert_many(image_urls.iter().map(|url| business_images::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            image: Set(url.clone()),
            created_at: NotSet,
        }))
        .exec_without_returning(txn)
        .await?;
    }

    let staff: Vec<_> = business
        .staff
        .iter()
        .enumerate()
        .filter_map(|(slot, name)| {
            let name = name.as_ref()?;
            Some(business_staff::ActiveModel {
                id: Set(Uuid::new_v4()),
                business_id: Set(business_id),
                name: Set(name.clone()),
                rating: NotSet,
                image: Set(staff_urls.get(slot).cloned()),
                created_at: NotSet,
            })
        })
        .collect();
    if !staff.is_empty() {
        BusinessStaff::insert_many(staff)
            .exec_without_returning(txn)
            .await?;
    }

    for category in &business.categories {
        let category_id = Uuid::new_v4();
        ServiceCategories::insert(service_categories::ActiveModel {
            id: Set(category_id),
            business_id: Set(business_id),
            title: Set(category.title.clone()),
            created_at: NotSet,
        })
        .exec_without_returning(txn)
        .await?;

        if category.services.is_empty() {
            continue;
        }
        Services::insert_many(category.services.iter().map(|service| services::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(category_id),
            title: Set(service.title.clone()),
            duration: Set(service.duration),
            price: Set(service.price),
            description: Set(service.description.clone()),
            created_at: NotSet,
        }))
        .exec_without_returning(txn)
        .await?;
    }
    Ok(())
}

pub async fn get_business(
    state: &AppState,
    business_id: Uuid,
) -> AppResult<ApiResponse<BusinessView>> {
    let profile = BusinessProfiles::find_by_id(business_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Business"))?;
    let view = load_views(state, vec![profile])
        .await?
        .pop()
        .ok_or(AppError::NotFound("Business"))?;
    Ok(ApiResponse::ok("OK", view))
}

pub async fn list_by_owner(
    state: &AppState,
    owner_id: Uuid,
) -> AppResult<ApiResponse<Vec<BusinessView>>> {
    let profiles = BusinessProfiles::find()
        .filter(business_profiles::Column::UserId.eq(owner_id))
        .order_by_asc(business_profiles::Column::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok(ApiResponse::ok("OK", load_views(state, profiles).await?))
}

pub async fn list_businesses(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<BusinessView>>> {
    let (page, per_page, _) = pagination.normalize();
    let paginator = BusinessProfiles::find()
        .order_by_desc(business_profiles::Column::CreatedAt)
        .order_by_asc(business_profiles::Column::Id)
        .paginate(&state.orm, per_page as u64);
    let total = paginator.num_items().await?;
    let profiles = paginator.fetch_page((page - 1) as u64).await?;

    let views = load_views(state, profiles).await?;
    Ok(ApiResponse::success(
        "OK",
        views,
        Some(Meta::new(page, per_page, total as i64)),
    ))
}

async fn load_views(
    state: &AppState,
    profiles: Vec<business_profiles::Model>,
) -> AppResult<Vec<BusinessView>> {
    if profiles.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();

    let images = BusinessImages::find()
        .filter(business_images::Column::BusinessId.is_in(ids.clone()))
        .order_by_asc(business_images::Column::CreatedAt)
        .all(&state.orm)
        .await?;
    let staff = BusinessStaff::find()
        .filter(business_staff::Column::BusinessId.is_in(ids.clone()))
        .order_by_asc(business_staff::Column::CreatedAt)
        .all(&state.orm)
        .await?;
    let categories = ServiceCategories::find()
        .filter(service_categories::Column::BusinessId.is_in(ids))
        .order_by_asc(service_categories::Column::CreatedAt)
        .all(&state.orm)
        .await?;
    let category_ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let catalog = if category_ids.is_empty() {
        Vec::new()
    } else {
        Services::find()
            .filter(services::Column::CategoryId.is_in(category_ids))
            .order_by_asc(services::Column::CreatedAt)
            .all(&state.orm)
            .await?
    };

    Ok(assemble_business_views(
        profiles, images, staff, categories, catalog,
    ))
}

/// Fold the flat child rows into one view per profile, keeping profile order.
pub fn assemble_business_views(
    profiles: Vec<business_profiles::Model>,
    images: Vec<business_images::Model>,
    staff: Vec<business_staff::Model>,
    categories: Vec<service_categories::Model>,
    catalog: Vec<services::Model>,
) -> Vec<BusinessView> {
    let mut views: Vec<BusinessView> = profiles
        .into_iter()
        .map(|p| BusinessView {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            about: p.about,
            phone_number: p.phone_number,
            rating: p.rating,
            tag: p.tag,
            coordinates: Coordinates {
                latitude: p.latitude,
                longitude: p.longitude,
                location: p.location,
            },
            image: Vec::new(),
            staff: Vec::new(),
            services: BTreeMap::new(),
        })
        .collect();
    let index: HashMap<Uuid, usize> = views.iter().enumerate().map(|(i, v)| (v.id, i)).collect();

    for image in images {
        if let Some(&i) = index.get(&image.business_id) {
            views[i].image.push(image.image);
        }
    }
    for member in staff {
        if let Some(&i) = index.get(&member.business_id) {
            views[i].staff.push(StaffView {
                id: member.id,
                name: member.name,
                rating: member.rating,
                image: member.image,
            });
        }
    }

    let mut category_owner = HashMap::new();
    for category in categories {
        if let Some(&i) = index.get(&category.business_id) {
            category_owner.insert(category.id, i);
            views[i].services.insert(
                category.id,
                CategoryView {
                    title: category.title,
                    service: Vec::new(),
                },
            );
        }
    }
    for service in catalog {
        let Some(&i) = category_owner.get(&service.category_id) else {
            continue;
        };
        if let Some(category) = views[i].services.get_mut(&service.category_id) {
            category.service.push(ServiceView {
                title: service.title,
                time: service.duration,
                price: service.price,
                description: service.description,
            });
        }
    }
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(name: &str) -> business_profiles::Model {
        business_profiles::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.into(),
            about: None,
            latitude: Some(41.39),
            longitude: Some(2.17),
            location: Some("Barcelona".into()),
            phone_number: None,
            tag: Some("barber".into()),
            rating: 0.0,
            created_at: Utc::now().into(),
        }
    }

    fn category(business_id: Uuid, title: &str) -> service_categories::Model {
        service_categories::Model {
            id: Uuid::new_v4(),
            business_id,
            title: title.into(),
            created_at: Utc::now().into(),
        }
    }

    fn service(category_id: Uuid, title: &str, duration: i32, price: i64) -> services::Model {
        services::Model {
            id: Uuid::new_v4(),
            category_id,
            title: title.into(),
            duration,
            price,
            description: Some(format!("{title} description")),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn services_are_grouped_under_their_category_id() {
        let shop = profile("Fade Room");
        let hair = category(shop.id, "Hair");
        let beard = category(shop.id, "Beard");
        let catalog = vec![
            service(hair.id, "Cut", 30, 20),
            service(beard.id, "Trim", 15, 10),
            service(hair.id, "Wash", 10, 5),
        ];

        let views = assemble_business_views(
            vec![shop.clone()],
            vec![],
            vec![],
            vec![hair.clone(), beard.clone()],
            catalog,
        );

        assert_eq!(views.len(), 1);
        let hair_view = &views[0].services[&hair.id];
        assert_eq!(hair_view.title, "Hair");
        assert_eq!(
            hair_view.service,
            vec![
                ServiceView {
                    title: "Cut".into(),
                    time: 30,
                    price: 20,
                    description: Some("Cut description".into()),
                },
                ServiceView {
                    title: "Wash".into(),
                    time: 10,
                    price: 5,
                    description: Some("Wash description".into()),
                },
            ]
        );
        assert_eq!(views[0].services[&beard.id].service.len(), 1);
        assert_eq!(views[0].coordinates.location.as_deref(), Some("Barcelona"));
    }

    #[test]
    fn child_rows_land_on_their_own_business() {
        let first = profile("First");
        let second = profile("Second");
        let image = |business_id, url: &str| business_images::Model {
            id: Uuid::new_v4(),
            business_id,
            image: url.into(),
            created_at: Utc::now().into(),
        };
        let member = business_staff::Model {
            id: Uuid::new_v4(),
            business_id: second.id,
            name: "Ana".into(),
            rating: 4.5,
            image: None,
            created_at: Utc::now().into(),
        };
        let empty = category(first.id, "Nails");

        let views = assemble_business_views(
            vec![first.clone(), second.clone()],
            vec![image(second.id, "b.jpg"), image(first.id, "a.jpg")],
            vec![member],
            vec![empty.clone()],
            vec![],
        );

        assert_eq!(views[0].id, first.id);
        assert_eq!(views[0].image, vec!["a.jpg".to_string()]);
        assert!(views[0].staff.is_empty());
        assert!(views[0].services[&empty.id].service.is_empty());
        assert_eq!(views[1].image, vec!["b.jpg".to_string()]);
        assert_eq!(views[1].staff[0].name, "Ana");
        assert!(views[1].services.is_empty());
    }
}

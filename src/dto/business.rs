use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::amount::Amount,
    error::{AppError, AppResult},
    models::Coordinates,
};

/// Text fields of the multipart business submission. `coordinates`, `staff`
/// and `categories` arrive as JSON-encoded form fields.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateBusinessRequest {
    pub name: Option<String>,
    pub tag: Option<String>,
    pub about: Option<String>,
    pub phone_number: Option<String>,
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub staff: Vec<StaffInput>,
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StaffInput {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryInput {
    pub title: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ServiceInput {
    pub title: Option<String>,
    /// Duration in minutes.
    pub time: Option<i32>,
    pub price: Option<Amount>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub name: String,
    pub tag: Option<String>,
    pub about: Option<String>,
    pub phone_number: Option<String>,
    pub coordinates: Coordinates,
    /// One slot per submitted staff entry, `None` where the name was blank.
    /// Slots keep their position so staff images pair up by index.
    pub staff: Vec<Option<String>>,
    pub categories: Vec<NewCategory>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub services: Vec<NewService>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewService {
    pub title: String,
    pub duration: i32,
    pub price: i64,
    pub description: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CreateBusinessRequest {
    pub fn validate(self) -> AppResult<NewBusiness> {
        let name = trimmed(self.name).ok_or_else(|| AppError::bad_request("name is required"))?;

        let categories = self
            .categories
            .into_iter()
            .enumerate()
            .map(|(ci, category)| {
                let title = trimmed(category.title).ok_or_else(|| {
                    AppError::bad_request(format!("categories[{ci}].title is required"))
                })?;
                let services = category
                    .services
                    .into_iter()
                    .enumerate()
                    .map(|(si, service)| service.validate(ci, si))
                    .collect::<AppResult<Vec<_>>>()?;
                Ok(NewCategory { title, services })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(NewBusiness {
            name,
            tag: trimmed(self.tag),
            about: trimmed(self.about),
            phone_number: trimmed(self.phone_number),
            coordinates: self.coordinates.unwrap_or_default(),
            staff: self.staff.into_iter().map(|s| trimmed(s.name)).collect(),
            categories,
        })
    }
}

impl ServiceInput {
    fn validate(self, ci: usize, si: usize) -> AppResult<NewService> {
        let field = |name: &str| format!("categories[{ci}].services[{si}].{name}");
        let title = trimmed(self.title)
            .ok_or_else(|| AppError::bad_request(format!("{} is required", field("title"))))?;
        let duration = self.time.filter(|t| *t > 0).ok_or_else(|| {
            AppError::bad_request(format!(
                "{} must be a positive number of minutes",
                field("time")
            ))
        })?;
        let price = self
            .price
            .ok_or_else(|| AppError::bad_request(format!("{} is required", field("price"))))?
            .0;
        Ok(NewService {
            title,
            duration,
            price,
            description: trimmed(self.description),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedBusiness {
    pub business_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct ServiceView {
    pub title: String,
    pub time: i32,
    pub price: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct CategoryView {
    pub title: String,
    pub service: Vec<ServiceView>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct StaffView {
    pub id: Uuid,
    pub name: String,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub about: Option<String>,
    pub phone_number: Option<String>,
    pub rating: f64,
    pub tag: Option<String>,
    pub coordinates: Coordinates,
    pub image: Vec<String>,
    pub staff: Vec<StaffView>,
    /// Keyed by category id.
    pub services: BTreeMap<Uuid, CategoryView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_staff_names_keep_their_slot() {
        let request: CreateBusinessRequest = serde_json::from_value(json!({
            "name": "Fade Room",
            "staff": [{ "name": "Ana" }, { "name": "  " }, { "name": "Ben" }],
            "categories": []
        }))
        .unwrap();
        let business = request.validate().unwrap();
        assert_eq!(
            business.staff,
            vec![Some("Ana".to_string()), None, Some("Ben".to_string())]
        );
    }

    #[test]
    fn nested_service_errors_name_their_path() {
        let request: CreateBusinessRequest = serde_json::from_value(json!({
            "name": "Fade Room",
            "categories": [{ "title": "Hair", "services": [{ "title": "Cut", "time": 30 }] }]
        }))
        .unwrap();
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "categories[0].services[0].price is required"
        );
    }

    #[test]
    fn name_is_required() {
        let err = CreateBusinessRequest::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }
}

use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PushTokenRequest {
    #[schema(example = "ExponentPushToken[xxxxxxxxxxxxxxxxxxxxxx]")]
    pub token: Option<String>,
}

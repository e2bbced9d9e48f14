use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateLocationRequest {
    pub area_slug: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationReason {
    Inside,
    Outside,
    AreaNotFound,
    NoPolygon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidateLocationResponse {
    pub allowed: bool,
    pub reason: LocationReason,
}

impl ValidateLocationResponse {
    pub fn denied(reason: LocationReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{service_area_entity, vendor_entity};

use super::ProductResponse;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    pub name: Option<String>,
    /// `false` deactivates the vendor; vendors are never deleted.
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<vendor_entity::Model> for VendorResponse {
    fn from(m: vendor_entity::Model) -> Self {
        VendorResponse {
            id: m.id,
            name: m.name,
            slug: m.slug,
            is_active: m.is_active,
            logo_url: m.image_path,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceAreaRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// GeoJSON Polygon or a bare ring of `[lng, lat]` pairs
    #[schema(value_type = Object)]
    pub polygon: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAreaResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub slug: String,
    #[schema(value_type = Object)]
    pub polygon: Option<Value>,
    pub is_active: bool,
}

impl From<service_area_entity::Model> for ServiceAreaResponse {
    fn from(m: service_area_entity::Model) -> Self {
        ServiceAreaResponse {
            id: m.id,
            vendor_id: m.vendor_id,
            name: m.name,
            slug: m.slug,
            polygon: m.polygon,
            is_active: m.is_active,
        }
    }
}

/// Customer menu for one service area.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AreaMenuResponse {
    pub area_id: Uuid,
    pub area_name: String,
    pub area_slug: String,
    pub vendor_name: String,
    pub vendor_logo_url: Option<String>,
    pub products: Vec<ProductResponse>,
}

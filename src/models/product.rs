use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::product_entity;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    /// Minor units (agorot)
    pub price: Option<i64>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

impl UpdateProductRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
            && self.sort_order.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub service_area_id: Option<Uuid>,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<product_entity::Model> for ProductResponse {
    fn from(m: product_entity::Model) -> Self {
        ProductResponse {
            id: m.id,
            vendor_id: m.vendor_id,
            service_area_id: m.service_area_id,
            name: m.name,
            price: m.price,
            description: m.description,
            is_active: m.is_active,
            image_url: m.image_path,
            sort_order: m.sort_order,
            updated_at: m.updated_at,
        }
    }
}

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::utils::geo::{GeoPoint, polygon_from_geojson};

/// 服务区域（地理围栏）
/// - polygon 为 GeoJSON Polygon：{ "type": "Polygon", "coordinates": [[[lng, lat], ...]] }
/// - polygon 为空或顶点不足 3 个时，区域不可下单
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "service_areas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub polygon: Option<Json>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Outer ring of the stored polygon; empty when missing or malformed.
    pub fn ring(&self) -> Vec<GeoPoint> {
        self.polygon
            .as_ref()
            .map(polygon_from_geojson)
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendors::Entity",
        from = "Column::VendorId",
        to = "super::vendors::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Vendor,
}

impl Related<super::vendors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

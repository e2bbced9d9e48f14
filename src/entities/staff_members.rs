use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    #[sea_orm(string_value = "DASHBOARD")]
    Dashboard,
    #[sea_orm(string_value = "WAITER")]
    Waiter,
    #[sea_orm(string_value = "BOTH")]
    Both,
}

impl StaffRole {
    /// Product management and the order dashboard.
    pub fn can_manage(&self) -> bool {
        matches!(self, StaffRole::Dashboard | StaffRole::Both)
    }

    /// Waiter queue.
    pub fn can_serve(&self) -> bool {
        matches!(self, StaffRole::Waiter | StaffRole::Both)
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::Dashboard => write!(f, "DASHBOARD"),
            StaffRole::Waiter => write!(f, "WAITER"),
            StaffRole::Both => write!(f, "BOTH"),
        }
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DASHBOARD" => Ok(StaffRole::Dashboard),
            "WAITER" => Ok(StaffRole::Waiter),
            "BOTH" => Ok(StaffRole::Both),
            other => Err(format!("Invalid role: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "staff_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Identity issued by the external auth provider.
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    /// None = every area of the vendor.
    pub service_area_id: Option<Uuid>,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::StaffRole;

/// 员工邀请：token 只能使用一次（used_at 非空即已使用）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "staff_invites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub service_area_id: Option<Uuid>,
    pub email: String,
    pub role: StaffRole,
    #[sea_orm(unique)]
    pub token: String,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

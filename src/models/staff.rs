use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{StaffRole, staff_invite_entity, staff_member_entity};

/// Resolved (vendor, area) scope of an authenticated staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffScope {
    pub staff_id: Uuid,
    pub vendor_id: Uuid,
    /// `None` covers every area of the vendor.
    pub service_area_id: Option<Uuid>,
    pub role: StaffRole,
}

impl From<&staff_member_entity::Model> for StaffScope {
    fn from(m: &staff_member_entity::Model) -> Self {
        StaffScope {
            staff_id: m.id,
            vendor_id: m.vendor_id,
            service_area_id: m.service_area_id,
            role: m.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub service_area_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub service_area_id: Option<Uuid>,
    pub email: String,
    pub role: StaffRole,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InviteResponse {
    pub fn from_model(m: staff_invite_entity::Model, site_url: Option<&str>) -> Self {
        let invite_url = site_url.map(|base| {
            format!("{}/invite?token={}", base.trim_end_matches('/'), m.token)
        });
        InviteResponse {
            id: m.id,
            vendor_id: m.vendor_id,
            service_area_id: m.service_area_id,
            email: m.email,
            role: m.role,
            token: m.token,
            invite_url,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ClaimInviteRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffMemberResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub service_area_id: Option<Uuid>,
    pub role: StaffRole,
    pub is_active: bool,
}

impl From<staff_member_entity::Model> for StaffMemberResponse {
    fn from(m: staff_member_entity::Model) -> Self {
        StaffMemberResponse {
            id: m.id,
            user_id: m.user_id,
            vendor_id: m.vendor_id,
            service_area_id: m.service_area_id,
            role: m.role,
            is_active: m.is_active,
        }
    }
}

use crate::config::AppConfig;
use crate::entities::{
    StaffRole, order_entity, product_entity, service_area_entity, staff_invite_entity,
    staff_member_entity, vendor_entity,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreateInviteRequest, InviteResponse, StaffMemberResponse, StaffScope};
use crate::utils::{AuthUser, generate_invite_token};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

impl StaffScope {
    /// Orders visible to this staff member.
    pub fn orders_condition(&self) -> Condition {
        let mut cond = Condition::all().add(order_entity::Column::VendorId.eq(self.vendor_id));
        if let Some(area) = self.service_area_id {
            cond = cond.add(order_entity::Column::ServiceAreaId.eq(area));
        }
        cond
    }

    pub fn products_condition(&self) -> Condition {
        let mut cond = Condition::all().add(product_entity::Column::VendorId.eq(self.vendor_id));
        if let Some(area) = self.service_area_id {
            cond = cond.add(product_entity::Column::ServiceAreaId.eq(area));
        }
        cond
    }

    pub fn require_manager(&self) -> AppResult<()> {
        if self.role.can_manage() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// 邀请的区域不能超出自己的范围；未指定时继承自己的区域
    pub fn invite_area(&self, requested: Option<Uuid>) -> AppResult<Option<Uuid>> {
        match (self.service_area_id, requested) {
            (None, requested) => Ok(requested),
            (Some(own), None) => Ok(Some(own)),
            (Some(own), Some(area)) if area == own => Ok(Some(own)),
            (Some(own), Some(area)) => {
                log::warn!("Manager scoped to area {own} tried to invite into area {area}");
                Err(AppError::Forbidden)
            }
        }
    }

    pub fn require_waiter(&self) -> AppResult<()> {
        if self.role.can_serve() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// 员工权限解析：所有员工操作都必须先解析出 (vendor, area) 范围
#[derive(Clone)]
pub struct AccessService {
    pool: DatabaseConnection,
    app: AppConfig,
}

impl AccessService {
    pub fn new(pool: DatabaseConnection, app: AppConfig) -> Self {
        Self { pool, app }
    }

    pub fn is_platform_admin(&self, user: &AuthUser) -> bool {
        self.app.is_platform_admin(user.email.as_deref())
    }

    pub fn require_platform_admin(&self, user: &AuthUser) -> AppResult<()> {
        if self.is_platform_admin(user) {
            Ok(())
        } else {
            log::warn!("User {} is not a platform admin", user.id);
            Err(AppError::Forbidden)
        }
    }

    /// Newest active membership wins when a user has several.
    pub async fn resolve_staff_scope(&self, user_id: Uuid) -> AppResult<StaffScope> {
        let member = staff_member_entity::Entity::find()
            .filter(staff_member_entity::Column::UserId.eq(user_id))
            .filter(staff_member_entity::Column::IsActive.eq(true))
            .order_by_desc(staff_member_entity::Column::CreatedAt)
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                log::warn!("No active staff membership for user {user_id}");
                AppError::Forbidden
            })?;
        Ok(StaffScope::from(&member))
    }

    /// Staff row plus invite consumption in one transaction. The invite is
    /// marked used with a `used_at IS NULL` guard, so a concurrent second
    /// claim affects no rows and rolls back.
    pub async fn claim_invite(&self, token: &str, user: &AuthUser) -> AppResult<StaffMemberResponse> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::ValidationError("Missing token".to_string()));
        }

        let txn = self.pool.begin().await?;

        let invite = staff_invite_entity::Entity::find()
            .filter(staff_invite_entity::Column::Token.eq(token))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

        if invite.is_used() {
            return Err(AppError::ValidationError("Invite already used".to_string()));
        }

        let now = Utc::now();
        let marked = staff_invite_entity::Entity::update_many()
            .col_expr(staff_invite_entity::Column::UsedAt, Expr::value(now))
            .col_expr(staff_invite_entity::Column::UsedBy, Expr::value(user.id))
            .filter(staff_invite_entity::Column::Id.eq(invite.id))
            .filter(staff_invite_entity::Column::UsedAt.is_null())
            .exec(&txn)
            .await?;
        if marked.rows_affected != 1 {
            return Err(AppError::ValidationError("Invite already used".to_string()));
        }

        let member = staff_member_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            vendor_id: Set(invite.vendor_id),
            service_area_id: Set(invite.service_area_id),
            role: Set(invite.role),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Invite {} claimed by user {}: vendor={} role={}",
            invite.id,
            user.id,
            member.vendor_id,
            member.role
        );
        Ok(member.into())
    }

    /// Platform admins, or DASHBOARD/BOTH staff of the same vendor.
    /// An area-scoped manager can only invite into their own area.
    pub async fn create_invite(
        &self,
        user: &AuthUser,
        vendor_id: Uuid,
        req: CreateInviteRequest,
    ) -> AppResult<InviteResponse> {
        let mut service_area_id = req.service_area_id;
        if !self.is_platform_admin(user) {
            let scope = self.resolve_staff_scope(user.id).await?;
            if scope.vendor_id != vendor_id {
                return Err(AppError::Forbidden);
            }
            scope.require_manager()?;
            service_area_id = scope.invite_area(req.service_area_id)?;
        }

        let email = req
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| e.contains('@'))
            .ok_or_else(|| AppError::ValidationError("A valid email is required".to_string()))?;

        let role = match req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => raw
                .parse::<StaffRole>()
                .map_err(AppError::ValidationError)?,
            None => StaffRole::Waiter,
        };

        vendor_entity::Entity::find_by_id(vendor_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))?;

        if let Some(area_id) = service_area_id {
            service_area_entity::Entity::find_by_id(area_id)
                .filter(service_area_entity::Column::VendorId.eq(vendor_id))
                .one(&self.pool)
                .await?
                .ok_or_else(|| {
                    AppError::ValidationError("serviceAreaId does not belong to this vendor".to_string())
                })?;
        }

        let invite = staff_invite_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            service_area_id: Set(service_area_id),
            email: Set(email),
            role: Set(role),
            token: Set(generate_invite_token()),
            used_at: Set(None),
            used_by: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Invite {} created for vendor {vendor_id} by {}", invite.id, user.id);
        Ok(InviteResponse::from_model(
            invite,
            self.app.site_url.as_deref(),
        ))
    }
}

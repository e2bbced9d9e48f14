//! Order status / payment-status state machine.
//!
//! `status` and `payment_status` move independently. Every write is a
//! conditional update on the previously observed pair, so two staff sessions
//! racing on one order get a conflict instead of silently overwriting each
//! other. DELIVERED and CANCELLED are terminal.

use crate::entities::{OrderStatus, PaymentStatus, order_entity};
use crate::error::{AppError, AppResult};
use crate::models::{StaffScope, UpdateOrderRequest, UpdateOrderResponse};
use crate::services::{SideEffect, SideEffectQueue};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderPatch {
    /// Parses a staff patch. Empty strings count as absent.
    pub fn from_request(req: &UpdateOrderRequest) -> AppResult<Self> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let status = present(&req.status)
            .map(|s| s.parse::<OrderStatus>())
            .transpose()
            .map_err(|_| AppError::ValidationError("Invalid status".to_string()))?;

        let payment_status = present(&req.payment_status)
            .map(|s| s.parse::<PaymentStatus>())
            .transpose()
            .map_err(|_| AppError::ValidationError("Invalid paymentStatus".to_string()))?;

        if let Some(p) = payment_status
            && !p.settable_by_staff()
        {
            return Err(AppError::ValidationError(format!(
                "Invalid paymentStatus: {p} is set by the payment provider"
            )));
        }

        let patch = OrderPatch {
            status,
            payment_status,
        };
        if patch.is_empty() {
            return Err(AppError::ValidationError("Nothing to update".to_string()));
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateSource {
    Staff,
    PaymentProvider,
}

/// Result of one applied patch.
#[derive(Debug, Clone)]
pub struct Transition {
    pub order: order_entity::Model,
    pub effects: Vec<SideEffect>,
}

fn effects_between(before: &order_entity::Model, after: &order_entity::Model) -> Vec<SideEffect> {
    let mut effects = Vec::new();
    if before.payment_status != PaymentStatus::Paid && after.payment_status == PaymentStatus::Paid {
        effects.push(SideEffect::PaymentConfirmed { order_id: after.id });
    }
    if before.status != OrderStatus::Delivered && after.status == OrderStatus::Delivered {
        effects.push(SideEffect::Delivered { order_id: after.id });
    }
    effects
}

#[derive(Clone)]
pub struct OrderLifecycleService {
    pool: DatabaseConnection,
    side_effects: SideEffectQueue,
}

impl OrderLifecycleService {
    pub fn new(pool: DatabaseConnection, side_effects: SideEffectQueue) -> Self {
        Self { pool, side_effects }
    }

    /// Staff update. Orders outside the caller's scope are reported as not found.
    pub async fn update_order(
        &self,
        order_id: Uuid,
        scope: &StaffScope,
        patch: OrderPatch,
    ) -> AppResult<UpdateOrderResponse> {
        let transition = self
            .apply_patch(order_id, Some(scope), patch, UpdateSource::Staff)
            .await?;
        log::info!(
            "Order {order_id} updated by staff {}: status={} payment_status={}",
            scope.staff_id,
            transition.order.status,
            transition.order.payment_status
        );
        self.dispatch(&transition);
        Ok(UpdateOrderResponse::from(&transition.order))
    }

    /// Payment provider callback. A PAID order is never moved back.
    pub async fn record_provider_payment(
        &self,
        order_id: Uuid,
        payment_status: PaymentStatus,
    ) -> AppResult<order_entity::Model> {
        let patch = OrderPatch {
            status: None,
            payment_status: Some(payment_status),
        };
        let transition = self
            .apply_patch(order_id, None, patch, UpdateSource::PaymentProvider)
            .await?;
        self.dispatch(&transition);
        Ok(transition.order)
    }

    fn dispatch(&self, transition: &Transition) {
        for effect in &transition.effects {
            self.side_effects.enqueue(*effect);
        }
    }

    async fn apply_patch(
        &self,
        order_id: Uuid,
        scope: Option<&StaffScope>,
        patch: OrderPatch,
        source: UpdateSource,
    ) -> AppResult<Transition> {
        let mut query = order_entity::Entity::find_by_id(order_id);
        if let Some(scope) = scope {
            query = query.filter(scope.orders_condition());
        }
        let current = query
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if let Some(next) = patch.status
            && current.status.is_terminal()
            && next != current.status
        {
            return Err(AppError::Conflict(format!(
                "Order is already {}",
                current.status
            )));
        }

        if source == UpdateSource::PaymentProvider
            && current.payment_status == PaymentStatus::Paid
            && patch.payment_status != Some(PaymentStatus::Paid)
        {
            log::warn!(
                "Ignoring late payment callback for paid order {order_id}: {:?}",
                patch.payment_status
            );
            return Ok(Transition {
                order: current,
                effects: Vec::new(),
            });
        }

        self.write_transition(&current, &patch).await
    }

    /// 以读到的 (status, payment_status) 为条件写入；期间被他人修改则返回 409
    async fn write_transition(
        &self,
        current: &order_entity::Model,
        patch: &OrderPatch,
    ) -> AppResult<Transition> {
        let mut update = order_entity::Entity::update_many()
            .col_expr(order_entity::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order_entity::Column::Id.eq(current.id))
            .filter(order_entity::Column::Status.eq(current.status))
            .filter(order_entity::Column::PaymentStatus.eq(current.payment_status));
        if let Some(status) = patch.status {
            update = update.col_expr(order_entity::Column::Status, Expr::value(status));
        }
        if let Some(payment_status) = patch.payment_status {
            update = update.col_expr(
                order_entity::Column::PaymentStatus,
                Expr::value(payment_status),
            );
        }

        let result = update.exec(&self.pool).await?;
        if result.rows_affected == 0 {
            log::warn!("Order {} changed concurrently, update rejected", current.id);
            return Err(AppError::Conflict(
                "Order was changed by someone else, reload and retry".to_string(),
            ));
        }

        let updated = order_entity::Entity::find_by_id(current.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let effects = effects_between(current, &updated);
        Ok(Transition {
            order: updated,
            effects,
        })
    }
}

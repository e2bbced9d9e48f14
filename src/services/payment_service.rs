use crate::entities::{PaymentStatus, order_entity};
use crate::error::{AppError, AppResult};
use crate::external::{PaymentRequestPayload, PaymentRequestResult};
use crate::models::{CreatePaymentResponse, UpdateOrderResponse};
use crate::services::OrderLifecycleService;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

/// Hosted payment page provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_request(
        &self,
        payload: &PaymentRequestPayload,
    ) -> AppResult<PaymentRequestResult>;
}

/// Provider callback kinds, each mapped to the payment status it records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentCallback {
    Success,
    Fail,
    Notify,
}

impl PaymentCallback {
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            PaymentCallback::Success => PaymentStatus::Paid,
            PaymentCallback::Fail => PaymentStatus::Failed,
            PaymentCallback::Notify => PaymentStatus::Pending,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            PaymentCallback::Success => "success",
            PaymentCallback::Fail => "fail",
            PaymentCallback::Notify => "notify",
        }
    }
}

pub fn callback_url(site_url: &str, callback: PaymentCallback, order_id: Uuid) -> String {
    format!(
        "{}/webhook/tranzila/{}?orderId={order_id}",
        site_url.trim_end_matches('/'),
        callback.path()
    )
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    lifecycle: OrderLifecycleService,
    site_url: Option<String>,
}

impl PaymentService {
    pub fn new(
        pool: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        lifecycle: OrderLifecycleService,
        site_url: Option<String>,
    ) -> Self {
        Self {
            pool,
            gateway,
            lifecycle,
            site_url,
        }
    }

    /// 发起托管支付：成功后把支付链接写回订单，payment_status -> PENDING
    pub async fn create_payment_request(
        &self,
        order_id: Option<Uuid>,
    ) -> AppResult<CreatePaymentResponse> {
        let order_id =
            order_id.ok_or_else(|| AppError::ValidationError("Missing orderId".to_string()))?;

        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if order.payment_status == PaymentStatus::Paid {
            return Err(AppError::Conflict("Order already paid".to_string()));
        }

        let site_url = self
            .site_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("SITE_URL".to_string()))?;

        let payload = PaymentRequestPayload {
            order_id: order.id.to_string(),
            amount: order.total_amount,
            customer_phone: order.customer_phone.clone(),
            success_url: callback_url(site_url, PaymentCallback::Success, order.id),
            failure_url: callback_url(site_url, PaymentCallback::Fail, order.id),
            notify_url: callback_url(site_url, PaymentCallback::Notify, order.id),
        };
        let result = self.gateway.create_payment_request(&payload).await?;

        // 回调可能已先于此处到达，已支付的订单不回退到 PENDING
        let updated = order_entity::Entity::update_many()
            .col_expr(
                order_entity::Column::PaymentUrl,
                Expr::value(Some(result.payment_url.clone())),
            )
            .col_expr(
                order_entity::Column::PaymentReference,
                Expr::value(result.payment_reference.clone()),
            )
            .col_expr(
                order_entity::Column::PaymentStatus,
                Expr::value(PaymentStatus::Pending),
            )
            .col_expr(order_entity::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order_entity::Column::Id.eq(order.id))
            .filter(order_entity::Column::PaymentStatus.ne(PaymentStatus::Paid))
            .exec(&self.pool)
            .await?;
        if updated.rows_affected == 0 {
            return Err(AppError::Conflict("Order already paid".to_string()));
        }

        log::info!(
            "Payment request created for order {} (reference {:?})",
            order.id,
            result.payment_reference
        );
        Ok(CreatePaymentResponse {
            payment_url: result.payment_url,
            payment_reference: result.payment_reference,
        })
    }

    /// Callbacks are only honoured for orders that went through
    /// `create_payment_request`; anything else looks like an unknown order.
    pub async fn handle_callback(
        &self,
        callback: PaymentCallback,
        order_id: Option<Uuid>,
    ) -> AppResult<UpdateOrderResponse> {
        let order_id =
            order_id.ok_or_else(|| AppError::ValidationError("Missing orderId".to_string()))?;
        log::info!("Tranzila {} callback for order {order_id}", callback.path());

        let existing = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .filter(order_entity::Model::has_payment_request);
        if existing.is_none() {
            log::warn!(
                "Tranzila {} callback for order {order_id} without a payment request",
                callback.path()
            );
            return Err(AppError::NotFound("Order not found".to_string()));
        }

        let order = self
            .lifecycle
            .record_provider_payment(order_id, callback.payment_status())
            .await?;
        Ok(UpdateOrderResponse::from(&order))
    }
}

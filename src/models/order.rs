use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{OrderStatus, PaymentStatus, order_entity, order_item_entity};

/// Cart line as submitted by the customer. Any price field the client sends is ignored.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: String,
    /// Number or numeric string; coerced to a positive integer.
    #[schema(value_type = Object)]
    #[serde(default)]
    pub quantity: Value,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub area_slug: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_note: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub items: Option<Vec<CartItemInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
    pub total_amount: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

impl From<order_entity::Model> for PlaceOrderResponse {
    fn from(m: order_entity::Model) -> Self {
        PlaceOrderResponse {
            order_id: m.id,
            total_amount: m.total_amount,
            currency: m.currency,
            status: m.status,
            payment_status: m.payment_status,
            created_at: m.created_at,
            payment_url: m.payment_url,
            payment_reference: m.payment_reference,
        }
    }
}

/// Public, polling-friendly view of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for OrderStatusResponse {
    fn from(m: order_entity::Model) -> Self {
        OrderStatusResponse {
            order_id: m.id,
            status: m.status,
            payment_status: m.payment_status,
            total_amount: m.total_amount,
            created_at: m.created_at,
        }
    }
}

/// Staff patch. Values arrive as text so unknown values can be reported by field.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&order_entity::Model> for UpdateOrderResponse {
    fn from(m: &order_entity::Model) -> Self {
        UpdateOrderResponse {
            order_id: m.id,
            status: m.status,
            payment_status: m.payment_status,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

impl From<order_item_entity::Model> for OrderItemResponse {
    fn from(m: order_item_entity::Model) -> Self {
        OrderItemResponse {
            id: m.id,
            product_id: m.product_id,
            name: m.name,
            price: m.price,
            quantity: m.quantity,
        }
    }
}

/// Full order row for the staff views.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub service_area_id: Uuid,
    pub customer_phone: String,
    pub customer_note: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub total_amount: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_url: Option<String>,
    pub payment_reference: Option<String>,
    pub invoice_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemResponse>>,
}

impl From<order_entity::Model> for OrderResponse {
    fn from(m: order_entity::Model) -> Self {
        OrderResponse {
            id: m.id,
            vendor_id: m.vendor_id,
            service_area_id: m.service_area_id,
            customer_phone: m.customer_phone,
            customer_note: m.customer_note,
            lat: m.lat,
            lng: m.lng,
            total_amount: m.total_amount,
            currency: m.currency,
            status: m.status,
            payment_status: m.payment_status,
            payment_url: m.payment_url,
            payment_reference: m.payment_reference,
            invoice_url: m.invoice_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
            items: None,
        }
    }
}

/// 订单列表查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOrderQuery {
    /// Optional status filter
    pub status: Option<String>,
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 100，最大 100)
    pub per_page: Option<u32>,
}

use crate::entities::{
    OrderStatus, PaymentStatus, order_entity, order_item_entity, product_entity,
    service_area_entity,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CartItemInput, DashboardOrderQuery, OrderItemResponse, OrderResponse, OrderStatusResponse,
    PlaceOrderRequest, PlaceOrderResponse, StaffScope,
};
use crate::utils::geo::is_valid_coordinate;
use crate::utils::{PaginatedResponse, PaginationParams};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Cart line after quantity coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i32,
}

/// Positive integer quantity from a JSON number or numeric string.
/// Fractions are truncated; anything else yields `None`.
fn coerce_quantity(raw: &Value) -> Option<i32> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    let n = n.trunc();
    (n >= 1.0 && n <= i32::MAX as f64).then_some(n as i32)
}

/// Drops lines whose quantity is not a positive integer.
pub fn normalize_cart(items: &[CartItemInput]) -> Vec<CartLine> {
    items
        .iter()
        .filter_map(|item| {
            coerce_quantity(&item.quantity).map(|quantity| CartLine {
                product_id: item.product_id.trim().to_string(),
                quantity,
            })
        })
        .collect()
}

fn required<'a>(value: &'a Option<String>, field: &str) -> AppResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("{field} is required")))
}

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
    currency: String,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection, currency: String) -> Self {
        Self { pool, currency }
    }

    /// 下单：服务端按商品表定价，订单与明细在同一事务内写入
    pub async fn place_order(&self, req: PlaceOrderRequest) -> AppResult<PlaceOrderResponse> {
        let area_slug = required(&req.area_slug, "areaSlug")?;
        let customer_phone = required(&req.customer_phone, "customerPhone")?;
        let items = req
            .items
            .as_deref()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| AppError::ValidationError("items is required".to_string()))?;

        let lines = normalize_cart(items);
        if lines.is_empty() {
            return Err(AppError::ValidationError(
                "No valid items in order".to_string(),
            ));
        }

        // 坐标只在两者都给出时记录
        let (lat, lng) = match (req.lat, req.lng) {
            (Some(lat), Some(lng)) if is_valid_coordinate(lat, lng) => (Some(lat), Some(lng)),
            (Some(_), Some(_)) => {
                return Err(AppError::ValidationError(
                    "lat/lng out of range".to_string(),
                ));
            }
            _ => (None, None),
        };

        let area = service_area_entity::Entity::find()
            .filter(service_area_entity::Column::Slug.eq(area_slug))
            .filter(service_area_entity::Column::IsActive.eq(true))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::ValidationError("Service area not found or inactive".to_string())
            })?;

        let requested: Vec<Uuid> = lines
            .iter()
            .filter_map(|l| l.product_id.parse::<Uuid>().ok())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let products: HashMap<Uuid, product_entity::Model> = if requested.is_empty() {
            HashMap::new()
        } else {
            product_entity::Entity::find()
                .filter(product_entity::Column::VendorId.eq(area.vendor_id))
                .filter(product_entity::Column::IsActive.eq(true))
                .filter(product_entity::Column::Id.is_in(requested))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let mut missing: Vec<String> = Vec::new();
        for line in &lines {
            let known = line
                .product_id
                .parse::<Uuid>()
                .is_ok_and(|id| products.contains_key(&id));
            if !known && !missing.contains(&line.product_id) {
                missing.push(line.product_id.clone());
            }
        }
        if !missing.is_empty() {
            return Err(AppError::MissingProducts(missing));
        }

        let order_id = Uuid::new_v4();
        let mut total_amount: i64 = 0;
        let mut item_models = Vec::with_capacity(lines.len());
        for line in &lines {
            let Some(product) = line
                .product_id
                .parse::<Uuid>()
                .ok()
                .and_then(|id| products.get(&id))
            else {
                return Err(AppError::MissingProducts(vec![line.product_id.clone()]));
            };
            total_amount = product
                .price
                .checked_mul(i64::from(line.quantity))
                .and_then(|line_total| total_amount.checked_add(line_total))
                .ok_or_else(|| AppError::ValidationError("Order total out of range".to_string()))?;

            item_models.push(order_item_entity::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                name: Set(product.name.clone()),
                price: Set(product.price),
                quantity: Set(line.quantity),
            });
        }

        let now = Utc::now();
        let note = req
            .customer_note
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let txn = self.pool.begin().await?;
        let order = order_entity::ActiveModel {
            id: Set(order_id),
            vendor_id: Set(area.vendor_id),
            service_area_id: Set(area.id),
            customer_phone: Set(customer_phone.to_string()),
            customer_note: Set(note),
            lat: Set(lat),
            lng: Set(lng),
            total_amount: Set(total_amount),
            currency: Set(self.currency.clone()),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Unpaid),
            payment_url: Set(None),
            payment_reference: Set(None),
            invoice_id: Set(None),
            invoice_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        order_item_entity::Entity::insert_many(item_models)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        log::info!(
            "Order {} placed in area {} ({} lines, total {} {})",
            order.id,
            area.slug,
            lines.len(),
            order.total_amount,
            order.currency
        );
        Ok(order.into())
    }

    /// Public status lookup used by the customer tracker.
    pub async fn get_order_status(&self, order_id: Uuid) -> AppResult<OrderStatusResponse> {
        order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    pub async fn list_dashboard_orders(
        &self,
        scope: &StaffScope,
        query: &DashboardOrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        scope.require_manager()?;

        let mut base = order_entity::Entity::find().filter(scope.orders_condition());
        if let Some(raw) = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let status = raw
                .parse::<OrderStatus>()
                .map_err(AppError::ValidationError)?;
            base = base.filter(order_entity::Column::Status.eq(status));
        }

        let params = PaginationParams::new(query.page, query.per_page);
        let total = base.clone().count(&self.pool).await?;
        let orders = base
            .order_by_desc(order_entity::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            orders.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    /// Open orders, oldest first, with their lines.
    pub async fn list_waiter_queue(&self, scope: &StaffScope) -> AppResult<Vec<OrderResponse>> {
        scope.require_waiter()?;

        let orders = order_entity::Entity::find()
            .filter(scope.orders_condition())
            .filter(order_entity::Column::Status.is_in(OrderStatus::open_for_waiters()))
            .order_by_asc(order_entity::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemResponse>> = HashMap::new();
        for item in order_item_entity::Entity::find()
            .filter(order_item_entity::Column::OrderId.is_in(ids))
            .order_by_asc(order_item_entity::Column::Name)
            .all(&self.pool)
            .await?
        {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(item.into());
        }

        Ok(orders
            .into_iter()
            .map(|o| {
                let items = items_by_order.remove(&o.id).unwrap_or_default();
                let mut resp = OrderResponse::from(o);
                resp.items = Some(items);
                resp
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::StaffRole;
    use crate::test_support::{self, Fixture};
    use serde_json::json;

    async fn service() -> (OrderService, Fixture) {
        let db = test_support::setup_db().await;
        let fixture = test_support::seed_demo(&db).await;
        (OrderService::new(db, "ILS".to_string()), fixture)
    }

    fn cart(items: Value) -> Vec<CartItemInput> {
        serde_json::from_value(items).unwrap()
    }

    fn request(items: Value) -> PlaceOrderRequest {
        PlaceOrderRequest {
            area_slug: Some("demo".into()),
            customer_phone: Some("0545555555".into()),
            customer_note: None,
            lat: Some(32.005),
            lng: Some(34.705),
            items: Some(cart(items)),
        }
    }

    async fn order_count(svc: &OrderService) -> u64 {
        order_entity::Entity::find().count(&svc.pool).await.unwrap()
    }

    #[test]
    fn test_quantity_coercion() {
        let lines = normalize_cart(&cart(json!([
            { "productId": "a", "quantity": 2 },
            { "productId": "b", "quantity": "3" },
            { "productId": "c", "quantity": 0 },
            { "productId": "d", "quantity": -1 },
            { "productId": "e", "quantity": "abc" },
            { "productId": "f" },
            { "productId": "g", "quantity": 1.9 },
            { "productId": "h", "quantity": null }
        ])));
        assert_eq!(
            lines,
            vec![
                CartLine { product_id: "a".into(), quantity: 2 },
                CartLine { product_id: "b".into(), quantity: 3 },
                CartLine { product_id: "g".into(), quantity: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_price_integrity_ignores_client_prices() {
        let (svc, fx) = service().await;
        let resp = svc
            .place_order(request(json!([
                { "productId": fx.product_a_id.to_string(), "quantity": 2, "price": 1 },
                { "productId": fx.product_b_id.to_string(), "quantity": 1, "price": 1 }
            ])))
            .await
            .unwrap();

        assert_eq!(resp.total_amount, 2500);
        assert_eq!(resp.currency, "ILS");
        assert_eq!(resp.status, OrderStatus::Pending);
        assert_eq!(resp.payment_status, PaymentStatus::Unpaid);

        let items = order_item_entity::Entity::find()
            .filter(order_item_entity::Column::OrderId.eq(resp.order_id))
            .all(&svc.pool)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        let sum: i64 = items.iter().map(|i| i.line_total()).sum();
        assert_eq!(sum, resp.total_amount);
    }

    #[tokio::test]
    async fn test_item_snapshot_survives_product_edit() {
        let (svc, fx) = service().await;
        let resp = svc
            .place_order(request(json!([
                { "productId": fx.coffee_id.to_string(), "quantity": 1 }
            ])))
            .await
            .unwrap();

        let mut coffee: product_entity::ActiveModel = product_entity::Entity::find_by_id(fx.coffee_id)
            .one(&svc.pool)
            .await
            .unwrap()
            .unwrap()
            .into();
        coffee.name = Set("Espresso".into());
        coffee.price = Set(9999);
        coffee.update(&svc.pool).await.unwrap();

        let item = order_item_entity::Entity::find()
            .filter(order_item_entity::Column::OrderId.eq(resp.order_id))
            .one(&svc.pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.name, "Coffee");
        assert_eq!(item.price, 1200);
    }

    #[tokio::test]
    async fn test_missing_products_listed_and_nothing_written() {
        let (svc, fx) = service().await;
        let bogus = Uuid::new_v4().to_string();
        let err = svc
            .place_order(request(json!([
                { "productId": fx.coffee_id.to_string(), "quantity": 1 },
                { "productId": fx.foreign_product_id.to_string(), "quantity": 1 },
                { "productId": fx.inactive_product_id.to_string(), "quantity": 1 },
                { "productId": bogus, "quantity": 1 },
                { "productId": "not-a-uuid", "quantity": 1 }
            ])))
            .await
            .unwrap_err();

        match err {
            AppError::MissingProducts(ids) => assert_eq!(
                ids,
                vec![
                    fx.foreign_product_id.to_string(),
                    fx.inactive_product_id.to_string(),
                    bogus,
                    "not-a-uuid".to_string(),
                ]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(order_count(&svc).await, 0);
    }

    #[tokio::test]
    async fn test_validation_order() {
        let (svc, fx) = service().await;
        let item = json!([{ "productId": fx.coffee_id.to_string(), "quantity": 1 }]);

        let mut req = request(item.clone());
        req.area_slug = Some("  ".into());
        assert!(matches!(svc.place_order(req).await, Err(AppError::ValidationError(m)) if m.contains("areaSlug")));

        let mut req = request(item.clone());
        req.customer_phone = None;
        assert!(matches!(svc.place_order(req).await, Err(AppError::ValidationError(m)) if m.contains("customerPhone")));

        assert!(matches!(
            svc.place_order(request(json!([]))).await,
            Err(AppError::ValidationError(m)) if m.contains("items")
        ));

        assert!(matches!(
            svc.place_order(request(json!([{ "productId": fx.coffee_id.to_string(), "quantity": 0 }]))).await,
            Err(AppError::ValidationError(m)) if m == "No valid items in order"
        ));

        let mut req = request(item.clone());
        req.area_slug = Some("closed".into());
        assert!(matches!(svc.place_order(req).await, Err(AppError::ValidationError(m)) if m.contains("Service area")));

        let mut req = request(item);
        req.lat = Some(120.0);
        assert!(matches!(svc.place_order(req).await, Err(AppError::ValidationError(_))));

        assert_eq!(order_count(&svc).await, 0);
    }

    #[tokio::test]
    async fn test_get_order_status() {
        let (svc, fx) = service().await;
        let placed = svc
            .place_order(request(json!([{ "productId": fx.coffee_id.to_string(), "quantity": 2 }])))
            .await
            .unwrap();

        let status = svc.get_order_status(placed.order_id).await.unwrap();
        assert_eq!(status.total_amount, 2400);
        assert_eq!(status.status, OrderStatus::Pending);

        assert!(matches!(
            svc.get_order_status(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dashboard_and_waiter_views_are_scoped() {
        let (svc, fx) = service().await;
        let mine = test_support::insert_order(&svc.pool, &fx, fx.area_id).await;
        let _other_area = test_support::insert_order(&svc.pool, &fx, fx.other_area_id).await;

        let scope = StaffScope {
            staff_id: Uuid::new_v4(),
            vendor_id: fx.vendor_id,
            service_area_id: Some(fx.area_id),
            role: StaffRole::Both,
        };

        let page = svc
            .list_dashboard_orders(&scope, &DashboardOrderQuery::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].id, mine.id);

        let filtered = svc
            .list_dashboard_orders(
                &scope,
                &DashboardOrderQuery {
                    status: Some("DELIVERED".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(filtered.items.is_empty());

        assert!(matches!(
            svc.list_dashboard_orders(
                &scope,
                &DashboardOrderQuery {
                    status: Some("LOST".into()),
                    ..Default::default()
                },
            )
            .await,
            Err(AppError::ValidationError(_))
        ));

        let queue = svc.list_waiter_queue(&scope).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].items.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_role_gates() {
        let (svc, fx) = service().await;
        let waiter = StaffScope {
            staff_id: Uuid::new_v4(),
            vendor_id: fx.vendor_id,
            service_area_id: None,
            role: StaffRole::Waiter,
        };
        assert!(matches!(
            svc.list_dashboard_orders(&waiter, &DashboardOrderQuery::default()).await,
            Err(AppError::Forbidden)
        ));

        let dashboard = StaffScope {
            role: StaffRole::Dashboard,
            ..waiter
        };
        assert!(matches!(
            svc.list_waiter_queue(&dashboard).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_waiter_queue_excludes_closed_orders() {
        let (svc, fx) = service().await;
        let open = test_support::insert_order(&svc.pool, &fx, fx.area_id).await;
        let done = test_support::insert_order(&svc.pool, &fx, fx.area_id).await;
        let mut am: order_entity::ActiveModel = done.into();
        am.status = Set(OrderStatus::Delivered);
        am.update(&svc.pool).await.unwrap();

        let scope = StaffScope {
            staff_id: Uuid::new_v4(),
            vendor_id: fx.vendor_id,
            service_area_id: None,
            role: StaffRole::Waiter,
        };
        let queue = svc.list_waiter_queue(&scope).await.unwrap();
        assert_eq!(queue.iter().map(|o| o.id).collect::<Vec<_>>(), vec![open.id]);
    }
}

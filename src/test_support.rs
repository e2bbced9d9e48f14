//! Shared fixtures for unit tests: in-memory SQLite with the real
//! migrations, a small demo tenant, and recording fakes for the outbound
//! capabilities.

use crate::entities::{
    OrderStatus, PaymentStatus, StaffRole, order_entity, order_item_entity, product_entity,
    service_area_entity, staff_member_entity, vendor_entity,
};
use crate::error::{AppError, AppResult};
use crate::external::ObjectStore;
use crate::services::{Invoice, InvoiceError, InvoiceProvider, InvoiceRequest, SmsSender};
use crate::utils::geo::{GeoPoint, polygon_to_geojson};
use async_trait::async_trait;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

pub async fn setup_db() -> DatabaseConnection {
    // 单连接：内存库每个连接都是独立的数据库
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Ids seeded by [`seed_demo`].
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub vendor_id: Uuid,
    pub other_vendor_id: Uuid,
    /// "demo": square lat 32.00..32.01, lng 34.70..34.71
    pub area_id: Uuid,
    /// "demo-north", same vendor
    pub other_area_id: Uuid,
    /// "other-park", belongs to `other_vendor_id`
    pub foreign_area_id: Uuid,
    /// 1200
    pub coffee_id: Uuid,
    /// 1000
    pub product_a_id: Uuid,
    /// 500
    pub product_b_id: Uuid,
    pub inactive_product_id: Uuid,
    pub foreign_product_id: Uuid,
}

fn square(lat: f64, lng: f64) -> serde_json::Value {
    polygon_to_geojson(&[
        GeoPoint::new(lat, lng),
        GeoPoint::new(lat, lng + 0.01),
        GeoPoint::new(lat + 0.01, lng + 0.01),
        GeoPoint::new(lat + 0.01, lng),
    ])
}

async fn vendor(db: &DatabaseConnection, name: &str, slug: &str) -> Uuid {
    let now = Utc::now();
    vendor_entity::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        is_active: Set(true),
        image_path: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

async fn area(
    db: &DatabaseConnection,
    vendor_id: Uuid,
    slug: &str,
    polygon: Option<serde_json::Value>,
    is_active: bool,
) -> Uuid {
    let now = Utc::now();
    service_area_entity::ActiveModel {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        name: Set(slug.to_uppercase()),
        slug: Set(slug.to_string()),
        polygon: Set(polygon),
        is_active: Set(is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

async fn product(
    db: &DatabaseConnection,
    vendor_id: Uuid,
    name: &str,
    price: i64,
    sort_order: i32,
    is_active: bool,
) -> Uuid {
    let now = Utc::now();
    product_entity::ActiveModel {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        service_area_id: Set(None),
        name: Set(name.to_string()),
        price: Set(price),
        description: Set(None),
        is_active: Set(is_active),
        image_path: Set(None),
        sort_order: Set(sort_order),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn seed_demo(db: &DatabaseConnection) -> Fixture {
    let vendor_id = vendor(db, "Demo Kiosk", "demo-kiosk").await;
    let other_vendor_id = vendor(db, "Other Cart", "other-cart").await;

    let area_id = area(db, vendor_id, "demo", Some(square(32.00, 34.70)), true).await;
    let other_area_id = area(db, vendor_id, "demo-north", Some(square(32.10, 34.70)), true).await;
    area(db, vendor_id, "closed", Some(square(32.00, 34.70)), false).await;
    area(db, vendor_id, "no-fence", None, true).await;
    let foreign_area_id =
        area(db, other_vendor_id, "other-park", Some(square(31.00, 34.00)), true).await;

    Fixture {
        vendor_id,
        other_vendor_id,
        area_id,
        other_area_id,
        foreign_area_id,
        coffee_id: product(db, vendor_id, "Coffee", 1200, 1, true).await,
        product_a_id: product(db, vendor_id, "Bagel", 1000, 2, true).await,
        product_b_id: product(db, vendor_id, "Juice", 500, 3, true).await,
        inactive_product_id: product(db, vendor_id, "Old Muffin", 700, 4, false).await,
        foreign_product_id: product(db, other_vendor_id, "Popcorn", 800, 1, true).await,
    }
}

/// PENDING / UNPAID order for two coffees (2400), phone 0545555555.
pub async fn insert_order(
    db: &DatabaseConnection,
    fx: &Fixture,
    area_id: Uuid,
) -> order_entity::Model {
    let vendor_id = if area_id == fx.foreign_area_id {
        fx.other_vendor_id
    } else {
        fx.vendor_id
    };
    let now = Utc::now();
    let order = order_entity::ActiveModel {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        service_area_id: Set(area_id),
        customer_phone: Set("0545555555".to_string()),
        customer_note: Set(None),
        lat: Set(Some(32.005)),
        lng: Set(Some(34.705)),
        total_amount: Set(2400),
        currency: Set("ILS".to_string()),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Unpaid),
        payment_url: Set(None),
        payment_reference: Set(None),
        invoice_id: Set(None),
        invoice_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap();

    order_item_entity::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        product_id: Set(fx.coffee_id),
        name: Set("Coffee".to_string()),
        price: Set(1200),
        quantity: Set(2),
    }
    .insert(db)
    .await
    .unwrap();

    order
}

pub async fn insert_staff(
    db: &DatabaseConnection,
    user_id: Uuid,
    vendor_id: Uuid,
    service_area_id: Option<Uuid>,
    role: StaffRole,
    is_active: bool,
) -> staff_member_entity::Model {
    // keeps created_at strictly increasing between consecutive rows
    tokio::time::sleep(Duration::from_millis(2)).await;
    staff_member_entity::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        vendor_id: Set(vendor_id),
        service_area_id: Set(service_area_id),
        role: Set(role),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

/// SMS sender that records instead of sending.
#[derive(Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingSms {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::ExternalApiError("SMS gateway down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Invoice provider returning `INV-{orderId}` after an optional number of upstream failures.
#[derive(Default)]
pub struct FakeInvoiceProvider {
    calls: AtomicUsize,
    failures: usize,
}

impl FakeInvoiceProvider {
    pub fn failing_times(failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvoiceProvider for FakeInvoiceProvider {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(InvoiceError::Upstream("HTTP 503".to_string()));
        }
        Ok(Invoice {
            invoice_id: format!("INV-{}", request.order_id),
            url: Some(format!("https://invoices.example/{}", request.order_id)),
        })
    }
}

/// Object store keeping uploads in memory; URLs look like `memory://{bucket}/{path}`.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn objects(&self) -> Vec<(String, String, Vec<u8>)> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn store(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> AppResult<String> {
        self.objects
            .lock()
            .unwrap()
            .push((bucket.to_string(), path.to_string(), bytes));
        Ok(format!("memory://{bucket}/{path}"))
    }
}

use crate::entities::{product_entity, service_area_entity, vendor_entity};
use crate::error::{AppError, AppResult};
use crate::external::{ImageUpload, ObjectStore};
use crate::models::{
    AreaMenuResponse, CreateServiceAreaRequest, CreateVendorRequest, ServiceAreaResponse,
    UpdateVendorRequest, VendorResponse,
};
use crate::utils::geo::{polygon_from_geojson, polygon_to_geojson, validate_polygon};
use crate::utils::normalize_slug;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

fn required_name(raw: Option<&str>) -> AppResult<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::ValidationError("name is required".to_string()))
}

fn required_slug(raw: Option<&str>) -> AppResult<String> {
    raw.and_then(normalize_slug).ok_or_else(|| {
        AppError::ValidationError("slug must match ^[a-z0-9-]+$".to_string())
    })
}

/// 唯一约束冲突 -> 409
fn unique_violation(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{what} slug already exists"))
        }
        _ => AppError::DatabaseError(err),
    }
}

/// 平台管理：商户、服务区域，以及顾客端菜单
#[derive(Clone)]
pub struct VendorService {
    pool: DatabaseConnection,
    store: Arc<dyn ObjectStore>,
    logo_bucket: String,
}

impl VendorService {
    pub fn new(pool: DatabaseConnection, store: Arc<dyn ObjectStore>, logo_bucket: String) -> Self {
        Self {
            pool,
            store,
            logo_bucket,
        }
    }

    pub async fn list_vendors(&self) -> AppResult<Vec<VendorResponse>> {
        let vendors = vendor_entity::Entity::find()
            .order_by_desc(vendor_entity::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(vendors.into_iter().map(Into::into).collect())
    }

    pub async fn create_vendor(&self, req: CreateVendorRequest) -> AppResult<VendorResponse> {
        let name = required_name(req.name.as_deref())?;
        let slug = required_slug(req.slug.as_deref())?;

        let taken = vendor_entity::Entity::find()
            .filter(vendor_entity::Column::Slug.eq(slug.as_str()))
            .one(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Vendor slug already exists".to_string()));
        }

        let now = Utc::now();
        let vendor = vendor_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            slug: Set(slug),
            is_active: Set(true),
            image_path: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Vendor"))?;

        log::info!("Vendor {} ({}) created", vendor.id, vendor.slug);
        Ok(vendor.into())
    }

    pub async fn update_vendor(
        &self,
        vendor_id: Uuid,
        req: UpdateVendorRequest,
    ) -> AppResult<VendorResponse> {
        if req.name.is_none() && req.is_active.is_none() {
            return Err(AppError::ValidationError("Nothing to update".to_string()));
        }
        let vendor = self.find_vendor(vendor_id).await?;

        let mut am: vendor_entity::ActiveModel = vendor.into();
        if let Some(name) = req.name.as_deref() {
            am.name = Set(required_name(Some(name))?);
        }
        if let Some(is_active) = req.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        let vendor = am.update(&self.pool).await?;

        if !vendor.is_active {
            log::info!("Vendor {} deactivated", vendor.id);
        }
        Ok(vendor.into())
    }

    /// Stores the logo at `{vendorId}/logo-{millis}.{ext}` and persists its public URL.
    pub async fn upload_logo(&self, vendor_id: Uuid, image: ImageUpload) -> AppResult<String> {
        let vendor = self.find_vendor(vendor_id).await?;

        let path = format!(
            "{}/logo-{}.{}",
            vendor.id,
            Utc::now().timestamp_millis(),
            image.extension
        );
        let url = self
            .store
            .store(&self.logo_bucket, &path, image.bytes, image.content_type)
            .await?;

        let mut am: vendor_entity::ActiveModel = vendor.into();
        am.image_path = Set(Some(url.clone()));
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;
        Ok(url)
    }

    pub async fn create_area(
        &self,
        vendor_id: Uuid,
        req: CreateServiceAreaRequest,
    ) -> AppResult<ServiceAreaResponse> {
        self.find_vendor(vendor_id).await?;
        let name = required_name(req.name.as_deref())?;
        let slug = required_slug(req.slug.as_deref())?;

        let raw = req
            .polygon
            .as_ref()
            .ok_or_else(|| AppError::ValidationError("polygon is required".to_string()))?;
        let ring = polygon_from_geojson(raw);
        validate_polygon(&ring).map_err(AppError::ValidationError)?;

        // 顾客链接只用 slug，所以区域 slug 全局唯一
        let taken = service_area_entity::Entity::find()
            .filter(service_area_entity::Column::Slug.eq(slug.as_str()))
            .one(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Area slug already exists".to_string()));
        }

        let now = Utc::now();
        let area = service_area_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            name: Set(name),
            slug: Set(slug),
            polygon: Set(Some(polygon_to_geojson(&ring))),
            is_active: Set(req.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Area"))?;

        log::info!(
            "Service area {} ({}) created for vendor {}",
            area.id,
            area.slug,
            vendor_id
        );
        Ok(area.into())
    }

    pub async fn list_areas(&self, vendor_id: Uuid) -> AppResult<Vec<ServiceAreaResponse>> {
        self.find_vendor(vendor_id).await?;
        let areas = service_area_entity::Entity::find()
            .filter(service_area_entity::Column::VendorId.eq(vendor_id))
            .order_by_asc(service_area_entity::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(areas.into_iter().map(Into::into).collect())
    }

    /// Public menu: the active area plus its vendor's active products.
    pub async fn area_menu(&self, area_slug: &str) -> AppResult<AreaMenuResponse> {
        let not_found = || AppError::NotFound("Service area not found".to_string());
        let slug = normalize_slug(area_slug).ok_or_else(not_found)?;

        let (area, vendor) = service_area_entity::Entity::find()
            .filter(service_area_entity::Column::Slug.eq(slug.as_str()))
            .filter(service_area_entity::Column::IsActive.eq(true))
            .find_also_related(vendor_entity::Entity)
            .one(&self.pool)
            .await?
            .ok_or_else(not_found)?;
        let vendor = vendor.filter(|v| v.is_active).ok_or_else(not_found)?;

        let products = product_entity::Entity::find()
            .filter(product_entity::Column::VendorId.eq(vendor.id))
            .filter(product_entity::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(product_entity::Column::ServiceAreaId.is_null())
                    .add(product_entity::Column::ServiceAreaId.eq(area.id)),
            )
            .order_by_asc(product_entity::Column::SortOrder)
            .order_by_asc(product_entity::Column::Name)
            .all(&self.pool)
            .await?;

        Ok(AreaMenuResponse {
            area_id: area.id,
            area_name: area.name,
            area_slug: area.slug,
            vendor_name: vendor.name,
            vendor_logo_url: vendor.image_path,
            products: products.into_iter().map(Into::into).collect(),
        })
    }

    async fn find_vendor(&self, vendor_id: Uuid) -> AppResult<vendor_entity::Model> {
        vendor_entity::Entity::find_by_id(vendor_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Fixture, MemoryStore};
    use serde_json::json;

    async fn service() -> (VendorService, Fixture) {
        let db = test_support::setup_db().await;
        let fixture = test_support::seed_demo(&db).await;
        let store = Arc::new(MemoryStore::default());
        (
            VendorService::new(db, store, "vendor-logos".to_string()),
            fixture,
        )
    }

    fn vendor_req(name: &str, slug: &str) -> CreateVendorRequest {
        CreateVendorRequest {
            name: Some(name.to_string()),
            slug: Some(slug.to_string()),
        }
    }

    fn area_req(slug: &str, polygon: serde_json::Value) -> CreateServiceAreaRequest {
        CreateServiceAreaRequest {
            name: Some("North beach".to_string()),
            slug: Some(slug.to_string()),
            polygon: Some(polygon),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_vendor_normalizes_and_rejects_duplicates() {
        let (svc, _) = service().await;
        let v = svc.create_vendor(vendor_req("Ice Cream", " Ice-Cream ")).await.unwrap();
        assert_eq!(v.slug, "ice-cream");
        assert!(v.is_active);

        assert!(matches!(
            svc.create_vendor(vendor_req("Again", "ice-cream")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            svc.create_vendor(vendor_req("Bad", "ice cream")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_vendor(vendor_req(" ", "ok")).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivated_vendor_hides_menu() {
        let (svc, fx) = service().await;
        assert!(svc.area_menu("demo").await.is_ok());

        let v = svc
            .update_vendor(
                fx.vendor_id,
                UpdateVendorRequest {
                    name: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(!v.is_active);
        assert!(matches!(svc.area_menu("demo").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_area_menu_lists_active_products_in_order() {
        let (svc, fx) = service().await;
        let menu = svc.area_menu("DEMO").await.unwrap();
        assert_eq!(menu.area_id, fx.area_id);
        assert_eq!(menu.vendor_name, "Demo Kiosk");

        let ids: Vec<Uuid> = menu.products.iter().map(|p| p.id).collect();
        assert!(ids.contains(&fx.coffee_id));
        assert!(!ids.contains(&fx.inactive_product_id));
        assert!(!ids.contains(&fx.foreign_product_id));
        let orders: Vec<i32> = menu.products.iter().map(|p| p.sort_order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);

        assert!(matches!(svc.area_menu("closed").await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.area_menu("nope").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_area_validates_polygon_and_slug() {
        let (svc, fx) = service().await;
        let square = json!([[34.80, 32.10], [34.81, 32.10], [34.81, 32.11], [34.80, 32.11]]);

        let area = svc
            .create_area(fx.vendor_id, area_req("north-beach", square.clone()))
            .await
            .unwrap();
        assert_eq!(area.polygon.as_ref().unwrap()["type"], "Polygon");
        assert!(area.is_active);

        // slugs are global, even across vendors
        assert!(matches!(
            svc.create_area(fx.other_vendor_id, area_req("north-beach", square.clone())).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            svc.create_area(fx.vendor_id, area_req("line", json!([[34.8, 32.1], [34.9, 32.2]]))).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_area(fx.vendor_id, area_req("bad", json!([[34.8, 132.1], [34.9, 32.2], [34.7, 32.0]]))).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_area(Uuid::new_v4(), area_req("ghost", square)).await,
            Err(AppError::NotFound(_))
        ));

        let areas = svc.list_areas(fx.vendor_id).await.unwrap();
        assert!(areas.iter().any(|a| a.slug == "north-beach"));
        assert!(areas.iter().all(|a| a.vendor_id == fx.vendor_id));
    }

    #[tokio::test]
    async fn test_upload_logo_path() {
        let (svc, fx) = service().await;
        let image = ImageUpload::new(vec![9], None, Some("logo.webp")).unwrap();
        let url = svc.upload_logo(fx.vendor_id, image).await.unwrap();
        let prefix = format!("memory://vendor-logos/{}/logo-", fx.vendor_id);
        assert!(url.starts_with(&prefix));
        assert!(url.ends_with(".webp"));

        let vendors = svc.list_vendors().await.unwrap();
        let v = vendors.iter().find(|v| v.id == fx.vendor_id).unwrap();
        assert_eq!(v.logo_url.as_deref(), Some(url.as_str()));
    }
}

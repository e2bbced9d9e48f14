use crate::entities::product_entity;
use crate::error::{AppError, AppResult};
use crate::external::{ImageUpload, ObjectStore};
use crate::models::{CreateProductRequest, ProductResponse, StaffScope, UpdateProductRequest};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate_price(price: i64) -> AppResult<i64> {
    if price > 0 {
        Ok(price)
    } else {
        Err(AppError::ValidationError(
            "price must be a positive integer".to_string(),
        ))
    }
}

/// 商品管理：所有读写都按员工的 (vendor, area) 范围过滤
#[derive(Clone)]
pub struct ProductService {
    pool: DatabaseConnection,
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ProductService {
    pub fn new(pool: DatabaseConnection, store: Arc<dyn ObjectStore>, bucket: String) -> Self {
        Self {
            pool,
            store,
            bucket,
        }
    }

    pub async fn list_products(&self, scope: &StaffScope) -> AppResult<Vec<ProductResponse>> {
        scope.require_manager()?;
        let products = product_entity::Entity::find()
            .filter(scope.products_condition())
            .order_by_asc(product_entity::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(products.into_iter().map(Into::into).collect())
    }

    pub async fn create_product(
        &self,
        scope: &StaffScope,
        req: CreateProductRequest,
    ) -> AppResult<ProductResponse> {
        scope.require_manager()?;

        let name = trimmed(req.name.as_deref())
            .ok_or_else(|| AppError::ValidationError("name is required".to_string()))?;
        let price = req
            .price
            .ok_or_else(|| AppError::ValidationError("price is required".to_string()))
            .and_then(validate_price)?;

        let now = Utc::now();
        let product = product_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(scope.vendor_id),
            service_area_id: Set(scope.service_area_id),
            name: Set(name),
            price: Set(price),
            description: Set(trimmed(req.description.as_deref())),
            is_active: Set(true),
            image_path: Set(None),
            sort_order: Set(req.sort_order.unwrap_or(0)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Product {} created for vendor {} by staff {}",
            product.id,
            product.vendor_id,
            scope.staff_id
        );
        Ok(product.into())
    }

    pub async fn update_product(
        &self,
        scope: &StaffScope,
        product_id: Uuid,
        req: UpdateProductRequest,
    ) -> AppResult<ProductResponse> {
        scope.require_manager()?;
        if req.is_empty() {
            return Err(AppError::ValidationError("Nothing to update".to_string()));
        }

        let existing = self.find_scoped(scope, product_id).await?;
        let mut am: product_entity::ActiveModel = existing.into();
        if let Some(name) = req.name.as_deref() {
            let name = trimmed(Some(name))
                .ok_or_else(|| AppError::ValidationError("name cannot be empty".to_string()))?;
            am.name = Set(name);
        }
        if let Some(price) = req.price {
            am.price = Set(validate_price(price)?);
        }
        if let Some(description) = req.description.as_deref() {
            am.description = Set(trimmed(Some(description)));
        }
        if let Some(is_active) = req.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(sort_order) = req.sort_order {
            am.sort_order = Set(sort_order);
        }
        am.updated_at = Set(Utc::now());

        Ok(am.update(&self.pool).await?.into())
    }

    /// Stores the image and persists its public URL on the product.
    pub async fn upload_image(
        &self,
        scope: &StaffScope,
        product_id: Uuid,
        image: ImageUpload,
    ) -> AppResult<String> {
        scope.require_manager()?;
        let existing = self.find_scoped(scope, product_id).await?;

        let path = format!(
            "{}/{}-{}.{}",
            existing.vendor_id,
            existing.id,
            Utc::now().timestamp_millis(),
            image.extension
        );
        let url = self
            .store
            .store(&self.bucket, &path, image.bytes, image.content_type)
            .await?;

        let mut am: product_entity::ActiveModel = existing.into();
        am.image_path = Set(Some(url.clone()));
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;
        Ok(url)
    }

    async fn find_scoped(
        &self,
        scope: &StaffScope,
        product_id: Uuid,
    ) -> AppResult<product_entity::Model> {
        product_entity::Entity::find_by_id(product_id)
            .filter(scope.products_condition())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }
}

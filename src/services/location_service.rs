use crate::entities::service_area_entity;
use crate::error::{AppError, AppResult};
use crate::models::{LocationReason, ValidateLocationRequest, ValidateLocationResponse};
use crate::utils::geo::{GeoPoint, is_inside, is_valid_coordinate, vertex_count};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// 地理围栏校验：未知/停用区域、缺少多边形一律拒绝，绝不默认放行
#[derive(Clone)]
pub struct LocationService {
    pool: DatabaseConnection,
}

impl LocationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn validate_location(
        &self,
        req: &ValidateLocationRequest,
    ) -> AppResult<ValidateLocationResponse> {
        let slug = req
            .area_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::ValidationError("areaSlug is required".to_string()))?;
        let (Some(lat), Some(lng)) = (req.lat, req.lng) else {
            return Err(AppError::ValidationError(
                "lat and lng are required".to_string(),
            ));
        };
        if !is_valid_coordinate(lat, lng) {
            return Err(AppError::ValidationError(
                "lat/lng out of range".to_string(),
            ));
        }

        let area = service_area_entity::Entity::find()
            .filter(service_area_entity::Column::Slug.eq(slug))
            .filter(service_area_entity::Column::IsActive.eq(true))
            .one(&self.pool)
            .await?;
        let Some(area) = area else {
            log::debug!("Location check for unknown or inactive area {slug}");
            return Ok(ValidateLocationResponse::denied(LocationReason::AreaNotFound));
        };

        let ring = area.ring();
        if vertex_count(&ring) < 3 {
            log::warn!("Service area {} has no usable polygon", area.slug);
            return Ok(ValidateLocationResponse::denied(LocationReason::NoPolygon));
        }

        let allowed = is_inside(GeoPoint { lat, lng }, &ring);
        Ok(ValidateLocationResponse {
            allowed,
            reason: if allowed {
                LocationReason::Inside
            } else {
                LocationReason::Outside
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    async fn service() -> LocationService {
        let db = test_support::setup_db().await;
        test_support::seed_demo(&db).await;
        LocationService::new(db)
    }

    fn req(slug: &str, lat: f64, lng: f64) -> ValidateLocationRequest {
        ValidateLocationRequest {
            area_slug: Some(slug.to_string()),
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    #[tokio::test]
    async fn test_inside_and_outside() {
        let svc = service().await;
        let inside = svc.validate_location(&req("demo", 32.005, 34.705)).await.unwrap();
        assert_eq!(
            inside,
            ValidateLocationResponse {
                allowed: true,
                reason: LocationReason::Inside
            }
        );

        let outside = svc.validate_location(&req("demo", 32.05, 34.705)).await.unwrap();
        assert_eq!(outside, ValidateLocationResponse::denied(LocationReason::Outside));
    }

    #[tokio::test]
    async fn test_unknown_inactive_and_degenerate_areas_fail_closed() {
        let svc = service().await;
        assert_eq!(
            svc.validate_location(&req("nowhere", 32.005, 34.705)).await.unwrap(),
            ValidateLocationResponse::denied(LocationReason::AreaNotFound)
        );
        assert_eq!(
            svc.validate_location(&req("closed", 32.005, 34.705)).await.unwrap(),
            ValidateLocationResponse::denied(LocationReason::AreaNotFound)
        );
        assert_eq!(
            svc.validate_location(&req("no-fence", 32.005, 34.705)).await.unwrap(),
            ValidateLocationResponse::denied(LocationReason::NoPolygon)
        );
    }

    #[tokio::test]
    async fn test_missing_or_invalid_input_is_rejected() {
        let svc = service().await;
        let missing = ValidateLocationRequest {
            area_slug: Some("demo".into()),
            lat: None,
            lng: Some(34.7),
        };
        assert!(matches!(
            svc.validate_location(&missing).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.validate_location(&req("demo", f64::NAN, 34.7)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.validate_location(&req(" ", 32.0, 34.7)).await,
            Err(AppError::ValidationError(_))
        ));
    }
}

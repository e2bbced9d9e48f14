pub mod admin;
pub mod catalog;
pub mod dashboard;
pub mod location;
pub mod order;
pub mod payment;
pub mod staff;
pub mod waiter;
pub mod webhook;

pub use admin::admin_config;
pub use catalog::catalog_config;
pub use dashboard::dashboard_config;
pub use location::location_config;
pub use order::order_config;
pub use payment::payment_config;
pub use staff::staff_config;
pub use waiter::waiter_config;
pub use webhook::webhook_config;

use crate::error::{AppError, AppResult};
use crate::external::{ImageUpload, MAX_IMAGE_SIZE};
use crate::models::StaffScope;
use crate::services::AccessService;
use crate::utils::AuthUser;
use actix_multipart::Multipart;
use actix_web::{HttpMessage, HttpRequest, web};
use futures_util::StreamExt;

/// 由认证中间件写入请求扩展
pub(crate) fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// Authenticated caller plus their staff scope.
pub(crate) async fn current_scope(
    req: &HttpRequest,
    access: &AccessService,
) -> AppResult<StaffScope> {
    let user = current_user(req)?;
    access.resolve_staff_scope(user.id).await
}

/// Malformed bodies answer with the regular error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            AppError::ValidationError(format!("Invalid JSON body: {err}")).into()
        })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(format!("Invalid path: {err}")).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query: {err}")).into()
    })
}

/// Reads the multipart field `file` into a validated image.
pub(crate) async fn read_image(mut payload: Multipart) -> AppResult<ImageUpload> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::ValidationError(format!("Multipart error: {e}")))?;

        let cd = field.content_disposition();
        if cd.get_name() != Some("file") {
            continue;
        }
        let filename = cd.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let data =
                chunk.map_err(|e| AppError::ValidationError(format!("Multipart error: {e}")))?;
            // 超限即停止读取
            if bytes.len() + data.len() > MAX_IMAGE_SIZE {
                return Err(AppError::ValidationError(format!(
                    "File too large (max {} MB)",
                    MAX_IMAGE_SIZE / 1024 / 1024
                )));
            }
            bytes.extend_from_slice(&data);
        }

        return ImageUpload::new(bytes, content_type.as_deref(), filename.as_deref());
    }
    Err(AppError::ValidationError("Missing file".to_string()))
}

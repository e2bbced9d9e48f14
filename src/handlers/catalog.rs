use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::services::VendorService;

#[utoipa::path(
    get,
    path = "/areas/{area_slug}",
    tag = "customer",
    params(
        ("area_slug" = String, Path, description = "服务区域 slug")
    ),
    responses(
        (status = 200, description = "区域信息与菜单", body = AreaMenuResponse),
        (status = 404, description = "区域不存在或未启用", body = ApiError)
    )
)]
pub async fn get_area_menu(
    vendor_service: web::Data<VendorService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match vendor_service.area_menu(&path).await {
        Ok(menu) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": menu
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/areas/{area_slug}", web::get().to(get_area_menu));
}

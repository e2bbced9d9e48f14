use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::LocationService;

#[utoipa::path(
    post,
    path = "/validate-location",
    tag = "customer",
    request_body = ValidateLocationRequest,
    responses(
        (status = 200, description = "判定结果 (allowed + reason)", body = ValidateLocationResponse),
        (status = 400, description = "缺少参数或坐标越界", body = ApiError)
    )
)]
pub async fn validate_location(
    location_service: web::Data<LocationService>,
    body: web::Json<ValidateLocationRequest>,
) -> Result<HttpResponse> {
    match location_service.validate_location(&body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn location_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/validate-location", web::post().to(validate_location));
}

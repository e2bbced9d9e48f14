use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use crate::handlers::current_scope;
use crate::models::*;
use crate::services::{AccessService, OrderLifecycleService, OrderPatch, OrderService};

#[utoipa::path(
    post,
    path = "/orders",
    tag = "customer",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "下单成功，金额由服务端计算", body = PlaceOrderResponse),
        (status = 400, description = "参数错误或商品不存在", body = ApiError),
        (status = 500, description = "写入失败", body = ApiError)
    )
)]
pub async fn place_order(
    order_service: web::Data<OrderService>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse> {
    match order_service.place_order(body.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{order_id}",
    tag = "customer",
    params(
        ("order_id" = Uuid, Path, description = "订单ID")
    ),
    responses(
        (status = 200, description = "订单状态", body = OrderStatusResponse),
        (status = 404, description = "订单不存在", body = ApiError)
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match order_service.get_order_status(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/orders/{order_id}",
    tag = "staff",
    params(
        ("order_id" = Uuid, Path, description = "订单ID")
    ),
    request_body = UpdateOrderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = UpdateOrderResponse),
        (status = 400, description = "无效的状态值或没有可更新的字段", body = ApiError),
        (status = 401, description = "未登录", body = ApiError),
        (status = 403, description = "不是员工", body = ApiError),
        (status = 404, description = "订单不存在或不在权限范围内", body = ApiError),
        (status = 409, description = "订单已结束或被并发修改", body = ApiError)
    )
)]
pub async fn update_order(
    access_service: web::Data<AccessService>,
    lifecycle_service: web::Data<OrderLifecycleService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse> {
    let scope = match current_scope(&req, &access_service).await {
        Ok(scope) => scope,
        Err(e) => return Ok(e.error_response()),
    };
    let patch = match OrderPatch::from_request(&body) {
        Ok(patch) => patch,
        Err(e) => return Ok(e.error_response()),
    };

    match lifecycle_service
        .update_order(path.into_inner(), &scope, patch)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(place_order))
            .route("/{order_id}", web::get().to(get_order))
            .route("/{order_id}", web::patch().to(update_order)),
    );
}

use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::current_scope;
use crate::services::{AccessService, OrderService};

#[utoipa::path(
    get,
    path = "/waiter/orders",
    tag = "waiter",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "待处理订单 (PENDING / ACCEPTED / ON_THE_WAY)，最早在前，含明细", body = [OrderResponse]),
        (status = 403, description = "无 WAITER 权限", body = ApiError)
    )
)]
pub async fn list_queue(
    access_service: web::Data<AccessService>,
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let scope = match current_scope(&req, &access_service).await {
        Ok(scope) => scope,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.list_waiter_queue(&scope).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": orders
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn waiter_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/waiter").route("/orders", web::get().to(list_queue)));
}

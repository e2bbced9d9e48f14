use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::PaymentService;

#[utoipa::path(
    post,
    path = "/payments/tranzila/create-request",
    tag = "payment",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "支付链接已生成", body = CreatePaymentResponse),
        (status = 400, description = "缺少 orderId", body = ApiError),
        (status = 404, description = "订单不存在", body = ApiError),
        (status = 409, description = "订单已支付", body = ApiError),
        (status = 502, description = "支付服务商返回异常", body = ApiError)
    )
)]
pub async fn create_payment_request(
    payment_service: web::Data<PaymentService>,
    body: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse> {
    match payment_service.create_payment_request(body.order_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments/tranzila")
            .route("/create-request", web::post().to(create_payment_request)),
    );
}

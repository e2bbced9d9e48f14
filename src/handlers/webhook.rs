use crate::models::PaymentCallbackQuery;
use crate::services::{PaymentCallback, PaymentService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use log::{info, warn};
use serde_json::json;

/// Tranzila 回调处理器
///
/// success / fail 由用户浏览器跳转而来 (GET)，notify 由服务商服务器推送 (POST)；
/// 两种方法都接受，订单号通过 `?orderId=` 传入。
async fn handle_tranzila(
    payment_service: &PaymentService,
    callback: PaymentCallback,
    query: PaymentCallbackQuery,
    body: web::Bytes,
) -> Result<HttpResponse> {
    if !body.is_empty() {
        info!(
            "Tranzila {} payload for order {:?}: {}",
            callback.path(),
            query.order_id,
            String::from_utf8_lossy(&body)
        );
    }

    match payment_service.handle_callback(callback, query.order_id).await {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => {
            warn!(
                "Tranzila {} callback rejected for order {:?}: {e}",
                callback.path(),
                query.order_id
            );
            Ok(e.error_response())
        }
    }
}

#[utoipa::path(
    post,
    path = "/webhook/tranzila/success",
    tag = "payment",
    params(PaymentCallbackQuery),
    responses(
        (status = 200, description = "payment_status -> PAID"),
        (status = 404, description = "订单不存在或未发起支付请求")
    )
)]
pub async fn tranzila_success(
    payment_service: web::Data<PaymentService>,
    query: web::Query<PaymentCallbackQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    handle_tranzila(&payment_service, PaymentCallback::Success, query.into_inner(), body).await
}

#[utoipa::path(
    post,
    path = "/webhook/tranzila/fail",
    tag = "payment",
    params(PaymentCallbackQuery),
    responses(
        (status = 200, description = "payment_status -> FAILED (已支付订单不变)"),
        (status = 404, description = "订单不存在或未发起支付请求")
    )
)]
pub async fn tranzila_fail(
    payment_service: web::Data<PaymentService>,
    query: web::Query<PaymentCallbackQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    handle_tranzila(&payment_service, PaymentCallback::Fail, query.into_inner(), body).await
}

#[utoipa::path(
    post,
    path = "/webhook/tranzila/notify",
    tag = "payment",
    params(PaymentCallbackQuery),
    responses(
        (status = 200, description = "payment_status -> PENDING (已支付订单不变)"),
        (status = 404, description = "订单不存在或未发起支付请求")
    )
)]
pub async fn tranzila_notify(
    payment_service: web::Data<PaymentService>,
    query: web::Query<PaymentCallbackQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    handle_tranzila(&payment_service, PaymentCallback::Notify, query.into_inner(), body).await
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook/tranzila")
            .route("/success", web::get().to(tranzila_success))
            .route("/success", web::post().to(tranzila_success))
            .route("/fail", web::get().to(tranzila_fail))
            .route("/fail", web::post().to(tranzila_fail))
            .route("/notify", web::post().to(tranzila_notify)),
    );
}

#[cfg(test)]
mod tests {
    use crate::entities::{PaymentStatus, order_entity};
    use crate::handlers::testing::{TestApp, test_app};
    use crate::test_support;
    use actix_web::test;
    use sea_orm::EntityTrait;
    use serde_json::Value;
    use uuid::Uuid;

    async fn payment_status(t: &TestApp, id: Uuid) -> PaymentStatus {
        order_entity::Entity::find_by_id(id)
            .one(&t.db)
            .await
            .unwrap()
            .unwrap()
            .payment_status
    }

    #[actix_web::test]
    async fn test_late_fail_does_not_downgrade_paid() {
        let t = TestApp::new().await;
        let app = test_app!(t);
        let order = test_support::insert_order(&t.db, &t.fx, t.fx.area_id).await;
        t.payments.create_payment_request(Some(order.id)).await.unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/webhook/tranzila/success?orderId={}", order.id))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["success"], true);
        assert!(resp.get("data").is_none());
        assert_eq!(payment_status(&t, order.id).await, PaymentStatus::Paid);

        let req = test::TestRequest::post()
            .uri(&format!("/webhook/tranzila/fail?orderId={}", order.id))
            .set_payload("Response=004")
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["success"], true);
        assert_eq!(payment_status(&t, order.id).await, PaymentStatus::Paid);
    }

    #[actix_web::test]
    async fn test_success_without_payment_request_is_not_found() {
        let t = TestApp::new().await;
        let app = test_app!(t);
        let order = test_support::insert_order(&t.db, &t.fx, t.fx.area_id).await;

        let req = test::TestRequest::get()
            .uri(&format!("/webhook/tranzila/success?orderId={}", order.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: Value = test::read_body_json(resp).await;
        assert!(body.get("data").is_none());
        assert_eq!(payment_status(&t, order.id).await, PaymentStatus::Unpaid);
    }

    #[actix_web::test]
    async fn test_notify_for_unknown_order_is_not_found() {
        let t = TestApp::new().await;
        let app = test_app!(t);

        let req = test::TestRequest::post()
            .uri(&format!("/webhook/tranzila/notify?orderId={}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use crate::handlers::{current_scope, read_image};
use crate::models::*;
use crate::services::{AccessService, OrderService, ProductService};

#[utoipa::path(
    get,
    path = "/dashboard/orders",
    tag = "dashboard",
    params(
        ("status" = Option<String>, Query, description = "订单状态过滤"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("perPage" = Option<u32>, Query, description = "每页数量 (最大 100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "权限范围内的订单，最新在前"),
        (status = 400, description = "无效的状态值", body = ApiError),
        (status = 403, description = "无 DASHBOARD 权限", body = ApiError)
    )
)]
pub async fn list_orders(
    access_service: web::Data<AccessService>,
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<DashboardOrderQuery>,
) -> Result<HttpResponse> {
    let scope = match current_scope(&req, &access_service).await {
        Ok(scope) => scope,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.list_dashboard_orders(&scope, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/dashboard/products",
    tag = "dashboard",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "商品列表 (按名称)", body = [ProductResponse]),
        (status = 403, description = "无 DASHBOARD 权限", body = ApiError)
    )
)]
pub async fn list_products(
    access_service: web::Data<AccessService>,
    product_service: web::Data<ProductService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let scope = match current_scope(&req, &access_service).await {
        Ok(scope) => scope,
        Err(e) => return Ok(e.error_response()),
    };

    match product_service.list_products(&scope).await {
        Ok(products) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": products
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/dashboard/products",
    tag = "dashboard",
    request_body = CreateProductRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "创建成功", body = ProductResponse),
        (status = 400, description = "参数错误", body = ApiError),
        (status = 403, description = "无 DASHBOARD 权限", body = ApiError)
    )
)]
pub async fn create_product(
    access_service: web::Data<AccessService>,
    product_service: web::Data<ProductService>,
    req: HttpRequest,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse> {
    let scope = match current_scope(&req, &access_service).await {
        Ok(scope) => scope,
        Err(e) => return Ok(e.error_response()),
    };

    match product_service
        .create_product(&scope, body.into_inner())
        .await
    {
        Ok(product) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": product
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/dashboard/products/{product_id}",
    tag = "dashboard",
    params(
        ("product_id" = Uuid, Path, description = "商品ID")
    ),
    request_body = UpdateProductRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = ProductResponse),
        (status = 400, description = "参数错误或没有可更新的字段", body = ApiError),
        (status = 404, description = "商品不存在或不在权限范围内", body = ApiError)
    )
)]
pub async fn update_product(
    access_service: web::Data<AccessService>,
    product_service: web::Data<ProductService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse> {
    let scope = match current_scope(&req, &access_service).await {
        Ok(scope) => scope,
        Err(e) => return Ok(e.error_response()),
    };

    match product_service
        .update_product(&scope, path.into_inner(), body.into_inner())
        .await
    {
        Ok(product) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": product
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/dashboard/products/{product_id}/image",
    tag = "dashboard",
    params(
        ("product_id" = Uuid, Path, description = "商品ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "上传成功 (multipart 字段 file)", body = ImageUploadResponse),
        (status = 400, description = "文件缺失、过大或格式不支持", body = ApiError),
        (status = 404, description = "商品不存在或不在权限范围内", body = ApiError)
    )
)]
pub async fn upload_product_image(
    access_service: web::Data<AccessService>,
    product_service: web::Data<ProductService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let scope = match current_scope(&req, &access_service).await {
        Ok(scope) => scope,
        Err(e) => return Ok(e.error_response()),
    };
    let image = match read_image(payload).await {
        Ok(image) => image,
        Err(e) => return Ok(e.error_response()),
    };

    match product_service
        .upload_image(&scope, path.into_inner(), image)
        .await
    {
        Ok(url) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": ImageUploadResponse { url }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .route("/orders", web::get().to(list_orders))
            .route("/products", web::get().to(list_products))
            .route("/products", web::post().to(create_product))
            .route("/products/{product_id}", web::patch().to(update_product))
            .route(
                "/products/{product_id}/image",
                web::post().to(upload_product_image),
            ),
    );
}

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{current_user, read_image};
use crate::models::*;
use crate::services::{AccessService, VendorService};

/// 平台管理员（邮箱白名单）校验
fn require_admin(req: &HttpRequest, access: &AccessService) -> AppResult<()> {
    let user = current_user(req)?;
    access.require_platform_admin(&user)
}

#[utoipa::path(
    get,
    path = "/admin/vendors",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "商户列表，最新在前", body = [VendorResponse]),
        (status = 403, description = "不是平台管理员", body = ApiError)
    )
)]
pub async fn list_vendors(
    access_service: web::Data<AccessService>,
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &access_service) {
        return Ok(e.error_response());
    }

    match vendor_service.list_vendors().await {
        Ok(vendors) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": vendors
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/vendors",
    tag = "admin",
    request_body = CreateVendorRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "创建成功", body = VendorResponse),
        (status = 400, description = "名称或 slug 不合法", body = ApiError),
        (status = 409, description = "slug 已存在", body = ApiError)
    )
)]
pub async fn create_vendor(
    access_service: web::Data<AccessService>,
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    body: web::Json<CreateVendorRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &access_service) {
        return Ok(e.error_response());
    }

    match vendor_service.create_vendor(body.into_inner()).await {
        Ok(vendor) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": vendor
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/vendors/{vendor_id}",
    tag = "admin",
    params(
        ("vendor_id" = Uuid, Path, description = "商户ID")
    ),
    request_body = UpdateVendorRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功 (isActive=false 为停用)", body = VendorResponse),
        (status = 404, description = "商户不存在", body = ApiError)
    )
)]
pub async fn update_vendor(
    access_service: web::Data<AccessService>,
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateVendorRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &access_service) {
        return Ok(e.error_response());
    }

    match vendor_service
        .update_vendor(path.into_inner(), body.into_inner())
        .await
    {
        Ok(vendor) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": vendor
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/vendors/{vendor_id}/logo",
    tag = "admin",
    params(
        ("vendor_id" = Uuid, Path, description = "商户ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "上传成功 (multipart 字段 file)", body = ImageUploadResponse),
        (status = 400, description = "文件缺失、过大或格式不支持", body = ApiError),
        (status = 404, description = "商户不存在", body = ApiError)
    )
)]
pub async fn upload_logo(
    access_service: web::Data<AccessService>,
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &access_service) {
        return Ok(e.error_response());
    }
    let image = match read_image(payload).await {
        Ok(image) => image,
        Err(e) => return Ok(e.error_response()),
    };

    match vendor_service.upload_logo(path.into_inner(), image).await {
        Ok(url) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": ImageUploadResponse { url }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/vendors/{vendor_id}/areas",
    tag = "admin",
    params(
        ("vendor_id" = Uuid, Path, description = "商户ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "该商户的服务区域", body = [ServiceAreaResponse]),
        (status = 403, description = "不是平台管理员", body = ApiError)
    )
)]
pub async fn list_areas(
    access_service: web::Data<AccessService>,
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &access_service) {
        return Ok(e.error_response());
    }

    match vendor_service.list_areas(path.into_inner()).await {
        Ok(areas) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": areas
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/vendors/{vendor_id}/areas",
    tag = "admin",
    params(
        ("vendor_id" = Uuid, Path, description = "商户ID")
    ),
    request_body = CreateServiceAreaRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "创建成功", body = ServiceAreaResponse),
        (status = 400, description = "多边形不合法", body = ApiError),
        (status = 404, description = "商户不存在", body = ApiError),
        (status = 409, description = "slug 已存在", body = ApiError)
    )
)]
pub async fn create_area(
    access_service: web::Data<AccessService>,
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CreateServiceAreaRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req, &access_service) {
        return Ok(e.error_response());
    }

    match vendor_service
        .create_area(path.into_inner(), body.into_inner())
        .await
    {
        Ok(area) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": area
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/vendors")
            .route("", web::get().to(list_vendors))
            .route("", web::post().to(create_vendor))
            .route("/{vendor_id}", web::patch().to(update_vendor))
            .route("/{vendor_id}/logo", web::post().to(upload_logo))
            .route("/{vendor_id}/areas", web::get().to(list_areas))
            .route("/{vendor_id}/areas", web::post().to(create_area)),
    );
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing::{ADMIN_EMAIL, TestApp, test_app};
    use actix_web::test;
    use serde_json::{Value, json};
    use uuid::Uuid;

    #[actix_web::test]
    async fn test_admin_allow_list_is_enforced() {
        let t = TestApp::new().await;
        let app = test_app!(t);

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/vendors")
            .insert_header(t.bearer(Uuid::new_v4(), Some("someone@example.com")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/vendors")
            .insert_header(t.bearer(Uuid::new_v4(), Some("ADMIN@example.com")))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["data"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_create_vendor_and_area() {
        let t = TestApp::new().await;
        let app = test_app!(t);
        let admin = t.bearer(Uuid::new_v4(), Some(ADMIN_EMAIL));

        let req = test::TestRequest::post()
            .uri("/api/v1/admin/vendors")
            .insert_header(admin.clone())
            .set_json(json!({"name": "Ice Cream Bike", "slug": "Ice-Cream"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["slug"], "ice-cream");
        let vendor_id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/admin/vendors")
            .insert_header(admin.clone())
            .set_json(json!({"name": "Copycat", "slug": "ice-cream"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/admin/vendors/{vendor_id}/areas"))
            .insert_header(admin.clone())
            .set_json(json!({
                "name": "Beach",
                "slug": "beach",
                "polygon": {
                    "type": "Polygon",
                    "coordinates": [[[34.70, 32.00], [34.71, 32.00], [34.71, 32.01], [34.70, 32.00]]]
                }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/admin/vendors/{vendor_id}/areas"))
            .insert_header(admin.clone())
            .set_json(json!({"name": "Line", "slug": "line", "polygon": [[34.70, 32.00], [34.71, 32.00]]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/admin/vendors/{vendor_id}/areas"))
            .insert_header(admin)
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["data"].as_array().unwrap().len(), 1);
        assert_eq!(resp["data"][0]["slug"], "beach");
    }
}

use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use crate::handlers::{current_scope, current_user};
use crate::models::*;
use crate::services::AccessService;

#[utoipa::path(
    get,
    path = "/staff/me",
    tag = "staff",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前员工的权限范围与角色", body = StaffScope),
        (status = 403, description = "没有有效的员工身份", body = ApiError)
    )
)]
pub async fn get_me(
    access_service: web::Data<AccessService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    match current_scope(&req, &access_service).await {
        Ok(scope) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": scope
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/invites/claim",
    tag = "staff",
    request_body = ClaimInviteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "邀请已领取，员工身份已创建", body = StaffMemberResponse),
        (status = 400, description = "缺少 token 或邀请已被使用", body = ApiError),
        (status = 404, description = "邀请不存在", body = ApiError)
    )
)]
pub async fn claim_invite(
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    body: web::Json<ClaimInviteRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let token = body.token.as_deref().unwrap_or_default();

    match access_service.claim_invite(token, &user).await {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/vendors/{vendor_id}/invites",
    tag = "staff",
    params(
        ("vendor_id" = Uuid, Path, description = "商户ID")
    ),
    request_body = CreateInviteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "邀请已创建", body = InviteResponse),
        (status = 400, description = "参数错误", body = ApiError),
        (status = 403, description = "既不是平台管理员也不是该商户的 DASHBOARD 员工", body = ApiError),
        (status = 404, description = "商户或区域不存在", body = ApiError)
    )
)]
pub async fn create_invite(
    access_service: web::Data<AccessService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CreateInviteRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match access_service
        .create_invite(&user, path.into_inner(), body.into_inner())
        .await
    {
        Ok(invite) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": invite
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn staff_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/staff/me", web::get().to(get_me))
        .route("/invites/claim", web::post().to(claim_invite))
        .route("/vendors/{vendor_id}/invites", web::post().to(create_invite));
}

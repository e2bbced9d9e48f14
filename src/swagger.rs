use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{OrderStatus, PaymentStatus, StaffRole};
use crate::handlers;
use crate::models::*;
use crate::utils::PaginationInfo;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::location::validate_location,
        handlers::catalog::get_area_menu,
        handlers::order::place_order,
        handlers::order::get_order,
        handlers::order::update_order,
        handlers::payment::create_payment_request,
        handlers::webhook::tranzila_success,
        handlers::webhook::tranzila_fail,
        handlers::webhook::tranzila_notify,
        handlers::dashboard::list_orders,
        handlers::dashboard::list_products,
        handlers::dashboard::create_product,
        handlers::dashboard::update_product,
        handlers::dashboard::upload_product_image,
        handlers::waiter::list_queue,
        handlers::staff::get_me,
        handlers::staff::claim_invite,
        handlers::staff::create_invite,
        handlers::admin::list_vendors,
        handlers::admin::create_vendor,
        handlers::admin::update_vendor,
        handlers::admin::upload_logo,
        handlers::admin::list_areas,
        handlers::admin::create_area,
    ),
    components(
        schemas(
            ApiError,
            ImageUploadResponse,
            PaginationInfo,
            OrderStatus,
            PaymentStatus,
            StaffRole,
            ValidateLocationRequest,
            ValidateLocationResponse,
            LocationReason,
            CartItemInput,
            PlaceOrderRequest,
            PlaceOrderResponse,
            OrderStatusResponse,
            UpdateOrderRequest,
            UpdateOrderResponse,
            OrderItemResponse,
            OrderResponse,
            DashboardOrderQuery,
            CreatePaymentRequest,
            CreatePaymentResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductResponse,
            CreateVendorRequest,
            UpdateVendorRequest,
            VendorResponse,
            CreateServiceAreaRequest,
            ServiceAreaResponse,
            AreaMenuResponse,
            StaffScope,
            CreateInviteRequest,
            InviteResponse,
            ClaimInviteRequest,
            StaffMemberResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "customer", description = "Geofence check, menu, ordering and tracking"),
        (name = "payment", description = "Hosted payment page and provider callbacks"),
        (name = "staff", description = "Order updates, staff identity and invites"),
        (name = "dashboard", description = "Order dashboard and product management"),
        (name = "waiter", description = "Waiter queue"),
        (name = "admin", description = "Platform administration"),
    ),
    info(
        title = "On The Way Backend API",
        version = "1.0.0",
        description = "Geofenced ordering backend REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

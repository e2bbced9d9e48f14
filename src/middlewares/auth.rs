use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    /// 顾客端接口：只有指定方法公开，同一路径的其它方法仍需认证
    customer_routes: Vec<(Method, &'static str)>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            // 完全匹配的公开路径
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            // 前缀匹配的公开路径
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/webhook/"],
            // `*` 匹配单个路径段
            customer_routes: vec![
                (Method::POST, "/api/v1/validate-location"),
                (Method::POST, "/api/v1/orders"),
                (Method::GET, "/api/v1/orders/*"),
                (Method::GET, "/api/v1/areas/*"),
                (Method::POST, "/api/v1/payments/tranzila/create-request"),
            ],
        }
    }

    fn matches_pattern(pattern: &str, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        let mut pattern_segments = pattern.split('/');
        let mut path_segments = path.split('/');
        loop {
            match (pattern_segments.next(), path_segments.next()) {
                (None, None) => return true,
                (Some("*"), Some(seg)) if !seg.is_empty() => continue,
                (Some(p), Some(seg)) if p == seg => continue,
                _ => return false,
            }
        }
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        // 检查完全匹配
        if self.exact_paths.contains(&path) {
            return true;
        }

        // 检查前缀匹配
        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }

        self.customer_routes
            .iter()
            .any(|(m, pattern)| m == method && Self::matches_pattern(pattern, path))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        // 检查是否为公开路径
        if self.public_paths.is_public(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        // 提取Authorization header
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match token {
            Some(token) => match self.jwt_service.authenticate(token) {
                Ok(user) => {
                    // 将认证用户添加到请求扩展中
                    req.extensions_mut().insert(user);
                    let fut = self.service.call(req);
                    Box::pin(fut)
                }
                Err(e) => {
                    log::warn!("Rejected token on {} {}: {e}", req.method(), req.path());
                    let error = AppError::AuthError("Invalid access token".to_string());
                    Box::pin(async move { Err(error.into()) })
                }
            },
            None => {
                let error = AppError::AuthError("Missing access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_routes_are_method_aware() {
        let paths = PublicPaths::new();
        assert!(paths.is_public(&Method::POST, "/api/v1/orders"));
        assert!(paths.is_public(&Method::GET, "/api/v1/orders/8d7c0b4e-1f1a-4a53-9f49-0c8a3c8e2b11"));
        assert!(!paths.is_public(&Method::PATCH, "/api/v1/orders/8d7c0b4e-1f1a-4a53-9f49-0c8a3c8e2b11"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/orders"));
        assert!(paths.is_public(&Method::GET, "/api/v1/areas/demo"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/areas/"));
        assert!(paths.is_public(&Method::POST, "/webhook/tranzila/notify"));
        assert!(paths.is_public(&Method::GET, "/swagger-ui/index.html"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/dashboard/orders"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/admin/vendors"));
    }
}

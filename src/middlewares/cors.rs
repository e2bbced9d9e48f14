use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // 顾客页面与员工后台部署在不同域名下
            true
        })
        .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}

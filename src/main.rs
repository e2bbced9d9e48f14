use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines
use std::sync::Arc;

use ontheway_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{ObjectStore, StorageClient, TranzilaClient, TwilioService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks::spawn_side_effect_worker,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");
    log::info!(
        "Environment: {:?} (SMS and invoices are log-only outside production)",
        config.app.environment
    );

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 校验第三方认证服务签发的令牌
    if config.auth.jwt_secret.is_empty() {
        log::warn!("AUTH_JWT_SECRET is not set, every staff request will be rejected");
    }
    let jwt_service = JwtService::new(&config.auth.jwt_secret, config.auth.audience.clone());

    // 创建外部服务
    let twilio_service = Arc::new(TwilioService::new(config.twilio.clone()));
    let tranzila_client = Arc::new(TranzilaClient::new(config.tranzila.clone()));
    let storage: Arc<dyn ObjectStore> = Arc::new(StorageClient::new(config.storage.clone()));

    // 支付/发货后的副作用（发票 + 短信）由后台任务执行
    let dispatcher = NotificationDispatcher::new(twilio_service, config.app.environment);
    let invoices = select_invoice_provider(config.app.environment, tranzila_client.clone());
    let side_effects =
        spawn_side_effect_worker(SideEffectRunner::new(pool.clone(), dispatcher, invoices));

    // 创建服务
    let lifecycle_service = OrderLifecycleService::new(pool.clone(), side_effects);
    let access_service = AccessService::new(pool.clone(), config.app.clone());
    let location_service = LocationService::new(pool.clone());
    let order_service = OrderService::new(pool.clone(), config.tranzila.currency.clone());
    let product_service = ProductService::new(
        pool.clone(),
        storage.clone(),
        config.storage.product_image_bucket.clone(),
    );
    let vendor_service = VendorService::new(
        pool.clone(),
        storage,
        config.storage.vendor_logo_bucket.clone(),
    );
    let payment_service = PaymentService::new(
        pool.clone(),
        tranzila_client,
        lifecycle_service.clone(),
        config.app.site_url.clone(),
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .app_data(handlers::json_config())
            .app_data(handlers::path_config())
            .app_data(handlers::query_config())
            .app_data(web::Data::new(access_service.clone()))
            .app_data(web::Data::new(lifecycle_service.clone()))
            .app_data(web::Data::new(location_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(product_service.clone()))
            .app_data(web::Data::new(vendor_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::location_config)
                    .configure(handlers::catalog_config)
                    .configure(handlers::order_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::dashboard_config)
                    .configure(handlers::waiter_config)
                    .configure(handlers::staff_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

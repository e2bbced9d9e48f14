use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub tranzila: TranzilaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Tokens are issued by the external auth provider; we only verify them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppEnvironment {
    Production,
    #[default]
    Development,
}

impl AppEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, AppEnvironment::Production)
    }
}

impl std::str::FromStr for AppEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(AppEnvironment::Production),
            "development" | "dev" | "test" | "staging" => Ok(AppEnvironment::Development),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: AppEnvironment,
    /// Public site base URL, used for payment callback and invite links.
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl AppConfig {
    pub fn is_platform_admin(&self, email: Option<&str>) -> bool {
        let Some(email) = email.map(|e| e.trim().to_lowercase()) else {
            return false;
        };
        !email.is_empty()
            && self
                .admin_emails
                .iter()
                .any(|allowed| allowed.trim().to_lowercase() == email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    #[serde(default)]
    pub from_phone: String,
    #[serde(default)]
    pub messaging_service_sid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranzilaConfig {
    pub api_base: String,
    pub terminal_name: String,
    pub app_public_key: String,
    pub app_private_key: String,
    #[serde(default)]
    pub create_document_url: Option<String>,
    pub currency: String,
}

impl Default for TranzilaConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.tranzila.com".to_string(),
            terminal_name: String::new(),
            app_public_key: String::new(),
            app_private_key: String::new(),
            create_document_url: None,
            currency: "ILS".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_url: String,
    pub service_key: String,
    #[serde(default)]
    pub public_base_url: Option<String>,
    pub vendor_logo_bucket: String,
    pub product_image_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            service_key: String::new(),
            public_base_url: None,
            vendor_logo_bucket: "vendor-logos".to_string(),
            product_image_bucket: "product-images".to_string(),
        }
    }
}

fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    auth: AuthConfig::default(),
                    app: AppConfig::default(),
                    twilio: TwilioConfig::default(),
                    tranzila: TranzilaConfig::default(),
                    storage: StorageConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }

        if let Ok(v) = env::var("AUTH_JWT_SECRET") {
            config.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("AUTH_JWT_AUDIENCE") {
            config.auth.audience = Some(v);
        }

        if let Ok(v) = env::var("APP_ENV")
            && let Ok(environment) = v.parse()
        {
            config.app.environment = environment;
        }
        if let Ok(v) = env::var("SITE_URL") {
            config.app.site_url = Some(v);
        }
        if let Ok(v) = env::var("PLATFORM_ADMIN_EMAILS") {
            config.app.admin_emails = split_emails(&v);
        }

        if let Ok(v) = env::var("TWILIO_ACCOUNT_SID") {
            config.twilio.account_sid = v;
        }
        if let Ok(v) = env::var("TWILIO_AUTH_TOKEN") {
            config.twilio.auth_token = v;
        }
        if let Ok(v) = env::var("TWILIO_FROM_NUMBER") {
            config.twilio.from_phone = v;
        }
        if let Ok(v) = env::var("TWILIO_MESSAGING_SERVICE_SID") {
            config.twilio.messaging_service_sid = Some(v);
        }

        if let Ok(v) = env::var("TRANZILA_API_BASE") {
            config.tranzila.api_base = v;
        }
        if let Ok(v) = env::var("TRANZILA_TERMINAL_NAME") {
            config.tranzila.terminal_name = v;
        }
        if let Ok(v) = env::var("TRANZILA_APP_PUBLIC_KEY") {
            config.tranzila.app_public_key = v;
        }
        if let Ok(v) = env::var("TRANZILA_APP_PRIVATE_KEY") {
            config.tranzila.app_private_key = v;
        }
        if let Ok(v) = env::var("TRANZILA_CREATE_DOCUMENT_URL") {
            config.tranzila.create_document_url = Some(v);
        }
        if let Ok(v) = env::var("TRANZILA_CURRENCY") {
            config.tranzila.currency = v;
        }

        if let Ok(v) = env::var("STORAGE_BASE_URL") {
            config.storage.base_url = v;
        }
        if let Ok(v) = env::var("STORAGE_SERVICE_KEY") {
            config.storage.service_key = v;
        }
        if let Ok(v) = env::var("STORAGE_PUBLIC_BASE_URL") {
            config.storage.public_base_url = Some(v);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_admin_is_case_insensitive() {
        let app = AppConfig {
            admin_emails: split_emails(" Admin@Example.com ,ops@example.com,"),
            ..Default::default()
        };
        assert!(app.is_platform_admin(Some("admin@example.com")));
        assert!(app.is_platform_admin(Some("OPS@example.com")));
        assert!(!app.is_platform_admin(Some("someone@example.com")));
        assert!(!app.is_platform_admin(Some("")));
        assert!(!app.is_platform_admin(None));
    }

    #[test]
    fn test_environment_parsing_defaults_to_development() {
        assert_eq!(AppEnvironment::default(), AppEnvironment::Development);
        assert_eq!("PROD".parse::<AppEnvironment>(), Ok(AppEnvironment::Production));
        assert_eq!("dev".parse::<AppEnvironment>(), Ok(AppEnvironment::Development));
        assert!("moon".parse::<AppEnvironment>().is_err());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [database]
            url = "postgres://localhost/ontheway"
            max_connections = 5

            [app]
            environment = "production"
            admin_emails = ["root@example.com"]
        "#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert!(cfg.app.environment.is_production());
        assert_eq!(cfg.tranzila.currency, "ILS");
        assert_eq!(cfg.storage.vendor_logo_bucket, "vendor-logos");
        assert!(cfg.twilio.account_sid.is_empty());
    }
}

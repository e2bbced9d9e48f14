use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;

/// Object storage capability: store bytes at `bucket/path`, get a public URL back.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn store(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String>;
}

/// Maximum upload size (5MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats: (extension, content type)
const SUPPORTED_FORMATS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Validated image bytes ready for [`ObjectStore::store`].
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub content_type: &'static str,
}

impl ImageUpload {
    /// Format comes from the declared content type, else the file name extension.
    pub fn new(
        bytes: Vec<u8>,
        content_type: Option<&str>,
        filename: Option<&str>,
    ) -> AppResult<Self> {
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Empty file".to_string()));
        }
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(AppError::ValidationError(format!(
                "File too large (max {} MB)",
                MAX_IMAGE_SIZE / 1024 / 1024
            )));
        }

        let by_mime = content_type.and_then(|ct| {
            let ct = ct.trim().to_ascii_lowercase();
            SUPPORTED_FORMATS.iter().find(|(_, mime)| *mime == ct)
        });
        let by_name = || {
            let ext = filename?.rsplit_once('.')?.1.to_ascii_lowercase();
            SUPPORTED_FORMATS.iter().find(|(e, _)| *e == ext)
        };

        let (extension, content_type) = by_mime
            .or_else(by_name)
            .copied()
            .ok_or_else(|| AppError::ValidationError("Unsupported image format".to_string()))?;
        Ok(Self {
            bytes,
            extension,
            content_type,
        })
    }
}

pub fn build_public_url(base: &str, bucket: &str, path: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{trimmed}/{bucket}/{path}")
}

/// HTTP object store (Supabase-style storage API).
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    config: StorageConfig,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        let base = match &self.config.public_base_url {
            Some(base) if !base.is_empty() => base.clone(),
            _ => format!(
                "{}/object/public",
                self.config.base_url.trim_end_matches('/')
            ),
        };
        build_public_url(&base, bucket, path)
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn store(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        if self.config.base_url.is_empty() || self.config.service_key.is_empty() {
            return Err(AppError::ConfigError(
                "STORAGE_BASE_URL / STORAGE_SERVICE_KEY".to_string(),
            ));
        }

        let url = format!(
            "{}/object/{bucket}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.config.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Upload to {bucket}/{path} failed: {status} {error_text}");
            return Err(AppError::ExternalApiError(format!(
                "Upload failed: HTTP {status}"
            )));
        }

        log::info!("Stored object {bucket}/{path}");
        Ok(self.public_url(bucket, path))
    }
}

use crate::config::AppEnvironment;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    pub order_id: Uuid,
    /// Minor units
    pub total_amount: i64,
    pub customer_phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub invoice_id: String,
    pub url: Option<String>,
}

/// Kept apart from `AppError` so callers can log-and-continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    #[error("Invoice provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invoice provider error: {0}")]
    Upstream(String),

    #[error("Unexpected invoice provider response: {0}")]
    InvalidResponse(String),
}

impl InvoiceError {
    /// Configuration problems will not fix themselves on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InvoiceError::Upstream(_))
    }
}

#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError>;
}

/// 非生产环境使用的模拟发票
pub struct MockInvoiceProvider;

#[async_trait]
impl InvoiceProvider for MockInvoiceProvider {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        log::info!(
            "[INVOICE MOCK] Creating invoice: order={} amount={} phone={} created_at={}",
            request.order_id,
            request.total_amount,
            request.customer_phone,
            request.created_at
        );
        Ok(Invoice {
            invoice_id: format!("MOCK-{}", request.order_id),
            url: Some(format!(
                "https://example.com/invoices/mock/{}",
                request.order_id
            )),
        })
    }
}

/// Real documents only in production.
pub fn select_invoice_provider(
    environment: AppEnvironment,
    production: Arc<dyn InvoiceProvider>,
) -> Arc<dyn InvoiceProvider> {
    if environment.is_production() {
        production
    } else {
        Arc::new(MockInvoiceProvider)
    }
}

//! Tranzila REST client: hosted payment requests and financial documents.

use crate::config::TranzilaConfig;
use crate::error::{AppError, AppResult};
use crate::services::{Invoice, InvoiceError, InvoiceProvider, InvoiceRequest, PaymentGateway};
use crate::utils::generate_nonce;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use sha2::Sha256;

const DOCUMENT_DOWNLOAD_BASE: &str = "https://my.tranzila.com/api/get_financial_document";

const PAYMENT_URL_KEYS: [&str; 4] = ["payment_url", "sale_url", "url", "redirect_url"];
const PAYMENT_REFERENCE_KEYS: [&str; 4] = ["request_id", "pr_id", "transaction_id", "track_id"];

/// access token = HMAC-SHA256(message = public key, secret = private key + time + nonce)
pub fn sign_request(public_key: &str, private_key: &str, time: &str, nonce: &str) -> AppResult<String> {
    let secret = format!("{private_key}{time}{nonce}");
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::InternalError("HMAC key error".to_string()))?;
    mac.update(public_key.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// First non-empty string (or number) found under any of `keys`.
fn first_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match value.get(*k) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequestPayload {
    pub order_id: String,
    pub amount: i64,
    pub customer_phone: String,
    pub success_url: String,
    pub failure_url: String,
    pub notify_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequestResult {
    pub payment_url: String,
    pub payment_reference: Option<String>,
}

#[derive(Clone)]
pub struct TranzilaClient {
    client: Client,
    config: TranzilaConfig,
}

impl TranzilaClient {
    pub fn new(config: TranzilaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    fn signed_headers(&self) -> AppResult<Vec<(&'static str, String)>> {
        if self.config.app_public_key.is_empty() || self.config.app_private_key.is_empty() {
            return Err(AppError::ConfigError(
                "TRANZILA_APP_PUBLIC_KEY / TRANZILA_APP_PRIVATE_KEY".to_string(),
            ));
        }
        let time = chrono::Utc::now().timestamp().to_string();
        let nonce = generate_nonce();
        let token = sign_request(
            &self.config.app_public_key,
            &self.config.app_private_key,
            &time,
            &nonce,
        )?;
        Ok(vec![
            ("X-tranzila-api-app-key", self.config.app_public_key.clone()),
            ("X-tranzila-api-request-time", time),
            ("X-tranzila-api-nonce", nonce),
            ("X-tranzila-api-access-token", token),
        ])
    }

    async fn post_json(&self, url: &str, body: &Value) -> AppResult<(reqwest::StatusCode, Value)> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in self.signed_headers()? {
            request = request.header(name, value);
        }
        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;
        let data = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
        Ok((status, data))
    }

    fn payment_request_body(&self, payload: &PaymentRequestPayload) -> Value {
        json!({
            "terminal_name": self.config.terminal_name,
            "amount": payload.amount,
            "currency_code": self.config.currency,
            "success_url": payload.success_url,
            "failure_url": payload.failure_url,
            "notify_url": payload.notify_url,
            "client": { "phone": payload.customer_phone },
            "reference": payload.order_id,
            "description": format!("Order {}", payload.order_id),
        })
    }

    fn document_body(&self, request: &InvoiceRequest) -> Value {
        json!({
            "terminal_name": self.config.terminal_name,
            "currency": self.config.currency,
            "amount": format!("{:.2}", request.total_amount as f64 / 100.0),
            "customer": { "phone": request.customer_phone },
            "reference": request.order_id.to_string(),
            "created_at": request.created_at.to_rfc3339(),
        })
    }
}

#[async_trait]
impl PaymentGateway for TranzilaClient {
    /// Creates a hosted payment request and returns where to send the customer.
    async fn create_payment_request(
        &self,
        payload: &PaymentRequestPayload,
    ) -> AppResult<PaymentRequestResult> {
        if self.config.terminal_name.is_empty() {
            return Err(AppError::ConfigError("TRANZILA_TERMINAL_NAME".to_string()));
        }

        let url = format!("{}/v1/pr/create", self.config.api_base.trim_end_matches('/'));
        let (status, data) = self
            .post_json(&url, &self.payment_request_body(payload))
            .await?;

        if !status.is_success() {
            log::error!("Tranzila payment request failed: order={} status={status} body={data}", payload.order_id);
            return Err(AppError::ExternalApiError(format!(
                "Tranzila error: HTTP {status}"
            )));
        }

        let payment_url = first_field(&data, &PAYMENT_URL_KEYS).ok_or_else(|| {
            log::error!("Tranzila response without payment url: order={} body={data}", payload.order_id);
            AppError::ExternalApiError("No payment_url in response".to_string())
        })?;

        Ok(PaymentRequestResult {
            payment_url,
            payment_reference: first_field(&data, &PAYMENT_REFERENCE_KEYS),
        })
    }
}

/// Extracts id and download URL from a create-document response.
fn parse_document(data: &Value) -> Result<Invoice, InvoiceError> {
    let invoice_id = first_field(data, &["document_id", "id"])
        .ok_or_else(|| InvoiceError::InvalidResponse(format!("no document id in {data}")))?;
    let url = first_field(data, &["pdf_url"]).or_else(|| {
        first_field(data, &["token"]).map(|token| format!("{DOCUMENT_DOWNLOAD_BASE}/{token}"))
    });
    Ok(Invoice { invoice_id, url })
}

#[async_trait]
impl InvoiceProvider for TranzilaClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let url = self
            .config
            .create_document_url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| InvoiceError::NotConfigured("TRANZILA_CREATE_DOCUMENT_URL".to_string()))?;

        let (status, data) = self
            .post_json(&url, &self.document_body(request))
            .await
            .map_err(|e| match e {
                AppError::ConfigError(setting) => InvoiceError::NotConfigured(setting),
                other => InvoiceError::Upstream(other.to_string()),
            })?;

        if !status.is_success() {
            return Err(InvoiceError::Upstream(format!(
                "create document returned HTTP {status}: {data}"
            )));
        }
        parse_document(&data)
    }
}

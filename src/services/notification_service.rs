use crate::config::AppEnvironment;
use crate::error::AppResult;
use crate::utils::normalize_israeli_phone;
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound text message capability.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Non-production environment: message logged, nothing sent.
    LoggedOnly,
    InvalidPhone,
    Failed,
}

/// 客户短信通知：尽力而为，失败只记录日志，不向调用方抛错
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn SmsSender>,
    environment: AppEnvironment,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn SmsSender>, environment: AppEnvironment) -> Self {
        Self {
            sender,
            environment,
        }
    }

    pub async fn send(&self, raw_phone: &str, message: &str) -> DispatchOutcome {
        if raw_phone.trim().is_empty() {
            log::warn!("[SMS] Missing phone number, skipping");
            return DispatchOutcome::InvalidPhone;
        }

        let Some(phone) = normalize_israeli_phone(raw_phone) else {
            log::warn!("[SMS] Invalid phone number {raw_phone:?}, skipping");
            return DispatchOutcome::InvalidPhone;
        };

        if !self.environment.is_production() {
            log::info!("[SMS MOCK] Would send SMS to {phone}: {message}");
            return DispatchOutcome::LoggedOnly;
        }

        match self.sender.send_sms(&phone, message).await {
            Ok(()) => DispatchOutcome::Sent,
            Err(e) => {
                log::error!("[SMS] Sending to {phone} failed: {e}");
                DispatchOutcome::Failed
            }
        }
    }
}

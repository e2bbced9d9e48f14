use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use crate::services::SmsSender;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SendSmsResponse {
    pub sid: String,
    pub status: String,
}

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 有 Messaging Service 时优先使用，否则使用发送号码
    fn build_params<'a>(&'a self, to: &'a str, body: &'a str) -> AppResult<Vec<(&'static str, &'a str)>> {
        let sender = match self.config.messaging_service_sid.as_deref() {
            Some(sid) if !sid.is_empty() => ("MessagingServiceSid", sid),
            _ if !self.config.from_phone.is_empty() => ("From", self.config.from_phone.as_str()),
            _ => {
                return Err(AppError::ConfigError(
                    "TWILIO_FROM_NUMBER or TWILIO_MESSAGING_SERVICE_SID".to_string(),
                ));
            }
        };
        Ok(vec![("To", to), sender, ("Body", body)])
    }
}

#[async_trait]
impl SmsSender for TwilioService {
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<()> {
        if self.config.account_sid.is_empty() || self.config.auth_token.is_empty() {
            return Err(AppError::ConfigError(
                "TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN".to_string(),
            ));
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let params = self.build_params(to, body)?;

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let sent: SendSmsResponse = response.json().await?;
            log::info!("SMS accepted by Twilio: to={to} sid={} status={}", sent.sid, sent.status);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("SMS failed to send: {to}, Error: {error_text}");
            Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {error_text}"
            )))
        }
    }
}

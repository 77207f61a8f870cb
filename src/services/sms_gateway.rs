use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

/// Outbound SMS transport. One call per message, no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Sends `body` to `to` from the configured sender. Returns the
    /// provider's message id on success.
    async fn send(&self, to: &str, body: &str) -> Result<String>;
}

pub const UNKNOWN_SID: &str = "unknown";

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct TwilioGateway {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioGateway {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gateway_timeout_secs))
            .build()?;
        Ok(Self::new(
            client,
            &config.twilio_api_base,
            &config.twilio_account_sid,
            &config.twilio_auth_token,
            &config.twilio_from,
        ))
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl SmsGateway for TwilioGateway {
    async fn send(&self, to: &str, body: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("From", self.from.as_str()), ("To", to), ("Body", body)])
            .send()
            .await?;

        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioError>(&text)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(text);
            return Err(Error::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        // Accepted by the carrier; an unreadable body must not turn into a
        // failure or the reminder goes out again on the next run.
        let sid = match resp.text().await {
            Ok(text) => serde_json::from_str::<TwilioMessage>(&text)
                .map(|created| created.sid)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        Ok(sid.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "message accepted but response body unreadable");
            UNKNOWN_SID.to_string()
        }))
    }
}

//! # SendGrid Notifier
//!
//! Emails the terminal token as a rendered barcode through the SendGrid v3
//! mail API. The image is attached inline and referenced from the HTML body
//! as `cid:barcode`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::info;

use relay_engine::{NodeIdentity, Notifier, NotifyError, Token, TokenCodec};

use crate::container::config::{ConfigError, SendGridConfig};

const HTML_BODY: &str =
    "<strong>A continuacion se muestra el codigo de barras</strong> <img src='cid:barcode' />";

/// Notifier delivering the final barcode by email.
pub struct SendGridNotifier {
    client: reqwest::Client,
    config: SendGridConfig,
    codec: Arc<dyn TokenCodec>,
}

impl SendGridNotifier {
    /// Notifier whose requests are bounded by the configured timeouts.
    pub fn new(config: SendGridConfig, codec: Arc<dyn TokenCodec>) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            config,
            codec,
        })
    }

    /// SendGrid v3 request body.
    fn message_body(&self, node: NodeIdentity, image: &[u8]) -> Value {
        json!({
            "personalizations": [{
                "to": [{ "email": self.config.to_email, "name": self.config.to_name }]
            }],
            "from": { "email": self.config.from_email, "name": format!("Grupo #{node}") },
            "subject": format!("Grupo #{node} - mqtt barcode"),
            "content": [{ "type": "text/html", "value": HTML_BODY }],
            "attachments": [{
                "content": STANDARD.encode(image),
                "type": "image/jpeg",
                "filename": "barcode.jpg",
                "disposition": "inline",
                "content_id": "barcode"
            }]
        })
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn notify(&self, node: NodeIdentity, token: &Token) -> Result<(), NotifyError> {
        let image = self.codec.encode(&token.to_string())?;
        let body = self.message_body(node, &image);

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            node = %node,
            token = %token,
            to = %self.config.to_email,
            "Barcode email sent"
        );
        Ok(())
    }
}

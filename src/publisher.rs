use crate::traits::Publisher;
use crate::types::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Sends announcements to a Telegram channel through the Bot API.
pub struct TelegramPublisher {
    client: Client,
    api_url: String,
    chat_id: String,
    timeout: Duration,
    max_attempts: u32,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramPublisher {
    pub fn new(token: &str, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            api_url: format!("https://api.telegram.org/bot{}/sendMessage", token),
            chat_id,
            timeout: Duration::from_secs(10),
            max_attempts: 3,
        }
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn send(&self, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.api_url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_attempts {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(PipelineError::Publish(format!(
                            "telegram HTTP error: {}",
                            e
                        )));
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_attempts {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(PipelineError::Publish(format!(
                        "telegram request failed: {}",
                        e
                    )));
                }
            }
        }
    }
}

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use spdlog::debug;

use crate::error::DeliveryError;

/// Inbound webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Message,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub text: String,
    pub chat: Chat,
    pub from: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Minimal Bot API client. Every call is a single attempt.
pub struct TelegramClient {
    client: Client,
    api_base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(api_base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, api_base_url, token))
    }

    pub fn with_client(client: Client, api_base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_base_url,
            token: token.into(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.token, method)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        debug!("Sending telegram message to chat {}", chat_id);

        let response = self.client
            .post(self.api_url("sendMessage"))
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(DeliveryError::Rejected { status });
        }

        Ok(())
    }
}

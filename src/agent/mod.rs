use spdlog::{debug, info};

use crate::agent::telegram::{TelegramClient, Update};
use crate::chat_directory::ChatDirectory;
use crate::error::{DeliveryError, NotifyError, ProcessingError, StoreError};

pub mod telegram;

/// The only identity the agent answers.
pub const OWNER: &str = "MorganGallant";

pub const REFUSAL_TEXT: &str = "Sorry, I only respond to my owner right now.";
pub const ACKNOWLEDGMENT_TEXT: &str = "Hello owner!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Refusal,
    Acknowledgment,
}

impl Reply {
    pub fn text(&self) -> &'static str {
        match self {
            Reply::Refusal => REFUSAL_TEXT,
            Reply::Acknowledgment => ACKNOWLEDGMENT_TEXT,
        }
    }
}

pub struct Agent {
    directory: ChatDirectory,
    client: TelegramClient,
    owner: String,
}

impl Agent {
    pub fn new(directory: ChatDirectory, client: TelegramClient) -> Agent {
        Agent {
            directory,
            client,
            owner: OWNER.to_string(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn resolve_destination(&self, identity: &str) -> Result<Option<i64>, StoreError> {
        self.directory.get(identity)
    }

    pub fn bind_destination(&self, identity: &str, chat_id: i64) -> Result<(), StoreError> {
        info!("Binding {} to chat {}", identity, chat_id);
        self.directory.set(identity, chat_id)
    }

    pub async fn send(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.client.send_message(chat_id, text).await
    }

    /// Messages the owner on their last known chat.
    pub async fn notify_owner(&self, text: &str) -> Result<(), NotifyError> {
        let Some(chat_id) = self.resolve_destination(&self.owner)? else {
            return Err(NotifyError::Unbound(self.owner.clone()));
        };
        self.send(chat_id, text).await?;
        Ok(())
    }

    /// Handles one webhook event and returns the reply that was sent, if any.
    ///
    /// The sender's chat binding is refreshed before the owner check, so the
    /// owner's latest chat is always recorded.
    pub async fn handle_inbound(&self, update: &Update) -> Result<Option<Reply>, ProcessingError> {
        let message = &update.message;
        let Some(username) = message.from.as_ref().and_then(|u| u.username.as_deref()) else {
            debug!("Ignoring update {} without a sender username", update.update_id);
            return Ok(None);
        };

        let chat_id = message.chat.id;
        if self.resolve_destination(username)? != Some(chat_id) {
            self.bind_destination(username, chat_id)?;
        }

        let reply = if username == self.owner {
            Reply::Acknowledgment
        } else {
            info!("Refusing update {} from {}", update.update_id, username);
            Reply::Refusal
        };

        self.send(chat_id, reply.text()).await?;
        Ok(Some(reply))
    }
}

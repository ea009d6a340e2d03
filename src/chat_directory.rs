use std::path::Path;

use spdlog::info;

use crate::error::StoreError;

/// Durable identity -> chat id mapping.
///
/// Only the last observed chat is kept per identity. sled serializes writes to
/// a key, so concurrent callers need no extra locking.
#[derive(Clone)]
pub struct ChatDirectory {
    db: sled::Db,
}

fn chat_id_key(identity: &str) -> String {
    format!("telegram:user:{}:chat_id", identity)
}

impl ChatDirectory {
    pub fn open(path: &Path) -> Result<ChatDirectory, StoreError> {
        info!("Opening chat directory at {}", path.display());
        let db = sled::open(path)?;
        Ok(ChatDirectory { db })
    }

    /// In-memory directory removed when dropped.
    pub fn temporary() -> Result<ChatDirectory, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(ChatDirectory { db })
    }

    /// `None` means the identity never reached us.
    pub fn get(&self, identity: &str) -> Result<Option<i64>, StoreError> {
        let key = chat_id_key(identity);
        let Some(value) = self.db.get(key.as_bytes())? else {
            return Ok(None);
        };

        let value = String::from_utf8_lossy(&value);
        match value.parse::<i64>() {
            Ok(chat_id) => Ok(Some(chat_id)),
            Err(_) => Err(StoreError::Corrupt { key, value: value.to_string() }),
        }
    }

    pub fn set(&self, identity: &str, chat_id: i64) -> Result<(), StoreError> {
        let key = chat_id_key(identity);
        self.db.insert(key.as_bytes(), chat_id.to_string().as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_raw(&self, identity: &str, value: &str) -> Result<(), StoreError> {
        self.db.insert(chat_id_key(identity).as_bytes(), value.as_bytes())?;
        Ok(())
    }
}

pub mod agent;
pub mod bundle;
pub mod chat_directory;
pub mod config;
pub mod content;
pub mod error;
pub mod logger;
pub mod request_start;
pub mod scheduler;
pub mod server;
mod test_data;
mod text_utils;
pub mod view;

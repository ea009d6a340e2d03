use std::io;

use thiserror::Error;

/// Startup-fatal problems with the bundled content or templates.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error reading bundled resources: {0}")]
    Bundle(#[from] io::Error),
    #[error("missing base template, expected to find {0}")]
    MissingBaseTemplate(String),
    #[error("error parsing template {name}: {reason}")]
    Template { name: String, reason: String },
    #[error("overlapping blog post {0}.md, shouldn't happen")]
    DuplicatePost(String),
    #[error("error rendering feed: {0}")]
    Feed(#[from] quick_xml::Error),
}

/// A single document that could not be turned into a post. Logged and skipped.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("blog posts should start with a '#', i.e. a title")]
    MissingTitle,
    #[error("titles should end with a newline character")]
    UnterminatedTitle,
    #[error("document is not valid UTF-8")]
    InvalidUtf8,
    #[error("error rendering markdown: {0}")]
    Markdown(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("missing template {0}")]
    UnknownTemplate(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("chat directory error: {0}")]
    Db(#[from] sled::Error),
    #[error("invalid chat id stored under {key}: {value:?}")]
    Corrupt { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to send telegram message: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to send telegram message: {status}")]
    Rejected { status: reqwest::StatusCode },
}

/// Failure to reach the owner from a background job.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("missing chat ID for {0}")]
    Unbound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Failure while handling one inbound webhook event.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("malformed update: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl ProcessingError {
    /// Whether the sender, rather than this server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ProcessingError::Malformed(_))
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid schedule {schedule:?} for job {name}: {reason}")]
    InvalidSchedule {
        name: String,
        schedule: String,
        reason: String,
    },
}

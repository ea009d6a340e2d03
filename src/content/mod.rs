use chrono::NaiveDate;

use crate::text_utils::{format_date, strip_tags, truncate_encoded};

pub mod blog;
pub mod document_store;

pub const BLOG_PREFIX: &str = "/blog";

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub date: NaiveDate,
    /// Sanitized HTML
    pub body: String,
}

impl Post {
    /// Publish dates are unique, so the date doubles as the address of a post.
    pub fn slug(&self) -> String {
        format_date(&self.date)
    }

    pub fn permalink(&self) -> String {
        format!("{}/{}", BLOG_PREFIX, self.slug())
    }

    /// Beginning of the rendered body without markup. Escaped text stays
    /// escaped, so the summary can be embedded as HTML.
    pub fn summary(&self, max_chars: usize) -> String {
        let text = strip_tags(&self.body);
        truncate_encoded(&text, max_chars).trim_end().to_string()
    }
}

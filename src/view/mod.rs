use std::time::Instant;

use chrono::{Datelike, Utc};

use crate::content::Post;
use crate::text_utils::format_date;

pub mod rss_renderer;
pub mod template_set;

const SITE_TITLE: &str = "Morgan Gallant";

/// Data shared by every page, rendered by the base layout.
#[derive(Debug, Clone)]
pub struct Common {
    pub processing_time: String,
    pub current_year: i64,
}

impl Common {
    /// `start` is when the request was received.
    pub fn since(start: Instant) -> Common {
        // Rendering time itself is not included, it should be negligible
        Common {
            processing_time: format!("{:?}", start.elapsed()),
            current_year: Utc::now().year() as i64,
        }
    }
}

/// What a page template gets to render.
pub enum View<'a> {
    Home { common: Common, recent: &'a [Post] },
    BlogIndex { common: Common, posts: &'a [Post] },
    BlogPost { common: Common, post: &'a Post },
    /// Any other template page. Gets the newest posts like the home page.
    Page { common: Common, recent: &'a [Post] },
}

impl View<'_> {
    pub fn common(&self) -> &Common {
        match self {
            View::Home { common, .. } => common,
            View::BlogIndex { common, .. } => common,
            View::BlogPost { common, .. } => common,
            View::Page { common, .. } => common,
        }
    }

    pub fn title(&self) -> String {
        match self {
            View::BlogIndex { .. } => format!("Writing | {}", SITE_TITLE),
            View::BlogPost { post, .. } => format!("{} | {}", post.title, SITE_TITLE),
            View::Home { .. } | View::Page { .. } => SITE_TITLE.to_string(),
        }
    }
}

#[derive(ramhorns::Content)]
pub(crate) struct PostItem {
    date: String,
    link: String,
    title: String,
    body: String,
}

impl From<&Post> for PostItem {
    fn from(post: &Post) -> Self {
        PostItem {
            date: format_date(&post.date),
            link: post.permalink(),
            title: post.title.clone(),
            body: post.body.clone(),
        }
    }
}

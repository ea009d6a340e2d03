use std::collections::HashMap;

use spdlog::info;

use crate::config::RssFeed;
use crate::content::Post;
use crate::error::LoadError;
use crate::view::rss_renderer::RssChannel;

/// Every post of the site, read once at startup and never changed after.
pub struct Blog {
    // Newest first
    posts: Vec<Post>,
    slug_to_index: HashMap<String, usize>,
    feed: Vec<u8>,
}

impl Blog {
    /// `posts` must already be sorted newest first, as `load_posts` returns them.
    pub fn new(posts: Vec<Post>, channel: &RssFeed) -> Result<Blog, LoadError> {
        let mut slug_to_index = HashMap::with_capacity(posts.len());
        for (i, post) in posts.iter().enumerate() {
            let slug = post.slug();
            if slug_to_index.contains_key(&slug) {
                return Err(LoadError::DuplicatePost(slug));
            }
            slug_to_index.insert(slug, i);
        }

        let rss = RssChannel {
            ch_title: &channel.title,
            ch_link: &channel.site_url,
            ch_desc: &channel.description,
        };
        let feed = rss.render(&posts)?;

        info!("Blog loaded with {} posts", posts.len());

        Ok(Blog {
            posts,
            slug_to_index,
            feed,
        })
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, slug: &str) -> Option<&Post> {
        self.slug_to_index.get(slug).map(|&i| &self.posts[i])
    }

    pub fn recent(&self, count: usize) -> &[Post] {
        &self.posts[..count.min(self.posts.len())]
    }

    pub fn feed(&self) -> &[u8] {
        &self.feed
    }
}

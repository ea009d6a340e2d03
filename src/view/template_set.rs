use std::collections::HashMap;

use ramhorns::Template;
use spdlog::debug;

use crate::bundle::{file_name, Bundle};
use crate::error::{LoadError, RenderError};
use crate::view::{PostItem, View};

pub const TEMPLATE_DIR: &str = "templates";
pub const TEMPLATE_EXT: &str = ".html";
pub const BASE_TEMPLATE: &str = "base";

#[derive(ramhorns::Content)]
struct HomePage {
    recent: Vec<PostItem>,
}

#[derive(ramhorns::Content)]
struct ListPage {
    posts: Vec<PostItem>,
}

#[derive(ramhorns::Content)]
struct PostPage {
    post: PostItem,
}

#[derive(ramhorns::Content)]
struct StaticPage {
    recent: Vec<PostItem>,
    current_year: i64,
}

#[derive(ramhorns::Content)]
struct Layout<'a> {
    title: &'a str,
    body: &'a str,
    processing_time: &'a str,
    current_year: i64,
}

/// Named page templates that all render through the shared base layout.
pub struct TemplateSet {
    base: Template<'static>,
    templates: HashMap<String, Template<'static>>,
}

impl TemplateSet {
    /// Compiles every `*.html` file directly inside `dir`. `base.html` is the
    /// layout and must exist; every other file becomes a template named after
    /// the file without its extension.
    pub fn build(bundle: &Bundle, dir: &str) -> Result<TemplateSet, LoadError> {
        let base_name = format!("{}{}", BASE_TEMPLATE, TEMPLATE_EXT);

        let mut base = None;
        let mut templates = HashMap::new();
        for (path, src) in bundle.read_dir(dir) {
            let name = file_name(path);
            let Some(id) = name.strip_suffix(TEMPLATE_EXT) else {
                continue;
            };

            let template = compile(name, src)?;
            if name == base_name {
                base = Some(template);
            } else {
                debug!("Compiled template {}", id);
                templates.insert(id.to_string(), template);
            }
        }

        let Some(base) = base else {
            return Err(LoadError::MissingBaseTemplate(base_name));
        };

        Ok(TemplateSet {
            base,
            templates,
        })
    }

    pub fn has(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn exec(&self, id: &str, view: &View) -> Result<String, RenderError> {
        let Some(template) = self.templates.get(id) else {
            return Err(RenderError::UnknownTemplate(id.to_string()));
        };

        let body = match view {
            View::Home { recent, .. } => template.render(&HomePage {
                recent: recent.iter().map(PostItem::from).collect(),
            }),
            View::BlogIndex { posts, .. } => template.render(&ListPage {
                posts: posts.iter().map(PostItem::from).collect(),
            }),
            View::BlogPost { post, .. } => template.render(&PostPage {
                post: PostItem::from(*post),
            }),
            View::Page { common, recent } => template.render(&StaticPage {
                recent: recent.iter().map(PostItem::from).collect(),
                current_year: common.current_year,
            }),
        };

        let common = view.common();
        let title = view.title();
        Ok(self.base.render(&Layout {
            title: &title,
            body: &body,
            processing_time: &common.processing_time,
            current_year: common.current_year,
        }))
    }
}

fn compile(name: &str, src: &[u8]) -> Result<Template<'static>, LoadError> {
    let src = match String::from_utf8(src.to_vec()) {
        Ok(src) => src,
        Err(e) => return Err(LoadError::Template { name: name.to_string(), reason: e.to_string() }),
    };

    match Template::new(src) {
        Ok(x) => Ok(x),
        Err(e) => Err(LoadError::Template { name: name.to_string(), reason: e.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::content::Post;
    use crate::test_data::sample_bundle;
    use crate::view::Common;

    use super::*;

    fn common() -> Common {
        Common {
            processing_time: "1ms".to_string(),
            current_year: 2024,
        }
    }

    #[test]
    fn test_build_skips_base_and_other_files() {
        let set = TemplateSet::build(&sample_bundle(), TEMPLATE_DIR).unwrap();
        assert!(set.has("index"));
        assert!(set.has("blog_index"));
        assert!(set.has("blog_post"));
        assert!(set.has("about"));
        assert!(!set.has("base"));
        assert!(!set.has("notes"));
    }

    #[test]
    fn test_missing_base() {
        let bundle = Bundle::from_files([("templates/index.html", "hi")]);
        match TemplateSet::build(&bundle, TEMPLATE_DIR) {
            Err(LoadError::MissingBaseTemplate(name)) => assert_eq!(name, "base.html"),
            _ => panic!("expected a missing base template error"),
        }
    }

    #[test]
    fn test_base_must_be_top_level() {
        let bundle = Bundle::from_files([
            ("templates/nested/base.html", "{{{body}}}"),
            ("templates/index.html", "hi"),
        ]);
        assert!(TemplateSet::build(&bundle, TEMPLATE_DIR).is_err());
    }

    #[test]
    fn test_exec_goes_through_base() {
        let set = TemplateSet::build(&sample_bundle(), TEMPLATE_DIR).unwrap();
        let post = Post {
            title: "<Hello>".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            body: "<p>Body</p>".to_string(),
        };

        let res = set.exec("blog_post", &View::BlogPost { common: common(), post: &post }).unwrap();
        assert_eq!(res, "<title>&lt;Hello&gt; | Morgan Gallant</title>[&lt;Hello&gt;|<p>Body</p>](2024)");

        let res = set.exec("about", &View::Page { common: common(), recent: &[] }).unwrap();
        assert_eq!(res, "<title>Morgan Gallant</title>[about me](2024)");

        let recent = [post];
        let res = set.exec("index", &View::Page { common: common(), recent: &recent }).unwrap();
        assert_eq!(res, "<title>Morgan Gallant</title>[<&lt;Hello&gt;>](2024)");
    }

    #[test]
    fn test_exec_unknown_template() {
        let set = TemplateSet::build(&sample_bundle(), TEMPLATE_DIR).unwrap();
        let res = set.exec("missing", &View::Page { common: common(), recent: &[] });
        assert!(matches!(res, Err(RenderError::UnknownTemplate(id)) if id == "missing"));
    }
}

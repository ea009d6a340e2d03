use std::sync::Arc;

use anyhow::Result;
use ntex::time::Seconds;
use ntex::util::Bytes;
use ntex::web;
use ntex::web::HttpRequest;
use spdlog::{error, info, warn};

use crate::agent::telegram::{TelegramClient, Update};
use crate::agent::Agent;
use crate::bundle::Bundle;
use crate::chat_directory::ChatDirectory;
use crate::config::Config;
use crate::content::blog::Blog;
use crate::content::document_store::{load_posts, WRITING_DIR};
use crate::content::BLOG_PREFIX;
use crate::error::ProcessingError;
use crate::request_start::{RequestStart, StampStart};
use crate::scheduler::jobs::default_jobs;
use crate::scheduler::{JobContext, Scheduler};
use crate::view::template_set::{TemplateSet, TEMPLATE_DIR};
use crate::view::{Common, View};

const STATIC_DIR: &str = "static";
const HOME_TEMPLATE: &str = "index";
const BLOG_INDEX_TEMPLATE: &str = "blog_index";
const BLOG_POST_TEMPLATE: &str = "blog_post";
const RECENT_POSTS: usize = 3;

pub struct AppState {
    pub bundle: Bundle,
    pub blog: Blog,
    pub templates: TemplateSet,
    pub agent: Arc<Agent>,
}

fn render_view(templates: &TemplateSet, id: &str, view: &View) -> web::HttpResponse {
    match templates.exec(id, view) {
        Ok(rendered) => web::HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(rendered),
        Err(e) => {
            warn!("Error rendering template {}: {}", id, e);
            web::HttpResponse::NotFound().finish()
        }
    }
}

#[web::get("/health")]
async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("OK")
}

#[web::get("/")]
async fn home(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let common = Common::since(RequestStart::of(&req).0);
    let view = View::Home { common, recent: state.blog.recent(RECENT_POSTS) };
    render_view(&state.templates, HOME_TEMPLATE, &view)
}

#[web::get("/blog")]
async fn blog_index(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let common = Common::since(RequestStart::of(&req).0);
    let view = View::BlogIndex { common, posts: state.blog.posts() };
    render_view(&state.templates, BLOG_INDEX_TEMPLATE, &view)
}

#[web::get("/blog/")]
async fn blog_index_slash() -> web::HttpResponse {
    web::HttpResponse::TemporaryRedirect()
        .header("Location", BLOG_PREFIX)
        .finish()
}

#[web::get("/blog/feed.xml")]
async fn blog_feed(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("application/rss+xml")
        .body(state.blog.feed().to_vec())
}

#[web::get("/blog/{slug}")]
async fn blog_post(req: HttpRequest, slug: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let slug = slug.into_inner();
    let Some(post) = state.blog.post(slug.trim_end_matches('/')) else {
        return web::HttpResponse::NotFound().finish();
    };

    let common = Common::since(RequestStart::of(&req).0);
    render_view(&state.templates, BLOG_POST_TEMPLATE, &View::BlogPost { common, post })
}

#[web::post("/telegram")]
async fn telegram(body: Bytes, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let result = match serde_json::from_slice::<Update>(&body) {
        Ok(update) => state.agent.handle_inbound(&update).await,
        Err(e) => Err(ProcessingError::from(e)),
    };

    match result {
        Ok(_) => web::HttpResponse::Ok().finish(),
        Err(e) if e.is_client_error() => {
            warn!("Rejecting telegram update: {}", e);
            web::HttpResponse::BadRequest().body("bad request")
        }
        Err(e) => {
            error!("Error processing telegram update: {}", e);
            web::HttpResponse::InternalServerError().body("internal error")
        }
    }
}

/// A template named after the path, otherwise a file from the static tree.
#[web::get("/{path}*")]
async fn page_or_static(req: HttpRequest, path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let path = path.into_inner();
    let path = path.trim_matches('/');
    if path.split('/').any(|part| part == "..") {
        return web::HttpResponse::Forbidden().body("Access forbidden");
    }

    if state.templates.has(path) {
        let common = Common::since(RequestStart::of(&req).0);
        let view = View::Page { common, recent: state.blog.recent(RECENT_POSTS) };
        return render_view(&state.templates, path, &view);
    }

    let file_path = format!("{}/{}", STATIC_DIR, path);
    match state.bundle.get(&file_path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            web::HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(content.to_vec())
        }
        None => web::HttpResponse::NotFound().finish(),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Order matters: specific routes before the catch-all
    cfg.service(health)
        .service(home)
        .service(blog_index)
        .service(blog_index_slash)
        .service(blog_feed)
        .service(blog_post)
        .service(telegram)
        .service(page_or_static);
}

/// Loads everything served from the bundle. Any error here means the binary
/// was built with broken content and must not start.
pub fn load_site(bundle: Bundle, config: &Config, agent: Arc<Agent>) -> Result<AppState> {
    let posts = load_posts(&bundle, WRITING_DIR)?;
    let blog = Blog::new(posts, &config.rss_feed)?;
    let templates = TemplateSet::build(&bundle, TEMPLATE_DIR)?;

    Ok(AppState {
        bundle,
        blog,
        templates,
        agent,
    })
}

pub async fn server_run(config: Config, telegram_key: String) -> Result<()> {
    let directory = ChatDirectory::open(&config.paths.data_dir)?;
    let client = TelegramClient::new(config.telegram.api_base_url.as_str(), telegram_key)?;
    let agent = Arc::new(Agent::new(directory, client));

    let app_state = Arc::new(load_site(Bundle::embedded()?, &config, agent.clone())?);

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let mut scheduler = Scheduler::new(default_jobs(), JobContext { agent, http })?;
    scheduler.start();

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    info!("Started http server on {}:{}", bind_addr, bind_port);

    let served = web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .wrap(StampStart)
            .configure(configure)
    })
        .bind((bind_addr, bind_port))?
        .shutdown_timeout(Seconds(3))
        .run()
        .await;

    scheduler.stop().await;

    Ok(served?)
}

#[cfg(test)]
mod tests {
    use ntex::http::StatusCode;
    use ntex::web::test;

    use crate::config::{Paths, RssFeed, Server, Telegram};
    use crate::test_data::sample_bundle;

    use super::*;

    fn config() -> Config {
        Config {
            paths: Paths { data_dir: "data".into() },
            server: Server { address: "127.0.0.1".to_string(), port: 0 },
            telegram: Telegram::default(),
            rss_feed: RssFeed {
                title: "Writing".to_string(),
                site_url: "https://example.com".to_string(),
                description: "Posts".to_string(),
            },
            log: None,
        }
    }

    fn state() -> (Arc<AppState>, Arc<Agent>) {
        let directory = ChatDirectory::temporary().unwrap();
        let client = TelegramClient::new("http://127.0.0.1:1", "token").unwrap();
        let agent = Arc::new(Agent::new(directory, client));
        let state = load_site(sample_bundle(), &config(), agent.clone()).unwrap();
        (Arc::new(state), agent)
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let (state, _) = state();
        let app = test::init_service(
            web::App::new().state(state).wrap(StampStart).configure(configure)
        ).await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[ntex::test]
    async fn test_health() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[ntex::test]
    async fn test_home_lists_recent_posts() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("[<Later><Hello>]"));
    }

    #[ntex::test]
    async fn test_blog_pages() {
        let (status, body) = get("/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("2024-06-01 Later /blog/2024-06-01;2024-01-01 Hello /blog/2024-01-01;"));

        let (status, body) = get("/blog/2024-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Hello|<p>Body text</p>"));

        let (status, _) = get("/blog/2023-01-01").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[ntex::test]
    async fn test_feed() {
        let (status, body) = get("/blog/feed.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("https://example.com/blog/2024-06-01"));
    }

    #[ntex::test]
    async fn test_pages_and_static_files() {
        let (status, body) = get("/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("[about me]"));

        let (status, body) = get("/index").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("[<Later><Hello>]"));

        let (status, body) = get("/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");

        let (status, _) = get("/missing.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get("/../Cargo.toml").await;
        assert_ne!(status, StatusCode::OK);
    }

    #[ntex::test]
    async fn test_webhook() {
        let (state, agent) = state();
        let app = test::init_service(
            web::App::new().state(state).wrap(StampStart).configure(configure)
        ).await;

        let req = test::TestRequest::post().uri("/telegram").set_payload("not json").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let anonymous = r#"{"update_id": 1, "message": {"message_id": 1, "text": "hi", "chat": {"id": 5}}}"#;
        let req = test::TestRequest::post().uri("/telegram").set_payload(anonymous).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // The gateway is unreachable, but the binding is stored first
        let stranger = r#"{"update_id": 2, "message": {"message_id": 2, "text": "hi", "chat": {"id": 6},
            "from": {"id": 3, "first_name": "S", "username": "stranger"}}}"#;
        let req = test::TestRequest::post().uri("/telegram").set_payload(stranger).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(agent.resolve_destination("stranger").unwrap(), Some(6));
    }
}

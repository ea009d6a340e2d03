use anyhow::Context;
use spdlog::debug;

use crate::scheduler::{Job, JobContext};

/// Jobs the site runs out of the box.
pub fn default_jobs() -> Vec<Job> {
    vec![
        url_probe(
            "gallant.com out-of-biz check",
            "@daily",
            "https://gallant.com",
            "gallant.com may be out of business!",
        ),
    ]
}

/// GETs `url` and tells the owner when it answers with an error status or
/// can't be reached at all.
pub fn url_probe(name: &str, schedule: &str, url: &str, alert: &str) -> Job {
    let url = url.to_string();
    let alert = alert.to_string();

    Job::new(name, schedule, move |ctx: JobContext| {
        let url = url.clone();
        let alert = alert.clone();
        async move {
            let response = match ctx.http.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    let text = format!("{} Daily ping to {} failed: {}", alert, url, e);
                    ctx.agent.notify_owner(&text).await?;
                    return Err(e).with_context(|| format!("failed to GET {}", url));
                }
            };

            let status = response.status();
            debug!("{} answered {}", url, status);
            if status.as_u16() >= 400 {
                let text = format!("{} Daily ping returned status {}.", alert, status);
                ctx.agent.notify_owner(&text).await?;
            }

            Ok::<(), anyhow::Error>(())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::agent::telegram::TelegramClient;
    use crate::agent::{Agent, OWNER};
    use crate::chat_directory::ChatDirectory;
    use crate::scheduler::run_job;

    use super::*;

    async fn setup(site_status: u16) -> (MockServer, MockServer, JobContext) {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(site_status))
            .mount(&site)
            .await;

        let gateway = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&gateway)
            .await;

        let directory = ChatDirectory::temporary().unwrap();
        let client = TelegramClient::new(gateway.uri(), "token").unwrap();
        let ctx = JobContext {
            agent: Arc::new(Agent::new(directory, client)),
            http: reqwest::Client::new(),
        };
        (site, gateway, ctx)
    }

    #[test]
    fn test_default_jobs() {
        let jobs = default_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].schedule, "@daily");
    }

    #[tokio::test]
    async fn test_healthy_site_is_quiet() {
        let (site, gateway, ctx) = setup(200).await;
        ctx.agent.bind_destination(OWNER, 1).unwrap();

        let job = url_probe("probe", "@daily", &site.uri(), "down!");
        assert!(run_job(&job, ctx).await);
        assert!(gateway.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_failing_site_alerts_owner() {
        let (site, gateway, ctx) = setup(503).await;
        ctx.agent.bind_destination(OWNER, 1).unwrap();

        let job = url_probe("probe", "@daily", &site.uri(), "down!");
        assert!(run_job(&job, ctx).await);

        let sent = gateway.received_requests().await.unwrap_or_default();
        assert_eq!(sent.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(body["chat_id"], 1);
        assert!(body["text"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_unbound_owner_fails_the_job() {
        let (site, gateway, ctx) = setup(500).await;

        let job = url_probe("probe", "@daily", &site.uri(), "down!");
        assert!(!run_job(&job, ctx).await);
        assert!(gateway.received_requests().await.unwrap_or_default().is_empty());
    }
}

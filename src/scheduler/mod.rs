use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use croner::Cron;
use spdlog::{error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::agent::Agent;
use crate::error::SchedulerError;

pub mod jobs;

pub type JobFuture = Pin<Box<dyn Future<Output=anyhow::Result<()>> + Send>>;
pub type WorkFn = Arc<dyn Fn(JobContext) -> JobFuture + Send + Sync>;

/// What a job gets to do its work.
#[derive(Clone)]
pub struct JobContext {
    pub agent: Arc<Agent>,
    pub http: reqwest::Client,
}

#[derive(Clone)]
pub struct Job {
    pub name: String,
    pub schedule: String,
    pub work: WorkFn,
}

impl Job {
    pub fn new<F, Fut>(name: impl Into<String>, schedule: impl Into<String>, work: F) -> Job
        where F: Fn(JobContext) -> Fut + Send + Sync + 'static,
              Fut: Future<Output=anyhow::Result<()>> + Send + 'static,
    {
        Job {
            name: name.into(),
            schedule: schedule.into(),
            work: Arc::new(move |ctx| Box::pin(work(ctx))),
        }
    }
}

fn parse_schedule(job: &Job) -> Result<Cron, SchedulerError> {
    Cron::new(&job.schedule)
        .with_seconds_optional()
        .parse()
        .map_err(|e| SchedulerError::InvalidSchedule {
            name: job.name.clone(),
            schedule: job.schedule.clone(),
            reason: e.to_string(),
        })
}

/// Runs every job on its own schedule, independently of the others.
pub struct Scheduler {
    jobs: Vec<Job>,
    ctx: JobContext,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Fails if any schedule is not a valid cron expression.
    pub fn new(jobs: Vec<Job>, ctx: JobContext) -> Result<Scheduler, SchedulerError> {
        for job in jobs.iter() {
            parse_schedule(job)?;
        }
        let (shutdown, _) = watch::channel(false);

        Ok(Scheduler {
            jobs,
            ctx,
            shutdown,
            handles: vec![],
        })
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        for job in self.jobs.iter() {
            let cron = match parse_schedule(job) {
                Ok(cron) => cron,
                Err(e) => {
                    error!("Not scheduling job: {}", e);
                    continue;
                }
            };
            let job = job.clone();
            let ctx = self.ctx.clone();
            let shutdown = self.shutdown.subscribe();
            self.handles.push(tokio::spawn(job_loop(job, cron, ctx, shutdown)));
        }
        info!("Started scheduler with {} jobs", self.jobs.len());
    }

    /// No new runs are triggered after this. A run already in progress is
    /// allowed to finish.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
        info!("Scheduler stopped");
    }
}

async fn job_loop(job: Job, cron: Cron, ctx: JobContext, mut shutdown: watch::Receiver<bool>) {
    loop {
        let now = Utc::now();
        let next = match cron.find_next_occurrence(&now, false) {
            Ok(next) => next,
            Err(e) => {
                warn!("Job has no next run, giving up. name={} schedule={} error={}", job.name, job.schedule, e);
                return;
            }
        };
        let wait = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => return,
        }
        if *shutdown.borrow() {
            return;
        }

        run_job(&job, ctx.clone()).await;
    }
}

/// One invocation of a job. Errors and panics are logged, never propagated.
pub async fn run_job(job: &Job, ctx: JobContext) -> bool {
    info!("Starting job name={} schedule={}", job.name, job.schedule);

    let work = (job.work)(ctx);
    match tokio::spawn(work).await {
        Ok(Ok(())) => {
            info!("Job completed successfully name={} schedule={}", job.name, job.schedule);
            true
        }
        Ok(Err(e)) => {
            error!("Job failed name={} schedule={} error={:#}", job.name, job.schedule, e);
            false
        }
        Err(e) => {
            error!("Job crashed name={} schedule={} error={}", job.name, job.schedule, e);
            false
        }
    }
}

/*
dailydose - single-binary main.rs
This binary starts the Rocket inspection server and runs the daily dispatch scheduler inside the same process.
*/

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use common::{resolve_env, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use dailydose::campaign::{CampaignDispatcher, CampaignSettings, MailchimpClient};
use dailydose::ingestion::{NewsDataClient, NewsQuery};
use dailydose::llm::intro::IntroComposer;
use dailydose::llm::remote::RemoteLlmProvider;
use dailydose::llm::summarizer::Summarizer;
use dailydose::llm::LlmProvider;
use dailydose::newsletter::NewsletterRenderer;
use dailydose::scheduler::{run_daily, DailySchedule};
use dailydose::server::{launch_rocket, AppState};
use dailydose::workflow::DailyDispatchWorkflow;

#[derive(Parser, Debug)]
#[command(name = "dailydose", about = "The Daily Dose newsletter worker + inspection server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable the daily scheduler (run server only)
    #[arg(long)]
    no_worker: bool,

    /// Run the scheduler only (do not bind HTTP server)
    #[arg(long, conflicts_with = "no_worker")]
    worker_only: bool,

    /// Run one dispatch immediately and exit
    #[arg(long, conflicts_with_all = ["no_worker", "worker_only"])]
    run_once: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");
    let override_path = match args.config {
        Some(p) if !p.exists() => {
            error!(path = ?p, "specified config file not found");
            anyhow::bail!("Config file not found: {}", p.display());
        }
        Some(p) => Some(p),
        None => Some(PathBuf::from("config.toml")).filter(|p| p.exists()),
    };

    let config = Config::load_with_defaults(
        Some(default_path.as_path()).filter(|p| p.exists()),
        override_path.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(error = %e, "failed to load configuration");
        e
    })?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let schedule = DailySchedule::parse(&config.scheduler.time, &config.scheduler.timezone)?;
    let workflow = Arc::new(build_workflow(&config, &schedule).await?);

    if args.run_once {
        info!("Running a single dispatch");
        let report = workflow.run().await?;
        info!(
            campaign_id = %report.campaign_id,
            summaries = report.summaries,
            skipped = report.skipped,
            "single dispatch finished"
        );
        return Ok(());
    }

    let shutdown_notify = Arc::new(Notify::new());

    if args.worker_only {
        info!("Starting in worker-only mode");
        let worker = run_daily(workflow.clone(), schedule, shutdown_notify.clone());

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received, notifying scheduler to shutdown");
                shutdown_notify.notify_waiters();
            }
            _ = worker => {}
        }
        info!("worker-only run finished");
        return Ok(());
    }

    let mut worker_handle = None;
    if !args.no_worker {
        info!("Spawning daily scheduler task");
        worker_handle = Some(tokio::spawn(run_daily(
            workflow.clone(),
            schedule,
            shutdown_notify.clone(),
        )));
    } else {
        info!("Daily scheduler disabled via CLI (--no-worker)");
    }

    let state = AppState {
        started_at: Utc::now(),
        workflow,
        schedule,
    };

    info!("Launching Rocket HTTP server");
    if let Err(e) = launch_rocket(state, &config.server).await {
        error!(error = %e, "Rocket server failed");
    }

    info!("HTTP server stopped; notifying scheduler to shutdown");
    shutdown_notify.notify_waiters();

    if let Some(handle) = worker_handle {
        match tokio::time::timeout(Duration::from_secs(20), handle).await {
            Ok(Ok(())) => info!("scheduler exited cleanly"),
            Ok(Err(join_err)) => error!(%join_err, "scheduler task panicked"),
            Err(_) => info!("Timed out waiting for scheduler to exit; continuing shutdown"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Construct every pipeline collaborator from configuration and environment secrets.
async fn build_workflow(config: &Config, schedule: &DailySchedule) -> Result<DailyDispatchWorkflow> {
    let news_key = resolve_env(&config.news.api_key_env)?;
    let news = NewsDataClient::new(
        config.news.api_url.clone(),
        news_key,
        NewsQuery {
            language: config.news.language.clone(),
            query: config.news.query.clone(),
            country: config.news.country.clone(),
        },
        config.news_timeout(),
    )?;

    let llm_key = resolve_env(&config.llm.api_key_env)?;
    let llm = RemoteLlmProvider::new(config.llm.api_url.clone(), llm_key, config.llm.model.clone())
        .with_defaults(config.llm_timeout(), 0.7);
    info!(model = %llm.model(), "LLM provider initialized");
    let llm: Arc<dyn LlmProvider> = Arc::new(llm);

    let campaign_key = resolve_env(&config.campaign.api_key_env)?;
    let list_id = resolve_env(&config.campaign.list_id_env)?;
    let mailchimp = MailchimpClient::new(
        campaign_key,
        config.campaign.api_url.clone(),
        config.campaign_timeout(),
    )?;
    info!(base_url = %mailchimp.base_url(), "campaign provider initialized");

    let dispatcher = CampaignDispatcher::new(
        Arc::new(mailchimp),
        CampaignSettings {
            list_id,
            subject: config.campaign.subject.clone(),
            title: config.campaign.title.clone(),
            from_name: config.campaign.from_name.clone(),
            reply_to: config.campaign.reply_to.clone(),
        },
    );

    let renderer = NewsletterRenderer::load(&config.newsletter.template_path, &config.newsletter.date_format)
        .await
        .context("failed to prepare newsletter template")?;

    Ok(DailyDispatchWorkflow::new(
        Arc::new(news),
        Summarizer::new(llm.clone(), config.llm.summary_words, config.llm.summary_max_tokens),
        IntroComposer::new(llm),
        renderer,
        dispatcher,
        schedule.timezone(),
    )
    .with_fallback_image(config.newsletter.fallback_image_url.clone()))
}

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{get, routes, Build, Rocket, State};
use serde::Serialize;

use common::ServerConfig;

use crate::error::DispatchError;
use crate::ingestion::Article;
use crate::newsletter::summary_list;
use crate::scheduler::DailySchedule;
use crate::workflow::DailyDispatchWorkflow;

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub workflow: Arc<DailyDispatchWorkflow>,
    pub schedule: DailySchedule,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    scheduled_time: String,
    timezone: String,
    next_run: String,
}

fn error_status(err: &DispatchError) -> Status {
    match err {
        DispatchError::UpstreamFetch { .. } => Status::BadGateway,
        _ => Status::InternalServerError,
    }
}

#[get("/")]
async fn index() -> &'static str {
    "Hello, world!"
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Fetched articles as JSON.
///
/// Only `title`, `content` and `image_url` are returned; the provider's other
/// fields (link, pubDate, source) are dropped at deserialization.
#[get("/fetch_news")]
async fn fetch_news(state: &State<AppState>) -> Result<Json<Vec<Article>>, Status> {
    state.workflow.fetch_news().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to fetch news");
        error_status(&e)
    })
}

/// Summaries of today's articles as an HTML list, computed for this request only.
#[get("/fetch_summarized_news")]
async fn fetch_summarized_news(state: &State<AppState>) -> Result<RawHtml<String>, Status> {
    let (_, digest) = state.workflow.build_digest().await.map_err(|e| {
        tracing::error!(error = %e, "failed to build digest");
        error_status(&e)
    })?;
    Ok(RawHtml(summary_list(&digest.summaries)))
}

/// The complete newsletter for today, rendered but not sent.
#[get("/preview")]
async fn preview(state: &State<AppState>) -> Result<RawHtml<String>, Status> {
    let date = state.workflow.today();
    let preview = state.workflow.preview_for_date(date).await.map_err(|e| {
        tracing::error!(error = %e, "failed to render preview");
        error_status(&e)
    })?;
    Ok(RawHtml(preview.html))
}

/// Status endpoint returning uptime and the next scheduled dispatch.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    let schedule = state.schedule;
    let next = schedule.next_fire_after(now).with_timezone(&schedule.timezone());

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: (now - state.started_at).num_seconds(),
        scheduled_time: schedule.time().format("%H:%M").to_string(),
        timezone: schedule.timezone().name().to_string(),
        next_run: next.to_rfc3339(),
    })
}

/// Build the Rocket instance with managed state, applying `[server]` bind/port.
pub fn build_rocket(state: AppState, server: &ServerConfig) -> Rocket<Build> {
    let mut fig = rocket::Config::figment();
    if let Some(bind) = &server.bind {
        fig = fig.merge(("address", bind.clone()));
    }
    if let Some(port) = server.port {
        fig = fig.merge(("port", port));
    }

    rocket::custom(fig).manage(state).mount(
        "/",
        routes![index, health, fetch_news, fetch_summarized_news, preview, status],
    )
}

pub async fn launch_rocket(state: AppState, server: &ServerConfig) -> Result<()> {
    tracing::info!("Starting Rocket HTTP server");
    build_rocket(state, server)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}

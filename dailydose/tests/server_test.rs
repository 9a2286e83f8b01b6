mod support;

use std::sync::Arc;

use chrono::Utc;
use support::{article, workflow, RecordingCampaign, ScriptedLlm, StubNews};
use dailydose::ingestion::Article;
use dailydose::scheduler::DailySchedule;
use dailydose::server::{build_rocket, AppState};
use rocket::http::Status;
use rocket::local::asynchronous::Client;

async fn client(news: StubNews, answers: &[&str]) -> (Client, Arc<RecordingCampaign>) {
    let campaign = Arc::new(RecordingCampaign::default());
    let state = AppState {
        started_at: Utc::now(),
        workflow: Arc::new(workflow(Arc::new(news), ScriptedLlm::ok(answers), campaign.clone())),
        schedule: DailySchedule::parse("07:00", "US/Central").unwrap(),
    };
    let server = common_server_config();
    let client = Client::tracked(build_rocket(state, &server)).await.unwrap();
    (client, campaign)
}

fn common_server_config() -> common::ServerConfig {
    common::ServerConfig {
        bind: None,
        port: None,
    }
}

fn two_articles() -> StubNews {
    StubNews {
        articles: vec![
            article("A", "First.", Some("https://img/a.png")),
            article("B", "Second.", None),
        ],
        fail_with_status: None,
    }
}

#[rocket::async_test]
async fn root_is_a_health_check() {
    let (client, _) = client(two_articles(), &[]).await;

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().await.unwrap(), "Hello, world!");
}

#[rocket::async_test]
async fn fetch_news_returns_articles_as_json() {
    let (client, _) = client(two_articles(), &[]).await;

    let response = client.get("/fetch_news").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let articles: Vec<Article> = response.into_json().await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "A");
}

#[rocket::async_test]
async fn upstream_failure_maps_to_bad_gateway() {
    let news = StubNews {
        articles: vec![],
        fail_with_status: Some(500),
    };
    let (client, _) = client(news, &[]).await;

    let response = client.get("/fetch_news").dispatch().await;
    assert_eq!(response.status(), Status::BadGateway);

    let response = client.get("/fetch_summarized_news").dispatch().await;
    assert_eq!(response.status(), Status::BadGateway);
}

#[rocket::async_test]
async fn summarized_news_is_fresh_per_request_and_never_sends() {
    let (client, campaign) = client(two_articles(), &["One.", "Two.", "Three.", "Four."]).await;

    let first = client.get("/fetch_summarized_news").dispatch().await;
    assert_eq!(first.status(), Status::Ok);
    assert_eq!(
        first.into_string().await.unwrap(),
        "<ul><li>One.</li><li>Two.</li></ul>"
    );

    let second = client.get("/fetch_summarized_news").dispatch().await;
    assert_eq!(
        second.into_string().await.unwrap(),
        "<ul><li>Three.</li><li>Four.</li></ul>"
    );

    assert_eq!(campaign.call_count(), 0);
}

#[rocket::async_test]
async fn preview_renders_without_dispatch() {
    let (client, campaign) = client(two_articles(), &["One.", "Two.", "Intro."]).await;

    let response = client.get("/preview").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let html = response.into_string().await.unwrap();
    assert!(html.contains("Intro.https://img/a.png<ul><li>One.</li><li>Two.</li></ul>"));
    assert_eq!(campaign.call_count(), 0);
}

#[rocket::async_test]
async fn status_reports_schedule() {
    let (client, _) = client(two_articles(), &[]).await;

    let response = client.get("/api/v1/status").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["scheduled_time"], "07:00");
    assert_eq!(body["timezone"], "US/Central");
    assert!(body["next_run"].as_str().unwrap().contains("T07:00:00"));
}

//! HTTP interface tests against a live listener.

#![cfg(feature = "server")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use askweb::agent::{ChatRequest, ChatResponse, LlmProvider, Orchestrator, PromptSet};
use askweb::error::AgentError;
use askweb::server::AskServer;
use async_trait::async_trait;
use serde_json::{Value, json};

use common::{FakeEngine, FakeFetcher, ScriptedProvider, Step, config, orchestrator};

/// Serves `server` on an ephemeral port and returns its base URL.
async fn spawn(server: AskServer) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| unreachable!());
    let addr = listener.local_addr().unwrap_or_else(|_| unreachable!());
    tokio::spawn(async move {
        let _ = axum::serve(listener, server.router()).await;
    });
    format!("http://{addr}")
}

async fn spawn_scripted(provider: &Arc<ScriptedProvider>, deadline: Duration) -> String {
    let engine = Arc::new(FakeEngine::per_query());
    let fetcher = Arc::new(FakeFetcher::ok());
    let orchestrator = orchestrator(provider, &engine, &fetcher, config(3));
    spawn(AskServer::new(Arc::new(orchestrator), deadline)).await
}

async fn post(base: &str, body: reqwest::Body) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/ask"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap_or_else(|_| unreachable!());
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap_or_default();
    (status, body)
}

async fn post_json(base: &str, body: &Value) -> (u16, Value) {
    post(base, body.to_string().into()).await
}

#[tokio::test]
async fn test_health() {
    let base = spawn_scripted(&Arc::new(ScriptedProvider::new()), Duration::from_secs(5)).await;
    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap_or_else(|_| unreachable!())
        .json::<Value>()
        .await
        .unwrap_or_default();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_math_answer() {
    let base = spawn_scripted(&Arc::new(ScriptedProvider::new()), Duration::from_secs(5)).await;
    let (status, body) = post_json(&base, &json!({"query": "What is 15 * 7 + 3?"})).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"response": "108", "type": "math"}));
}

#[tokio::test]
async fn test_search_answer_respects_zero_budget() {
    let provider = Arc::new(ScriptedProvider::new().default_reply(
        Step::Evaluator,
        Ok(r#"{"sufficient": false, "reason": "thin"}"#.to_string()),
    ));
    let base = spawn_scripted(&provider, Duration::from_secs(5)).await;
    let (status, body) =
        post_json(&base, &json!({"query": "Who founded Mozilla?", "max_retries": 0})).await;

    assert_eq!(status, 200);
    assert_eq!(body["type"], "search");
    assert_eq!(body["response"], "answer");
    assert_eq!(provider.calls(Step::Generator), 1);
}

#[tokio::test]
async fn test_bad_requests() {
    let base = spawn_scripted(&Arc::new(ScriptedProvider::new()), Duration::from_secs(5)).await;

    let (status, body) = post(&base, "{not json".into()).await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, body) = post_json(&base, &json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Query not provided");

    let (status, body) = post_json(&base, &json!({"query": "   "})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Query not provided");

    let (status, body) = post_json(&base, &json!({"query": "q", "max_retries": -1})).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap_or_default().contains("max_retries"));
}

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let base = spawn(AskServer::unconfigured(
        AgentError::ApiKeyMissing,
        Duration::from_secs(5),
    ))
    .await;

    let (status, body) = post_json(&base, &json!({"query": "hello"})).await;
    assert_eq!(status, 401);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_synthesis_failure_is_bad_gateway() {
    let provider = Arc::new(ScriptedProvider::new().default_reply(
        Step::Synthesizer,
        Err(AgentError::ApiRequest {
            message: "upstream unavailable".to_string(),
            status: Some(503),
        }),
    ));
    let base = spawn_scripted(&provider, Duration::from_secs(5)).await;

    let (status, body) = post_json(&base, &json!({"query": "Who founded Mozilla?"})).await;
    assert_eq!(status, 502);
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("upstream unavailable")
    );
}

#[tokio::test]
async fn test_deadline_is_gateway_timeout() {
    struct StalledProvider;

    #[async_trait]
    impl LlmProvider for StalledProvider {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ChatResponse::text("search"))
        }
    }

    let orchestrator = Orchestrator::with_prompts(
        Arc::new(StalledProvider),
        Arc::new(FakeEngine::per_query()),
        Arc::new(FakeFetcher::ok()),
        config(3),
        &PromptSet::defaults(),
    );
    let base = spawn(AskServer::new(
        Arc::new(orchestrator),
        Duration::from_millis(100),
    ))
    .await;

    let (status, body) = post_json(&base, &json!({"query": "Who founded Mozilla?"})).await;
    assert_eq!(status, 504);
    assert!(body["error"].as_str().unwrap_or_default().contains("timed out"));
}

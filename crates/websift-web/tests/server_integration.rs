//! Integration tests for the websift-web server.
//!
//! These start a real axum server on a random port and call it over HTTP.

use std::sync::{Arc, Mutex};

use websift::agent::{AnswerFuture, GenerateAnswer};
use websift::error::Error;
use websift_web::{AnswerResponse, ERROR_ANSWER, WebConfig, spawn_web};

/// Answers "answer to <question>" and remembers what it was asked.
#[derive(Default)]
struct EchoAssistant {
    asked: Mutex<Vec<String>>,
}

impl GenerateAnswer for EchoAssistant {
    fn answer<'a>(&'a self, question: &'a str) -> AnswerFuture<'a> {
        self.asked.lock().unwrap().push(question.to_string());
        Box::pin(async move { Ok(format!("answer to {question}")) })
    }
}

struct FailingAssistant;

impl GenerateAnswer for FailingAssistant {
    fn answer<'a>(&'a self, _question: &'a str) -> AnswerFuture<'a> {
        Box::pin(async {
            Err(Error::Http {
                status: 502,
                body: "model gateway down".into(),
            })
        })
    }
}

/// Helper: spawn a test server on port 0 (random available port).
async fn spawn_test_server(assistant: Arc<dyn GenerateAnswer>) -> String {
    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
    };
    let addr = spawn_web(assistant, config).await.unwrap();
    format!("http://{addr}")
}

#[tokio::test]
async fn answers_question() {
    let assistant = Arc::new(EchoAssistant::default());
    let base = spawn_test_server(assistant.clone()).await;

    let resp = reqwest::get(format!(
        "{base}/web-search-agent?question=Who%20won%20the%20Tour%3F"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);

    let body: AnswerResponse = resp.json().await.unwrap();
    assert_eq!(body.answer, "answer to Who won the Tour?");
    assert_eq!(
        *assistant.asked.lock().unwrap(),
        vec!["Who won the Tour?".to_string()]
    );
}

#[tokio::test]
async fn assistant_failure_is_400_with_fixed_message() {
    let base = spawn_test_server(Arc::new(FailingAssistant)).await;

    let resp = reqwest::get(format!("{base}/web-search-agent?question=anything"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json, serde_json::json!({"answer": ERROR_ANSWER}));
    assert_eq!(
        json["answer"],
        "Error during web searching. Please try again."
    );
}

#[tokio::test]
async fn missing_question_is_rejected() {
    let assistant = Arc::new(EchoAssistant::default());
    let base = spawn_test_server(assistant.clone()).await;

    let resp = reqwest::get(format!("{base}/web-search-agent")).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert!(assistant.asked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let base = spawn_test_server(Arc::new(EchoAssistant::default())).await;
    let resp = reqwest::get(format!("{base}/api/state")).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let base = spawn_test_server(Arc::new(EchoAssistant::default())).await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/web-search-agent?question=hi"))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

//! Endpoint handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use websift::agent::GenerateAnswer;

/// Body returned when answer generation fails.
pub const ERROR_ANSWER: &str = "Error during web searching. Please try again.";

/// Shared application state passed to handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<dyn GenerateAnswer>,
}

/// Query string for GET /web-search-agent.
#[derive(Deserialize)]
pub struct AskParams {
    pub question: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AnswerResponse {
    pub answer: String,
}

/// GET /web-search-agent?question=...: answer a question with web evidence.
///
/// Returns 200 with the answer, or 400 with a fixed error message when the
/// assistant fails. A missing `question` parameter is rejected by the
/// extractor (400).
pub async fn web_search_agent(
    State(app): State<AppState>,
    Query(params): Query<AskParams>,
) -> (StatusCode, Json<AnswerResponse>) {
    let start = Instant::now();
    info!("question: {:?}", params.question);
    match app.assistant.answer(&params.question).await {
        Ok(answer) => {
            info!("answered in {:.1}s", start.elapsed().as_secs_f64());
            (StatusCode::OK, Json(AnswerResponse { answer }))
        }
        Err(e) => {
            error!("answer generation failed: {e}");
            (
                StatusCode::BAD_REQUEST,
                Json(AnswerResponse {
                    answer: ERROR_ANSWER.to_string(),
                }),
            )
        }
    }
}

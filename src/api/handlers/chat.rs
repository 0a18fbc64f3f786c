//! The `/chat` endpoint: question in, generated strategy answer out.

use axum::{Json, extract::State};

use crate::AppState;
use crate::api::models::chat::{ChatRequest, ChatResponse};
use crate::errors::{Error, ErrorBody, Result};
use crate::prompt;

/// Answer a battle-strategy question.
///
/// Renders the fixed system instruction plus the question into a single prompt
/// and invokes the local generation backend. The raw completion is returned as
/// the answer; nothing validates it against the instruction's constraints.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    summary = "Ask a strategy question",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Generated answer", body = ChatResponse),
        (status = 400, description = "Missing or empty question", body = ErrorBody),
        (status = 500, description = "Generation backend failure", body = ErrorBody)
    )
)]
pub async fn ask(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Result<Json<ChatResponse>> {
    let question = match request.question.as_deref() {
        Some(question) if !question.is_empty() => question,
        _ => {
            return Err(Error::BadRequest {
                message: "question is required".to_string(),
            });
        }
    };

    // The route is only registered when the relay is configured, so this is a
    // wiring error rather than a user one.
    let chat = state.chat.as_ref().ok_or_else(|| Error::Internal {
        operation: "answer chat question: relay is not configured".to_string(),
    })?;

    let rendered = prompt::render(question);
    let answer = chat
        .generate(&rendered)
        .await
        .map_err(|e| e.context("generation backend call failed"))?;

    Ok(Json(ChatResponse { answer }))
}

//! API request/response models for the chat relay.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single free-text question. No conversation history is carried; every
/// question stands alone.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The question to answer
    #[schema(example = "What should I bring against Gyarados?")]
    pub question: Option<String>,
}

/// The generated answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// Raw completion text from the generation backend
    pub answer: String,
}

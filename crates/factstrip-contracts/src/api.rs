//! JSON bodies exchanged over the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::analysis::{Explanation, Mood, Verdict};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub verdict: Verdict,
    pub confidence: u8,
    pub description: String,
    pub mood: Mood,
    pub mood_confidence: u8,
    pub comic_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExplanationRequest {
    #[serde(default)]
    pub fact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationResponse {
    pub success: bool,
    pub fact: String,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            success: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub openai_configured: bool,
    pub replicate_configured: bool,
    pub ts: String,
}

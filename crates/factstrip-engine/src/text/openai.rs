use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};

use super::{ChatRequest, TextProvider};
use crate::transport::{first_non_empty_env, http_client, response_json_or_error};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI-compatible `chat/completions` client.
pub struct OpenAiChatProvider {
    api_base: String,
    api_key: Option<String>,
    model: String,
    http: HttpClient,
}

impl OpenAiChatProvider {
    pub fn new(
        api_key: Option<String>,
        api_base: Option<&str>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api_base: normalize_api_base(api_base.unwrap_or(DEFAULT_API_BASE)),
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            model: model.trim().to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn from_env(model: &str, timeout: Duration) -> Result<Self> {
        let base = first_non_empty_env(&["OPENAI_API_BASE", "OPENAI_BASE_URL"]);
        Self::new(
            first_non_empty_env(&["OPENAI_API_KEY", "OPENAI_API_KEY_BACKUP"]),
            base.as_deref(),
            model,
            timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn payload(&self, request: &ChatRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

/// A bare host gets the `/v1` prefix appended.
fn normalize_api_base(raw: &str) -> String {
    let mut base = raw.trim().trim_end_matches('/').to_string();
    if let Ok(parsed) = reqwest::Url::parse(&base) {
        if parsed.path().trim().is_empty() || parsed.path() == "/" {
            base = format!("{base}/v1");
        }
    }
    base.trim_end_matches('/').to_string()
}

fn extract_message_content(payload: &Value) -> Option<String> {
    payload
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

impl TextProvider for OpenAiChatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, request: &ChatRequest) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("OPENAI_API_KEY not set");
        };
        let endpoint = self.endpoint();
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&self.payload(request))
            .send()
            .with_context(|| format!("OpenAI request failed ({endpoint})"))?;
        let payload = response_json_or_error("OpenAI", response)?;
        extract_message_content(&payload)
            .ok_or_else(|| anyhow::anyhow!("OpenAI response contained no message content"))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Map, Value};

use super::{GeneratedImage, ImageProvider, ImageRequest, ProviderSettings};
use crate::transport::{http_client, response_json_or_error};

pub(super) const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";

pub const DEFAULT_REPLICATE_MODEL: &str =
    "stability-ai/sdxl:39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";

const GUIDANCE_SCALE: f64 = 7.5;
const INFERENCE_STEPS: u64 = 25;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct ReplicateProvider {
    api_base: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    http: HttpClient,
}

impl ReplicateProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            api_base: settings.replicate_api_base.trim_end_matches('/').to_string(),
            api_key: settings.replicate_token.clone(),
            model: settings.replicate_model.trim().to_string(),
            timeout: settings.timeout,
            http: http_client(settings.timeout)?,
        })
    }

    fn predictions_endpoint(&self) -> String {
        format!("{}/predictions", self.api_base)
    }

    /// `owner/name:version` pins a version; a bare `owner/name` runs the
    /// model's latest deployment.
    fn payload(&self, request: &ImageRequest) -> Map<String, Value> {
        let mut input = json!({
            "prompt": request.prompt,
            "width": request.width,
            "height": request.height,
            "num_outputs": 1,
            "guidance_scale": GUIDANCE_SCALE,
            "num_inference_steps": INFERENCE_STEPS,
        });
        if let (Some(negative), Some(obj)) =
            (request.negative_prompt.as_deref(), input.as_object_mut())
        {
            obj.insert(
                "negative_prompt".to_string(),
                Value::String(negative.to_string()),
            );
        }
        let mut payload = Map::new();
        match self.model.split_once(':') {
            Some((_, version)) => {
                payload.insert("version".to_string(), Value::String(version.to_string()));
            }
            None => {
                payload.insert("model".to_string(), Value::String(self.model.clone()));
            }
        }
        payload.insert("input".to_string(), input);
        payload
    }

    fn poll_prediction(&self, poll_url: &str, api_key: &str, started: Instant) -> Result<Value> {
        loop {
            if started.elapsed() >= self.timeout {
                bail!(
                    "Replicate polling timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                );
            }
            thread::sleep(POLL_INTERVAL);
            let response = self
                .http
                .get(poll_url)
                .bearer_auth(api_key)
                .send()
                .with_context(|| format!("Replicate poll request failed ({poll_url})"))?;
            let payload = response_json_or_error("Replicate poll", response)?;
            match prediction_status(&payload).as_str() {
                "succeeded" => return Ok(payload),
                "failed" | "canceled" => bail!("Replicate prediction failed: {}", payload),
                _ => {}
            }
        }
    }
}

fn prediction_status(prediction: &Value) -> String {
    prediction
        .get("status")
        .and_then(Value::as_str)
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default()
}

fn prediction_id(prediction: &Value) -> &str {
    prediction
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
}

fn first_output_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => {
            let trimmed = url.trim();
            trimmed
                .starts_with("http")
                .then(|| trimmed.to_string())
        }
        Value::Array(rows) => rows.iter().find_map(first_output_url),
        Value::Object(obj) => ["url", "urls", "output"]
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(first_output_url),
        _ => None,
    }
}

impl ImageProvider for ReplicateProvider {
    fn name(&self) -> &str {
        "replicate"
    }

    fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("REPLICATE_API_TOKEN not set");
        };
        let endpoint = self.predictions_endpoint();
        let started = Instant::now();
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .header("Prefer", "wait")
            .json(&Value::Object(self.payload(request)))
            .send()
            .with_context(|| format!("Replicate request failed ({endpoint})"))?;
        let mut prediction = response_json_or_error("Replicate", response)?;

        let status = prediction_status(&prediction);
        if status != "succeeded" {
            if !matches!(status.as_str(), "starting" | "processing") {
                bail!("Replicate prediction failed: {}", prediction);
            }
            let poll_url = prediction
                .get("urls")
                .and_then(|urls| urls.get("get"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("Replicate prediction missing poll URL"))?;
            prediction = self.poll_prediction(&poll_url, api_key, started)?;
        }

        let url = prediction
            .get("output")
            .and_then(first_output_url)
            .ok_or_else(|| anyhow::anyhow!("Replicate response returned no image URLs"))?;
        let prediction_id = prediction_id(&prediction);
        tracing::debug!(
            provider = "replicate",
            prediction_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction succeeded"
        );
        Ok(GeneratedImage::Url(url))
    }
}

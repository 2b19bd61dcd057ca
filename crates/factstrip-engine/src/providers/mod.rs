//! Image generation adapters and the acquirer that turns their output into
//! decoded images.

mod dryrun;
mod replicate;

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use reqwest::blocking::Client as HttpClient;

use crate::comic::PanelPrompt;
use crate::transport::{error_chain_text, first_non_empty_env, http_client, truncate_text};

pub use dryrun::{DryrunProvider, OfflineProvider};
pub use replicate::{ReplicateProvider, DEFAULT_REPLICATE_MODEL};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DIMENSION_STEP: u32 = 8;

/// Rounds `value` to the nearest multiple of `step`, never below `step`.
pub fn snap_multiple(value: u32, step: u32) -> u32 {
    let step = step.max(1);
    let snapped = value.saturating_add(step / 2) / step * step;
    snapped.max(step)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl ImageRequest {
    pub fn new(prompt: &PanelPrompt, width: u32, height: u32) -> Self {
        Self {
            prompt: prompt.prompt.clone(),
            negative_prompt: prompt.negative_prompt.clone(),
            width: snap_multiple(width, DIMENSION_STEP),
            height: snap_multiple(height, DIMENSION_STEP),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Remote handle the acquirer still has to download.
    Url(String),
    Bytes(Vec<u8>),
}

pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage>;
}

#[derive(Default)]
pub struct ImageProviderRegistry {
    providers: BTreeMap<String, Box<dyn ImageProvider>>,
}

impl ImageProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: ImageProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ImageProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn take(&mut self, name: &str) -> Option<Box<dyn ImageProvider>> {
        self.providers.remove(name)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub replicate_token: Option<String>,
    pub replicate_api_base: String,
    pub replicate_model: String,
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            replicate_token: None,
            replicate_api_base: replicate::DEFAULT_API_BASE.to_string(),
            replicate_model: DEFAULT_REPLICATE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            replicate_token: first_non_empty_env(&["REPLICATE_API_TOKEN", "REPLICATE_API_KEY"]),
            replicate_api_base: first_non_empty_env(&["REPLICATE_API_BASE"])
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.replicate_api_base),
            replicate_model: first_non_empty_env(&["REPLICATE_MODEL"])
                .unwrap_or(defaults.replicate_model),
            timeout: defaults.timeout,
        }
    }
}

pub fn default_provider_registry(settings: &ProviderSettings) -> Result<ImageProviderRegistry> {
    let mut providers = ImageProviderRegistry::new();
    providers.register(ReplicateProvider::new(settings)?);
    providers.register(DryrunProvider);
    providers.register(OfflineProvider);
    Ok(providers)
}

/// Runs one provider call and resolves its output into a decoded image.
/// Every failure is logged and collapsed into `None`.
pub struct ImageAcquirer {
    provider: Box<dyn ImageProvider>,
    http: HttpClient,
}

impl ImageAcquirer {
    pub fn new(provider: Box<dyn ImageProvider>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            provider,
            http: http_client(timeout)?,
        })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn acquire(&self, request: &ImageRequest) -> Option<DynamicImage> {
        match self.try_acquire(request) {
            Ok(image) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    width = image.width(),
                    height = image.height(),
                    "image acquired"
                );
                Some(image)
            }
            Err(err) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    width = request.width,
                    height = request.height,
                    error = %error_chain_text(&err, 512),
                    "image acquisition failed"
                );
                None
            }
        }
    }

    fn try_acquire(&self, request: &ImageRequest) -> Result<DynamicImage> {
        let bytes = match self.provider.generate(request)? {
            GeneratedImage::Bytes(bytes) => bytes,
            GeneratedImage::Url(url) => self.download(&url)?,
        };
        let image = image::load_from_memory(&bytes).context("generated image is not decodable")?;
        if image.width() == 0 || image.height() == 0 {
            bail!("generated image is empty");
        }
        Ok(image)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .with_context(|| format!("failed downloading image ({url})"))?;
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            bail!("image download failed ({code}): {}", truncate_text(&body, 512));
        }
        Ok(response
            .bytes()
            .context("failed reading image bytes")?
            .to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::{bail, Result};

    use super::{
        default_provider_registry, snap_multiple, DryrunProvider, GeneratedImage, ImageAcquirer,
        ImageProvider, ImageRequest, ProviderSettings,
    };
    use crate::comic::PanelPrompt;

    struct FixedProvider(GeneratedImage);

    impl ImageProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self, _request: &ImageRequest) -> Result<GeneratedImage> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    impl ImageProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn generate(&self, _request: &ImageRequest) -> Result<GeneratedImage> {
            bail!("service unavailable")
        }
    }

    fn request(width: u32, height: u32) -> ImageRequest {
        let prompt = PanelPrompt {
            prompt: "a bee".to_string(),
            negative_prompt: None,
        };
        ImageRequest::new(&prompt, width, height)
    }

    #[test]
    fn dimensions_snap_to_multiples_of_eight() {
        assert_eq!(snap_multiple(400, 8), 400);
        assert_eq!(snap_multiple(403, 8), 400);
        assert_eq!(snap_multiple(404, 8), 408);
        assert_eq!(snap_multiple(0, 8), 8);
        let req = request(1601, 397);
        assert_eq!((req.width, req.height), (1600, 400));
    }

    #[test]
    fn default_registry_lists_known_providers() -> Result<()> {
        let mut registry = default_provider_registry(&ProviderSettings::default())?;
        assert_eq!(registry.names(), vec!["dryrun", "offline", "replicate"]);
        assert!(registry.get("replicate").is_some());
        assert!(registry.take("dryrun").is_some());
        assert!(registry.get("dryrun").is_none());
        Ok(())
    }

    #[test]
    fn acquirer_decodes_provider_bytes() -> Result<()> {
        let acquirer = ImageAcquirer::new(Box::new(DryrunProvider), Duration::from_secs(1))?;
        let image = acquirer.acquire(&request(64, 32));
        let image = image.ok_or_else(|| anyhow::anyhow!("dryrun image missing"))?;
        assert_eq!((image.width(), image.height()), (64, 32));
        Ok(())
    }

    #[test]
    fn acquirer_collapses_failures_into_none() -> Result<()> {
        let failing = ImageAcquirer::new(Box::new(FailingProvider), Duration::from_secs(1))?;
        assert!(failing.acquire(&request(64, 64)).is_none());

        let junk = ImageAcquirer::new(
            Box::new(FixedProvider(GeneratedImage::Bytes(b"not a png".to_vec()))),
            Duration::from_secs(1),
        )?;
        assert!(junk.acquire(&request(64, 64)).is_none());

        let unreachable = ImageAcquirer::new(
            Box::new(FixedProvider(GeneratedImage::Url(
                "http://127.0.0.1:9/image.png".to_string(),
            ))),
            Duration::from_millis(500),
        )?;
        assert!(unreachable.acquire(&request(64, 64)).is_none());
        Ok(())
    }
}

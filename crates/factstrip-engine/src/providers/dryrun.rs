use std::io::Cursor;

use anyhow::{bail, Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use super::{GeneratedImage, ImageProvider, ImageRequest};

/// Deterministic local provider: a solid image whose colour is derived from
/// the prompt hash.
pub struct DryrunProvider;

impl ImageProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let image = RgbImage::from_pixel(
            request.width,
            request.height,
            color_from_prompt(&request.prompt),
        );
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode dryrun image")?;
        tracing::debug!(
            provider = "dryrun",
            prompt_hash = %prompt_hash(&request.prompt),
            "generated dryrun image"
        );
        Ok(GeneratedImage::Bytes(bytes))
    }
}

/// Always fails, so every comic falls through to placeholders.
pub struct OfflineProvider;

impl ImageProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    fn generate(&self, _request: &ImageRequest) -> Result<GeneratedImage> {
        bail!("image generation is disabled (offline provider)")
    }
}

fn color_from_prompt(prompt: &str) -> Rgb<u8> {
    let digest = Sha256::digest(prompt.as_bytes());
    Rgb([digest[0], digest[1], digest[2]])
}

fn prompt_hash(prompt: &str) -> String {
    hex::encode(&Sha256::digest(prompt.as_bytes())[..4])
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::{color_from_prompt, prompt_hash, DryrunProvider, OfflineProvider};
    use crate::providers::{GeneratedImage, ImageProvider, ImageRequest};

    fn request(prompt: &str) -> ImageRequest {
        ImageRequest {
            prompt: prompt.to_string(),
            negative_prompt: None,
            width: 16,
            height: 8,
        }
    }

    #[test]
    fn dryrun_colour_depends_only_on_prompt() -> Result<()> {
        assert_eq!(color_from_prompt("bees"), color_from_prompt("bees"));
        assert_ne!(color_from_prompt("bees"), color_from_prompt("wasps"));
        assert_eq!(prompt_hash("bees").len(), 8);

        let GeneratedImage::Bytes(bytes) = DryrunProvider.generate(&request("bees"))? else {
            anyhow::bail!("expected inline bytes");
        };
        let image = image::load_from_memory(&bytes)?.to_rgb8();
        assert_eq!(image.dimensions(), (16, 8));
        assert_eq!(*image.get_pixel(3, 3), color_from_prompt("bees"));
        Ok(())
    }

    #[test]
    fn offline_always_fails() {
        assert!(OfflineProvider.generate(&request("bees")).is_err());
    }
}

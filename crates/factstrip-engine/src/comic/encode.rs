use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbImage};

use super::ComicError;

pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// 1x1 white PNG; last resort when even the placeholder strip cannot be
/// encoded.
pub const BLANK_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4//8/AAX+Av4N70a4AAAAAElFTkSuQmCC";

pub fn encode_data_url(image: &RgbImage) -> Result<String, ComicError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| ComicError::Encode(err.to_string()))?;
    Ok(format!("{DATA_URL_PREFIX}{}", BASE64.encode(bytes)))
}

pub fn decode_data_url(data_url: &str) -> Result<DynamicImage, ComicError> {
    let payload = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| ComicError::DataUrl("expected a base64 PNG data url".to_string()))?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|err| ComicError::DataUrl(err.to_string()))?;
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|err| ComicError::DataUrl(err.to_string()))
}

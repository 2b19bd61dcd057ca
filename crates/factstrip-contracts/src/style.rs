use std::fmt;

use serde::{Deserialize, Serialize};

/// Visual style requested by the caller.
///
/// Parsing is lenient: anything unrecognised (including an absent value)
/// resolves to [`Style::Normal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "anime/manga")]
    AnimeManga,
    #[serde(rename = "newspaper")]
    Newspaper,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Normal, Style::AnimeManga, Style::Newspaper];

    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Normal;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "anime/manga" | "anime" | "manga" | "anime-manga" => Self::AnimeManga,
            "newspaper" => Self::Newspaper,
            _ => Self::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::AnimeManga => "anime/manga",
            Self::Newspaper => "newspaper",
        }
    }

    /// Flat fill used when a panel has to be synthesised locally.
    pub fn placeholder_background(self) -> [u8; 3] {
        match self {
            Self::Normal => [235, 245, 255],
            Self::AnimeManga => [255, 240, 245],
            Self::Newspaper => [220, 220, 220],
        }
    }

    pub fn prompt_base(self) -> &'static str {
        match self {
            Self::Normal => {
                "Realistic educational comic style, diverse characters explaining, clear visual storytelling, professional comic art"
            }
            Self::AnimeManga => {
                "Japanese anime manga style, vibrant colors, expressive anime characters, clean line art, detailed background"
            }
            Self::Newspaper => {
                "Black and white newspaper comic style, vintage comic strip, grayscale, classic comic art, ink drawing"
            }
        }
    }

    /// Trailing reinforcement appended after the scene description.
    pub fn prompt_suffix(self) -> &'static str {
        match self {
            Self::Normal => "educational comic style, clear illustration, professional artwork",
            Self::AnimeManga => "anime style, manga, Japanese animation, vibrant colors",
            Self::Newspaper => "black and white, grayscale, newspaper comic style, ink drawing",
        }
    }

    pub fn negative_prompt(self) -> Option<&'static str> {
        match self {
            Self::Newspaper => Some("color, colorful"),
            _ => None,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

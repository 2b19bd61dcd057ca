use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{percentage, required, required_text, SchemaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    True,
    False,
    Unverified,
}

impl Verdict {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Self::True),
            "false" => Some(Self::False),
            "unverified" => Some(Self::Unverified),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Unverified => "unverified",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fact-check verdict plus the per-panel visual descriptions the comic uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactAnalysis {
    pub verdict: Verdict,
    pub confidence: u8,
    pub description: String,
    pub story: String,
    pub image_prompts: [String; 4],
}

impl FactAnalysis {
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        let verdict_raw = required_text(object, "verdict")?;
        let verdict = Verdict::parse(&verdict_raw).ok_or_else(|| {
            SchemaError::invalid("verdict", format!("unknown verdict '{verdict_raw}'"))
        })?;
        let confidence = percentage(required(object, "confidence")?, "confidence")?;
        let description = required_text(object, "description")?;
        let story = required_text(object, "story")?;

        let rows = required(object, "image_prompts")?
            .as_array()
            .ok_or_else(|| SchemaError::invalid("image_prompts", "expected an array"))?;
        let prompts: Vec<String> = rows
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
        let image_prompts: [String; 4] = prompts
            .into_iter()
            .take(4)
            .collect::<Vec<String>>()
            .try_into()
            .map_err(|partial: Vec<String>| {
                SchemaError::invalid(
                    "image_prompts",
                    format!("expected 4 non-empty prompts, got {}", partial.len()),
                )
            })?;

        Ok(Self {
            verdict,
            confidence,
            description,
            story,
            image_prompts,
        })
    }

    /// Used whenever the text service is unreachable or returns junk.
    pub fn fallback(statement: &str) -> Self {
        Self {
            verdict: Verdict::Unverified,
            confidence: 50,
            description: "Unable to verify at this time.".to_string(),
            story: format!(
                "Let's explore the statement: '{statement}'. We're checking facts and sources to determine the truth."
            ),
            image_prompts: [
                format!("Curious character wondering about {statement}, educational setting"),
                format!("Character researching {statement} with scientific tools"),
                format!("Character explaining evidence about {statement}"),
                format!("Character presenting conclusion about {statement}"),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Positive,
    Negative,
    Serious,
}

impl Mood {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "neutral" => Some(Self::Neutral),
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "serious" => Some(Self::Serious),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodReading {
    pub mood: Mood,
    pub confidence: u8,
}

impl MoodReading {
    pub const FALLBACK: MoodReading = MoodReading {
        mood: Mood::Neutral,
        confidence: 75,
    };

    pub fn from_object(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        let raw = required_text(object, "mood")?;
        let mood = Mood::parse(&raw)
            .ok_or_else(|| SchemaError::invalid("mood", format!("unknown mood '{raw}'")))?;
        let confidence = match object.get("confidence") {
            None | Some(Value::Null) => Self::FALLBACK.confidence,
            Some(value) => percentage(value, "confidence")?,
        };
        Ok(Self { mood, confidence })
    }
}

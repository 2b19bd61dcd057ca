//! End-to-end handling of one statement: analysis, mood, explanation and the
//! comic strip.

use anyhow::{Context, Result};
use factstrip_contracts::api::GenerateResponse;
use factstrip_contracts::json_text::extract_json_object;
use factstrip_contracts::{
    Explanation, FactAnalysis, MoodReading, PanelRole, PanelScript, SchemaError, Style,
};
use serde_json::{Map, Value};

use crate::comic::{ComicPipeline, ComicRender, ComicRequest};
use crate::text::{ChatRequest, TextProvider};
use crate::transport::error_chain_text;

const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a professional fact-checker and visual storyteller.
For each statement, return EXACTLY this JSON format:
{
    "verdict": "true/false/unverified",
    "confidence": 0-100,
    "description": "brief factual explanation",
    "story": "engaging story for comic panels",
    "image_prompts": [
        "Detailed visual description for panel 1 - characters, setting, emotions. Show curiosity and questioning.",
        "Detailed visual description for panel 2 - scientific investigation, tools, discovery moment.",
        "Detailed visual description for panel 3 - characters explaining evidence, visual aids, teaching moment.",
        "Detailed visual description for panel 4 - characters presenting the conclusion, confident expressions."
    ]
}
Image prompts must be specific about characters, actions and settings, keep the same characters
across all 4 panels, stay accurate to the topic, and leave space for speech bubbles at the top."#;

const MOOD_SYSTEM_PROMPT: &str = r#"Analyze mood. Return JSON: {"mood": "neutral/positive/negative/serious", "confidence": 0-100}"#;

const EXPLANATION_SYSTEM_PROMPT: &str = r#"You explain facts to curious readers in four short comic speech bubbles.
Return EXACTLY this JSON format:
{
    "step1": "introduce the question the fact raises",
    "step2": "how scientists investigated it",
    "step3": "the key evidence",
    "step4": "the conclusion"
}
Each step must be one or two plain sentences, at most 120 characters, with no panel labels."#;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Statement is required")]
    EmptyStatement,
}

#[derive(Debug, Clone)]
pub struct FactCheckReport {
    pub statement: String,
    pub style: Style,
    pub analysis: FactAnalysis,
    pub mood: MoodReading,
    pub explanation: Option<Explanation>,
    pub comic: ComicRender,
}

impl FactCheckReport {
    pub fn into_response(self) -> GenerateResponse {
        GenerateResponse {
            verdict: self.analysis.verdict,
            confidence: self.analysis.confidence,
            description: self.analysis.description,
            mood: self.mood.mood,
            mood_confidence: self.mood.confidence,
            comic_image: self.comic.data_url,
            explanation: self.explanation,
            success: true,
        }
    }
}

/// Speech-bubble text for the four panels: the explanation steps when one
/// exists, otherwise a fixed template built from the verdict.
pub fn dialogues_for(
    statement: &str,
    analysis: &FactAnalysis,
    explanation: Option<&Explanation>,
) -> PanelScript {
    match explanation {
        Some(explanation) => {
            PanelScript::new(PanelRole::ALL.map(|role| explanation.step(role).to_string()))
        }
        None => PanelScript::new([
            format!("Fact: {statement}"),
            "Researching scientific evidence...".to_string(),
            "Analyzing the data and studies...".to_string(),
            format!(
                "Verdict: {}! ({}% confidence)",
                analysis.verdict.as_str().to_uppercase(),
                analysis.confidence
            ),
        ]),
    }
}

/// Shared, stateless service; one instance serves every request.
pub struct FactChecker {
    text: Box<dyn TextProvider>,
    pipeline: ComicPipeline,
}

impl FactChecker {
    pub fn new(text: Box<dyn TextProvider>, pipeline: ComicPipeline) -> Self {
        Self { text, pipeline }
    }

    pub fn text_configured(&self) -> bool {
        self.text.is_configured()
    }

    pub fn analyze(&self, statement: &str) -> FactAnalysis {
        let request = ChatRequest::new(
            ANALYSIS_SYSTEM_PROMPT,
            format!("Fact-check and create comic prompts for: \"{statement}\""),
        )
        .with_temperature(0.7)
        .with_max_tokens(1200);
        self.ask_json("analysis", &request, FactAnalysis::from_object)
            .unwrap_or_else(|| FactAnalysis::fallback(statement))
    }

    pub fn detect_mood(&self, statement: &str) -> MoodReading {
        let request = ChatRequest::new(MOOD_SYSTEM_PROMPT, format!("Statement: \"{statement}\""))
            .with_temperature(0.1)
            .with_max_tokens(80);
        self.ask_json("mood", &request, MoodReading::from_object)
            .unwrap_or(MoodReading::FALLBACK)
    }

    pub fn explain(&self, fact: &str) -> Option<Explanation> {
        let fact = fact.trim();
        if fact.is_empty() {
            return None;
        }
        let request = ChatRequest::new(
            EXPLANATION_SYSTEM_PROMPT,
            format!("Explain this fact step by step: \"{fact}\""),
        )
        .with_temperature(0.7)
        .with_max_tokens(600);
        self.ask_json("explanation", &request, Explanation::from_object)
    }

    pub fn check(&self, statement: &str, style: Style) -> Result<FactCheckReport, CheckError> {
        let statement = statement.trim();
        if statement.is_empty() {
            return Err(CheckError::EmptyStatement);
        }
        tracing::info!(%style, chars = statement.chars().count(), "checking statement");

        let analysis = self.analyze(statement);
        let mood = self.detect_mood(statement);
        let explanation = self.explain(statement);
        tracing::info!(
            verdict = %analysis.verdict,
            confidence = analysis.confidence,
            mood = ?mood.mood,
            explained = explanation.is_some(),
            "analysis complete"
        );

        let script = dialogues_for(statement, &analysis, explanation.as_ref());
        let comic = self.pipeline.render(&ComicRequest {
            statement: statement.to_string(),
            style,
            script,
            fragments: analysis.image_prompts.clone().map(Some),
        });

        Ok(FactCheckReport {
            statement: statement.to_string(),
            style,
            analysis,
            mood,
            explanation,
            comic,
        })
    }

    /// A transport failure, a reply without a JSON object and a schema
    /// violation are all reported the same way.
    fn ask_json<T>(
        &self,
        purpose: &'static str,
        request: &ChatRequest,
        parse: fn(&Map<String, Value>) -> Result<T, SchemaError>,
    ) -> Option<T> {
        let outcome = self.text.complete(request).and_then(|reply| {
            let object = extract_json_object(&reply)
                .with_context(|| format!("{purpose} reply contained no JSON object"))?;
            parse(&object).with_context(|| format!("{purpose} reply failed validation"))
        });
        match outcome {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    provider = self.text.name(),
                    purpose,
                    error = %error_chain_text(&err, 512),
                    "text generation failed; using fallback"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{bail, Result};
    use factstrip_contracts::{FactAnalysis, Mood, PanelRole, Style, Verdict};

    use super::{dialogues_for, CheckError, FactChecker};
    use crate::comic::{decode_data_url, ComicPipeline, PanelSource, StripStage, DATA_URL_PREFIX};
    use crate::config::ComicConfig;
    use crate::providers::{ImageAcquirer, OfflineProvider};
    use crate::text::{ChatRequest, OfflineTextProvider, TextProvider};

    /// Answers by matching on the system prompt, counting every call.
    struct ScriptedText {
        calls: Arc<AtomicUsize>,
    }

    impl TextProvider for ScriptedText {
        fn name(&self) -> &str {
            "scripted"
        }

        fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.system.contains("fact-checker") {
                return Ok(r#"Here you go:
```json
{"verdict": "true", "confidence": 95, "description": "Honeybees use the waggle dance.",
 "story": "A bee dances.", "image_prompts": ["bee wonders", "bee dances", "dance diagram", "bees fly to flowers"]}
```"#
                    .to_string());
            }
            if request.system.contains("Analyze mood") {
                return Ok(r#"{"mood": "positive", "confidence": 88}"#.to_string());
            }
            if request.system.contains("four short comic speech bubbles") {
                return Ok(r#"{"step1": "Do bees talk?", "step2": "Scientists watched hives.",
                    "step3": "The dance encodes direction.", "step4": "Bees really dance to talk."}"#
                    .to_string());
            }
            bail!("unexpected prompt")
        }
    }

    fn offline_pipeline() -> Result<ComicPipeline> {
        let acquirer = ImageAcquirer::new(Box::new(OfflineProvider), Duration::from_secs(1))?;
        Ok(ComicPipeline::new(acquirer, ComicConfig::default())?)
    }

    fn scripted_checker() -> Result<(FactChecker, Arc<AtomicUsize>)> {
        let calls = Arc::new(AtomicUsize::new(0));
        let text = ScriptedText {
            calls: Arc::clone(&calls),
        };
        Ok((FactChecker::new(Box::new(text), offline_pipeline()?), calls))
    }

    #[test]
    fn bees_with_failing_services_render_placeholder_strip() -> Result<()> {
        let checker = FactChecker::new(Box::new(OfflineTextProvider), offline_pipeline()?);
        let report = checker.check("Bees communicate by dance", Style::parse(Some("normal")))?;

        assert_eq!(report.analysis.verdict, Verdict::Unverified);
        assert_eq!(report.analysis.confidence, 50);
        assert_eq!(report.mood.mood, Mood::Neutral);
        assert_eq!(report.mood.confidence, 75);
        assert!(report.explanation.is_none());
        assert_eq!(report.comic.sources, [PanelSource::Placeholder; 4]);

        let response = report.into_response();
        assert!(response.success);
        assert!(response.comic_image.starts_with(DATA_URL_PREFIX));
        let image = decode_data_url(&response.comic_image)?;
        assert_eq!((image.width(), image.height()), (800, 800));
        Ok(())
    }

    #[test]
    fn empty_statement_is_rejected_before_any_call() -> Result<()> {
        let (checker, calls) = scripted_checker()?;
        let err = checker.check("   ", Style::Newspaper).err();
        assert_eq!(err, Some(CheckError::EmptyStatement));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn scripted_services_flow_into_the_report() -> Result<()> {
        let (checker, calls) = scripted_checker()?;
        let report = checker.check("  Bees communicate by dance ", Style::AnimeManga)?;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.statement, "Bees communicate by dance");
        assert_eq!(report.analysis.verdict, Verdict::True);
        assert_eq!(report.analysis.image_prompts[1], "bee dances");
        assert_eq!(report.mood.mood, Mood::Positive);
        assert_eq!(report.mood.confidence, 88);
        let explanation = report
            .explanation
            .clone()
            .ok_or_else(|| anyhow::anyhow!("explanation missing"))?;
        assert_eq!(explanation.step(PanelRole::Conclusion), "Bees really dance to talk.");
        assert_eq!(report.comic.stage, StripStage::IndividualPanels);
        Ok(())
    }

    #[test]
    fn template_dialogues_carry_the_verdict() {
        let mut analysis = FactAnalysis::fallback("The moon is cheese");
        analysis.verdict = Verdict::False;
        analysis.confidence = 97;
        let script = dialogues_for("The moon is cheese", &analysis, None);
        assert_eq!(script.text(PanelRole::Introduction), "Fact: The moon is cheese");
        assert_eq!(script.text(PanelRole::Investigation), "Researching scientific evidence...");
        assert_eq!(script.text(PanelRole::Evidence), "Analyzing the data and studies...");
        assert_eq!(
            script.text(PanelRole::Conclusion),
            "Verdict: FALSE! (97% confidence)"
        );
    }

    #[test]
    fn explain_skips_blank_facts() -> Result<()> {
        let (checker, calls) = scripted_checker()?;
        assert!(checker.explain("  ").is_none());
        assert!(checker.explain("Bees dance").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }
}

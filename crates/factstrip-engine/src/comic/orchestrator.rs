use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

use factstrip_contracts::{PanelRole, PanelScript, Style};
use image::RgbImage;

use super::bubble::render_panel;
use super::divider::divide_strip;
use super::encode::{encode_data_url, BLANK_PNG_DATA_URL};
use super::grid::compose_grid;
use super::prompt::{panel_prompt, strip_prompt};
use super::ComicError;
use crate::config::{ComicConfig, ConfigError};
use crate::providers::{ImageAcquirer, ImageRequest};

/// Fallback ladder, tried in order until one stage produces an encoded strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripStage {
    SingleStrip,
    IndividualPanels,
    Placeholders,
}

impl StripStage {
    pub const ORDER: [StripStage; 3] = [
        StripStage::SingleStrip,
        StripStage::IndividualPanels,
        StripStage::Placeholders,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleStrip => "single_strip",
            Self::IndividualPanels => "individual_panels",
            Self::Placeholders => "placeholders",
        }
    }
}

impl fmt::Display for StripStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSource {
    StripCrop,
    Generated,
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct ComicRequest {
    pub statement: String,
    pub style: Style,
    pub script: PanelScript,
    /// Topic-specific visual descriptions, one per panel.
    pub fragments: [Option<String>; 4],
}

impl ComicRequest {
    fn fragment(&self, role: PanelRole) -> Option<&str> {
        self.fragments[role.index()].as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct ComicRender {
    pub data_url: String,
    pub stage: StripStage,
    pub sources: [PanelSource; 4],
}

pub struct ComicPipeline {
    acquirer: ImageAcquirer,
    config: ComicConfig,
}

type StagePanels = ([RgbImage; 4], [PanelSource; 4]);

impl ComicPipeline {
    pub fn new(acquirer: ImageAcquirer, config: ComicConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { acquirer, config })
    }

    pub fn config(&self) -> &ComicConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.acquirer.provider_name()
    }

    /// Always returns a strip; the worst case is a blank PNG. A stage that
    /// errors or panics hands over to the next one.
    #[tracing::instrument(
        name = "comic.render",
        skip_all,
        fields(style = %request.style, provider = self.acquirer.provider_name())
    )]
    pub fn render(&self, request: &ComicRequest) -> ComicRender {
        for stage in StripStage::ORDER {
            let started = Instant::now();
            let attempt = AssertUnwindSafe(|| self.run_stage(stage, request));
            let outcome = panic::catch_unwind(attempt)
                .unwrap_or_else(|_| Err(ComicError::StagePanicked(stage.as_str())));
            match outcome {
                Ok(render) => {
                    tracing::info!(
                        stage = %stage,
                        sources = ?render.sources,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "comic strip rendered"
                    );
                    return render;
                }
                Err(err) => {
                    tracing::warn!(stage = %stage, error = %err, "comic stage failed");
                }
            }
        }
        tracing::error!("placeholder strip could not be produced; returning blank image");
        ComicRender {
            data_url: BLANK_PNG_DATA_URL.to_string(),
            stage: StripStage::Placeholders,
            sources: [PanelSource::Placeholder; 4],
        }
    }

    fn run_stage(
        &self,
        stage: StripStage,
        request: &ComicRequest,
    ) -> Result<ComicRender, ComicError> {
        let (panels, sources) = match stage {
            StripStage::SingleStrip => self.single_strip(request)?,
            StripStage::IndividualPanels => self.individual_panels(request)?,
            StripStage::Placeholders => self.placeholders(request),
        };
        let grid = compose_grid(&panels, self.config.panel_size);
        Ok(ComicRender {
            data_url: encode_data_url(&grid)?,
            stage,
            sources,
        })
    }

    fn single_strip(&self, request: &ComicRequest) -> Result<StagePanels, ComicError> {
        let fragments = PanelRole::ALL.map(|role| request.fragment(role));
        let prompt = strip_prompt(request.style, &request.statement, &fragments);
        let image_request =
            ImageRequest::new(&prompt, self.config.strip_width(), self.config.panel_size);
        let strip = self
            .acquirer
            .acquire(&image_request)
            .ok_or(ComicError::NoImage("strip"))?;
        let mut crops = divide_strip(&strip, self.config.panel_size)?.into_iter();
        let panels = PanelRole::ALL.map(|role| self.finish_panel(crops.next(), request, role));
        Ok((panels, [PanelSource::StripCrop; 4]))
    }

    fn individual_panels(&self, request: &ComicRequest) -> Result<StagePanels, ComicError> {
        let images: Vec<Option<RgbImage>> = if self.config.parallel_panels {
            thread::scope(|scope| {
                let handles: Vec<_> = PanelRole::ALL
                    .into_iter()
                    .map(|role| scope.spawn(move || self.generate_panel(request, role)))
                    .collect();
                // Every handle is joined before any error is reported.
                let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
                joined
                    .into_iter()
                    .map(|result| result.map_err(|_| ComicError::WorkerPanicked))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            PanelRole::ALL
                .iter()
                .map(|role| self.generate_panel(request, *role))
                .collect()
        };

        let mut sources = [PanelSource::Placeholder; 4];
        let mut images = images.into_iter();
        let panels = PanelRole::ALL.map(|role| {
            let image = images.next().flatten();
            if image.is_some() {
                sources[role.index()] = PanelSource::Generated;
            } else {
                tracing::debug!(
                    panel = role.index(),
                    "panel generation failed; using placeholder"
                );
            }
            self.finish_panel(image, request, role)
        });
        Ok((panels, sources))
    }

    fn placeholders(&self, request: &ComicRequest) -> StagePanels {
        let panels = PanelRole::ALL.map(|role| self.finish_panel(None, request, role));
        (panels, [PanelSource::Placeholder; 4])
    }

    fn generate_panel(&self, request: &ComicRequest, role: PanelRole) -> Option<RgbImage> {
        let prompt = panel_prompt(
            request.style,
            &request.statement,
            role,
            request.fragment(role),
        );
        let size = self.config.panel_size;
        self.acquirer
            .acquire(&ImageRequest::new(&prompt, size, size))
            .map(|image| image.to_rgb8())
    }

    fn finish_panel(
        &self,
        base: Option<RgbImage>,
        request: &ComicRequest,
        role: PanelRole,
    ) -> RgbImage {
        render_panel(
            base,
            request.script.text(role),
            request.style,
            role,
            &self.config,
        )
    }
}

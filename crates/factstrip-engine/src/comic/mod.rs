//! Comic assembly: prompts, panel rendering, strip division, grid layout,
//! encoding, and the fallback pipeline tying them together.

mod bubble;
mod canvas;
mod divider;
mod encode;
mod font;
mod grid;
mod orchestrator;
mod placeholder;
mod prompt;

pub use bubble::{clean_dialogue, render_panel, wrap_text, BubbleLayout};
pub use divider::{crop_spans, divide_strip, DivideError};
pub use encode::{decode_data_url, encode_data_url, BLANK_PNG_DATA_URL, DATA_URL_PREFIX};
pub use grid::{compose_grid, grid_origin};
pub use orchestrator::{ComicPipeline, ComicRender, ComicRequest, PanelSource, StripStage};
pub use placeholder::synthesize_placeholder;
pub use prompt::{panel_prompt, strip_prompt, PanelPrompt};

#[derive(thiserror::Error, Debug)]
pub enum ComicError {
    #[error(transparent)]
    Divide(#[from] DivideError),

    #[error("no image returned for {0}")]
    NoImage(&'static str),

    #[error("png encoding failed: {0}")]
    Encode(String),

    #[error("invalid data url: {0}")]
    DataUrl(String),

    #[error("panel worker panicked")]
    WorkerPanicked,

    #[error("{0} stage panicked")]
    StagePanicked(&'static str),
}

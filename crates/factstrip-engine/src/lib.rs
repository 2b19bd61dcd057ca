pub mod comic;
pub mod config;
pub mod factcheck;
pub mod providers;
pub mod text;
mod transport;

pub use comic::{ComicPipeline, ComicRender, ComicRequest, PanelSource, StripStage};
pub use config::{BubbleConfig, ComicConfig, ConfigError};
pub use factcheck::{dialogues_for, CheckError, FactCheckReport, FactChecker};
pub use providers::{
    default_provider_registry, GeneratedImage, ImageAcquirer, ImageProvider,
    ImageProviderRegistry, ImageRequest, ProviderSettings,
};
pub use text::{ChatRequest, OfflineTextProvider, OpenAiChatProvider, TextProvider};
pub use transport::first_non_empty_env;

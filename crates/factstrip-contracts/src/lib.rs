pub mod analysis;
pub mod api;
pub mod json_text;
pub mod panels;
pub mod style;

pub use analysis::{Explanation, FactAnalysis, Mood, MoodReading, SchemaError, Verdict};
pub use panels::{Dialogue, PanelRole, PanelScript};
pub use style::Style;

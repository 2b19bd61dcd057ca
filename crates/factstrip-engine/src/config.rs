/// Pixel geometry of the speech bubble. Fractions are relative to the panel
/// side length.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleConfig {
    pub wrap_columns: usize,
    pub glyph_scale: u32,
    pub line_spacing: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    pub top_margin: u32,
    pub max_width_fraction: f32,
    pub max_height_fraction: f32,
    pub corner_radius: u32,
    pub outline_width: u32,
    pub tail_width: u32,
    pub tail_height: u32,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            wrap_columns: 19,
            glyph_scale: 2,
            line_spacing: 4,
            padding_x: 15,
            padding_y: 10,
            top_margin: 20,
            max_width_fraction: 0.85,
            max_height_fraction: 0.45,
            corner_radius: 15,
            outline_width: 3,
            tail_width: 16,
            tail_height: 12,
        }
    }
}

impl BubbleConfig {
    pub fn glyph_advance(&self) -> u32 {
        8 * self.glyph_scale.max(1)
    }

    pub fn line_height(&self) -> u32 {
        self.glyph_advance() + self.line_spacing
    }

    pub fn max_width(&self, panel_size: u32) -> u32 {
        (panel_size as f32 * self.max_width_fraction).floor() as u32
    }

    pub fn max_height(&self, panel_size: u32) -> u32 {
        (panel_size as f32 * self.max_height_fraction).floor() as u32
    }
}

pub const MAX_PANEL_SIZE: u32 = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct ComicConfig {
    /// Side length S of every panel; the strip is 2S x 2S.
    pub panel_size: u32,
    pub max_dialogue_chars: usize,
    pub parallel_panels: bool,
    pub bubble: BubbleConfig,
}

impl Default for ComicConfig {
    fn default() -> Self {
        Self {
            panel_size: 400,
            max_dialogue_chars: 120,
            parallel_panels: false,
            bubble: BubbleConfig::default(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("panel size {0} must be a multiple of 8 between 64 and 2048")]
    PanelSize(u32),

    #[error("bubble fraction `{name}` must be within (0, 1], got {value}")]
    Fraction { name: &'static str, value: f32 },

    #[error("bubble fits {columns} columns of text; at least 4 are required")]
    BubbleTooNarrow { columns: u32 },

    #[error("bubble fits no line of text at panel size {panel_size}")]
    BubbleTooShort { panel_size: u32 },

    #[error("max dialogue length {0} must be at least 16 characters")]
    DialogueLength(usize),
}

impl ComicConfig {
    pub fn with_panel_size(panel_size: u32) -> Self {
        Self {
            panel_size,
            ..Self::default()
        }
    }

    pub fn strip_width(&self) -> u32 {
        self.panel_size * 4
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.panel_size;
        if !(64..=MAX_PANEL_SIZE).contains(&size) || size % 8 != 0 {
            return Err(ConfigError::PanelSize(size));
        }
        if self.max_dialogue_chars < 16 {
            return Err(ConfigError::DialogueLength(self.max_dialogue_chars));
        }
        let bubble = &self.bubble;
        for (name, value) in [
            ("max_width_fraction", bubble.max_width_fraction),
            ("max_height_fraction", bubble.max_height_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Fraction { name, value });
            }
        }
        let usable_width = bubble
            .max_width(size)
            .saturating_sub(bubble.padding_x * 2);
        let columns = usable_width / bubble.glyph_advance();
        if columns < 4 {
            return Err(ConfigError::BubbleTooNarrow { columns });
        }
        let usable_height = bubble
            .max_height(size)
            .saturating_sub(bubble.padding_y * 2);
        if usable_height < bubble.glyph_advance() {
            return Err(ConfigError::BubbleTooShort { panel_size: size });
        }
        Ok(())
    }
}

use factstrip_contracts::{PanelRole, Style};
use image::{Rgb, RgbImage};

use super::canvas::{stroke_rect, BLACK};
use super::font::BitmapFont;
use crate::config::ComicConfig;

const FRAME_INSET: i32 = 5;
const FRAME_WIDTH: i32 = 2;
const LABEL_MARGIN: u32 = 20;

/// Flat style-coloured panel with a frame and a `Panel N` label along the
/// bottom edge (the top is reserved for the speech bubble).
pub fn synthesize_placeholder(style: Style, role: PanelRole, config: &ComicConfig) -> RgbImage {
    let size = config.panel_size;
    let mut panel = RgbImage::from_pixel(size, size, Rgb(style.placeholder_background()));
    let side = size as i32 - FRAME_INSET * 2;
    stroke_rect(
        &mut panel,
        FRAME_INSET,
        FRAME_INSET,
        side,
        side,
        FRAME_WIDTH,
        BLACK,
    );

    let font = BitmapFont::new(config.bubble.glyph_scale);
    let label = role.label();
    let x = size.saturating_sub(font.text_width(&label)) / 2;
    let y = size.saturating_sub(LABEL_MARGIN + font.height());
    font.draw_text(&mut panel, x as i32, y as i32, &label, BLACK);
    panel
}

#[cfg(test)]
mod tests {
    use factstrip_contracts::{PanelRole, Style};
    use image::Rgb;

    use super::synthesize_placeholder;
    use crate::comic::canvas::BLACK;
    use crate::config::ComicConfig;

    #[test]
    fn placeholder_uses_style_background_and_frame() {
        let config = ComicConfig::default();
        for style in Style::ALL {
            let panel = synthesize_placeholder(style, PanelRole::Investigation, &config);
            assert_eq!(panel.dimensions(), (400, 400));
            assert_eq!(*panel.get_pixel(200, 200), Rgb(style.placeholder_background()));
            assert_eq!(*panel.get_pixel(5, 200), BLACK);
            assert_eq!(*panel.get_pixel(200, 394), BLACK);
        }
    }

    #[test]
    fn placeholders_differ_by_label() {
        let config = ComicConfig::default();
        let first = synthesize_placeholder(Style::Normal, PanelRole::Introduction, &config);
        let last = synthesize_placeholder(Style::Normal, PanelRole::Conclusion, &config);
        assert_ne!(first, last);
    }
}

use factstrip_contracts::{PanelRole, Style};
use image::imageops::{self, FilterType};
use image::RgbImage;

use super::canvas::{fill_rounded_rect, fill_triangle, BLACK, WHITE};
use super::font::BitmapFont;
use super::placeholder::synthesize_placeholder;
use crate::config::{BubbleConfig, ComicConfig};

const ELLIPSIS: &str = "...";

/// Length in bytes of a `panel N:` label (N in 1..=4) at the start of
/// `lowered`, if any.
fn panel_label_len(lowered: &str) -> Option<usize> {
    let bytes = lowered.as_bytes();
    if !lowered.starts_with("panel ") {
        return None;
    }
    match (bytes.get(6), bytes.get(7)) {
        (Some(b'1'..=b'4'), Some(b':')) => Some(8),
        _ => None,
    }
}

fn strip_panel_labels(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;
    while idx < text.len() {
        if let Some(len) = panel_label_len(&lowered[idx..]) {
            idx += len;
            continue;
        }
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

/// Normalises dialogue for display: drops `Panel N:` artifacts, folds line
/// breaks and runs of whitespace, and caps the length at `max_chars`
/// (ellipsis included).
pub fn clean_dialogue(text: &str, max_chars: usize) -> String {
    let stripped = strip_panel_labels(text);
    let collapsed = stripped.split_whitespace().collect::<Vec<&str>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let head: String = collapsed.chars().take(keep).collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

/// Greedy word wrap by character count. Words longer than `columns` are split.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(columns) {
            let piece: String = chunk.iter().collect();
            let piece_len = chunk.len();
            if current_len == 0 {
                current = piece;
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= columns {
                current.push(' ');
                current.push_str(&piece);
                current_len += 1 + piece_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current = piece;
                current_len = piece_len;
            }
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

fn ellipsize(line: &str, columns: usize) -> String {
    let keep = columns.saturating_sub(ELLIPSIS.len());
    if line.chars().count() <= keep {
        return format!("{line}{ELLIPSIS}");
    }
    let head: String = line.chars().take(keep).collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

/// Resolved geometry of one speech bubble inside a square panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleLayout {
    pub lines: Vec<String>,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub line_height: u32,
}

impl BubbleLayout {
    pub fn measure(text: &str, panel_size: u32, config: &BubbleConfig) -> Self {
        let advance = config.glyph_advance();
        let line_height = config.line_height();
        let max_width = config.max_width(panel_size);
        let max_height = config.max_height(panel_size);

        let fit_columns =
            (max_width.saturating_sub(config.padding_x * 2) / advance).max(1) as usize;
        let columns = config.wrap_columns.clamp(1, fit_columns);
        let mut lines = wrap_text(text, columns);

        let max_lines = ((max_height.saturating_sub(config.padding_y * 2) + config.line_spacing)
            / line_height)
            .max(1) as usize;
        if lines.len() > max_lines {
            lines.truncate(max_lines);
            if let Some(last) = lines.last_mut() {
                *last = ellipsize(last, columns);
            }
        }

        let longest = lines
            .iter()
            .map(|line| line.chars().count() as u32)
            .max()
            .unwrap_or(0);
        let text_width = longest * advance;
        let text_height = (lines.len() as u32 * line_height).saturating_sub(config.line_spacing);
        let width = (text_width + config.padding_x * 2).min(max_width);
        let height = (text_height + config.padding_y * 2).min(max_height);

        Self {
            lines,
            x: panel_size.saturating_sub(width) / 2,
            y: config.top_margin,
            width,
            height,
            line_height,
        }
    }

    pub fn center_x(&self) -> u32 {
        self.x + self.width / 2
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    fn draw(&self, img: &mut RgbImage, config: &BubbleConfig) {
        if self.lines.is_empty() {
            return;
        }
        let (x, y) = (self.x as i32, self.y as i32);
        let (w, h) = (self.width as i32, self.height as i32);
        let outline = config.outline_width as i32;
        let radius = config.corner_radius as i32;

        fill_rounded_rect(img, x, y, w, h, radius, BLACK);
        fill_rounded_rect(
            img,
            x + outline,
            y + outline,
            w - outline * 2,
            h - outline * 2,
            (radius - outline).max(0),
            WHITE,
        );

        // Tail: an outlined wedge whose white core cuts through the bubble's
        // bottom border so the two read as one shape.
        let cx = f64::from(self.center_x());
        let bottom = f64::from(self.bottom());
        let half = f64::from(config.tail_width) / 2.0;
        let o = f64::from(config.outline_width);
        let tip = bottom + f64::from(config.tail_height);
        fill_triangle(
            img,
            (cx - half - o, bottom - o),
            (cx + half + o, bottom - o),
            (cx, tip + o),
            BLACK,
        );
        fill_triangle(
            img,
            (cx - half, bottom - o - 1.0),
            (cx + half, bottom - o - 1.0),
            (cx, tip - o),
            WHITE,
        );

        let font = BitmapFont::new(config.glyph_scale);
        let text_height =
            (self.lines.len() as u32 * self.line_height).saturating_sub(config.line_spacing);
        let top = y + (self.height.saturating_sub(text_height) / 2) as i32;
        for (idx, line) in self.lines.iter().enumerate() {
            let line_width = font.text_width(line);
            let lx = x + (self.width.saturating_sub(line_width) / 2) as i32;
            let ly = top + (idx as u32 * self.line_height) as i32;
            font.draw_text(img, lx, ly, line, BLACK);
        }
    }
}

pub(crate) fn fit_panel(panel: RgbImage, panel_size: u32) -> RgbImage {
    if panel.dimensions() == (panel_size, panel_size) {
        return panel;
    }
    imageops::resize(&panel, panel_size, panel_size, FilterType::Lanczos3)
}

/// Burns a speech bubble into `base`, synthesising a placeholder panel first
/// when there is no base image. The result is always `S x S`.
pub fn render_panel(
    base: Option<RgbImage>,
    dialogue: &str,
    style: Style,
    role: PanelRole,
    config: &ComicConfig,
) -> RgbImage {
    let size = config.panel_size;
    let mut panel = match base {
        Some(image) if image.width() > 0 && image.height() > 0 => fit_panel(image, size),
        _ => synthesize_placeholder(style, role, config),
    };
    let text = clean_dialogue(dialogue, config.max_dialogue_chars);
    BubbleLayout::measure(&text, size, &config.bubble).draw(&mut panel, &config.bubble);
    panel
}

#[cfg(test)]
mod tests {
    use factstrip_contracts::{PanelRole, Style};
    use image::{Rgb, RgbImage};

    use super::{clean_dialogue, render_panel, wrap_text, BubbleLayout};
    use crate::comic::canvas::{BLACK, WHITE};
    use crate::config::ComicConfig;

    #[test]
    fn clean_dialogue_strips_labels_and_line_breaks() {
        let cleaned = clean_dialogue("Panel 1: Did you know?\nPANEL 2:Bees   dance!", 120);
        assert_eq!(cleaned, "Did you know? Bees dance!");
        assert_eq!(clean_dialogue("panel 7: stays", 120), "panel 7: stays");
    }

    #[test]
    fn long_dialogue_is_truncated_with_ellipsis() {
        let text = "word ".repeat(60);
        assert_eq!(text.len(), 300);
        let cleaned = clean_dialogue(&text, 120);
        assert!(cleaned.chars().count() <= 120);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn wrap_respects_column_width() {
        let lines = wrap_text("Honeybees perform a waggle dance to share directions", 12);
        assert!(lines.iter().all(|line| line.chars().count() <= 12));
        assert_eq!(lines.join(" "), "Honeybees perform a waggle dance to share directions");
    }

    #[test]
    fn wrap_splits_words_longer_than_a_line() {
        let lines = wrap_text("supercalifragilistic", 8);
        assert_eq!(lines, vec!["supercal", "ifragili", "stic"]);
        assert!(wrap_text("   ", 8).is_empty());
    }

    #[test]
    fn bubble_never_exceeds_caps() {
        let config = ComicConfig::default();
        let bubble = &config.bubble;
        let text = clean_dialogue(&"evidence ".repeat(40), config.max_dialogue_chars);
        let layout = BubbleLayout::measure(&text, config.panel_size, bubble);
        assert!(layout.width <= bubble.max_width(config.panel_size));
        assert!(layout.height <= bubble.max_height(config.panel_size));
        let text_height = layout.lines.len() as u32 * layout.line_height - bubble.line_spacing;
        assert!(text_height + bubble.padding_y * 2 <= layout.height);
        let columns = layout
            .lines
            .iter()
            .map(|line| line.chars().count() as u32)
            .max()
            .unwrap_or(0);
        assert!(columns * bubble.glyph_advance() + bubble.padding_x * 2 <= layout.width);
    }

    #[test]
    fn overflowing_lines_end_with_ellipsis() {
        let mut config = ComicConfig::default();
        config.bubble.max_height_fraction = 0.15;
        let text = clean_dialogue(&"data ".repeat(24), config.max_dialogue_chars);
        let layout = BubbleLayout::measure(&text, config.panel_size, &config.bubble);
        assert!(layout.lines.len() < wrap_text(&text, config.bubble.wrap_columns).len());
        assert!(layout.lines.last().is_some_and(|line| line.ends_with("...")));
    }

    #[test]
    fn bubble_is_centered_near_the_top() {
        let config = ComicConfig::default();
        let layout = BubbleLayout::measure("Did you know?", config.panel_size, &config.bubble);
        assert!(layout.center_x().abs_diff(config.panel_size / 2) <= 1);
        assert_eq!(layout.y, config.bubble.top_margin);
    }

    #[test]
    fn rendered_panel_is_canonical_size_for_any_input() {
        let config = ComicConfig::default();
        let odd = RgbImage::from_pixel(123, 77, Rgb([10, 200, 30]));
        let wide = RgbImage::from_pixel(1600, 400, Rgb([10, 200, 30]));
        for base in [Some(odd), Some(wide), Some(RgbImage::new(0, 0)), None] {
            let panel = render_panel(base, "Hello", Style::Normal, PanelRole::Evidence, &config);
            assert_eq!(panel.dimensions(), (config.panel_size, config.panel_size));
        }
    }

    #[test]
    fn bubble_and_tail_are_burned_into_the_panel() {
        let config = ComicConfig::default();
        let red = Rgb([200, 0, 0]);
        let base = RgbImage::from_pixel(config.panel_size, config.panel_size, red);
        let panel = render_panel(
            Some(base),
            "Bees dance",
            Style::Normal,
            PanelRole::Introduction,
            &config,
        );
        let layout = BubbleLayout::measure("Bees dance", config.panel_size, &config.bubble);
        let inner = *panel.get_pixel(layout.x + 6, layout.y + layout.height / 2);
        assert_eq!(inner, WHITE);
        let tail = *panel.get_pixel(layout.center_x(), layout.bottom() + 2);
        assert!(tail == WHITE || tail == BLACK);
        assert_eq!(*panel.get_pixel(2, config.panel_size - 2), red);
        let inked = panel.pixels().filter(|pixel| **pixel == BLACK).count();
        assert!(inked > 0);
    }
}

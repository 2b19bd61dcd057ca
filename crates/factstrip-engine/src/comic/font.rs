use font8x8::{
    UnicodeFonts, BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS, MISC_FONTS,
};
use image::{Rgb, RgbImage};

/// Hollow box drawn when no typeface in the chain has the glyph and the `?`
/// substitute is missing as well.
const MISSING_GLYPH: [u8; 8] = [0x7E, 0x42, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Typeface {
    Basic,
    Latin,
    Greek,
    BoxDrawing,
    Block,
    Misc,
}

/// Lookup order; earlier entries win.
const TYPEFACE_CHAIN: [Typeface; 6] = [
    Typeface::Basic,
    Typeface::Latin,
    Typeface::Greek,
    Typeface::BoxDrawing,
    Typeface::Block,
    Typeface::Misc,
];

impl Typeface {
    fn glyph(self, ch: char) -> Option<[u8; 8]> {
        match self {
            Self::Basic => BASIC_FONTS.get(ch),
            Self::Latin => LATIN_FONTS.get(ch),
            Self::Greek => GREEK_FONTS.get(ch),
            Self::BoxDrawing => BOX_FONTS.get(ch),
            Self::Block => BLOCK_FONTS.get(ch),
            Self::Misc => MISC_FONTS.get(ch),
        }
    }
}

fn ascii_substitute(ch: char) -> Option<char> {
    match ch {
        '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => Some('\''),
        '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => Some('"'),
        '\u{2010}'..='\u{2015}' | '\u{2212}' => Some('-'),
        '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' => Some(' '),
        '\u{2022}' | '\u{00B7}' => Some('*'),
        _ => None,
    }
}

pub(crate) fn glyph_for(ch: char) -> [u8; 8] {
    let ch = ascii_substitute(ch).unwrap_or(ch);
    TYPEFACE_CHAIN
        .iter()
        .find_map(|typeface| typeface.glyph(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or(MISSING_GLYPH)
}

/// Monospaced 8x8 bitmap font drawn at an integer scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    pub(crate) fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    pub(crate) fn advance(&self) -> u32 {
        8 * self.scale
    }

    pub(crate) fn height(&self) -> u32 {
        8 * self.scale
    }

    pub(crate) fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.advance()
    }

    pub(crate) fn draw_text(
        &self,
        img: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        color: Rgb<u8>,
    ) {
        let scale = self.scale as i32;
        let (width, height) = (img.width() as i32, img.height() as i32);
        let mut cursor_x = x;
        for ch in text.chars() {
            let glyph = glyph_for(ch);
            for (row_idx, row_bits) in glyph.into_iter().enumerate() {
                for col_idx in 0..8 {
                    if (row_bits >> col_idx) & 1 == 0 {
                        continue;
                    }
                    let px = cursor_x + col_idx * scale;
                    let py = y + row_idx as i32 * scale;
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let (tx, ty) = (px + sx, py + sy);
                            if tx >= 0 && ty >= 0 && tx < width && ty < height {
                                img.put_pixel(tx as u32, ty as u32, color);
                            }
                        }
                    }
                }
            }
            cursor_x += self.advance() as i32;
        }
    }
}

#[cfg(test)]
mod tests {
    use font8x8::{UnicodeFonts, BASIC_FONTS};
    use image::RgbImage;

    use super::{glyph_for, BitmapFont, MISSING_GLYPH};
    use crate::comic::canvas::{BLACK, WHITE};

    #[test]
    fn chain_resolves_latin_and_greek() {
        assert_ne!(glyph_for('é'), glyph_for('?'));
        assert_ne!(glyph_for('λ'), glyph_for('?'));
        assert_eq!(Some(glyph_for('A')), BASIC_FONTS.get('A'));
    }

    #[test]
    fn typographic_punctuation_maps_to_ascii() {
        assert_eq!(Some(glyph_for('\u{2019}')), BASIC_FONTS.get('\''));
        assert_eq!(Some(glyph_for('\u{2014}')), BASIC_FONTS.get('-'));
    }

    #[test]
    fn unknown_glyphs_fall_back_to_question_mark() {
        let fallback = glyph_for('\u{1F41D}');
        assert_eq!(Some(fallback), BASIC_FONTS.get('?'));
        assert_ne!(fallback, MISSING_GLYPH);
    }

    #[test]
    fn draw_text_stays_inside_measured_box() {
        let font = BitmapFont::new(2);
        let mut img = RgbImage::from_pixel(64, 32, WHITE);
        font.draw_text(&mut img, 0, 0, "Hi", BLACK);
        assert_eq!(font.text_width("Hi"), 32);
        let inked: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, pixel)| **pixel == BLACK)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|(x, y)| *x < 32 && *y < font.height()));
    }
}

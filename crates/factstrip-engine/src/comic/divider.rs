use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DivideError {
    #[error("strip image {width}x{height} is too small to divide into 4 panels")]
    TooSmall { width: u32, height: u32 },
}

/// Horizontal `(x, width)` spans of the four crops. Each span is `W / 4` wide
/// and the last one absorbs the remainder, so the widths always sum to `W`.
pub fn crop_spans(width: u32) -> [(u32, u32); 4] {
    let base = width / 4;
    let last = width - base * 3;
    [(0, base), (base, base), (base * 2, base), (base * 3, last)]
}

/// Splits one wide multi-panel image into four canonical `S x S` panels.
pub fn divide_strip(strip: &DynamicImage, panel_size: u32) -> Result<[RgbImage; 4], DivideError> {
    let (width, height) = strip.dimensions();
    if width < 4 || height == 0 {
        return Err(DivideError::TooSmall { width, height });
    }
    Ok(crop_spans(width).map(|(x, crop_width)| {
        strip
            .crop_imm(x, 0, crop_width, height)
            .resize_exact(panel_size, panel_size, FilterType::Lanczos3)
            .to_rgb8()
    }))
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgb, RgbImage};

    use super::{crop_spans, divide_strip, DivideError};

    fn banded_strip(width: u32, height: u32) -> DynamicImage {
        let colors = [
            Rgb([255, 0, 0]),
            Rgb([0, 255, 0]),
            Rgb([0, 0, 255]),
            Rgb([255, 255, 0]),
        ];
        let spans = crop_spans(width);
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            let band = spans
                .iter()
                .position(|(start, span)| x >= *start && x < start + span)
                .unwrap_or(3);
            colors[band]
        }))
    }

    #[test]
    fn spans_cover_width_exactly() {
        for width in [4, 5, 7, 400, 1601, 1603] {
            let spans = crop_spans(width);
            assert_eq!(spans.iter().map(|(_, w)| w).sum::<u32>(), width);
            assert_eq!(spans[0].0, 0);
            for pair in spans.windows(2) {
                assert_eq!(pair[0].0 + pair[0].1, pair[1].0);
            }
        }
        assert_eq!(crop_spans(1603)[3], (1200, 403));
    }

    #[test]
    fn wide_strip_yields_four_square_panels_in_order() -> anyhow::Result<()> {
        let strip = banded_strip(1600, 400);
        let panels = divide_strip(&strip, 400)?;
        let expected = [
            Rgb([255, 0, 0]),
            Rgb([0, 255, 0]),
            Rgb([0, 0, 255]),
            Rgb([255, 255, 0]),
        ];
        for (panel, color) in panels.iter().zip(expected) {
            assert_eq!(panel.dimensions(), (400, 400));
            assert_eq!(*panel.get_pixel(200, 200), color);
        }
        Ok(())
    }

    #[test]
    fn odd_sizes_are_resized_to_canonical_panels() -> anyhow::Result<()> {
        let panels = divide_strip(&banded_strip(7, 1), 64)?;
        assert!(panels.iter().all(|panel| panel.dimensions() == (64, 64)));
        Ok(())
    }

    #[test]
    fn degenerate_strips_are_rejected() {
        let narrow = DynamicImage::ImageRgb8(RgbImage::new(3, 100));
        assert_eq!(
            divide_strip(&narrow, 400).err(),
            Some(DivideError::TooSmall {
                width: 3,
                height: 100
            })
        );
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(divide_strip(&empty, 400).is_err());
    }
}

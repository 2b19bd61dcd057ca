use image::imageops;
use image::RgbImage;

use super::bubble::fit_panel;
use super::canvas::{fill_rect, stroke_rect, BLACK, WHITE};

const SEPARATOR_WIDTH: i32 = 3;
const BORDER_WIDTH: i32 = 4;

/// Top-left corner of grid cell `index` (row-major, 2 columns).
pub fn grid_origin(index: usize, panel_size: u32) -> (u32, u32) {
    let column = (index % 2) as u32;
    let row = (index / 2 % 2) as u32;
    (column * panel_size, row * panel_size)
}

/// Lays four panels out as a 2x2 strip. Callers substitute placeholders for
/// missing panels before this point; panels of the wrong size are resized.
pub fn compose_grid(panels: &[RgbImage; 4], panel_size: u32) -> RgbImage {
    let side = panel_size * 2;
    let mut canvas = RgbImage::from_pixel(side, side, WHITE);

    for (index, panel) in panels.iter().enumerate() {
        let (x, y) = grid_origin(index, panel_size);
        let panel = fit_panel(panel.clone(), panel_size);
        imageops::replace(&mut canvas, &panel, i64::from(x), i64::from(y));
    }

    let s = panel_size as i32;
    let half = SEPARATOR_WIDTH / 2;
    let side = side as i32;
    fill_rect(&mut canvas, s - half, 0, s - half + SEPARATOR_WIDTH, side, BLACK);
    fill_rect(&mut canvas, 0, s - half, side, s - half + SEPARATOR_WIDTH, BLACK);
    stroke_rect(&mut canvas, 0, 0, side, side, BORDER_WIDTH, BLACK);
    canvas
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::{compose_grid, grid_origin};
    use crate::comic::canvas::{BLACK, WHITE};

    fn solid(size: u32, color: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(size, size, color)
    }

    const COLORS: [Rgb<u8>; 4] = [
        Rgb([200, 30, 30]),
        Rgb([30, 200, 30]),
        Rgb([30, 30, 200]),
        Rgb([200, 200, 30]),
    ];

    #[test]
    fn origins_follow_index_order() {
        assert_eq!(grid_origin(0, 400), (0, 0));
        assert_eq!(grid_origin(1, 400), (400, 0));
        assert_eq!(grid_origin(2, 400), (0, 400));
        assert_eq!(grid_origin(3, 400), (400, 400));
    }

    #[test]
    fn canvas_is_twice_the_panel_size_with_separators() {
        let panels = COLORS.map(|color| solid(400, color));
        let grid = compose_grid(&panels, 400);
        assert_eq!(grid.dimensions(), (800, 800));
        for offset in [50, 399, 400, 401, 750] {
            assert_eq!(*grid.get_pixel(400, offset), BLACK);
            assert_eq!(*grid.get_pixel(offset, 400), BLACK);
        }
        assert_eq!(*grid.get_pixel(0, 0), BLACK);
        assert_eq!(*grid.get_pixel(3, 200), BLACK);
        assert_eq!(*grid.get_pixel(799, 799), BLACK);
    }

    #[test]
    fn panels_land_in_fixed_cells() {
        let panels = COLORS.map(|color| solid(400, color));
        let grid = compose_grid(&panels, 400);
        for (index, color) in COLORS.iter().enumerate() {
            let (x, y) = grid_origin(index, 400);
            assert_eq!(grid.get_pixel(x + 200, y + 200), color);
        }
    }

    #[test]
    fn mismatched_panel_sizes_are_fitted_to_cells() {
        let panels = [
            solid(123, COLORS[0]),
            solid(900, COLORS[1]),
            solid(400, COLORS[2]),
            RgbImage::from_pixel(400, 200, COLORS[3]),
        ];
        let grid = compose_grid(&panels, 400);
        assert_eq!(grid.dimensions(), (800, 800));
        assert_eq!(*grid.get_pixel(200, 200), COLORS[0]);
        assert_eq!(*grid.get_pixel(600, 200), COLORS[1]);
        assert_eq!(*grid.get_pixel(200, 600), COLORS[2]);
        assert_ne!(*grid.get_pixel(600, 750), WHITE);
    }
}

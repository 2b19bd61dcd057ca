//! Opaque raster primitives. Coordinates may fall outside the image; every
//! primitive clips.

use image::{Rgb, RgbImage};

pub(crate) const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub(crate) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

fn clamp_i32(value: i32, min_value: i32, max_value: i32) -> i32 {
    value.max(min_value).min(max_value)
}

/// Fills the half-open box `[x0, x1) x [y0, y1)`.
pub(crate) fn fill_rect(img: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
    let (width, height) = (img.width() as i32, img.height() as i32);
    let min_x = clamp_i32(x0.min(x1), 0, width);
    let max_x = clamp_i32(x0.max(x1), 0, width);
    let min_y = clamp_i32(y0.min(y1), 0, height);
    let max_y = clamp_i32(y0.max(y1), 0, height);
    for y in min_y..max_y {
        for x in min_x..max_x {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Border of `thickness` pixels drawn inside the `w x h` box at (x, y).
pub(crate) fn stroke_rect(
    img: &mut RgbImage,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    thickness: i32,
    color: Rgb<u8>,
) {
    let t = thickness.max(1);
    fill_rect(img, x, y, x + w, y + t, color);
    fill_rect(img, x, y + h - t, x + w, y + h, color);
    fill_rect(img, x, y, x + t, y + h, color);
    fill_rect(img, x + w - t, y, x + w, y + h, color);
}

fn inside_rounded(px: i32, py: i32, x: i32, y: i32, w: i32, h: i32, radius: i32) -> bool {
    let r = radius.min(w / 2).min(h / 2).max(0) as f64;
    let fx = f64::from(px) + 0.5;
    let fy = f64::from(py) + 0.5;
    let left = f64::from(x) + r;
    let right = f64::from(x + w) - r;
    let top = f64::from(y) + r;
    let bottom = f64::from(y + h) - r;
    let cx = fx.clamp(left, right.max(left));
    let cy = fy.clamp(top, bottom.max(top));
    let (dx, dy) = (fx - cx, fy - cy);
    dx * dx + dy * dy <= r * r
}

pub(crate) fn fill_rounded_rect(
    img: &mut RgbImage,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    radius: i32,
    color: Rgb<u8>,
) {
    if w <= 0 || h <= 0 {
        return;
    }
    let min_x = clamp_i32(x, 0, img.width() as i32);
    let max_x = clamp_i32(x + w, 0, img.width() as i32);
    let min_y = clamp_i32(y, 0, img.height() as i32);
    let max_y = clamp_i32(y + h, 0, img.height() as i32);
    for py in min_y..max_y {
        for px in min_x..max_x {
            if inside_rounded(px, py, x, y, w, h, radius) {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

fn edge(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

fn point_in_triangle(p: (f64, f64), a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
    let d1 = edge(a, b, p);
    let d2 = edge(b, c, p);
    let d3 = edge(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

pub(crate) fn fill_triangle(
    img: &mut RgbImage,
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    color: Rgb<u8>,
) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    let min_x = clamp_i32(a.0.min(b.0).min(c.0).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32(a.0.max(b.0).max(c.0).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32(a.1.min(b.1).min(c.1).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32(a.1.max(b.1).max(c.1).ceil() as i32, 0, img.height() as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = (f64::from(x) + 0.5, f64::from(y) + 0.5);
            if point_in_triangle(p, a, b, c) {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

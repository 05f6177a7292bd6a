//! Fast marching inpainting after Telea (2004).
//!
//! Masked pixels are filled in order of their distance from the mask
//! boundary. Each one becomes a weighted average of first-order estimates
//! `I(q) + grad I(q) . (p - q)` from the already known pixels `q` within the
//! inpainting radius, favouring close pixels, pixels along the boundary
//! normal and pixels on the same distance level set.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::error::{PipelineError, Result};

pub const DEFAULT_RADIUS: u32 = 3;

const KNOWN: u8 = 0;
const BAND: u8 = 1;
const INSIDE: u8 = 2;

const INF: f32 = 1.0e6;

/// A pixel on the marching front, ordered so the heap pops the smallest
/// arrival time first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Front {
    t: f32,
    x: u32,
    y: u32,
}

impl Eq for Front {}

impl Ord for Front {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| (other.y, other.x).cmp(&(self.y, self.x)))
    }
}

impl PartialOrd for Front {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Field {
    width: u32,
    height: u32,
    flags: Vec<u8>,
    t: Vec<f32>,
}

impl Field {
    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    fn flag(&self, x: i64, y: i64) -> Option<u8> {
        self.in_bounds(x, y)
            .then(|| self.flags[self.idx(x as u32, y as u32)])
    }

    fn known_t(&self, x: i64, y: i64) -> Option<f32> {
        match self.flag(x, y) {
            Some(KNOWN) => Some(self.t[self.idx(x as u32, y as u32)]),
            _ => None,
        }
    }

    fn settled_t(&self, x: i64, y: i64) -> Option<f32> {
        match self.flag(x, y) {
            Some(INSIDE) | None => None,
            Some(_) => Some(self.t[self.idx(x as u32, y as u32)]),
        }
    }

    /// Arrival time at (x, y) from the known neighbours (eikonal update).
    fn arrival_time(&self, x: u32, y: u32) -> f32 {
        let (x, y) = (i64::from(x), i64::from(y));
        [
            (x - 1, y, x, y - 1),
            (x + 1, y, x, y - 1),
            (x - 1, y, x, y + 1),
            (x + 1, y, x, y + 1),
        ]
        .into_iter()
        .map(|(x1, y1, x2, y2)| solve(self.known_t(x1, y1), self.known_t(x2, y2)))
        .fold(INF, f32::min)
    }

    /// Gradient of the arrival time at (x, y), using only settled pixels.
    fn gradient(&self, x: u32, y: u32) -> (f32, f32) {
        let (x, y) = (i64::from(x), i64::from(y));
        let center = self.t[self.idx(x as u32, y as u32)];
        let axis = |prev: Option<f32>, next: Option<f32>| match (prev, next) {
            (Some(p), Some(n)) => (n - p) * 0.5,
            (Some(p), None) => center - p,
            (None, Some(n)) => n - center,
            (None, None) => 0.0,
        };

        (
            axis(self.settled_t(x - 1, y), self.settled_t(x + 1, y)),
            axis(self.settled_t(x, y - 1), self.settled_t(x, y + 1)),
        )
    }
}

fn solve(a: Option<f32>, b: Option<f32>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let d = a - b;
            if d * d >= 2.0 {
                return 1.0 + a.min(b);
            }
            let r = (2.0 - d * d).sqrt();
            let s = (a + b - r) * 0.5;
            if s >= a && s >= b { s } else { s + r }
        }
        (Some(a), None) => 1.0 + a,
        (None, Some(b)) => 1.0 + b,
        (None, None) => INF,
    }
}

/// Fill every pixel where `mask` is non-zero from its surroundings.
///
/// Unmasked pixels are copied unchanged. Masked pixels with no path to a
/// known pixel (a mask covering the whole image) keep their input value.
pub fn inpaint_telea(image: &RgbImage, mask: &GrayImage, radius: u32) -> Result<RgbImage> {
    if image.dimensions() != mask.dimensions() {
        return Err(PipelineError::Inpaint(format!(
            "mask is {}x{} but image is {}x{}",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        )));
    }

    let mut out = image.clone();
    if mask.pixels().all(|p| p[0] == 0) {
        return Ok(out);
    }

    let (width, height) = image.dimensions();
    let len = (width as usize) * (height as usize);
    let mut field = Field {
        width,
        height,
        flags: vec![KNOWN; len],
        t: vec![0.0; len],
    };

    let band = dilate(mask, Norm::L1, 1);
    let mut heap = BinaryHeap::new();
    for (x, y, p) in mask.enumerate_pixels() {
        let i = field.idx(x, y);
        if p[0] != 0 {
            field.flags[i] = INSIDE;
            field.t[i] = INF;
        } else if band.get_pixel(x, y)[0] != 0 {
            field.flags[i] = BAND;
            heap.push(Front { t: 0.0, x, y });
        }
    }

    let radius = i64::from(radius.max(1));

    while let Some(Front { x, y, .. }) = heap.pop() {
        let i = field.idx(x, y);
        if field.flags[i] == KNOWN {
            continue;
        }
        field.flags[i] = KNOWN;

        for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
            let (nx, ny) = (i64::from(x) + dx, i64::from(y) + dy);
            if field.flag(nx, ny) != Some(INSIDE) {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            let j = field.idx(nx, ny);

            let t = field.arrival_time(nx, ny);
            field.t[j] = t;
            let value = fill_pixel(&out, &field, nx, ny, radius);
            if let Some(value) = value {
                out.put_pixel(nx, ny, value);
            }
            field.flags[j] = BAND;
            heap.push(Front { t, x: nx, y: ny });
        }
    }

    Ok(out)
}

fn fill_pixel(out: &RgbImage, field: &Field, x: u32, y: u32, radius: i64) -> Option<Rgb<u8>> {
    let t_p = field.t[field.idx(x, y)];
    let (gx, gy) = field.gradient(x, y);

    let mut acc = [0.0f32; 3];
    let mut total = 0.0f32;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let len2 = dx * dx + dy * dy;
            if len2 == 0 || len2 > radius * radius {
                continue;
            }
            let (qx, qy) = (i64::from(x) + dx, i64::from(y) + dy);
            match field.flag(qx, qy) {
                Some(INSIDE) | None => continue,
                Some(_) => {}
            }
            let (qx, qy) = (qx as u32, qy as u32);

            // vector from the source pixel to the one being filled
            let (rx, ry) = (-dx as f32, -dy as f32);
            let len2 = len2 as f32;

            let mut dir = rx * gx + ry * gy;
            if dir.abs() <= 0.01 {
                dir = 1.0e-6;
            }
            let dst = 1.0 / (len2 * len2.sqrt());
            let lev = 1.0 / (1.0 + (field.t[field.idx(qx, qy)] - t_p).abs());
            let w = (dst * lev * dir).abs();

            // first-order estimate of the filled pixel from q
            let q = out.get_pixel(qx, qy);
            let grad = image_gradient(out, field, qx, qy);
            for c in 0..3 {
                let (ix, iy) = grad[c];
                acc[c] += w * (f32::from(q[c]) + ix * rx + iy * ry);
            }
            total += w;
        }
    }

    if total <= 0.0 {
        return None;
    }

    Some(Rgb(acc.map(|v| (v / total).round().clamp(0.0, 255.0) as u8)))
}

/// Per-channel image gradient at (x, y) from neighbours that already hold
/// a value; central differences where both sides are available.
fn image_gradient(out: &RgbImage, field: &Field, x: u32, y: u32) -> [(f32, f32); 3] {
    let (xi, yi) = (i64::from(x), i64::from(y));
    let value = |x: i64, y: i64| match field.flag(x, y) {
        Some(INSIDE) | None => None,
        Some(_) => Some(out.get_pixel(x as u32, y as u32)),
    };
    let center = out.get_pixel(x, y);
    let (left, right) = (value(xi - 1, yi), value(xi + 1, yi));
    let (up, down) = (value(xi, yi - 1), value(xi, yi + 1));

    let axis = |prev: Option<&Rgb<u8>>, next: Option<&Rgb<u8>>, c: usize| match (prev, next) {
        (Some(p), Some(n)) => (f32::from(n[c]) - f32::from(p[c])) * 0.5,
        (Some(p), None) => f32::from(center[c]) - f32::from(p[c]),
        (None, Some(n)) => f32::from(n[c]) - f32::from(center[c]),
        (None, None) => 0.0,
    };

    [0, 1, 2].map(|c| (axis(left, right, c), axis(up, down, c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square_mask(width: u32, height: u32, x0: u32, y0: u32, size: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let inside = (x0..x0 + size).contains(&x) && (y0..y0 + size).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn empty_mask_is_identity() {
        let img = RgbImage::from_fn(9, 7, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 7]));
        let mask = GrayImage::new(9, 7);
        assert_eq!(inpaint_telea(&img, &mask, DEFAULT_RADIUS).unwrap(), img);
    }

    #[test]
    fn flat_colour_is_restored() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([40, 120, 200]));
        for y in 8..12 {
            for x in 8..12 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let mask = square_mask(20, 20, 8, 8, 4);

        let out = inpaint_telea(&img, &mask, DEFAULT_RADIUS).unwrap();
        assert!(out.pixels().all(|p| *p == Rgb([40, 120, 200])));
    }

    #[test]
    fn unmasked_pixels_pass_through() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 15) as u8, (y * 15) as u8, 99]));
        let mask = square_mask(16, 16, 5, 5, 6);

        let out = inpaint_telea(&img, &mask, DEFAULT_RADIUS).unwrap();
        for (x, y, m) in mask.enumerate_pixels() {
            if m[0] == 0 {
                assert_eq!(out.get_pixel(x, y), img.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn fill_stays_within_surrounding_range() {
        let img = RgbImage::from_fn(30, 10, |x, _| {
            let v = (x * 8) as u8;
            Rgb([v, v, v])
        });
        let mask = square_mask(30, 10, 12, 3, 4);

        let out = inpaint_telea(&img, &mask, DEFAULT_RADIUS).unwrap();
        for y in 3..7 {
            for x in 12..16 {
                let v = out.get_pixel(x, y)[0];
                assert!((8 * 9..=8 * 18).contains(&u32::from(v)), "pixel ({x}, {y}) = {v}");
            }
        }
    }

    #[test]
    fn linear_ramp_is_continued_across_the_hole() {
        let img = RgbImage::from_fn(30, 10, |x, y| Rgb([(x * 8) as u8, (y * 20) as u8, 50]));
        let mask = square_mask(30, 10, 12, 3, 4);

        let out = inpaint_telea(&img, &mask, DEFAULT_RADIUS).unwrap();
        for y in 3..7 {
            for x in 12..16 {
                let expected = img.get_pixel(x, y);
                let got = out.get_pixel(x, y);
                for c in 0..3 {
                    let diff = (i32::from(got[c]) - i32::from(expected[c])).abs();
                    assert!(diff <= 1, "pixel ({x}, {y}) channel {c}: {got:?} vs {expected:?}");
                }
            }
        }
    }

    #[test]
    fn fully_masked_image_is_unchanged() {
        let img = RgbImage::from_pixel(5, 5, Rgb([1, 2, 3]));
        let mask = GrayImage::from_pixel(5, 5, Luma([255]));
        assert_eq!(inpaint_telea(&img, &mask, DEFAULT_RADIUS).unwrap(), img);
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let img = RgbImage::new(4, 4);
        let mask = GrayImage::new(4, 5);
        let err = inpaint_telea(&img, &mask, DEFAULT_RADIUS).unwrap_err();
        assert_eq!(err.kind(), "inpaint");
    }
}

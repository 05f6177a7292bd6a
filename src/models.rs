use std::fmt;

/// Axis-aligned text region reported by an OCR engine, in image pixels.
///
/// Engines are not trusted to stay inside the image: origins may be negative
/// and extents may overflow. Consumers clamp before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Clip the box to `[0, width) x [0, height)`.
    ///
    /// Returns `(x, y, w, h)` in unsigned image coordinates, or `None` when
    /// nothing of the box remains inside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = i64::from(self.x).clamp(0, i64::from(width));
        let y0 = i64::from(self.y).clamp(0, i64::from(height));
        let x1 = (i64::from(self.x) + i64::from(self.width)).clamp(0, i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).clamp(0, i64::from(height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && i64::from(self.x) + i64::from(self.width) <= i64::from(width)
            && i64::from(self.y) + i64::from(self.height) <= i64::from(height)
    }
}

/// Text and layout recognised in one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    /// Full recognised text
    pub text: String,

    /// One box per layout unit, in engine traversal order
    pub boxes: Vec<BoundingBox>,
}

impl DetectionResult {
    pub fn new(text: impl Into<String>, boxes: Vec<BoundingBox>) -> Self {
        Self {
            text: text.into(),
            boxes,
        }
    }
}

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Classifier verdict for one image.
///
/// Label 1 is harmful, 0 is benign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub probability: f64,
    pub label: u8,
}

impl Classification {
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let label = u8::from(probability >= threshold);
        Self { probability, label }
    }

    pub fn is_valid(&self) -> bool {
        self.probability.is_finite() && (0.0..=1.0).contains(&self.probability)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}\t{}", self.probability, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_inner_box() {
        let b = BoundingBox::new(2, 3, 4, 5);
        assert_eq!(b.clamp_to(10, 10), Some((2, 3, 4, 5)));
        assert!(b.is_within(10, 10));
    }

    #[test]
    fn clamp_clips_negative_origin_and_overflow() {
        let b = BoundingBox::new(-3, 8, 6, 10);
        assert_eq!(b.clamp_to(10, 10), Some((0, 8, 3, 2)));
        assert!(!b.is_within(10, 10));
    }

    #[test]
    fn clamp_drops_box_outside_image() {
        assert_eq!(BoundingBox::new(12, 0, 4, 4).clamp_to(10, 10), None);
        assert_eq!(BoundingBox::new(-8, 0, 4, 4).clamp_to(10, 10), None);
        assert_eq!(BoundingBox::new(1, 1, 0, 4).clamp_to(10, 10), None);
    }

    #[test]
    fn display_uses_four_decimals_and_tab() {
        let c = Classification::from_probability(0.123456, DEFAULT_THRESHOLD);
        assert_eq!(c.to_string(), "0.1235\t0");

        let c = Classification::from_probability(0.5, DEFAULT_THRESHOLD);
        assert_eq!(c.to_string(), "0.5000\t1");
    }
}

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::models::BoundingBox;

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// Build a single-channel inpainting mask: 255 inside any box, 0 elsewhere.
///
/// Boxes are clipped to the image first; boxes with nothing left inside the
/// image are ignored.
pub fn build_mask(width: u32, height: u32, boxes: &[BoundingBox]) -> GrayImage {
    let mut mask = GrayImage::from_pixel(width, height, Luma([MASK_OFF]));

    for bbox in boxes {
        if let Some((x, y, w, h)) = bbox.clamp_to(width, height) {
            draw_filled_rect_mut(
                &mut mask,
                Rect::at(x as i32, y as i32).of_size(w, h),
                Luma([MASK_ON]),
            );
        }
    }

    mask
}

/// Number of masked pixels
pub fn masked_pixels(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != MASK_OFF).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_boxes_gives_empty_mask() {
        let mask = build_mask(7, 5, &[]);
        assert_eq!(mask.dimensions(), (7, 5));
        assert_eq!(masked_pixels(&mask), 0);
    }

    #[test]
    fn single_box_is_filled_exactly() {
        let mask = build_mask(10, 8, &[BoundingBox::new(2, 1, 3, 4)]);
        for (x, y, p) in mask.enumerate_pixels() {
            let inside = (2..5).contains(&x) && (1..5).contains(&y);
            assert_eq!(p[0], if inside { 255 } else { 0 }, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn overlapping_boxes_union() {
        let mask = build_mask(
            10,
            10,
            &[BoundingBox::new(0, 0, 4, 4), BoundingBox::new(2, 2, 4, 4)],
        );
        assert_eq!(masked_pixels(&mask), 16 + 16 - 4);
        assert_eq!(mask.get_pixel(3, 3)[0], 255);
        assert_eq!(mask.get_pixel(5, 0)[0], 0);
    }

    #[test]
    fn boxes_past_the_edge_are_clipped() {
        let mask = build_mask(
            6,
            6,
            &[
                BoundingBox::new(-2, -2, 4, 4),
                BoundingBox::new(4, 4, 100, 100),
                BoundingBox::new(50, 50, 5, 5),
            ],
        );
        assert_eq!(masked_pixels(&mask), 4 + 4);
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(5, 5)[0], 255);
        assert_eq!(mask.get_pixel(2, 2)[0], 0);
    }
}

use std::path::{Path, PathBuf};

use image::GrayImage;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Well-known location used by `MaskHandoff::Fixed` when no path is given
pub const DEFAULT_MASK_PATH: &str = "/tmp/temp_image_mask.png";

/// How the mask travels from the mask builder to the inpainter.
///
/// The round-trip is lossless, so every variant hands the inpainter the same
/// mask. `Fixed` reuses one path for every line and is only safe while lines
/// are processed one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MaskHandoff {
    /// Pass the mask in memory
    Skip,
    /// Unique temporary PNG, removed once read back
    #[default]
    Scoped,
    /// Always the same PNG path, overwritten each time
    Fixed(PathBuf),
}

impl MaskHandoff {
    /// Write the mask out as a grayscale PNG and read it back.
    pub fn round_trip(&self, mask: GrayImage) -> Result<GrayImage> {
        match self {
            MaskHandoff::Skip => Ok(mask),
            MaskHandoff::Scoped => {
                let file = tempfile::Builder::new()
                    .prefix("memeguard-mask-")
                    .suffix(".png")
                    .tempfile()?;
                // file is removed when dropped, on success and error alike
                write_and_read(file.path(), &mask)
            }
            MaskHandoff::Fixed(path) => write_and_read(path, &mask),
        }
    }
}

fn write_and_read(path: &Path, mask: &GrayImage) -> Result<GrayImage> {
    let fail = |message: String| PipelineError::MaskHandoff {
        path: path.to_path_buf(),
        message,
    };

    mask.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| fail(format!("write: {e}")))?;

    let read_back = image::open(path)
        .map_err(|e| fail(format!("read: {e}")))?
        .to_luma8();

    if read_back.dimensions() != mask.dimensions() {
        let (w, h) = read_back.dimensions();
        return Err(fail(format!(
            "read back {w}x{h}, wrote {}x{}",
            mask.width(),
            mask.height()
        )));
    }

    debug!(path = %path.display(), "mask handed off through file");
    Ok(read_back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn sample_mask() -> GrayImage {
        GrayImage::from_fn(12, 9, |x, y| Luma([if (x + y) % 3 == 0 { 255 } else { 0 }]))
    }

    #[test]
    fn scoped_round_trip_is_lossless() {
        let mask = sample_mask();
        assert_eq!(MaskHandoff::Scoped.round_trip(mask.clone()).unwrap(), mask);
    }

    #[test]
    fn fixed_path_is_overwritten_each_time() {
        let dir = tempfile::TempDir::new().unwrap();
        let handoff = MaskHandoff::Fixed(dir.path().join("mask.png"));

        let first = sample_mask();
        assert_eq!(handoff.round_trip(first).unwrap().dimensions(), (12, 9));

        let second = GrayImage::from_pixel(3, 4, Luma([255]));
        assert_eq!(handoff.round_trip(second.clone()).unwrap(), second);
        assert!(dir.path().join("mask.png").exists());
    }

    #[test]
    fn unwritable_path_is_a_handoff_error() {
        let handoff = MaskHandoff::Fixed(PathBuf::from("/nonexistent-dir/mask.png"));
        let err = handoff.round_trip(sample_mask()).unwrap_err();
        assert_eq!(err.kind(), "mask_handoff");
    }
}

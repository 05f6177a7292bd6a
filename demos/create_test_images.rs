use image::{Rgb, RgbImage};
use std::path::PathBuf;

/// Writes a few sample images for a local run:
///
///   cargo run --example create_test_images -- local_test/images
///   cargo run --bin gen_input -- --img_folder local_test/images --output_folder local_test
///   ls local_test/images/* | cargo run --bin memeguard
fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("local_test/images"));
    std::fs::create_dir_all(&out_dir)?;

    // Gradient with no text
    let mut plain = RgbImage::new(800, 600);
    for y in 0..600 {
        for x in 0..800 {
            let r = (x * 255 / 800) as u8;
            let g = (y * 255 / 600) as u8;
            plain.put_pixel(x, y, Rgb([r, g, 128]));
        }
    }
    plain.save(out_dir.join("plain.png"))?;

    // Dark background with a white caption band, meme style
    let mut captioned = RgbImage::from_pixel(640, 480, Rgb([40, 40, 60]));
    for y in 400..450 {
        for x in 60..580 {
            if (x / 12 + y / 10) % 3 != 0 {
                captioned.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }
    }
    captioned.save(out_dir.join("captioned.jpg"))?;

    std::fs::write(out_dir.join("notes.txt"), "not an image\n")?;

    println!("Created sample images in {}", out_dir.display());
    Ok(())
}

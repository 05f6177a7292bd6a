use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".bmp"];

pub const MANIFEST_NAME: &str = "stdin.csv";

/// Mount point the images are expected under inside the container
pub const DEFAULT_MOUNT_PREFIX: &str = "/images";

pub fn is_image_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// File names of the images directly inside `dir`, sorted by name.
///
/// Subdirectories are neither listed nor entered and symlinks are not
/// followed.
pub fn scan_images(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if is_image_name(&name) {
            names.push(name.into_owned());
        } else {
            debug!(name = %name, "skipping non-image entry");
        }
    }

    Ok(names)
}

/// Paths as the pipeline will see them: `prefix` joined with each file name.
pub fn mounted_paths(prefix: &Path, names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| prefix.join(name).to_string_lossy().into_owned())
        .collect()
}

/// Quote a CSV field when it holds a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `<output_dir>/stdin.csv`, one path per row, no header.
///
/// Rows end in CRLF. An existing manifest is overwritten.
pub fn write_manifest(output_dir: &Path, paths: &[String]) -> Result<PathBuf> {
    let manifest_path = output_dir.join(MANIFEST_NAME);
    let mut file = fs::File::create(&manifest_path)
        .with_context(|| format!("failed to create {}", manifest_path.display()))?;

    for path in paths {
        write!(file, "{}\r\n", csv_field(path))?;
    }
    file.flush()?;

    Ok(manifest_path)
}

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use image::RgbImage;
use tracing::{debug, warn};

use crate::detection::TextExtractor;
use crate::models::{BoundingBox, DetectionResult};

pub const DEFAULT_LANGUAGES: &str = "eng+chi_sim+chi_tra+tam+msa";

/// Single column of text of variable sizes
pub const DEFAULT_PSM: u32 = 4;

pub const DEFAULT_OEM: u32 = 1;

/// Layout level of a tesseract TSV row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum BoxLevel {
    /// Every layout unit, page included
    All,
    Block,
    Paragraph,
    Line,
    Word,
}

impl BoxLevel {
    fn accepts(self, level: u32) -> bool {
        match self {
            BoxLevel::All => true,
            BoxLevel::Block => level == 2,
            BoxLevel::Paragraph => level == 3,
            BoxLevel::Line => level == 4,
            BoxLevel::Word => level == 5,
        }
    }
}

/// Runs the `tesseract` executable and reads its TSV output.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    pub binary: PathBuf,
    pub languages: String,
    pub psm: u32,
    pub oem: u32,
    pub box_level: BoxLevel,
}

impl TesseractExtractor {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            languages: DEFAULT_LANGUAGES.to_string(),
            psm: DEFAULT_PSM,
            oem: DEFAULT_OEM,
            box_level: BoxLevel::All,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    pub fn with_psm(mut self, psm: u32) -> Self {
        self.psm = psm;
        self
    }

    pub fn with_oem(mut self, oem: u32) -> Self {
        self.oem = oem;
        self
    }

    pub fn with_box_level(mut self, box_level: BoxLevel) -> Self {
        self.box_level = box_level;
        self
    }

    fn run_tsv(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("--oem")
            .arg(self.oem.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("failed to run {} (is it installed?)", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract exited with {}: {}", output.status, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&self, image: &RgbImage) -> Result<DetectionResult> {
        let tmp = tempfile::Builder::new()
            .prefix("memeguard-ocr-")
            .suffix(".png")
            .tempfile()
            .context("failed to create temp file for OCR")?;
        image
            .save_with_format(tmp.path(), image::ImageFormat::Png)
            .context("failed to write temp image for OCR")?;

        let tsv = self.run_tsv(tmp.path())?;
        let rows = parse_tsv(&tsv)?;
        debug!(rows = rows.len(), "tesseract returned layout rows");

        let (width, height) = image.dimensions();
        let boxes: Vec<BoundingBox> = rows
            .iter()
            .filter(|row| self.box_level.accepts(row.level))
            .map(|row| row.bbox)
            .collect();

        for b in boxes.iter().filter(|b| !b.is_within(width, height)) {
            warn!(?b, width, height, "OCR box extends past the image");
        }

        Ok(DetectionResult::new(assemble_text(&rows), boxes))
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// One row of `tesseract ... tsv` output.
#[derive(Debug, Clone, PartialEq)]
pub struct TsvRow {
    pub level: u32,
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
    pub bbox: BoundingBox,
    pub conf: f32,
    pub text: String,
}

/// Parse tesseract TSV output, keeping every layout level in output order.
pub fn parse_tsv(tsv: &str) -> Result<Vec<TsvRow>> {
    let mut rows = Vec::new();

    for (idx, raw) in tsv.lines().enumerate() {
        if idx == 0 && raw.starts_with("level") {
            continue;
        }
        if raw.trim().is_empty() {
            continue;
        }

        let cols: Vec<&str> = raw.split('\t').collect();
        if cols.len() < 11 {
            return Err(anyhow!("malformed TSV row {}: {:?}", idx + 1, raw));
        }

        let int = |i: usize| -> Result<i64> {
            cols[i]
                .trim()
                .parse::<i64>()
                .with_context(|| format!("bad integer in TSV row {} column {}", idx + 1, i + 1))
        };

        let width = int(8)?.max(0) as u32;
        let height = int(9)?.max(0) as u32;
        rows.push(TsvRow {
            level: int(0)? as u32,
            block: int(2)? as u32,
            paragraph: int(3)? as u32,
            line: int(4)? as u32,
            bbox: BoundingBox::new(int(6)? as i32, int(7)? as i32, width, height),
            conf: cols[10].trim().parse::<f32>().unwrap_or(-1.0),
            text: cols.get(11).map(|t| t.to_string()).unwrap_or_default(),
        });
    }

    Ok(rows)
}

/// Rebuild plain text from word rows: words joined by spaces, lines by
/// newlines, a blank line between paragraphs.
pub fn assemble_text(rows: &[TsvRow]) -> String {
    let mut text = String::new();
    let mut current: Option<(u32, u32, u32)> = None;

    for row in rows.iter().filter(|r| r.level == 5) {
        let word = row.text.trim();
        if word.is_empty() {
            continue;
        }

        let key = (row.block, row.paragraph, row.line);
        match current {
            Some(prev) if prev == key => text.push(' '),
            Some((block, paragraph, _)) => {
                text.push('\n');
                if (block, paragraph) != (key.0, key.1) {
                    text.push('\n');
                }
            }
            None => {}
        }
        text.push_str(word);
        current = Some(key);
    }

    if !text.is_empty() {
        text.push('\n');
    }
    text
}

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use memeguard::detection::{ocr, tesseract};
use memeguard::inpaint::handoff::DEFAULT_MASK_PATH;
use memeguard::inpaint::telea::DEFAULT_RADIUS;
use memeguard::models::DEFAULT_THRESHOLD;
use memeguard::{
    BoxLevel, Classifier, MaskHandoff, OcrsExtractor, Pipeline, RandomClassifier,
    TesseractExtractor, TextExtractor,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Engine {
    /// tesseract executable, multi-language
    Tesseract,
    /// pure-Rust ocrs models
    Ocrs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Handoff {
    /// Unique temporary file per image
    Scoped,
    /// One well-known file, overwritten per image
    Fixed,
    /// Keep the mask in memory
    Skip,
}

/// Read image paths from stdin, one per line, and print
/// `probability<TAB>label` for each.
#[derive(Parser)]
#[command(name = "memeguard")]
#[command(about = "Strip text from images and classify them as harmful or benign")]
struct Cli {
    /// Text extraction engine
    #[arg(long, value_enum, default_value_t = Engine::Tesseract)]
    engine: Engine,

    /// Tesseract languages, '+' separated
    #[arg(long, default_value = tesseract::DEFAULT_LANGUAGES)]
    languages: String,

    /// Tesseract page segmentation mode
    #[arg(long, default_value_t = tesseract::DEFAULT_PSM)]
    psm: u32,

    /// Tesseract OCR engine mode
    #[arg(long, default_value_t = tesseract::DEFAULT_OEM)]
    oem: u32,

    /// Path to the tesseract executable
    #[arg(long, env = "MEMEGUARD_TESSERACT", default_value = "tesseract")]
    tesseract_bin: PathBuf,

    /// Which tesseract layout units become mask boxes
    #[arg(long, value_enum, default_value_t = BoxLevel::All)]
    box_level: BoxLevel,

    /// Directory holding the ocrs detection and recognition models
    #[arg(long, env = "MEMEGUARD_OCRS_MODELS", value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Inpainting radius in pixels
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    radius: u32,

    /// Probability at or above which an image is labelled 1
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Seed the placeholder classifier for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// How the mask is passed to the inpainter
    #[arg(long, value_enum, default_value_t = Handoff::Scoped)]
    mask_handoff: Handoff,

    /// File used by `--mask-handoff fixed`
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MASK_PATH)]
    mask_path: PathBuf,

    /// Save per-image debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    memeguard::init_tracing(args.verbose);

    let extractor: Box<dyn TextExtractor> = match args.engine {
        Engine::Tesseract => Box::new(
            TesseractExtractor::new()
                .with_binary(args.tesseract_bin)
                .with_languages(args.languages)
                .with_psm(args.psm)
                .with_oem(args.oem)
                .with_box_level(args.box_level),
        ),
        Engine::Ocrs => {
            let model_dir = match args.model_dir {
                Some(dir) => dir,
                None => ocr::default_model_dir()?,
            };
            Box::new(OcrsExtractor::new(model_dir))
        }
    };

    let classifier: Box<dyn Classifier> = Box::new(
        match args.seed {
            Some(seed) => RandomClassifier::seeded(seed),
            None => RandomClassifier::new(),
        }
        .with_threshold(args.threshold),
    );

    let handoff = match args.mask_handoff {
        Handoff::Scoped => MaskHandoff::Scoped,
        Handoff::Fixed => MaskHandoff::Fixed(args.mask_path),
        Handoff::Skip => MaskHandoff::Skip,
    };

    let mut pipeline = Pipeline::new()
        .with_extractor(extractor)
        .with_classifier(classifier)
        .with_radius(args.radius)
        .with_handoff(handoff);

    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();
    pipeline.run(stdin, &mut stdout, &mut stderr)?;

    Ok(())
}

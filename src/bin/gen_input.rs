use clap::Parser;
use std::path::PathBuf;

use memeguard::manifest::{self, DEFAULT_MOUNT_PREFIX, MANIFEST_NAME};

/// Scan a folder for images and create a CSV file with their file paths.
#[derive(Parser)]
#[command(name = "gen_input")]
struct Cli {
    /// Path to the folder containing images.
    #[arg(long = "img_folder", value_name = "DIR")]
    img_folder: PathBuf,

    /// Path to the folder to store your generated stdin
    #[arg(long = "output_folder", value_name = "DIR", default_value = "../local_test/test_stdin/")]
    output_folder: PathBuf,

    /// Folder the images are mounted under when the pipeline runs
    #[arg(long = "mount_prefix", value_name = "DIR", default_value = DEFAULT_MOUNT_PREFIX)]
    mount_prefix: PathBuf,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    memeguard::init_tracing(args.verbose);

    let names = manifest::scan_images(&args.img_folder)?;
    let paths = manifest::mounted_paths(&args.mount_prefix, &names);
    println!("{paths:?}");

    let written = manifest::write_manifest(&args.output_folder, &paths)?;
    tracing::info!(rows = paths.len(), path = %written.display(), "manifest written");
    println!("CSV file '{MANIFEST_NAME}' created successfully.");

    Ok(())
}

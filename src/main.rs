use clap::{Parser, Subcommand};
use photofit::{config, output, process};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "photofit")]
#[command(about = "Crop, resize and compress a photo to a fixed size and byte budget")]
#[command(long_about = "\
Crop, resize and compress a photo to a fixed size and byte budget

The source is cropped to its centred square, scaled to the crop size
(inches x dpi), resampled to exactly WIDTHxHEIGHT, then encoded as JPEG or
PNG at the best fidelity that fits under the size limit.

Search order:
  JPEG: quality 95 → 15 at full size, then quality x scale (0.9 → 0.5)
  PNG:  lossless, then a 256-colour palette, then scale (0.9 → 0.5)

If nothing fits, the smallest candidate is written and a warning printed.

Run 'photofit gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Log every encode attempt
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Per-run overrides of the config's `[output]` section.
#[derive(clap::Args)]
struct ProcessArgs {
    /// Source image (any format the decoder recognises)
    input: PathBuf,

    /// Output path [default: <stem>-processed.<ext> next to the input]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Side of the centred square crop, in inches (0.5-10)
    #[arg(long)]
    crop_inches: Option<f64>,

    /// Dots per inch for the crop (72-600)
    #[arg(long)]
    dpi: Option<u32>,

    /// Final width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Final height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Maximum output size in MB (0.1-10)
    #[arg(long)]
    max_size_mb: Option<f64>,

    /// Output format: jpg or png
    #[arg(long)]
    format: Option<String>,

    /// Config file layered over the stock defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON report instead of the text summary
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Crop, resample and encode one image within the size limit
    Process(ProcessArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Process(args) => run_process(args)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run_process(args: ProcessArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = config::load_config(args.config.as_deref())?;
    apply_overrides(&mut cfg.output, &args);

    let req = process::ProcessRequest::from_output_config(&cfg.output)?;
    let result = process::process_file(&args.input, &req, &cfg.compression)?;

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input, req.codec.extension()));
    std::fs::write(&output_path, &result.encoded_bytes)?;

    if args.json {
        let report = result.report(req.codec, req.max_bytes());
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_result(&result, &args.input, &output_path);
    }
    Ok(())
}

fn apply_overrides(out: &mut config::OutputConfig, args: &ProcessArgs) {
    if let Some(v) = args.crop_inches {
        out.crop_inches = v;
    }
    if let Some(v) = args.dpi {
        out.dpi = v;
    }
    if let Some(v) = args.width {
        out.width = v;
    }
    if let Some(v) = args.height {
        out.height = v;
    }
    if let Some(v) = args.max_size_mb {
        out.max_file_size_mb = v;
    }
    if let Some(v) = &args.format {
        out.format = v.clone();
    }
}

/// `photos/me.heic` → `photos/me-processed.jpg`
fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}-processed.{extension}"))
}

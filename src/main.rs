use clap::{Parser, Subcommand};
use simple_imgconv::archive::ZipBuilder;
use simple_imgconv::batch::{Batch, BatchRunner};
use simple_imgconv::config::{self, Config, ConversionOverrides};
use simple_imgconv::format::OutputFormat;
use simple_imgconv::imaging::{HeifTranscoder, PdfPacker, RustBackend};
use simple_imgconv::pipeline::Pipeline;
use simple_imgconv::{deliver, output, source};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// Conversion options. Unset flags fall back to `config.toml`.
#[derive(clap::Args, Clone)]
struct ConvertArgs {
    /// Files to convert
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Target format (jpeg, png, gif, webp, avif, pdf, ico)
    #[arg(long, short)]
    format: Option<OutputFormat>,

    /// Quality for lossy formats, 1-100
    #[arg(long, short)]
    quality: Option<u32>,

    /// Longer-edge bound, combined with --max-height (the larger wins)
    #[arg(long)]
    max_width: Option<u32>,

    /// Longer-edge bound, combined with --max-width (the larger wins)
    #[arg(long)]
    max_height: Option<u32>,

    /// Do not ask the codec to keep the aspect ratio
    #[arg(long)]
    no_aspect_ratio: bool,

    /// Ask the codec to drop source metadata
    #[arg(long)]
    strip_metadata: bool,

    /// Print a JSON report instead of progress lines
    #[arg(long)]
    json: bool,
}

impl ConvertArgs {
    fn overrides(&self) -> ConversionOverrides {
        ConversionOverrides {
            format: self.format,
            quality: self.quality,
            max_width: self.max_width,
            max_height: self.max_height,
            no_aspect_ratio: self.no_aspect_ratio,
            strip_metadata: self.strip_metadata,
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-imgconv")]
#[command(about = "Batch image converter: many formats in, one file or one zip out")]
#[command(long_about = "\
Batch image converter: many formats in, one file or one zip out

Every file in a batch gets the same options. Files are converted one after
another; a file that fails is reported and the rest carry on.

Inputs:   JPEG, PNG, GIF, WebP, HEIC/HEIF, BMP, TIFF (25 MB max each)
Outputs:  JPEG, PNG, GIF, WebP, AVIF, PDF (one A4 page per image), ICO

Delivery:
  one file converted   → <output>/<name>_converted.<ext>
  several converted    → <output>/converted_images.zip
  nothing converted    → nothing written

Run 'simple-imgconv gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Output directory (overrides [output] dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file (default: ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert files and write the result
    Convert(ConvertArgs),
    /// Report which files would be accepted, without converting
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List supported input and output formats
    Formats,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Convert(args) => {
            let config = load_config(cli.config.as_deref())?;
            let output_dir = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output.dir));
            convert(args, &config, &output_dir)?;
        }
        Command::Check { files } => {
            let (accepted, rejections) = source::accept_all(files);
            output::print_check(&accepted, &rejections);
        }
        Command::Formats => output::print_formats(),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn convert(
    args: &ConvertArgs,
    config: &Config,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = config.conversion.with_overrides(&args.overrides())?.to_request();
    init_thread_pool(&config.processing);

    let (accepted, rejections) = source::accept_all(&args.files);
    if !args.json && !rejections.is_empty() {
        output::print_rejections(&rejections);
        println!();
    }

    let mut batch = Batch::new();
    batch.extend(accepted);

    let codec = RustBackend::new();
    let heic = HeifTranscoder::new();
    let packer = PdfPacker::new();
    let archiver = ZipBuilder::new();
    let pipeline = Pipeline::new(&codec, &heic, &packer);

    let (tx, rx) = std::sync::mpsc::channel();
    let quiet = args.json;
    let printer = std::thread::spawn(move || {
        for event in rx {
            if quiet {
                continue;
            }
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = BatchRunner::new(&pipeline, &archiver)
        .with_events(tx)
        .run(&mut batch, &request);
    printer.join().map_err(|_| "progress printer panicked")?;
    let result = result?;

    let delivery = deliver::deliver(&result, output_dir)?;
    if args.json {
        let report = output::RunReport::new(batch.summary(), delivery.as_ref(), &rejections);
        println!("{}", output::format_json_report(&report)?);
    } else {
        output::print_delivery(&result, delivery.as_ref());
    }
    Ok(())
}

/// Load `--config FILE` if given, else `./config.toml` when present, else defaults.
fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Log to stderr so stdout stays clean for results and `--json`.
fn init_tracing(verbose: bool) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "simple_imgconv=debug".to_string()
        } else {
            "simple_imgconv=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

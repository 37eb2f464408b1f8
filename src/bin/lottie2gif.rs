use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use lottiegif::{Converter, ConvertOptions, Rgba8};

/// Convert a Lottie animation into a looping transparent GIF.
#[derive(Parser, Debug)]
#[command(name = "lottie2gif", version)]
struct Cli {
    /// Input Lottie JSON.
    input: PathBuf,

    /// Output GIF path.
    output: PathBuf,

    /// NeuQuant sample factor (1 = best colors, 30 = fastest).
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=30))]
    quality: u8,

    /// Pixels with alpha at or below this become transparent.
    #[arg(long, default_value_t = 127)]
    alpha_threshold: u8,

    /// Flatten frames over the background instead of keeping transparency.
    #[arg(long, default_value_t = false)]
    opaque: bool,

    /// Background for --opaque, as #rrggbb or #rrggbbaa.
    #[arg(long, default_value = "#ffffff", value_parser = parse_color)]
    background: Rgba8,

    /// Maximum wait for one frame from the rendering environment.
    #[arg(long, default_value_t = 10_000)]
    render_timeout_ms: u64,

    /// Skip loading system fonts.
    #[arg(long, default_value_t = false)]
    no_system_fonts: bool,
}

fn parse_color(s: &str) -> Result<Rgba8, String> {
    Rgba8::from_hex(s).map_err(|e| e.to_string())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match convert(cli) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn convert(cli: Cli) -> anyhow::Result<PathBuf> {
    let options = ConvertOptions {
        quality: cli.quality,
        alpha_threshold: cli.alpha_threshold,
        transparency: !cli.opaque,
        background: cli.background,
        render_timeout_ms: cli.render_timeout_ms,
        load_system_fonts: !cli.no_system_fonts,
        staging_root: None,
    };

    let mut converter = Converter::new(options);
    let report = converter
        .run(&cli.input, &cli.output)
        .with_context(|| format!("convert '{}'", cli.input.display()))?;

    tracing::info!(
        frames = report.stream.frame_count,
        width = report.stream.width,
        height = report.stream.height,
        delay_ms = report.stream.delay_ms,
        "done"
    );
    Ok(report.output_path().unwrap_or(&cli.output).to_path_buf())
}

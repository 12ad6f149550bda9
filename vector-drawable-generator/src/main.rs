use anyhow::{Context, Result};
use clap::Parser;
use icon_kit::converter::DEFAULT_CONVERTER;
use icon_kit::logging::init_tracing;
use icon_kit::{run_vector_job, CancelFlag, Color, ExternalConverter, IconError, TargetSize, VectorJob};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// 128 + SIGINT, what shells report for an interrupted command
const INTERRUPTED_EXIT: u8 = 130;

/// Convert a raster image into an Android Vector Drawable.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Source image
    input: PathBuf,
    /// Vector Drawable XML to write
    output: PathBuf,
    /// WIDTHxHEIGHT, or `banner` (320x180) / `icon` (108x108) with a usage comment
    #[arg(long)]
    size: Option<String>,
    /// Keep the traced SVG next to the output
    #[arg(long)]
    svg: bool,
    /// Flatten onto this color before tracing instead of keeping transparency
    #[arg(long, value_parser = parse_color)]
    background: Option<Color>,
    /// SVG to Vector Drawable converter, called as `<converter> -i IN.svg -o OUT.xml`
    #[arg(long, env = "VD_CONVERTER", default_value = DEFAULT_CONVERTER)]
    converter: PathBuf,
    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_color(value: &str) -> Result<Color, String> {
    Color::parse(value).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancelFlag::default();
    if let Err(err) = install_signal_handler(cancel.clone()) {
        eprintln!("vector-drawable-generator: {:#}", err);
        return ExitCode::FAILURE;
    }

    match run(&cli, cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vector-drawable-generator: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

/// First SIGINT/SIGTERM asks the pipeline to stop so its working directory is
/// dropped on the way out; a second one exits immediately.
fn install_signal_handler(cancel: CancelFlag) -> Result<()> {
    ctrlc::set_handler(move || on_signal(&cancel)).context("Failed to install signal handler")
}

fn on_signal(cancel: &CancelFlag) {
    if cancel.is_cancelled() {
        std::process::exit(i32::from(INTERRUPTED_EXIT));
    }
    warn!("Interrupted, cleaning up");
    cancel.cancel();
}

fn run(cli: &Cli, cancel: CancelFlag) -> Result<()> {
    // Preconditions before any work: converter present, size well formed
    let converter = ExternalConverter::locate(&cli.converter)?.with_cancel(cancel.clone());
    let size = cli.size.as_deref().map(TargetSize::parse).transpose()?;

    let job = VectorJob {
        size,
        keep_svg: cli.svg,
        background: cli.background,
        cancel,
        ..VectorJob::new(cli.input.clone(), cli.output.clone())
    };

    let report = run_vector_job(&job, &converter)?;
    if report.inverted {
        info!("Dark source was traced inverted and its black fills restored to white");
    }
    println!("{}", report.output.display());

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match IconError::find(err) {
        Some(IconError::Usage(_)) => 2,
        Some(IconError::Interrupted) => INTERRUPTED_EXIT,
        _ => 1,
    }
}

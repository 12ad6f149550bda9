use anyhow::Result;
use clap::Parser;
use icon_kit::logging::init_tracing;
use icon_kit::{generate_icon_set, Color, IconError, IconSetOptions, ScalePercent};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// Generate the Fire TV banner (320x180) and launcher (108x108) PNGs from one image.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Extra scale after fitting: a percent (120) or a multiplier (1.2)
    #[arg(long, default_value = "100", value_parser = parse_scale)]
    scale: ScalePercent,
    /// Vertical shift in pixels, positive moves down
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    vshift: i32,
    /// Horizontal shift in pixels, positive moves right
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    hshift: i32,
    /// Canvas color (#RGB, #RRGGBB, #RRGGBBAA, r,g,b or a name); inferred from the top-left pixel by default
    #[arg(long, value_parser = parse_color)]
    background: Option<Color>,
    /// Print the generated files as JSON on stdout
    #[arg(long)]
    json: bool,
    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
    /// Source image
    input: PathBuf,
    /// Directory receiving banner_320x180.png and launcher_108x108.png
    output_dir: PathBuf,
}

fn parse_scale(value: &str) -> Result<ScalePercent, String> {
    ScalePercent::parse(value).map_err(|e| e.to_string())
}

fn parse_color(value: &str) -> Result<Color, String> {
    Color::parse(value).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("iconset-generator: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let opts = IconSetOptions {
        scale: cli.scale,
        h_shift: cli.hshift,
        v_shift: cli.vshift,
        background: cli.background,
    };
    debug!("Icon set options: {:?}", opts);

    let generated = generate_icon_set(&cli.input, &cli.output_dir, &opts)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&generated)?);
    } else {
        for icon in &generated {
            println!("{}", icon.path.display());
        }
    }

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match IconError::find(err) {
        Some(IconError::Usage(_)) | Some(IconError::InvalidSize(_)) => 2,
        Some(IconError::InputNotFound(_)) => 3,
        Some(IconError::ToolMissing(_)) => 4,
        Some(IconError::Interrupted) => 130,
        Some(IconError::TraceFailure(_)) | None => 1,
    }
}

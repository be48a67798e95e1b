use anyhow::{Context, Result, bail};
use clap::Parser;
use console::style;
use log::{info, warn};
use std::path::PathBuf;
use video_sheet::component::ContactSheetGenerator;
use video_sheet::component::contact_sheet::find_system_font;
use video_sheet::config::{FontSpec, GeneratorSettings, OutputFormat, Rgba, SheetProperty};
use video_sheet::init;
use video_sheet::signal::setup_shutdown_signal;

const CLI_AFTER_HELP: &str = "Examples:\n  video_sheet movie.mp4 --count 20\n  video_sheet ./videos --output ./sheets --interval 60 --columns 4 --parallel\n  video_sheet movie.mkv --start 60 --end 600 --font /usr/share/fonts/TTF/DejaVuSans.ttf --format jpg\n  video_sheet movie.mp4 --set timestamp=false --set background_colour=202020ff";

#[derive(Debug, Parser)]
#[command(
    name = "video_sheet",
    version,
    about = "Generate contact-sheet images (thumbnail grid + header) for video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Video file or directory to scan for videos.
    #[arg(required_unless_present = "dump_settings")]
    input: Option<PathBuf>,

    /// Output directory (defaults to each video's directory).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sample every N seconds.
    #[arg(long, conflicts_with = "count")]
    interval: Option<f64>,

    /// Number of evenly spaced thumbnails, endpoints included (at least 2).
    #[arg(long)]
    count: Option<usize>,

    /// Trim window start in seconds.
    #[arg(long)]
    start: Option<f64>,

    /// Trim window end in seconds.
    #[arg(long)]
    end: Option<f64>,

    /// TrueType/OpenType font used for the header and timestamps.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Font size in pixels.
    #[arg(long)]
    font_size: Option<f32>,

    /// Number of grid columns.
    #[arg(long)]
    columns: Option<u32>,

    /// Header height in pixels.
    #[arg(long)]
    header_size: Option<u32>,

    /// Maximum thumbnail bounding box, e.g. 320x180.
    #[arg(long, value_parser = parse_size)]
    max_thumb: Option<(u32, u32)>,

    /// Header background colour (RRGGBB or RRGGBBAA).
    #[arg(long)]
    background: Option<Rgba>,

    /// Text colour (RRGGBB or RRGGBBAA).
    #[arg(long)]
    text_colour: Option<Rgba>,

    /// Do not stamp the sample time on each thumbnail.
    #[arg(long)]
    no_timestamp: bool,

    /// Extract frames in parallel.
    #[arg(long)]
    parallel: bool,

    /// Settings file (defaults to ./settings.json when present).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output image format (png, jpg).
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Set a sheet property by name, value parsed as JSON (repeatable).
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Path to the ffmpeg binary.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Overwrite existing sheets.
    #[arg(long)]
    overwrite: bool,

    /// Print the effective settings as JSON and exit.
    #[arg(long)]
    dump_settings: bool,

    /// Show debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("尺寸格式應為 WxH: {value}"))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("寬度錯誤: {e}"))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("高度錯誤: {e}"))?;
    Ok((width, height))
}

fn build_settings(cli: &Cli) -> Result<GeneratorSettings> {
    let mut settings = GeneratorSettings::load(cli.settings.as_deref())?;

    if let Some(interval) = cli.interval {
        settings.interval = Some(interval);
        settings.count = None;
    }
    if let Some(count) = cli.count {
        settings.count = Some(count);
        settings.interval = None;
    }
    if cli.start.is_some() {
        settings.start = cli.start;
    }
    if cli.end.is_some() {
        settings.end = cli.end;
    }
    if cli.parallel {
        settings.parallel = true;
    }
    if let Some(format) = cli.format {
        settings.format = format;
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        settings.ffmpeg.clone_from(ffmpeg);
    }

    let style = &mut settings.style;
    if cli.font.is_some() || cli.font_size.is_some() {
        let font = FontSpec {
            path: cli.font.clone().or_else(|| style.font.path.clone()),
            size: cli.font_size.unwrap_or(style.font.size),
        };
        style.apply(SheetProperty::Font(font))?;
    }
    if let Some(colour) = cli.background {
        style.apply(SheetProperty::BackgroundColour(colour))?;
    }
    if let Some(colour) = cli.text_colour {
        style.apply(SheetProperty::TextColour(colour))?;
    }
    if let Some(size) = cli.header_size {
        style.apply(SheetProperty::HeaderSize(size))?;
    }
    if let Some(columns) = cli.columns {
        style.apply(SheetProperty::GridColumn(columns))?;
    }
    if let Some((width, height)) = cli.max_thumb {
        style.apply(SheetProperty::MaxThumbSize(width, height))?;
    }
    if cli.no_timestamp {
        style.apply(SheetProperty::Timestamp(false))?;
    }
    for assignment in &cli.set {
        style.apply(SheetProperty::parse_assignment(assignment)?)?;
    }

    if style.font.path.is_none() {
        match find_system_font() {
            Some(path) => {
                info!("使用系統字型: {}", path.display());
                style.font.path = Some(path);
            }
            None => warn!("找不到可用字型，預覽圖將不含文字（請使用 --font 指定）"),
        }
    }

    Ok(settings)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init::init(if cli.verbose { "debug" } else { "info" });

    let settings = build_settings(&cli)?;

    if cli.dump_settings {
        println!("{}", settings.to_json()?);
        return Ok(());
    }

    let input = cli.input.context("缺少輸入路徑")?;
    let shutdown_signal = setup_shutdown_signal()?;

    let generator = ContactSheetGenerator::new(settings, shutdown_signal)
        .with_output_dir(cli.output)
        .with_overwrite(cli.overwrite);

    let result = generator.run(&input)?;
    if result.failed > 0 {
        eprintln!(
            "{} {} 個影片處理失敗",
            style("錯誤:").red().bold(),
            result.failed
        );
        bail!("{} 個影片處理失敗", result.failed);
    }

    Ok(())
}

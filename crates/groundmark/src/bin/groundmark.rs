//! groundmark CLI: localize image files and inspect the lookup tables.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use groundmark::board::{format_grid_key, format_yellow_key, IdentityTables};
use groundmark::image_io::{load_rgb, rgb_view};
use groundmark::{FrameReport, Localizer, LocalizerConfig, VisualizationMode};
use log::LevelFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "groundmark")]
#[command(about = "Estimate camera position, height and yaw from colored ground markers")]
#[command(version)]
struct Args {
    /// Image files, processed in order as consecutive frames.
    images: Vec<PathBuf>,

    /// Device id selecting the screen profile.
    #[arg(long, default_value_t = 2)]
    device: u8,

    /// Optional JSON LocalizerConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the per-frame reports as a JSON array.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Debug planes to render for every frame.
    #[arg(long, value_enum)]
    visualization: Option<VisArg>,

    /// Draw polygons and corners on the debug image.
    #[arg(long)]
    show_contours: bool,

    /// Directory for debug images (`<stem>_debug.png`).
    #[arg(long, default_value = ".")]
    debug_dir: PathBuf,

    /// Write the effective config as JSON and continue.
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Print the non-empty lookup-table slots and exit.
    #[arg(long)]
    dump_tables: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VisArg {
    Rgb,
    Black,
    Yellow,
}

impl From<VisArg> for VisualizationMode {
    fn from(v: VisArg) -> Self {
        match v {
            VisArg::Rgb => VisualizationMode::Rgb,
            VisArg::Black => VisualizationMode::Black,
            VisArg::Yellow => VisualizationMode::Yellow,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    #[cfg(feature = "tracing")]
    groundmark::core::init_tracing(level, false);
    #[cfg(not(feature = "tracing"))]
    {
        let _ = groundmark::core::init_with_level(level);
    }
}

fn dump_tables() {
    let tables = IdentityTables::shared();
    println!("# grid pairs");
    for (key, (a, b)) in tables.grid_entries() {
        println!("{} -> ({a}, {b})", format_grid_key(key));
    }
    println!("# yellow pairs");
    for (key, (a, b)) in tables.yellow_entries() {
        println!("{} -> ({a}, {b})", format_yellow_key(key));
    }
}

fn frame_line(path: &Path, report: &FrameReport) -> String {
    match (&report.pose, &report.error) {
        (Some(p), _) => format!(
            "{}\t{:.3}\t{:.3}\t{:.3}\t{:.1}",
            path.display(),
            p.x,
            p.y,
            p.height,
            p.yaw_degrees()
        ),
        (None, err) => format!(
            "{}\tunknown\t{}",
            path.display(),
            err.as_deref().unwrap_or("no pose")
        ),
    }
}

fn debug_image_path(dir: &Path, image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    dir.join(format!("{stem}_debug.png"))
}

fn run(args: Args) -> CliResult<()> {
    if args.dump_tables {
        dump_tables();
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => LocalizerConfig::load_json(path)?,
        None => LocalizerConfig::default(),
    };
    if let Some(v) = args.visualization {
        config.mode.visualization = v.into();
    }
    config.mode.show_contours |= args.show_contours;
    if let Some(path) = &args.write_config {
        config.write_json(path)?;
        log::info!("wrote config to {}", path.display());
    }
    if args.images.is_empty() {
        if args.write_config.is_some() {
            return Ok(());
        }
        return Err("no input images (see --help)".into());
    }

    let mut localizer = Localizer::new(config)?;
    let mut reports = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let img = load_rgb(path)?;
        let report = localizer.localize_with_report(&rgb_view(&img), args.device);
        println!("{}", frame_line(path, &report));

        if let Some(vis) = localizer.visualization() {
            let out = debug_image_path(&args.debug_dir, path);
            vis.save(&out)?;
            log::info!("wrote debug image {}", out.display());
        }
        reports.push(report);
    }

    if let Some(path) = &args.report {
        fs::write(path, serde_json::to_string_pretty(&reports)?)?;
        log::info!("wrote {} reports to {}", reports.len(), path.display());
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

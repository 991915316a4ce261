//! SurveyGrid CLI - grid geotagged survey readings

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use surveygrid_colormap::{PaletteType, Spectrum};
use surveygrid_core::{
    FileKey, GeoBounds, GriddingParams, InterpolationMethod, PostProcessingFlags, Range,
    SurveyFile,
};
use surveygrid_engine::{
    EngineConfig, GriddingFilter, GriddingResult, RecomputeCoordinator, RenderedGrid,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "surveygrid")]
#[command(author, version, about = "Grid geotagged survey readings", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a survey file
    Info {
        /// Input survey file (JSON)
        input: PathBuf,
    },
    /// Grid one series of one or more survey files
    Grid {
        /// Input survey files (JSON)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        gridding: GriddingArgs,
        #[command(flatten)]
        display: DisplayArgs,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Also write RGBA pixels (northmost row first) next to each grid
        #[arg(long)]
        rgba: bool,
    },
    /// Print the value histogram of a gridded series
    Histogram {
        /// Input survey file (JSON)
        input: PathBuf,
        #[command(flatten)]
        gridding: GriddingArgs,
        #[command(flatten)]
        display: DisplayArgs,
        /// Number of bars; defaults to the configured value
        #[arg(short, long)]
        bars: Option<usize>,
        /// Width of the longest bar in characters
        #[arg(long, default_value = "60")]
        width: usize,
    },
    /// Print the effective engine configuration as TOML
    Config,
}

#[derive(clap::Args)]
struct GriddingArgs {
    /// Series to grid
    #[arg(short, long)]
    series: String,
    /// Cell size in metres
    #[arg(long, default_value = "10")]
    cell_size: f64,
    /// Blanking distance in metres
    #[arg(long, default_value = "50")]
    blanking: f64,
    /// Interpolation method: splines, idw
    #[arg(short, long, default_value = "splines")]
    method: InterpolationMethod,
}

#[derive(clap::Args)]
struct DisplayArgs {
    /// Smooth the grid before display
    #[arg(long)]
    smooth: bool,
    /// Shade by slope illumination
    #[arg(long)]
    hillshade: bool,
    /// Show the analytic signal instead of the values
    #[arg(long)]
    analytic: bool,
    /// Display range minimum; needs --max
    #[arg(long, requires = "max", allow_hyphen_values = true)]
    min: Option<f64>,
    /// Display range maximum; needs --min
    #[arg(long, requires = "min", allow_hyphen_values = true)]
    max: Option<f64>,
    /// Palette type: linear, gaussian, quantile
    #[arg(long)]
    palette: Option<String>,
    /// Colour spectrum, e.g. hue, rainbow, thermal
    #[arg(long)]
    spectrum: Option<Spectrum>,
}

impl DisplayArgs {
    fn range(&self) -> Result<Option<Range>> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                let range = Range::new(min, max);
                if !range.is_finite() {
                    bail!("Display range must be finite, got {}", range);
                }
                Ok(Some(range))
            }
            _ => Ok(None),
        }
    }

    fn filter(&self, config: &EngineConfig) -> Result<GriddingFilter> {
        let palette = match self.palette.as_deref() {
            None => config.palette,
            Some(p) => parse_palette(p)?,
        };
        let flags = PostProcessingFlags::new(self.analytic, self.hillshade, self.smooth);
        Ok(GriddingFilter::new(flags, self.range()?)
            .with_palette(palette, self.spectrum.unwrap_or(config.spectrum)))
    }
}

// ─── Output ─────────────────────────────────────────────────────────────

/// Grid file contents. `values` is row-major, northmost row first; no-data
/// cells are `null`.
#[derive(Serialize)]
struct GridOutput<'a> {
    file: String,
    series: &'a str,
    params: &'a GriddingParams,
    width: usize,
    height: usize,
    cell_width: f64,
    cell_height: f64,
    bounds: &'a GeoBounds,
    range: Range,
    filter: &'a GriddingFilter,
    values: Vec<Vec<Option<f64>>>,
}

impl<'a> GridOutput<'a> {
    fn new(result: &'a GriddingResult, rendered: &'a RenderedGrid) -> Self {
        let grid = rendered.values();
        let (width, height) = grid.shape();
        let (cell_width, cell_height) = result.cell_size();
        let values = (0..height)
            .rev()
            .map(|y| {
                (0..width)
                    .map(|x| Some(grid.data()[[x, y]]).filter(|v| v.is_finite()))
                    .collect()
            })
            .collect();
        Self {
            file: result.file_key().to_string(),
            series: result.series_name(),
            params: result.params(),
            width,
            height,
            cell_width,
            cell_height,
            bounds: grid.bounds(),
            range: rendered.range(),
            filter: rendered.filter(),
            values,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn progress(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn read_survey(path: &Path) -> Result<SurveyFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read survey: {}", path.display()))?;
    let mut file: SurveyFile = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse survey: {}", path.display()))?;
    file.set_path(path);
    Ok(file)
}

fn parse_palette(s: &str) -> Result<PaletteType> {
    match s.to_ascii_lowercase().as_str() {
        "linear" => Ok(PaletteType::Linear),
        "gaussian" => Ok(PaletteType::Gaussian),
        "quantile" => Ok(PaletteType::Quantile),
        _ => bail!("Unknown palette type: {} (expected linear, gaussian or quantile)", s),
    }
}

fn output_stem(key: &FileKey, series: &str) -> String {
    let stem = key
        .path()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grid".to_string());
    format!("{}.{}", stem, series)
}

/// Open `inputs`, grid them and wait for every job. Returns the keys that
/// produced a result.
fn grid_files(
    coordinator: &mut RecomputeCoordinator,
    inputs: &[PathBuf],
    gridding: &GriddingArgs,
    display: &DisplayArgs,
) -> Result<Vec<FileKey>> {
    let params = GriddingParams::new(gridding.cell_size, gridding.blanking, gridding.method)?;
    let filter = display.filter(coordinator.config())?;

    let pb = spinner("Reading surveys...")?;
    let mut keys = Vec::with_capacity(inputs.len());
    for path in inputs {
        let key = coordinator.open_file(Arc::new(read_survey(path)?));
        coordinator.set_filter(&key, &gridding.series, filter)?;
        keys.push(key);
    }
    pb.finish_and_clear();

    let handles = coordinator.run_gridding(&keys, &gridding.series, params, display.range()?)?;
    let pb = progress(handles.len())?;
    for handle in handles {
        pb.set_message(handle.file().to_string());
        let key = handle.file().clone();
        if let Err(e) = handle.wait() {
            warn!("{}: {}", key, e);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    coordinator.wait_idle()?;

    Ok(keys
        .into_iter()
        .filter(|k| coordinator.get_result(k).is_some())
        .collect())
}

fn write_grid(
    coordinator: &mut RecomputeCoordinator,
    key: &FileKey,
    output: &Path,
    rgba: bool,
) -> Result<()> {
    let result = coordinator
        .get_result(key)
        .with_context(|| format!("No result for {}", key))?;
    let rendered = coordinator
        .rendered_grid(key)?
        .with_context(|| format!("No rendered grid for {}", key))?;

    let stem = output_stem(key, result.series_name());
    let path = output.join(format!("{}.grid.json", stem));
    let json = serde_json::to_string(&GridOutput::new(&result, &rendered))?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Grid saved to: {}", path.display());

    if rgba {
        let path = output.join(format!("{}.rgba", stem));
        std::fs::write(&path, rendered.to_rgba()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Pixels saved to: {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let file = read_survey(&input)?;
            println!("File: {}", input.display());
            if let Some(template) = &file.template {
                println!("Template: {}", template);
            }
            println!("Lines: {}", file.lines.len());
            println!("Records: {}", file.record_count());
            if let Some(bounds) = file.bounds() {
                println!(
                    "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                    bounds.min.latitude,
                    bounds.min.longitude,
                    bounds.max.latitude,
                    bounds.max.longitude
                );
            }
            println!("\nSeries:");
            for series in file.series_names() {
                let values: Vec<f64> = file
                    .samples(&series)
                    .unwrap_or_default()
                    .iter()
                    .map(|s| s.value)
                    .filter(|v| v.is_finite())
                    .collect();
                match Range::from_values(values.iter().copied()) {
                    Some(range) => {
                        println!("  {}: {} readings, range {}", series, values.len(), range)
                    }
                    None => println!("  {}: no readings", series),
                }
            }
        }

        // ── Grid ─────────────────────────────────────────────────────
        Commands::Grid {
            inputs,
            gridding,
            display,
            output,
            rgba,
        } => {
            let start = Instant::now();
            std::fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let mut coordinator = RecomputeCoordinator::new(config)?;
            let keys = grid_files(&mut coordinator, &inputs, &gridding, &display)?;
            for key in &keys {
                write_grid(&mut coordinator, key, &output, rgba)?;
            }
            info!(
                gridded = keys.len(),
                failed = inputs.len() - keys.len(),
                "gridding finished"
            );
            println!("  Processing time: {:.2?}", start.elapsed());
            if keys.is_empty() {
                bail!("No file could be gridded");
            }
        }

        // ── Histogram ────────────────────────────────────────────────
        Commands::Histogram {
            input,
            gridding,
            display,
            bars,
            width,
        } => {
            let num_bars = bars.unwrap_or(config.histogram_bars);
            let mut coordinator = RecomputeCoordinator::new(config)?;
            let keys = grid_files(&mut coordinator, &[input], &gridding, &display)?;
            let Some(key) = keys.first() else {
                bail!("Gridding failed");
            };
            let rendered = coordinator
                .rendered_grid(key)?
                .with_context(|| format!("No rendered grid for {}", key))?;

            let histogram = rendered.histogram(num_bars);
            let range = rendered.range();
            let step = range.width() / histogram.num_bars() as f64;
            println!("Range: {}  ({} cells)", range, histogram.total());
            for (i, cdf) in histogram.cdf().iter().take(histogram.num_bars()).enumerate() {
                let bar = histogram.scale_bar(i, width as f64).round() as usize;
                println!(
                    "{:>12.4} {:>8} {:>5.1}% {}",
                    range.min + step * i as f64,
                    histogram.bar(i),
                    100.0 * cdf,
                    "#".repeat(bar)
                );
            }
        }

        // ── Config ───────────────────────────────────────────────────
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(min: Option<f64>, max: Option<f64>) -> DisplayArgs {
        DisplayArgs {
            smooth: false,
            hillshade: false,
            analytic: false,
            min,
            max,
            palette: Some("gaussian".into()),
            spectrum: None,
        }
    }

    #[test]
    fn test_display_range() {
        let range = display(Some(5.0), Some(-1.0)).range().unwrap();
        assert_eq!(range, Some(Range::new(-1.0, 5.0)));
        assert_eq!(display(None, None).range().unwrap(), None);
    }

    #[test]
    fn test_non_finite_display_range_rejected() {
        assert!(display(Some(f64::NAN), Some(1.0)).range().is_err());
        assert!(display(Some(0.0), Some(f64::INFINITY)).range().is_err());
        assert!(display(Some(f64::NAN), Some(1.0))
            .filter(&EngineConfig::default())
            .is_err());
    }

    #[test]
    fn test_cli_parses_negative_range() {
        let cli = Cli::try_parse_from([
            "surveygrid", "grid", "a.json", "-s", "mag", "--min", "-3", "--max", "nan",
        ])
        .unwrap();
        let Commands::Grid { display, .. } = cli.command else {
            panic!("expected grid command");
        };
        assert_eq!(display.min, Some(-3.0));
        assert!(display.range().is_err());
    }
}

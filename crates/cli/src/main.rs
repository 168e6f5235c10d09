//! Reliefill CLI - upstream/downstream region extraction on DEMs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use reliefill_algorithms::hydrology::{
    relief_fill_with, BoundaryRule, Cell, Direction, Interrupt, Policy, ReliefFillParams,
};
use reliefill_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};
use reliefill_core::{Connectivity, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "reliefill")]
#[command(author, version, about = "Upstream/downstream relief fill on DEM rasters", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Extract the cells upstream or downstream of a seed
    Fill {
        /// Input DEM file
        input: PathBuf,
        /// Output mask file (1 = filled, 0 = not)
        output: PathBuf,
        /// Seed row index
        #[arg(long, requires = "col")]
        row: Option<usize>,
        /// Seed column index
        #[arg(long, requires = "row")]
        col: Option<usize>,
        /// Seed X coordinate in the DEM's projected CRS
        #[arg(short = 'x', long, requires = "y", conflicts_with_all = ["row", "col"])]
        x: Option<f64>,
        /// Seed Y coordinate in the DEM's projected CRS
        #[arg(short = 'y', long, requires = "x")]
        y: Option<f64>,
        /// Fill direction: downstream, upstream
        #[arg(short, long, default_value = "downstream")]
        direction: String,
        /// Neighbor connectivity: 4, 8
        #[arg(short, long, default_value = "8")]
        connectivity: String,
        /// Admission policy: threshold, monotonic (basin)
        #[arg(short, long, default_value = "threshold")]
        policy: String,
        /// Allow filling the last row and column of the grid
        #[arg(long)]
        full_grid: bool,
        /// Treat the DEM's no-data value as an ordinary elevation
        #[arg(long)]
        keep_nodata: bool,
        /// Abort the fill after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn read_dem(path: &PathBuf) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path).context("Failed to read raster")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_mask(raster: &Raster<u8>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Resolve the seed from either grid indices or a projected coordinate
fn resolve_seed(
    dem: &Raster<f64>,
    row: Option<usize>,
    col: Option<usize>,
    x: Option<f64>,
    y: Option<f64>,
) -> Result<Cell> {
    match (row, col, x, y) {
        (Some(row), Some(col), _, _) => Ok(Cell::try_from((row, col))?),
        (_, _, Some(x), Some(y)) => {
            let (row, col) = dem
                .geo_to_cell(x, y)
                .with_context(|| format!("Input coordinate ({}, {}) out of range", x, y))?;
            debug!(x, y, row, col, "mapped seed coordinate");
            Ok(Cell::try_from((row, col))?)
        }
        _ => anyhow::bail!("A seed is required: give --row/--col or --x/--y"),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let raster = read_dem(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            match raster.geokeys() {
                Some(keys) => println!("GeoKeys: {} (carried to outputs)", keys.key_count()),
                None => println!("GeoKeys: none"),
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        Commands::Fill {
            input,
            output,
            row,
            col,
            x,
            y,
            direction,
            connectivity,
            policy,
            full_grid,
            keep_nodata,
            timeout_ms,
        } => {
            // Configuration errors surface before any I/O
            let mut params = ReliefFillParams::new(
                direction.parse::<Direction>()?,
                connectivity.parse::<Connectivity>()?,
                policy.parse::<Policy>()?,
            );
            if full_grid {
                params = params.with_boundary(BoundaryRule::FullGrid);
            }

            let mut dem = read_dem(&input)?;
            if !keep_nodata {
                let masked = dem.mask_nodata();
                debug!(masked, "no-data cells excluded from the fill");
            }

            let seed = resolve_seed(&dem, row, col, x, y)?;
            info!(
                "Seed {} ({}, {}-neighbor, {})",
                seed, params.direction, params.connectivity, params.policy
            );

            let interrupt = match timeout_ms {
                Some(ms) => Interrupt::never().with_timeout(Duration::from_millis(ms)),
                None => Interrupt::never(),
            };

            let pb = spinner("Filling...");
            let start = Instant::now();
            let result = relief_fill_with(&dem, seed, params, &interrupt);
            pb.finish_and_clear();
            let mask = result.context("Failed to compute relief fill")?;
            let elapsed = start.elapsed();

            let count = mask.count_where(|v| v == 1);
            if count == 0 {
                info!("No cell filled: seed on the grid edge, out of range, or no-data");
            } else {
                info!("Filled {} of {} cells", count, mask.len());
            }

            write_mask(&mask, &output)?;
            done("Relief fill", &output, elapsed);
        }
    }

    Ok(())
}

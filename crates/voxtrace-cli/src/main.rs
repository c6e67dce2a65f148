//! voxtrace CLI - trace segments through a voxel grid from the terminal.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use voxtrace::{traverse_batch_with, BatchResult, GridGeometry, TraceSettings};
use voxtrace_math::point;

#[derive(Parser)]
#[command(name = "voxtrace")]
#[command(about = "Exact segment traversal of regular voxel grids", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace segments and print the voxels each one crosses
    Trace {
        #[command(flatten)]
        grid: GridArgs,
        /// Segment as "sx,sy,sz:dx,dy,dz" (repeatable)
        #[arg(long = "ray", required = true, value_parser = parse_segment)]
        rays: Vec<Segment>,
        /// Print the batch result as JSON
        #[arg(long)]
        json: bool,
        /// Run on the calling thread only
        #[arg(long)]
        sequential: bool,
        /// Relative tolerance for simultaneous boundary crossings
        #[arg(long)]
        tie_tolerance: Option<f64>,
    },
    /// Display grid bounds and voxel count
    Info {
        #[command(flatten)]
        grid: GridArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct GridArgs {
    /// Voxel counts per axis, "I,J,K"
    #[arg(long, value_parser = parse_shape)]
    shape: [i64; 3],
    /// World position of the grid's minimum corner
    #[arg(long, value_parser = parse_triple, default_value = "0,0,0")]
    origin: [f64; 3],
    /// Voxel edge lengths per axis
    #[arg(long, value_parser = parse_triple, default_value = "1,1,1")]
    spacing: [f64; 3],
}

impl GridArgs {
    fn build(&self) -> Result<GridGeometry> {
        GridGeometry::from_raw(self.origin, self.spacing, self.shape).context("Invalid grid")
    }
}

/// A segment given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    source: [f64; 3],
    destination: [f64; 3],
}

#[derive(Serialize)]
struct GridInfo {
    shape: [usize; 3],
    origin: [f64; 3],
    spacing: [f64; 3],
    min: [f64; 3],
    max: [f64; 3],
    voxel_count: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Trace {
            grid,
            rays,
            json,
            sequential,
            tie_tolerance,
        } => {
            let mut settings = if sequential {
                TraceSettings::sequential()
            } else {
                TraceSettings::default()
            };
            if let Some(tie) = tie_tolerance {
                settings.tie_tolerance = tie;
            }
            trace(&grid.build()?, &rays, &settings, json)?;
        }
        Commands::Info { grid, json } => {
            show_info(&grid.build()?, json)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn trace(
    grid: &GridGeometry,
    rays: &[Segment],
    settings: &TraceSettings,
    json: bool,
) -> Result<()> {
    let sources: Vec<_> = rays.iter().map(|r| point(r.source)).collect();
    let destinations: Vec<_> = rays.iter().map(|r| point(r.destination)).collect();

    let result = traverse_batch_with(&sources, &destinations, grid, settings)?;
    info!(
        rays = result.len(),
        hits = result.hit_count(),
        total_length = result.total_length(),
        "Traced segments"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_table(rays, &result);
    }
    Ok(())
}

fn print_table(rays: &[Segment], result: &BatchResult) {
    for (n, (ray, (voxels, lengths))) in rays.iter().zip(result.iter()).enumerate() {
        let total: f64 = lengths.iter().sum();
        println!(
            "ray {n}: {:?} -> {:?}  {} voxels, length {total:.6}",
            ray.source,
            ray.destination,
            voxels.len()
        );
        for (voxel, length) in voxels.iter().zip(lengths) {
            println!("  ({:>4}, {:>4}, {:>4})  {length:.6}", voxel.i, voxel.j, voxel.k);
        }
    }
}

fn show_info(grid: &GridGeometry, json: bool) -> Result<()> {
    let bb = grid.bounding_box();
    let info = GridInfo {
        shape: grid.shape(),
        origin: [grid.origin().x, grid.origin().y, grid.origin().z],
        spacing: [grid.spacing().x, grid.spacing().y, grid.spacing().z],
        min: [bb.min.x, bb.min.y, bb.min.z],
        max: [bb.max.x, bb.max.y, bb.max.z],
        voxel_count: grid.voxel_count(),
    };
    debug!(shape = ?info.shape, "Grid info");

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Shape:   {} x {} x {}", info.shape[0], info.shape[1], info.shape[2]);
    println!("Origin:  {:?}", info.origin);
    println!("Spacing: {:?}", info.spacing);
    println!("Bounds:  {:?} .. {:?}", info.min, info.max);
    println!("Voxels:  {}", info.voxel_count);
    if grid.is_empty() {
        println!("(empty grid: every segment yields no voxels)");
    }
    Ok(())
}

fn split_three(s: &str) -> Result<[&str; 3]> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => bail!("expected three comma-separated values, got {:?}", s),
    }
}

fn parse_triple(s: &str) -> Result<[f64; 3]> {
    let [a, b, c] = split_three(s)?;
    let parse = |v: &str| {
        v.parse::<f64>()
            .with_context(|| format!("invalid number {:?}", v))
    };
    Ok([parse(a)?, parse(b)?, parse(c)?])
}

fn parse_shape(s: &str) -> Result<[i64; 3]> {
    let [a, b, c] = split_three(s)?;
    let parse = |v: &str| {
        v.parse::<i64>()
            .with_context(|| format!("invalid voxel count {:?}", v))
    };
    Ok([parse(a)?, parse(b)?, parse(c)?])
}

fn parse_segment(s: &str) -> Result<Segment> {
    let Some((source, destination)) = s.split_once(':') else {
        bail!("expected \"sx,sy,sz:dx,dy,dz\", got {:?}", s);
    };
    Ok(Segment {
        source: parse_triple(source)?,
        destination: parse_triple(destination)?,
    })
}

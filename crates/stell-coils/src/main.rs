//! coils-tool: inspect stellarator coils files
//!
//! Computes fields and vector potentials at probe points, offset surfaces,
//! finite-build meshes and coil-surface distances.

use anyhow::{Context, Result};
use clap::Parser;
use stell_coils::{read_coils_file, write_coils_file, FiniteBuildConfig, Frame, Point};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coils-tool")]
#[command(about = "Field, geometry and persistence utilities for filament coil sets")]
#[command(version)]
struct Args {
    /// Input coils file
    #[arg(short, long)]
    coil: PathBuf,

    /// Print the magnetic field at x,y,z (m)
    #[arg(short, long, allow_hyphen_values = true)]
    bfield: Option<String>,

    /// Print the vector potential at x,y,z (m)
    #[arg(short, long, allow_hyphen_values = true)]
    afield: Option<String>,

    /// Per-group currents overriding the file, comma separated (A)
    #[arg(short, long, allow_hyphen_values = true)]
    extcur: Option<String>,

    /// Write the coil set back to <coil>_new
    #[arg(short, long)]
    output: bool,

    /// Print the offset surface at this distance (m) as JSON
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Print the finite-build mesh as JSON
    #[arg(long)]
    finite_build: bool,

    /// Finite-build width (m)
    #[arg(long, default_value = "0.1")]
    width: f64,

    /// Finite-build height (m)
    #[arg(long, default_value = "0.1")]
    height: f64,

    /// Finite-build frame (centroid, frenet, parallel)
    #[arg(long, default_value = "centroid")]
    frame: Frame,

    /// Surface points file (x y z per line) to measure coil distances against
    #[arg(short, long)]
    surface: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn parse_list(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid number: {:?}", v))
        })
        .collect()
}

fn parse_point(s: &str) -> Result<Point> {
    match parse_list(s)?.as_slice() {
        [x, y, z] => Ok(Point::new(*x, *y, *z)),
        _ => anyhow::bail!("Expected x,y,z, got: {}", s),
    }
}

fn read_surface(path: &Path) -> Result<Vec<Point>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read surface file: {:?}", path))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| line.split_whitespace().count() >= 3)
        .map(|(i, line)| -> Result<Point> {
            let values = line
                .split_whitespace()
                .take(3)
                .map(str::parse::<f64>)
                .collect::<Result<Vec<f64>, _>>()
                .with_context(|| format!("{:?} line {}: invalid point", path, i + 1))?;
            Ok(Point::new(values[0], values[1], values[2]))
        })
        .collect()
}

fn new_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push("_new");
    PathBuf::from(name)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let set = read_coils_file(&args.coil)
        .with_context(|| format!("Failed to read coils file: {:?}", args.coil))?;

    let extcur = args.extcur.as_deref().map(parse_list).transpose()?;

    println!("nfp     = {}", set.nfp());
    println!("groups  = {}", set.ngroups());
    println!("coils   = {}", set.ncoils());
    for group in set.groups() {
        println!(
            "  {:<20} coils = {:<4} current = {:.6E}",
            group.name(),
            group.ncoils(),
            group.current()
        );
    }
    if let Some(bounds) = set.bounds() {
        println!(
            "bounds  = [{:.4}, {:.4}, {:.4}] .. [{:.4}, {:.4}, {:.4}]",
            bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
    }

    if let Some(probe) = &args.bfield {
        let point = parse_point(probe)?;
        let b = set
            .total_field(&point, extcur.as_deref())
            .context("Field evaluation failed")?;
        println!("B = [{:.10E}, {:.10E}, {:.10E}] T", b.x, b.y, b.z);
    }

    if let Some(probe) = &args.afield {
        let point = parse_point(probe)?;
        let a = set
            .total_potential(&point, extcur.as_deref())
            .context("Vector potential evaluation failed")?;
        println!("A = [{:.10E}, {:.10E}, {:.10E}]", a.x, a.y, a.z);
    }

    if let Some(path) = &args.surface {
        let surface = read_surface(path)?;
        let distances = set
            .surface_distance(&surface)
            .context("Surface distance failed")?;
        for group in &distances.groups {
            let min = group.coils.iter().flatten().copied().fold(f64::INFINITY, f64::min);
            println!("  {:<20} min distance = {:.6}", group.name, min);
        }
        println!("distance = {:.6} .. {:.6}", distances.min, distances.max);
    }

    if let Some(distance) = args.offset {
        let surface = set.offset_surface(distance);
        println!("{}", serde_json::to_string_pretty(&surface)?);
    }

    if args.finite_build {
        let config = FiniteBuildConfig {
            width: args.width,
            height: args.height,
            frame: args.frame,
        };
        let mesh = set
            .finite_build_mesh(&config)
            .context("Finite-build mesh failed")?;
        println!("{}", serde_json::to_string_pretty(&mesh)?);
    }

    if args.output {
        let path = new_path(&args.coil);
        write_coils_file(&set, &path)
            .with_context(|| format!("Failed to write output file: {:?}", path))?;
        eprintln!("Wrote coils file: {:?}", path);
    }

    Ok(())
}

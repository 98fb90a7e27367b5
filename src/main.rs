//! hexsphere CLI - generate and relax pentagon/hexagon sphere tilings
//!
//! Relaxes explicit mesh documents or engine payloads, dumps icosphere
//! vertices, and exports per-tile CSV tables.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::DVec3;

use hexsphere_relax::{
    generation, io, mesh, solver, unreal, MeshDocument, RelaxationConfig,
    RelaxationConfigBuilder, RelaxationMetrics, VertexRecord,
};

#[derive(Parser)]
#[command(name = "hexsphere")]
#[command(about = "Generate and relax pentagon/hexagon sphere tilings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relax a mesh document or engine payload and write the updated file
    Relax {
        /// Input JSON (mesh document, or auto-detected engine payload)
        input: PathBuf,
        /// Output JSON path
        output: PathBuf,
        #[command(flatten)]
        params: SolverParams,
        /// Emit spherical UVs even when the payload carries none
        /// (engine payloads only)
        #[arg(long)]
        emit_uv: bool,
    },
    /// Generate icosphere vertices and dump them to a file
    Icosphere {
        /// Number of subdivision passes
        #[arg(long, default_value_t = 0)]
        subdivisions: u32,
        /// Output file (.txt, .csv, or .json)
        output: PathBuf,
        /// Output format; detected from the file extension when omitted
        #[arg(long, value_enum)]
        format: Option<VertexFormat>,
    },
    /// Generate a tiled sphere from scratch and export its CSV tables
    FullCsv {
        /// Number of subdivision passes
        #[arg(long, default_value_t = 0)]
        subdivisions: u32,
        /// Output filename prefix for the CSV family
        output: PathBuf,
    },
    /// Export per-tile CSV tables from an engine payload
    TileCsv {
        /// Input engine payload JSON
        input: PathBuf,
        /// Output filename prefix for the CSV family
        output: PathBuf,
    },
}

/// Solver parameter overrides; unset values fall back to the mode's defaults
#[derive(Args)]
struct SolverParams {
    /// Relaxation iterations
    #[arg(long)]
    iterations: Option<usize>,
    /// Target sphere radius (defaults to the document radius)
    #[arg(long)]
    radius: Option<f64>,
    /// Per-step displacement scale
    #[arg(long)]
    step: Option<f64>,
    /// Laplacian smoothing weight
    #[arg(long)]
    laplacian_weight: Option<f64>,
    /// Spring weight
    #[arg(long)]
    spring_weight: Option<f64>,
    /// Pentagon expansion weight
    #[arg(long)]
    pentagon_expand_weight: Option<f64>,
    /// Worker threads (defaults to the logical CPU count)
    #[arg(long)]
    threads: Option<usize>,
    /// Diagnostic metrics cadence in iterations (0 disables)
    #[arg(long)]
    log_every: Option<usize>,
    /// Progress line cadence in iterations (0 disables)
    #[arg(long)]
    progress_every: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VertexFormat {
    Txt,
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Relax {
            input,
            output,
            params,
            emit_uv,
        } => run_relax(&input, &output, &params, emit_uv),
        Commands::Icosphere {
            subdivisions,
            output,
            format,
        } => run_icosphere(subdivisions, &output, format),
        Commands::FullCsv {
            subdivisions,
            output,
        } => run_full_csv(subdivisions, &output),
        Commands::TileCsv { input, output } => run_tile_csv(&input, &output),
    }
}

fn run_relax(input: &Path, output: &Path, params: &SolverParams, emit_uv: bool) -> Result<()> {
    ensure_output_path(output)?;
    let text = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let mut root: serde_json::Value = serde_json::from_str(&text)?;

    let (config, metrics) = if unreal::is_engine_payload(&root) {
        let config = apply_params(RelaxationConfigBuilder::engine_payload(), params, None)?;
        let metrics = unreal::process(&mut root, &config, emit_uv)?;
        fs::write(output, serde_json::to_string_pretty(&root)?)?;
        (config, metrics)
    } else {
        let document: MeshDocument = serde_json::from_value(root)?;
        let mut mesh = mesh::from_document(&document)?;
        let document_radius = if document.radius > 0.0 {
            document.radius
        } else {
            1.0
        };
        let config = apply_params(RelaxationConfigBuilder::new(), params, Some(document_radius))?;
        let metrics = solver::relax(&mut mesh, &config)?;
        io::write_document(output, &mesh::to_document(&mesh, config.radius))?;
        (config, metrics)
    };

    print_summary(&config, &metrics);
    Ok(())
}

fn run_icosphere(subdivisions: u32, output: &Path, format: Option<VertexFormat>) -> Result<()> {
    ensure_output_path(output)?;
    let radius = 1.0;
    let vertices = generation::icosphere::generate_vertices(subdivisions, radius)?;
    let format = format.unwrap_or_else(|| detect_format(output));

    match format {
        VertexFormat::Txt => write_vertices_txt(&vertices, output)?,
        VertexFormat::Csv => write_vertices_csv(&vertices, output)?,
        VertexFormat::Json => write_vertices_json(&vertices, radius, output)?,
    }
    println!(
        "Done. mode=icosphere, subdivisions={}, radius={:.6}, vertices={}, output={}",
        subdivisions,
        radius,
        vertices.len(),
        output.display()
    );
    Ok(())
}

fn run_full_csv(subdivisions: u32, output: &Path) -> Result<()> {
    ensure_output_path(output)?;
    let sphere = generation::generate_tiled_sphere(subdivisions, 1.0)?;
    unreal::tiles::export_raw(
        output,
        &sphere.vertices,
        &sphere.triangles,
        &sphere.normals,
        &sphere.uvs,
        &sphere.tangents,
    )?;
    println!(
        "Done. mode=full-csv, subdivisions={}, vertices={}, triangles={}, output_prefix={}",
        subdivisions,
        sphere.vertices.len(),
        sphere.triangle_count(),
        output.display()
    );
    Ok(())
}

fn run_tile_csv(input: &Path, output: &Path) -> Result<()> {
    ensure_output_path(output)?;
    let text = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let root: serde_json::Value = serde_json::from_str(&text)?;
    unreal::tiles::export(&root, output)?;
    println!(
        "Done. mode=tile-csv, input={}, output_prefix={}",
        input.display(),
        output.display()
    );
    Ok(())
}

/// Apply CLI overrides on top of a mode's default builder
fn apply_params(
    mut builder: RelaxationConfigBuilder,
    params: &SolverParams,
    document_radius: Option<f64>,
) -> Result<RelaxationConfig> {
    if let Some(iterations) = params.iterations {
        builder = builder.iterations(iterations);
    }
    if let Some(radius) = params.radius.or(document_radius) {
        builder = builder.radius(radius)?;
    }
    if let Some(step) = params.step {
        builder = builder.step(step);
    }
    if let Some(weight) = params.laplacian_weight {
        builder = builder.laplacian_weight(weight);
    }
    if let Some(weight) = params.spring_weight {
        builder = builder.spring_weight(weight);
    }
    if let Some(weight) = params.pentagon_expand_weight {
        builder = builder.pentagon_expand_weight(weight);
    }
    if let Some(threads) = params.threads {
        builder = builder.threads(threads)?;
    }
    if let Some(every) = params.log_every {
        builder = builder.log_every(every);
    }
    if let Some(every) = params.progress_every {
        builder = builder.progress_every(every);
    }
    Ok(builder.build()?)
}

fn print_summary(config: &RelaxationConfig, metrics: &RelaxationMetrics) {
    println!(
        "Done. Iterations={}, radius={:.6}",
        config.iterations, config.radius
    );
    println!(
        "Edge length min={:.6} max={:.6} mean={:.6} std={:.6}",
        metrics.edge_min, metrics.edge_max, metrics.edge_mean, metrics.edge_std_dev
    );
    println!(
        "Pentagon area mean={:.6}, Hex area mean={:.6}",
        metrics.pentagon_area_mean, metrics.hexagon_area_mean
    );
}

fn detect_format(output: &Path) -> VertexFormat {
    match output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => VertexFormat::Csv,
        Some("json") => VertexFormat::Json,
        _ => VertexFormat::Txt,
    }
}

fn write_vertices_txt(vertices: &[DVec3], output: &Path) -> Result<()> {
    let lines: Vec<String> = vertices
        .iter()
        .map(|v| format!("{:.9} {:.9} {:.9}", v.x, v.y, v.z))
        .collect();
    fs::write(output, lines.join("\n") + "\n")?;
    Ok(())
}

fn write_vertices_csv(vertices: &[DVec3], output: &Path) -> Result<()> {
    let mut lines = vec!["id,x,y,z".to_string()];
    for (i, v) in vertices.iter().enumerate() {
        lines.push(format!("{},{:.9},{:.9},{:.9}", i, v.x, v.y, v.z));
    }
    fs::write(output, lines.join("\n") + "\n")?;
    Ok(())
}

fn write_vertices_json(vertices: &[DVec3], radius: f64, output: &Path) -> Result<()> {
    let document = MeshDocument {
        radius,
        vertices: vertices
            .iter()
            .enumerate()
            .map(|(i, v)| VertexRecord {
                id: i as u32,
                x: v.x,
                y: v.y,
                z: v.z,
                fixed: false,
            })
            .collect(),
        tiles: Vec::new(),
    };
    fs::write(output, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}

fn ensure_output_path(output: &Path) -> Result<()> {
    if output.is_dir() {
        bail!("output path is a directory, expected file: {}", output.display());
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

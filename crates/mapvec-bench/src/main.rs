//! mapvec-bench: CLI tool for tracing region maps and collecting diagnostics.
//!
//! Traces a colour raster into polygons, printing a fingerprint of the
//! result along with per-stage diagnostics. Useful for:
//!
//! - Checking that a change leaves traced output untouched (fingerprint)
//! - Measuring per-stage durations to identify bottlenecks
//! - Inspecting output as SVG, a debug rendering, or a coordinate dump
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin mapvec-bench -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Set `RUST_LOG=debug` to see stage summaries from the tracer.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use mapvec_export::{RenderOptions, SvgMetadata};
use mapvec_pipeline::diagnostics::{Clock, TraceDiagnostics};
use mapvec_pipeline::{OrphanPolicy, TessellatorKind, TraceConfig, TraceResult};

/// Region tracing and diagnostics for mapvec.
///
/// Traces every colour region of an image into a polygon with nested
/// holes and prints a fingerprint plus per-stage timing and counts.
#[derive(Parser)]
#[command(name = "mapvec-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// What to do with holes no region encloses.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_ORPHANS)]
    orphan_policy: Orphans,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a debug rendering of the traced polygons to file (PNG).
    #[arg(long)]
    png: Option<PathBuf>,

    /// Upscale factor for `--png`.
    #[arg(long, default_value_t = RenderOptions::DEFAULT_SCALE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..=64))]
    scale: u32,

    /// Outline holes in black in the `--png` rendering.
    #[arg(long)]
    hole_outlines: bool,

    /// Write a coordinate-level dump of the polygons to file.
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Triangulate the polygons and report triangle counts.
    #[arg(long)]
    tessellate: bool,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full trace config as a JSON string.
    ///
    /// When provided, all other trace parameter flags are ignored.
    /// The JSON must be a valid `TraceConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Orphaned hole handling.
#[derive(Clone, Copy, ValueEnum)]
enum Orphans {
    /// Log and drop the hole.
    Discard,
    /// Log and keep the hole as a top-level polygon.
    Promote,
}

const fn orphans_from_pipeline(p: OrphanPolicy) -> Orphans {
    match p {
        OrphanPolicy::Discard => Orphans::Discard,
        OrphanPolicy::Promote => Orphans::Promote,
    }
}

/// The CLI default, derived from [`TraceConfig::DEFAULT_ORPHAN_POLICY`] so
/// the two cannot silently diverge.
const CLI_DEFAULT_ORPHANS: Orphans = orphans_from_pipeline(TraceConfig::DEFAULT_ORPHAN_POLICY);

/// Build a [`TraceConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<TraceConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(TraceConfig {
        orphan_policy: match cli.orphan_policy {
            Orphans::Discard => OrphanPolicy::Discard,
            Orphans::Promote => OrphanPolicy::Promote,
        },
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let decode_start = Instant::now();
    let raster = match mapvec_pipeline::decode::decode_rgb(&image_bytes) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Decode error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let decode_duration = decode_start.elapsed();

    eprintln!(
        "Image: {} ({} bytes, {}x{}, decoded in {:.3}ms)",
        cli.image_path.display(),
        image_bytes.len(),
        raster.width(),
        raster.height(),
        decode_duration.as_secs_f64() * 1000.0,
    );
    eprintln!("Config: {config:?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    let mut first_result = None;

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match mapvec_pipeline::diagnostics::trace_with_diagnostics(&raster, &config, &StdClock) {
            Ok((result, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                if first_result.is_none() {
                    first_result = Some(result);
                }
                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Trace error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    let Some(result) = first_result else {
        return ExitCode::FAILURE;
    };

    println!(
        "fingerprint: {:016x}",
        mapvec_export::fingerprint(&result.polygons)
    );
    println!(
        "polygons: {} top-level, {} total",
        result.polygons.len(),
        result.polygon_count(),
    );

    if cli.tessellate {
        print_tessellation(&result);
    }

    if !write_outputs(&cli, &config, &result) {
        return ExitCode::FAILURE;
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write every requested output file. Returns `false` if any write failed.
fn write_outputs(cli: &Cli, config: &TraceConfig, result: &TraceResult) -> bool {
    let mut ok = true;

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("bench");
        let config_json = serde_json::to_string(config).ok();
        let metadata = SvgMetadata {
            title: Some(title),
            description: Some("Traced by mapvec-bench"),
            config_json: config_json.as_deref(),
        };
        let svg = mapvec_export::to_svg(&result.polygons, result.dimensions, &metadata);
        ok &= write_file(svg_path, "SVG", svg.as_bytes());
    }

    if let Some(ref png_path) = cli.png {
        let options = RenderOptions {
            scale: cli.scale,
            hole_outlines: cli.hole_outlines,
        };
        match mapvec_export::render(&result.polygons, result.dimensions, &options) {
            Ok(img) => match img.save_with_format(png_path, image::ImageFormat::Png) {
                Ok(()) => eprintln!(
                    "PNG written to {} ({}x{})",
                    png_path.display(),
                    img.width(),
                    img.height(),
                ),
                Err(e) => {
                    eprintln!("Error writing PNG to {}: {e}", png_path.display());
                    ok = false;
                }
            },
            Err(e) => {
                eprintln!("Render error: {e}");
                ok = false;
            }
        }
    }

    if let Some(ref dump_path) = cli.dump {
        let text = mapvec_export::dump(&result.polygons);
        ok &= write_file(dump_path, "Dump", text.as_bytes());
    }

    ok
}

fn write_file(path: &Path, label: &str, contents: &[u8]) -> bool {
    match std::fs::write(path, contents) {
        Ok(()) => {
            eprintln!(
                "{label} written to {} ({} bytes)",
                path.display(),
                contents.len(),
            );
            true
        }
        Err(e) => {
            eprintln!("Error writing {label} to {}: {e}", path.display());
            false
        }
    }
}

fn print_tessellation(result: &TraceResult) {
    let start = Instant::now();
    let meshes = mapvec_pipeline::tessellate_all(&result.polygons, &TessellatorKind::default());
    let elapsed = start.elapsed();
    let triangles: usize = meshes.iter().map(|m| m.triangles.len()).sum();
    let area: f64 = meshes.iter().map(mapvec_pipeline::Mesh::area).sum();
    println!(
        "tessellation: {} meshes, {triangles} triangles, area {area:.1} ({:.3}ms)",
        meshes.len(),
        elapsed.as_secs_f64() * 1000.0,
    );
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&TraceDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[TraceDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Perimeter", |d| d.perimeter.duration),
        ("Assembly", |d| d.assembly.duration),
        ("Islands", |d| d.islands.duration),
        ("Output", |d| d.output.duration),
    ];

    for (name, extractor) in stage_extractors {
        let total: f64 = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum();
        let stage_mean = total / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

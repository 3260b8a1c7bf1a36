//! Trace diagnostics: timing and counts for each tracing stage.
//!
//! [`trace_with_diagnostics`] runs the same stages as
//! [`trace`](crate::trace) and records how long each took and what it
//! produced. Time is read through the [`Clock`] trait so the library
//! itself never touches a platform timer.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::raster::Raster;
use crate::tracer::Tracer;
use crate::types::{TraceConfig, TraceError, TraceResult};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time passed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceDiagnostics {
    /// Frame walk and frame node creation.
    pub perimeter: StageDiagnostics,
    /// Ring tracing through the graph reachable from the frame.
    pub assembly: StageDiagnostics,
    /// Island sweep, including graphs found inside islands.
    pub islands: StageDiagnostics,
    /// Nesting holes into their parents.
    pub output: StageDiagnostics,
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    pub summary: TraceSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    Perimeter {
        /// Nodes found on the frame.
        frame_nodes: usize,
        /// Pixels marked visited.
        visited_pixels: usize,
    },
    Assembly {
        nodes: usize,
        segments: usize,
        polygons: usize,
    },
    Islands {
        /// Holes attached to a parent.
        holes: usize,
        /// Islands that were a single boundary loop.
        pure_loops: usize,
        /// Holes with no enclosing region.
        orphaned: usize,
        /// Boundary pixels no walk reached before the sweep.
        unwalked: usize,
        /// Nodes created while tracing islands.
        nodes: usize,
    },
    Output {
        top_level: usize,
        total: usize,
    },
}

/// Summary counts for the whole trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    pub image_width: u32,
    pub image_height: u32,
    pub pixel_count: u64,
    pub one_way_nodes: usize,
    pub three_way_nodes: usize,
    pub four_way_nodes: usize,
    pub segments: usize,
    pub polygon_count: usize,
    pub vertex_count: usize,
}

/// Trace `raster`, timing each stage with `clock`.
///
/// # Errors
///
/// Same as [`trace`](crate::trace).
pub fn trace_with_diagnostics<C: Clock>(
    raster: &Raster,
    config: &TraceConfig,
    clock: &C,
) -> Result<(TraceResult, TraceDiagnostics), TraceError> {
    let start = clock.now();
    let mut tracer = Tracer::new(raster, config)?;

    let t = clock.now();
    tracer.trace_image_edges()?;
    let perimeter = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Perimeter {
            frame_nodes: tracer.graph().nodes().len(),
            visited_pixels: tracer.visited().count(),
        },
    };

    let t = clock.now();
    tracer.assemble()?;
    let assembled_nodes = tracer.graph().nodes().len();
    let assembly = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Assembly {
            nodes: assembled_nodes,
            segments: tracer.graph().segment_count(),
            polygons: tracer.stats().top_level_polygons,
        },
    };

    let t = clock.now();
    tracer.resolve_islands()?;
    let stats = tracer.stats();
    let islands = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Islands {
            holes: stats.holes,
            pure_loops: stats.pure_loops,
            orphaned: stats.orphaned_holes,
            unwalked: stats.unwalked_boundary_pixels,
            nodes: tracer.graph().nodes().len() - assembled_nodes,
        },
    };

    let t = clock.now();
    let result = tracer.finish();
    let output = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Output {
            top_level: result.polygons.len(),
            total: result.polygon_count(),
        },
    };

    let dimensions = result.dimensions;
    let summary = TraceSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: u64::from(dimensions.width) * u64::from(dimensions.height),
        one_way_nodes: stats.one_way_nodes,
        three_way_nodes: stats.three_way_nodes,
        four_way_nodes: stats.four_way_nodes,
        segments: stats.segments,
        polygon_count: result.polygon_count(),
        vertex_count: total_vertices(&result.polygons),
    };

    let diagnostics = TraceDiagnostics {
        perimeter,
        assembly,
        islands,
        output,
        total_duration: clock.elapsed(&start),
        summary,
    };
    Ok((result, diagnostics))
}

fn total_vertices(polygons: &[crate::Polygon]) -> usize {
    polygons
        .iter()
        .map(|p| p.vertex_count() + total_vertices(&p.holes))
        .sum()
}

impl TraceDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Trace Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Perimeter", &self.perimeter),
            ("Assembly", &self.assembly),
            ("Islands", &self.islands),
            ("Output", &self.output),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Nodes: {} one-way, {} three-way, {} four-way  |  Segments: {}",
            self.summary.one_way_nodes,
            self.summary.three_way_nodes,
            self.summary.four_way_nodes,
            self.summary.segments,
        ));
        lines.push(format!(
            "Polygons: {}  |  Vertices: {}",
            self.summary.polygon_count, self.summary.vertex_count,
        ));

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Perimeter {
            frame_nodes,
            visited_pixels,
        } => format!("{frame_nodes} frame nodes, {visited_pixels} pixels visited"),
        StageMetrics::Assembly {
            nodes,
            segments,
            polygons,
        } => format!("{nodes} nodes, {segments} segments -> {polygons} polygons"),
        StageMetrics::Islands {
            holes,
            pure_loops,
            orphaned,
            unwalked,
            nodes,
        } => format!(
            "{holes} holes ({pure_loops} loops), {orphaned} orphaned, {unwalked} unwalked, +{nodes} nodes"
        ),
        StageMetrics::Output { top_level, total } => {
            format!("{top_level} top-level of {total} polygons")
        }
    }
}

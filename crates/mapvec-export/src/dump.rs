//! Coordinate-level text dump, for diffing two traces by eye.

use std::fmt::Write;

use mapvec_pipeline::Polygon;

use crate::fingerprint::canonical_order;

/// Write every polygon and hole, one ring per line, in the same order
/// [`fingerprint`](crate::fingerprint::fingerprint) hashes them.
///
/// ```text
/// polygon 0 #ff0000 vertices=5 holes=1
///   0,0 3,0 3,3 0,3 0,0
///   hole 0 #00ff00 vertices=5 holes=0
///     1,1 2,1 2,2 1,2 1,1
/// ```
#[must_use]
pub fn dump(polygons: &[Polygon]) -> String {
    let mut out = String::new();
    for (i, polygon) in canonical_order(polygons).into_iter().enumerate() {
        write_polygon(&mut out, "polygon", i, polygon, 0);
    }
    out
}

fn write_polygon(out: &mut String, label: &str, index: usize, polygon: &Polygon, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{indent}{label} {index} {} vertices={} holes={}",
        polygon.color,
        polygon.vertex_count(),
        polygon.holes.len(),
    );
    let coords: Vec<String> = polygon
        .ring
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect();
    let _ = writeln!(out, "{indent}  {}", coords.join(" "));
    for (j, hole) in canonical_order(&polygon.holes).into_iter().enumerate() {
        write_polygon(out, "hole", j, hole, depth + 1);
    }
}

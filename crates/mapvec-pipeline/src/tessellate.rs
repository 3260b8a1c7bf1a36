//! Tessellation: turn traced polygons into triangle meshes for rendering.
//!
//! This module defines the [`Tessellate`] trait for pluggable
//! triangulation strategies and the [`TessellatorKind`] enum for choosing
//! one at runtime. Each top-level polygon is triangulated with its holes
//! cut out; the holes themselves are not filled.

use geo::{Area, TriangulateEarcut};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{Color, Polygon};

/// Selects which triangulation algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TessellatorKind {
    /// Ear clipping via `geo::TriangulateEarcut`.
    #[default]
    Earcut,
}

/// Triangles covering one polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub color: Color,
    pub triangles: Vec<geo::Triangle<f64>>,
}

impl Mesh {
    /// Total area covered by the triangles.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.triangles.iter().map(Area::unsigned_area).sum()
    }
}

/// Trait for triangulation strategies.
pub trait Tessellate {
    /// Triangulate `polygon` minus its holes.
    fn tessellate(&self, polygon: &Polygon) -> Mesh;
}

impl Tessellate for TessellatorKind {
    fn tessellate(&self, polygon: &Polygon) -> Mesh {
        match *self {
            Self::Earcut => EarcutTessellator.tessellate(polygon),
        }
    }
}

/// Ear-clipping triangulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarcutTessellator;

impl Tessellate for EarcutTessellator {
    fn tessellate(&self, polygon: &Polygon) -> Mesh {
        Mesh {
            color: polygon.color,
            triangles: polygon.to_geo().earcut_triangles(),
        }
    }
}

/// Triangulate every polygon in parallel, keeping input order.
pub fn tessellate_all<T>(polygons: &[Polygon], tessellator: &T) -> Vec<Mesh>
where
    T: Tessellate + Sync,
{
    polygons
        .par_iter()
        .map(|p| tessellator.tessellate(p))
        .collect()
}

//! Debug rendering of traced polygons with `tiny-skia`.
//!
//! Each polygon is filled in its own colour using the even-odd rule, with
//! its outer ring and hole rings added to the same path so the holes come
//! out unpainted. Rendering a correct trace at scale 1 reproduces the
//! source raster pixel for pixel.

use image::{Rgba, RgbaImage};
use mapvec_pipeline::{Dimensions, Point, Polygon};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

/// Rendering knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Integer upscale factor applied to both axes.
    pub scale: u32,
    /// Stroke every hole ring in black after filling.
    pub hole_outlines: bool,
}

impl RenderOptions {
    pub const DEFAULT_SCALE: u32 = 1;
    pub const DEFAULT_HOLE_OUTLINES: bool = false;
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: Self::DEFAULT_SCALE,
            hole_outlines: Self::DEFAULT_HOLE_OUTLINES,
        }
    }
}

/// Errors from [`render`].
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render scale must be at least 1")]
    ZeroScale,

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
}

/// Rasterise `polygons` onto a canvas of `dimensions` times
/// [`RenderOptions::scale`].
///
/// Polygons and holes are painted in [`paint_order`]. Pixels covered by
/// nothing stay transparent.
///
/// # Errors
///
/// Returns [`RenderError::ZeroScale`] if the scale is 0 and
/// [`RenderError::Canvas`] if the scaled canvas is empty or too large.
pub fn render(
    polygons: &[Polygon],
    dimensions: Dimensions,
    options: &RenderOptions,
) -> Result<RgbaImage, RenderError> {
    if options.scale == 0 {
        return Err(RenderError::ZeroScale);
    }
    let canvas_error = || RenderError::Canvas {
        width: dimensions.width.saturating_mul(options.scale),
        height: dimensions.height.saturating_mul(options.scale),
    };
    let width = dimensions
        .width
        .checked_mul(options.scale)
        .ok_or_else(canvas_error)?;
    let height = dimensions
        .height
        .checked_mul(options.scale)
        .ok_or_else(canvas_error)?;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(canvas_error)?;

    let scale = to_f32(options.scale);
    let transform = Transform::from_scale(scale, scale);

    for (polygon, _) in paint_order(polygons) {
        fill_polygon(&mut pixmap, polygon, transform);
    }

    if options.hole_outlines {
        let stroke = Stroke {
            width: 1.0 / scale,
            ..Stroke::default()
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        for polygon in polygons {
            stroke_holes(&mut pixmap, polygon, &paint, &stroke, transform);
        }
    }

    Ok(to_image(&pixmap))
}

/// Every polygon and hole in the forest, largest outline first, paired
/// with whether it is a hole.
///
/// Each entry is filled with its own holes cut out, so regions never
/// overlap except where a hole is shared by several touching regions.
/// Those regions are top-level polygons inside the hole's outline and
/// strictly smaller than it, so they are painted over it.
#[must_use]
pub fn paint_order(polygons: &[Polygon]) -> Vec<(&Polygon, bool)> {
    fn collect<'a>(out: &mut Vec<(&'a Polygon, bool)>, polygon: &'a Polygon, is_hole: bool) {
        out.push((polygon, is_hole));
        for hole in &polygon.holes {
            collect(out, hole, true);
        }
    }

    let mut order = Vec::new();
    for polygon in polygons {
        collect(&mut order, polygon, false);
    }
    order.sort_by_key(|(p, _)| std::cmp::Reverse(doubled_area(&p.ring)));
    order
}

/// Twice the area enclosed by a lattice ring (shoelace formula).
fn doubled_area(ring: &[Point]) -> i64 {
    ring.windows(2)
        .map(|w| {
            i64::from(w[0].x) * i64::from(w[1].y) - i64::from(w[1].x) * i64::from(w[0].y)
        })
        .sum::<i64>()
        .abs()
}

fn fill_polygon(pixmap: &mut Pixmap, polygon: &Polygon, transform: Transform) {
    let mut pb = PathBuilder::new();
    push_ring(&mut pb, &polygon.ring);
    for hole in &polygon.holes {
        push_ring(&mut pb, &hole.ring);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let [r, g, b] = polygon.color.to_rgb();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = false;
    pixmap.fill_path(&path, &paint, FillRule::EvenOdd, transform, None);
}

fn stroke_holes(
    pixmap: &mut Pixmap,
    polygon: &Polygon,
    paint: &Paint<'_>,
    stroke: &Stroke,
    transform: Transform,
) {
    for hole in &polygon.holes {
        if let Some(path) = ring_path(&hole.ring) {
            pixmap.stroke_path(&path, paint, stroke, transform, None);
        }
        stroke_holes(pixmap, hole, paint, stroke, transform);
    }
}

fn ring_path(ring: &[Point]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    push_ring(&mut pb, ring);
    pb.finish()
}

fn push_ring(pb: &mut PathBuilder, ring: &[Point]) {
    let Some((first, rest)) = ring.split_first() else {
        return;
    };
    pb.move_to(to_f32(first.x), to_f32(first.y));
    for p in rest {
        pb.line_to(to_f32(p.x), to_f32(p.y));
    }
    pb.close();
}

/// Lattice coordinates are bounded by the raster size, well inside the
/// range `f32` represents exactly.
#[allow(clippy::cast_precision_loss)]
fn to_f32<T: Into<i64>>(v: T) -> f32 {
    v.into() as f32
}

/// Convert the premultiplied pixmap into a straight-alpha image.
fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *pixel = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

//! mapvec-pipeline: Pure region tracing pipeline (sans-IO).
//!
//! Converts a colour raster into one polygon per connected colour region
//! through:
//! perimeter walk -> graph assembly -> island sweep -> hole nesting.
//!
//! Boundaries run along pixel edges, so neighbouring polygons share their
//! common edges exactly: there are no gaps or overlaps between them.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. File access and rendering
//! live in `mapvec-export` and `mapvec-bench`.

pub mod assemble;
pub mod decode;
pub mod diagnostics;
pub mod direction;
pub mod graph;
mod islands;
pub mod raster;
pub mod tessellate;
pub mod tracer;
pub mod types;

pub use direction::Direction;
pub use raster::{Raster, VisitedMap};
pub use tessellate::{EarcutTessellator, Mesh, Tessellate, TessellatorKind, tessellate_all};
pub use tracer::{TraceStats, Tracer};
pub use types::{
    BoundingBox, Color, Dimensions, OrphanPolicy, Point, Polygon, TraceConfig, TraceError,
    TraceResult,
};

/// Trace every colour region of `raster`.
///
/// # Steps
///
/// 1. Walk the image frame, creating a node wherever the frame colour
///    changes.
/// 2. Trace a ring from every slot of every discovered node, growing the
///    graph as walks meet new junctions.
/// 3. Sweep the raster for boundaries no walk reached and attach each as
///    a hole of the region enclosing it.
/// 4. Nest holes into their parents.
///
/// # Errors
///
/// Returns [`TraceError::NoTransitions`] if the raster is a single colour.
/// Returns [`TraceError::BrokenTopology`] if the boundary graph is
/// inconsistent.
pub fn trace(raster: &Raster, config: &TraceConfig) -> Result<TraceResult, TraceError> {
    let mut tracer = Tracer::new(raster, config)?;
    tracer.trace_image_edges()?;
    tracer.assemble()?;
    tracer.resolve_islands()?;
    Ok(tracer.finish())
}

/// Decode image bytes (PNG, JPEG, BMP, WebP) and trace them.
///
/// # Errors
///
/// Returns [`TraceError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`TraceError::ImageDecode`] if the image format is unrecognized.
/// Otherwise as [`trace`].
pub fn process(image_bytes: &[u8], config: &TraceConfig) -> Result<TraceResult, TraceError> {
    let raster = decode::decode_rgb(image_bytes)?;
    trace(&raster, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode an image whose left half is black and right half white.
    fn split_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &TraceConfig::default());
        assert!(matches!(result, Err(TraceError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &TraceConfig::default());
        assert!(matches!(result, Err(TraceError::ImageDecode(_))));
    }

    #[test]
    fn process_uniform_image_has_no_transitions() {
        let img = image::RgbaImage::from_fn(20, 20, |_, _| image::Rgba([128, 128, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();

        let result = process(&buf, &TraceConfig::default());
        assert!(matches!(result, Err(TraceError::NoTransitions)));
    }

    #[test]
    fn process_split_produces_two_regions() {
        let result = process(&split_png(40, 30), &TraceConfig::default()).unwrap();
        assert_eq!(result.polygons.len(), 2);
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 40,
                height: 30
            }
        );
        for polygon in &result.polygons {
            assert_eq!(polygon.vertex_count(), 5);
            assert!(polygon.holes.is_empty());
        }
    }
}

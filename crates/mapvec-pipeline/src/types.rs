//! Shared types for the mapvec tracing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A corner of the pixel lattice.
///
/// Corner `(x, y)` is the top-left corner of pixel `(x, y)`, so a
/// `width x height` raster has corners `0..=width` by `0..=height`.
/// The same type addresses pixels where the context is a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (from the left edge).
    pub x: i32,
    /// Vertical position (from the top edge, growing downwards).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A packed `0x00RRGGBB` colour.
///
/// [`Color::OUTSIDE`] is reserved for coordinates outside the raster and
/// never compares equal to a sampled colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    /// Sentinel returned for out-of-bounds samples.
    pub const OUTSIDE: Self = Self(u32::MAX);

    /// Pack three 8-bit channels.
    #[must_use]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Unpack into `[r, g, b]`.
    #[must_use]
    pub const fn to_rgb(self) -> [u8; 3] {
        let [_, r, g, b] = self.0.to_be_bytes();
        [r, g, b]
    }

    /// Whether this is the out-of-bounds sentinel.
    #[must_use]
    pub const fn is_outside(self) -> bool {
        self.0 == Self::OUTSIDE.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_outside() {
            f.write_str("outside")
        } else {
            write!(f, "#{:06x}", self.0)
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Axis-aligned bounds over lattice corners (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Bounds of a point sequence, or `None` when it is empty.
    #[must_use]
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(
            Self {
                min: first,
                max: first,
            },
            |acc, p| Self {
                min: Point::new(acc.min.x.min(p.x), acc.min.y.min(p.y)),
                max: Point::new(acc.max.x.max(p.x), acc.max.y.max(p.y)),
            },
        ))
    }

    /// Whether `other` lies entirely within these bounds.
    #[must_use]
    pub const fn contains_box(&self, other: &Self) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }
}

/// A traced region: a closed boundary ring plus nested holes.
///
/// `ring` is closed (first point equals last) and oriented with the
/// polygon's own interior on the right, i.e. clockwise on screen. Holes
/// use the same representation; a hole's `color` is the colour found
/// just inside its ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    /// Interior colour sampled right of the first boundary edge.
    pub color: Color,
    /// Closed boundary ring.
    pub ring: Vec<Point>,
    /// Enclosed holes, each itself a polygon.
    pub holes: Vec<Self>,
}

impl Polygon {
    /// Number of ring points, including the closing point.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.ring.len()
    }

    /// First ring point, if any.
    #[must_use]
    pub fn first(&self) -> Option<Point> {
        self.ring.first().copied()
    }

    /// Bounds of the outer ring.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(&self.ring)
    }

    /// Convert to a `geo` polygon, holes becoming interior rings.
    #[must_use]
    pub fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            ring_to_line_string(&self.ring),
            self.holes
                .iter()
                .map(|h| ring_to_line_string(&h.ring))
                .collect(),
        )
    }

    /// Convert only the outer ring to a `geo` polygon.
    #[must_use]
    pub fn outline_to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(ring_to_line_string(&self.ring), Vec::new())
    }

    /// Total number of polygons in this tree, counting `self`.
    #[must_use]
    pub fn tree_len(&self) -> usize {
        1 + self.holes.iter().map(Self::tree_len).sum::<usize>()
    }
}

fn ring_to_line_string(ring: &[Point]) -> geo::LineString<f64> {
    ring.iter()
        .map(|p| (f64::from(p.x), f64::from(p.y)))
        .collect::<Vec<_>>()
        .into()
}

/// What to do with a hole whose enclosing region cannot be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrphanPolicy {
    /// Drop the hole after logging it.
    #[default]
    Discard,
    /// Keep the hole as a standalone top-level polygon.
    Promote,
}

/// Configuration for a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Handling of holes with no enclosing region.
    pub orphan_policy: OrphanPolicy,
}

impl TraceConfig {
    /// Default for [`orphan_policy`](Self::orphan_policy).
    pub const DEFAULT_ORPHAN_POLICY: OrphanPolicy = OrphanPolicy::Discard;
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            orphan_policy: Self::DEFAULT_ORPHAN_POLICY,
        }
    }
}

/// Result of tracing a raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResult {
    /// Top-level polygons, each carrying its resolved holes.
    pub polygons: Vec<Polygon>,

    /// Dimensions of the source raster in pixels.
    ///
    /// Export serializers use this to set coordinate spaces
    /// (e.g., SVG `viewBox`).
    pub dimensions: Dimensions,
}

impl TraceResult {
    /// Total number of polygons including all nested holes.
    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.polygons.iter().map(Polygon::tree_len).sum()
    }
}

/// Errors that can occur while tracing.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The raster has zero width or height.
    #[error("raster has no pixels")]
    EmptyRaster,

    /// A raw pixel buffer does not match the declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The raster is a single colour, so there is no boundary to trace.
    #[error("raster contains no colour transitions")]
    NoTransitions,

    /// The boundary graph became inconsistent at a corner.
    #[error("inconsistent boundary topology at ({x}, {y})")]
    BrokenTopology { x: i32, y: i32 },

    /// A graph lookup named a node that was never created.
    #[error("boundary graph has no node {node}")]
    UnknownNode { node: usize },

    /// A boundary loop was stored without any points.
    #[error("boundary loop has no points")]
    EmptyLoop,
}

impl TraceError {
    pub(crate) const fn broken_at(point: Point) -> Self {
        Self::BrokenTopology {
            x: point.x,
            y: point.y,
        }
    }
}

/// Serde-compatible proxy for `TraceError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum TraceErrorProxy {
    ImageDecode(String),
    EmptyInput,
    EmptyRaster,
    SizeMismatch { expected: usize, actual: usize },
    NoTransitions,
    BrokenTopology { x: i32, y: i32 },
    UnknownNode { node: usize },
    EmptyLoop,
}

impl Serialize for TraceError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => TraceErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => TraceErrorProxy::EmptyInput,
            Self::EmptyRaster => TraceErrorProxy::EmptyRaster,
            Self::SizeMismatch { expected, actual } => TraceErrorProxy::SizeMismatch {
                expected: *expected,
                actual: *actual,
            },
            Self::NoTransitions => TraceErrorProxy::NoTransitions,
            Self::BrokenTopology { x, y } => TraceErrorProxy::BrokenTopology { x: *x, y: *y },
            Self::UnknownNode { node } => TraceErrorProxy::UnknownNode { node: *node },
            Self::EmptyLoop => TraceErrorProxy::EmptyLoop,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TraceError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = TraceErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed `image::ImageError` cannot be rebuilt from its
            // message, so surface it as a generic decoding error.
            TraceErrorProxy::ImageDecode(msg) => Self::ImageDecode(image::ImageError::IoError(
                std::io::Error::other(msg),
            )),
            TraceErrorProxy::EmptyInput => Self::EmptyInput,
            TraceErrorProxy::EmptyRaster => Self::EmptyRaster,
            TraceErrorProxy::SizeMismatch { expected, actual } => {
                Self::SizeMismatch { expected, actual }
            }
            TraceErrorProxy::NoTransitions => Self::NoTransitions,
            TraceErrorProxy::BrokenTopology { x, y } => Self::BrokenTopology { x, y },
            TraceErrorProxy::UnknownNode { node } => Self::UnknownNode { node },
            TraceErrorProxy::EmptyLoop => Self::EmptyLoop,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Color tests ---

    #[test]
    fn color_packs_channels() {
        let c = Color::from_rgb(0x12, 0x34, 0x56);
        assert_eq!(c, Color(0x0012_3456));
        assert_eq!(c.to_rgb(), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn outside_never_equals_a_packed_color() {
        assert_ne!(Color::from_rgb(255, 255, 255), Color::OUTSIDE);
        assert!(Color::OUTSIDE.is_outside());
        assert!(!Color::from_rgb(0, 0, 0).is_outside());
    }

    #[test]
    fn color_display() {
        assert_eq!(Color::from_rgb(255, 0, 16).to_string(), "#ff0010");
        assert_eq!(Color::OUTSIDE.to_string(), "outside");
    }

    // --- BoundingBox tests ---

    #[test]
    fn bounding_box_of_points() {
        let bb = BoundingBox::of(&[Point::new(3, 1), Point::new(-1, 4), Point::new(2, 2)]).unwrap();
        assert_eq!(bb.min, Point::new(-1, 1));
        assert_eq!(bb.max, Point::new(3, 4));
        assert!(BoundingBox::of(&[]).is_none());
    }

    #[test]
    fn bounding_box_containment() {
        let outer = BoundingBox {
            min: Point::new(0, 0),
            max: Point::new(4, 4),
        };
        let inner = BoundingBox {
            min: Point::new(1, 1),
            max: Point::new(4, 2),
        };
        assert!(outer.contains_box(&inner));
        assert!(!inner.contains_box(&outer));
    }

    // --- Polygon tests ---

    fn unit_square(x: i32, y: i32, color: Color) -> Polygon {
        Polygon {
            color,
            ring: vec![
                Point::new(x, y),
                Point::new(x + 1, y),
                Point::new(x + 1, y + 1),
                Point::new(x, y + 1),
                Point::new(x, y),
            ],
            holes: Vec::new(),
        }
    }

    #[test]
    fn polygon_tree_len_counts_nested_holes() {
        let mut inner = unit_square(1, 1, Color(2));
        inner.holes.push(unit_square(1, 1, Color(3)));
        let mut outer = unit_square(0, 0, Color(1));
        outer.holes.push(inner);
        assert_eq!(outer.tree_len(), 3);
    }

    #[test]
    fn polygon_to_geo_keeps_holes_as_interiors() {
        let mut outer = unit_square(0, 0, Color(1));
        outer.holes.push(unit_square(0, 0, Color(2)));
        let geo = outer.to_geo();
        assert_eq!(geo.interiors().len(), 1);
        assert_eq!(geo.exterior().0.len(), 5);
        assert!(outer.outline_to_geo().interiors().is_empty());
    }

    // --- TraceConfig tests ---

    #[test]
    fn trace_config_defaults() {
        let config = TraceConfig::default();
        assert_eq!(config.orphan_policy, OrphanPolicy::Discard);
    }

    #[test]
    fn trace_config_missing_fields_use_defaults() {
        let config: TraceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TraceConfig::default());
    }

    // --- TraceError tests ---

    #[test]
    fn error_no_transitions_display() {
        assert_eq!(
            TraceError::NoTransitions.to_string(),
            "raster contains no colour transitions"
        );
    }

    #[test]
    fn error_size_mismatch_display() {
        let err = TraceError::SizeMismatch {
            expected: 12,
            actual: 10,
        };
        assert_eq!(err.to_string(), "pixel buffer holds 10 bytes, expected 12");
    }

    // --- Serde round-trip tests ---

    #[test]
    fn polygon_serde_round_trip() {
        let mut p = unit_square(2, 3, Color::from_rgb(1, 2, 3));
        p.holes.push(unit_square(2, 3, Color::from_rgb(4, 5, 6)));
        let json = serde_json::to_string(&p).unwrap();
        let back: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn trace_config_serde_round_trip() {
        let config = TraceConfig {
            orphan_policy: OrphanPolicy::Promote,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: TraceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn trace_error_serde_round_trip_no_transitions() {
        let json = serde_json::to_string(&TraceError::NoTransitions).unwrap();
        let back: TraceError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, TraceError::NoTransitions));
    }

    #[test]
    fn trace_error_serde_round_trip_broken_topology() {
        let err = TraceError::broken_at(Point::new(4, 7));
        let json = serde_json::to_string(&err).unwrap();
        let back: TraceError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, TraceError::BrokenTopology { x: 4, y: 7 }));
    }

    #[test]
    fn trace_error_serde_round_trip_unknown_node() {
        let err = TraceError::UnknownNode { node: 12 };
        assert_eq!(err.to_string(), "boundary graph has no node 12");
        let json = serde_json::to_string(&err).unwrap();
        let back: TraceError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, TraceError::UnknownNode { node: 12 }));
    }

    #[test]
    fn trace_result_err_serde_round_trip() {
        let result: Result<TraceResult, TraceError> = Err(TraceError::EmptyInput);
        let json = serde_json::to_string(&result).unwrap();
        let back: Result<TraceResult, TraceError> = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Err(TraceError::EmptyInput)));
    }
}

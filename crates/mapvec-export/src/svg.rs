//! SVG export serializer.
//!
//! Converts traced polygons into an SVG string using the [`svg`] crate for
//! document construction, XML escaping, and path data formatting.
//!
//! Each polygon becomes one `<path>` element: the outer ring followed by
//! one subpath per hole, filled with `fill-rule="evenodd"` so the holes
//! stay open. Paths are emitted in the same painter's order as the debug
//! renderer uses (see [`paint_order`](crate::render::paint_order)).
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use mapvec_pipeline::{Dimensions, Point, Polygon};

use crate::render::paint_order;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized trace configuration, emitted inside a `<metadata>`
    /// element wrapped in a namespaced `<mapvec:trace>` element so
    /// exported files carry the settings that produced them.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string for a polygon and its holes.
///
/// Every ring becomes `M x,y L x,y ... z`; the repeated closing point is
/// left to the `z`. Rings with fewer than 2 distinct points are skipped.
///
/// # Examples
///
/// ```
/// use mapvec_pipeline::{Color, Point, Polygon};
/// use mapvec_export::build_path_data;
///
/// let polygon = Polygon {
///     color: Color(0),
///     ring: vec![
///         Point::new(0, 0),
///         Point::new(2, 0),
///         Point::new(2, 1),
///         Point::new(0, 1),
///         Point::new(0, 0),
///     ],
///     holes: Vec::new(),
/// };
/// assert!(build_path_data(&polygon).starts_with("M0,0 L2,0 L2,1 L0,1"));
/// ```
#[must_use]
pub fn build_path_data(polygon: &Polygon) -> String {
    let rings = std::iter::once(&polygon.ring).chain(polygon.holes.iter().map(|h| &h.ring));
    let mut data = Data::new();
    let mut drawn = false;
    for ring in rings {
        let Some((first, rest)) = open_ring(ring) else {
            continue;
        };
        data = data.move_to((f64::from(first.x), f64::from(first.y)));
        for p in rest {
            data = data.line_to((f64::from(p.x), f64::from(p.y)));
        }
        data = data.close();
        drawn = true;
    }
    if !drawn {
        return String::new();
    }
    String::from(Value::from(data))
}

/// Split a closed ring into its first point and the remaining distinct
/// points, or `None` if fewer than two distinct points remain.
fn open_ring(ring: &[Point]) -> Option<(&Point, &[Point])> {
    let open = match ring {
        [rest @ .., last] if rest.first() == Some(last) => rest,
        _ => ring,
    };
    open.split_first().filter(|(_, rest)| !rest.is_empty())
}

fn polygon_path(polygon: &Polygon) -> Option<Path> {
    let d = build_path_data(polygon);
    if d.is_empty() {
        return None;
    }
    Some(
        Path::new()
            .set("d", d)
            .set("fill", polygon.color.to_string())
            .set("fill-rule", "evenodd")
            .set("stroke", "none"),
    )
}

/// Serialize polygons into an SVG document string.
///
/// The `viewBox` is set from [`Dimensions`] so the SVG coordinate space
/// matches the source image pixel grid, and `shape-rendering="crispEdges"`
/// keeps pixel-aligned edges sharp.
///
/// # Examples
///
/// ```
/// use mapvec_pipeline::{Color, Dimensions, Point, Polygon};
/// use mapvec_export::{SvgMetadata, to_svg};
///
/// let polygons = vec![Polygon {
///     color: Color::from_rgb(255, 0, 0),
///     ring: vec![
///         Point::new(0, 0),
///         Point::new(4, 0),
///         Point::new(4, 3),
///         Point::new(0, 3),
///         Point::new(0, 0),
///     ],
///     holes: Vec::new(),
/// }];
/// let dims = Dimensions { width: 4, height: 3 };
/// let metadata = SvgMetadata {
///     title: Some("regions"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&polygons, dims, &metadata);
/// assert!(svg.contains("<title>regions</title>"));
/// assert!(svg.contains(r##"fill="#ff0000""##));
/// ```
#[must_use]
pub fn to_svg(polygons: &[Polygon], dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h))
        .set("shape-rendering", "crispEdges");

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut trace_el = Element::new("mapvec:trace");
        trace_el.assign("xmlns:mapvec", "https://mapvec.dev/ns/1");
        trace_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(trace_el);
        doc = doc.add(metadata_el);
    }

    for (polygon, is_hole) in paint_order(polygons) {
        if let Some(path) = polygon_path(polygon) {
            doc = doc.add(if is_hole { path.set("class", "hole") } else { path });
        }
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

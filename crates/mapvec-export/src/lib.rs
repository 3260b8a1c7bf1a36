//! mapvec-export: Pure serializers for traced polygons (sans-IO)
//!
//! Turns the polygons produced by `mapvec-pipeline` into SVG documents,
//! debug renderings, text dumps and a stable fingerprint for regression
//! checks. Nothing here touches the filesystem.

pub mod dump;
pub mod fingerprint;
pub mod render;
pub mod svg;

pub use dump::dump;
pub use fingerprint::{canonical_order, fingerprint};
pub use render::{RenderError, RenderOptions, paint_order, render};
pub use svg::{SvgMetadata, build_path_data, to_svg};

//! Island discovery.
//!
//! Boundaries that never touch the image frame or any traced boundary
//! are invisible to the graph walk. A row-major sweep finds them: the
//! first pixel of such a boundary has a colour change on its west edge
//! and was never marked by a walk.

use crate::assemble::{flatten, reverse_ring};
use crate::direction::Direction;
use crate::tracer::Tracer;
use crate::types::{Color, OrphanPolicy, Point, Polygon, TraceError};

impl Tracer<'_> {
    /// Sweep the raster for untraced boundaries, tracing each one and
    /// attaching it as a hole of the region enclosing it.
    ///
    /// Marks every pixel visited as the sweep passes it. Before marking,
    /// a pixel with a colour change on its west edge must already have
    /// been marked by a walk; each one that was not is counted in
    /// [`TraceStats::unwalked_boundary_pixels`](crate::TraceStats).
    ///
    /// # Errors
    ///
    /// Propagates [`TraceError::BrokenTopology`] from ring tracing.
    pub fn resolve_islands(&mut self) -> Result<(), TraceError> {
        let width = i32::try_from(self.raster.width()).unwrap_or(i32::MAX);
        let height = i32::try_from(self.raster.height()).unwrap_or(i32::MAX);
        let before = self.stats.holes;
        for y in 0..height {
            for x in 0..width {
                // The frame counts as a west boundary for column 0.
                let west_boundary = self.raster.color(x, y) != self.raster.color(x - 1, y);
                if x > 0 && west_boundary && !self.visited.is_visited(x, y) {
                    self.resolve_island(Point::new(x, y))?;
                }
                if west_boundary && !self.visited.is_visited(x, y) {
                    self.stats.unwalked_boundary_pixels += 1;
                    log::warn!("boundary west of pixel ({x}, {y}) was never walked");
                }
                self.visited.mark(x, y);
            }
        }
        log::debug!("resolved {} islands", self.stats.holes - before);
        Ok(())
    }

    /// Trace the island whose top-left corner is `corner`.
    ///
    /// The pixel west of `corner` has the enclosing colour; the pixel at
    /// `corner` is inside the island.
    fn resolve_island(&mut self, corner: Point) -> Result<(), TraceError> {
        let outer = self.raster.color(corner.x - 1, corner.y);
        let inner = self.color(corner);
        let down = self.walk(corner, Direction::South);

        if !down.junction {
            // A single boundary loop: the island is one region.
            self.stats.pure_loops += 1;
            let entry = self.add_loop(down.points, Direction::South)?;
            let ring = reverse_ring(flatten(&self.graph, &[entry]));
            return self.attach_hole(outer, corner, ring_polygon(inner, ring), true);
        }

        // Several regions meet inside the island. Splice the two walks
        // leaving `corner` into one segment so the corner itself is not a
        // node, then trace the island's outline with the enclosing colour
        // on the right.
        let across = self.walk(corner, Direction::East);
        let from = self.node_at(across.end);
        let to = self.node_at(down.end);
        let from_dir = across.arrival.invert();
        let to_dir = down.arrival.invert();

        let mut points: Vec<Point> = across.points.into_iter().rev().collect();
        points.extend(down.points.into_iter().skip(1));
        let segment = self.add_segment(points);
        self.link(from, from_dir, to, to_dir, segment)?;

        let (_, outline) = self.trace_from_node(from, from_dir)?;
        let ring = reverse_ring(flatten(&self.graph, &outline));
        self.assemble()?;
        self.attach_hole(outer, corner, ring_polygon(inner, ring), false)
    }

    /// File `hole` under the smallest region of colour `outer` enclosing
    /// the pixel west of `corner`.
    fn attach_hole(
        &mut self,
        outer: Color,
        corner: Point,
        hole: Polygon,
        candidate: bool,
    ) -> Result<(), TraceError> {
        let probe = geo::Point::new(f64::from(corner.x) - 0.5, f64::from(corner.y) + 0.5);
        if let Some(parent) = self.store.find_parent(outer, probe) {
            self.stats.holes += 1;
            self.store.push(hole, Some(parent), candidate);
            return Ok(());
        }

        self.stats.orphaned_holes += 1;
        log::warn!(
            "no {outer} region encloses the {} island at ({}, {}); {:?}",
            hole.color,
            corner.x,
            corner.y,
            self.config.orphan_policy,
        );
        match self.config.orphan_policy {
            OrphanPolicy::Discard => {}
            OrphanPolicy::Promote => {
                self.stats.top_level_polygons += 1;
                self.store.push(hole, None, candidate);
            }
        }
        Ok(())
    }
}

const fn ring_polygon(color: Color, ring: Vec<Point>) -> Polygon {
    Polygon {
        color,
        ring,
        holes: Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::raster::Raster;
    use crate::types::TraceConfig;

    fn raster_from(rows: &[&str]) -> Raster {
        let h = u32::try_from(rows.len()).unwrap();
        let w = u32::try_from(rows[0].len()).unwrap();
        let img = image::RgbImage::from_fn(w, h, |x, y| {
            let c = rows[y as usize].as_bytes()[x as usize];
            image::Rgb([c, 0, 0])
        });
        Raster::from_image(img).unwrap()
    }

    fn color(c: u8) -> Color {
        Color::from_rgb(c, 0, 0)
    }

    fn run(tracer: &mut Tracer<'_>) {
        tracer.trace_image_edges().unwrap();
        tracer.assemble().unwrap();
        tracer.resolve_islands().unwrap();
    }

    #[test]
    fn single_pixel_island_is_a_pure_loop_hole() {
        let raster = raster_from(&["aaa", "aba", "aaa"]);
        let mut tracer = Tracer::new(&raster, &TraceConfig::default()).unwrap();
        run(&mut tracer);

        assert_eq!(tracer.stats().pure_loops, 1);
        assert_eq!(tracer.stats().holes, 1);
        assert_eq!(tracer.stats().unwalked_boundary_pixels, 0);

        let polygons = std::mem::take(&mut tracer.store).into_polygons();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].color, color(b'a'));
        let hole = &polygons[0].holes[0];
        assert_eq!(hole.color, color(b'b'));
        assert_eq!(
            hole.ring,
            vec![
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(2, 2),
                Point::new(1, 2),
                Point::new(1, 1),
            ]
        );
    }

    #[test]
    fn island_with_junctions_is_traced_as_complex() {
        // b and c touch inside a: the island outline has junctions.
        let raster = raster_from(&["aaaaa", "abbca", "abcca", "aaaaa"]);
        let mut tracer = Tracer::new(&raster, &TraceConfig::default()).unwrap();
        run(&mut tracer);

        assert_eq!(tracer.stats().pure_loops, 0);
        assert_eq!(tracer.stats().holes, 1);
        assert_eq!(tracer.stats().unwalked_boundary_pixels, 0);

        let polygons = std::mem::take(&mut tracer.store).into_polygons();
        let frame: Vec<&Polygon> = polygons.iter().filter(|p| p.color == color(b'a')).collect();
        assert_eq!(frame.len(), 1);
        let hole = &frame[0].holes[0];
        assert_eq!(hole.color, color(b'b'));
        assert_eq!(
            hole.ring,
            vec![
                Point::new(3, 1),
                Point::new(4, 1),
                Point::new(4, 3),
                Point::new(2, 3),
                Point::new(1, 3),
                Point::new(1, 1),
                Point::new(3, 1),
            ]
        );
        // The regions inside the island are top-level polygons.
        assert!(polygons.iter().any(|p| p.color == color(b'b')));
        assert!(polygons.iter().any(|p| p.color == color(b'c')));
    }

    #[test]
    fn nested_islands_find_innermost_parent() {
        let raster = raster_from(&[
            "aaaaaaa", //
            "abbbbba", //
            "abcccba", //
            "abcacba", //
            "abcccba", //
            "abbbbba", //
            "aaaaaaa", //
        ]);
        let mut tracer = Tracer::new(&raster, &TraceConfig::default()).unwrap();
        run(&mut tracer);
        assert_eq!(tracer.stats().pure_loops, 3);

        let polygons = std::mem::take(&mut tracer.store).into_polygons();
        assert_eq!(polygons.len(), 1);
        let b = &polygons[0].holes[0];
        assert_eq!(b.color, color(b'b'));
        let c = &b.holes[0];
        assert_eq!(c.color, color(b'c'));
        let a = &c.holes[0];
        assert_eq!(a.color, color(b'a'));
        assert_eq!(a.ring[0], Point::new(3, 3));
    }

    #[test]
    fn orphan_is_discarded_by_default() {
        let raster = raster_from(&["aaa", "aba", "aaa"]);
        let mut tracer = Tracer::new(&raster, &TraceConfig::default()).unwrap();
        // No regions stored yet, so the hole has no parent.
        tracer.resolve_islands().unwrap();
        assert_eq!(tracer.stats().orphaned_holes, 1);
        assert!(tracer.store.is_empty());
    }

    #[test]
    fn sweep_counts_boundaries_no_walk_reached() {
        let raster = raster_from(&["aaa", "aba", "aaa"]);
        let mut tracer = Tracer::new(&raster, &TraceConfig::default()).unwrap();
        // Without the perimeter walk the frame column is never walked, yet
        // the sweep still leaves every pixel marked.
        tracer.resolve_islands().unwrap();
        assert!(tracer.visited().is_complete());
        assert_eq!(tracer.stats().unwalked_boundary_pixels, 3);
    }

    #[test]
    fn full_trace_walks_every_boundary_pixel() {
        let raster = raster_from(&[
            "aaaaaaa", //
            "abbcbba", //
            "abcacba", //
            "abbcbba", //
            "aaaaaaa", //
        ]);
        let mut tracer = Tracer::new(&raster, &TraceConfig::default()).unwrap();
        tracer.trace_image_edges().unwrap();
        tracer.assemble().unwrap();
        let before_sweep = tracer.visited().count();
        tracer.resolve_islands().unwrap();
        assert!(before_sweep < 35);
        assert_eq!(tracer.stats().unwalked_boundary_pixels, 0);
        assert_eq!(tracer.stats().orphaned_holes, 0);
    }

    #[test]
    fn orphan_is_promoted_on_request() {
        let raster = raster_from(&["aaa", "aba", "aaa"]);
        let config = TraceConfig {
            orphan_policy: OrphanPolicy::Promote,
        };
        let mut tracer = Tracer::new(&raster, &config).unwrap();
        tracer.resolve_islands().unwrap();
        assert_eq!(tracer.stats().orphaned_holes, 1);
        let polygons = std::mem::take(&mut tracer.store).into_polygons();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].color, color(b'b'));
    }
}

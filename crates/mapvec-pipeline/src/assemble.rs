//! Polygon assembly: walking rings through the boundary graph and
//! collecting the results into a nested polygon tree.

use std::collections::HashMap;

use geo::{Area, Contains};

use crate::direction::Direction;
use crate::graph::{DirectedSegment, NodeId};
use crate::tracer::Tracer;
use crate::types::{Color, Point, Polygon, TraceError};

/// One step of a ring: a node and the segment leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingEntry {
    pub node: NodeId,
    pub segment: DirectedSegment,
}

/// A polygon waiting for the tree to be built.
#[derive(Debug)]
struct Stored {
    polygon: Polygon,
    parent: Option<usize>,
}

/// A region that islands may be nested in.
#[derive(Debug)]
struct Candidate {
    index: usize,
    outline: geo::Polygon<f64>,
    area: f64,
}

/// Arena of finished polygons.
///
/// Holes are stored flat with a parent index; [`into_polygons`]
/// nests them. Regions that may enclose islands are also bucketed by
/// colour for [`find_parent`].
///
/// [`into_polygons`]: Self::into_polygons
/// [`find_parent`]: Self::find_parent
#[derive(Debug, Default)]
pub struct PolygonStore {
    stored: Vec<Stored>,
    candidates: HashMap<Color, Vec<Candidate>>,
}

impl PolygonStore {
    /// Number of polygons stored so far, holes included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stored.len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    /// Store a polygon, optionally under `parent`, and register it as a
    /// possible parent for later islands when `candidate` is set.
    pub fn push(&mut self, polygon: Polygon, parent: Option<usize>, candidate: bool) -> usize {
        let index = self.stored.len();
        if candidate {
            let outline = polygon.outline_to_geo();
            let area = outline.unsigned_area();
            self.candidates
                .entry(polygon.color)
                .or_default()
                .push(Candidate {
                    index,
                    outline,
                    area,
                });
        }
        self.stored.push(Stored { polygon, parent });
        index
    }

    /// The smallest candidate region of `color` whose outline contains
    /// `probe`.
    #[must_use]
    pub fn find_parent(&self, color: Color, probe: geo::Point<f64>) -> Option<usize> {
        self.candidates
            .get(&color)?
            .iter()
            .filter(|c| c.outline.contains(&probe))
            .min_by(|a, b| a.area.total_cmp(&b.area))
            .map(|c| c.index)
    }

    /// Nest every hole in its parent and return the top-level polygons in
    /// the order they were stored.
    ///
    /// Parents are always stored before their holes, so a reverse pass
    /// finishes each polygon's subtree before moving it.
    #[must_use]
    pub fn into_polygons(self) -> Vec<Polygon> {
        let parents: Vec<Option<usize>> = self.stored.iter().map(|s| s.parent).collect();
        let mut slots: Vec<Option<Polygon>> =
            self.stored.into_iter().map(|s| Some(s.polygon)).collect();

        for index in (0..slots.len()).rev() {
            let Some(parent) = parents[index] else {
                continue;
            };
            if let Some(mut hole) = slots[index].take() {
                hole.holes.reverse();
                if let Some(Some(p)) = slots.get_mut(parent) {
                    p.holes.push(hole);
                }
            }
        }

        slots
            .into_iter()
            .flatten()
            .map(|mut p| {
                p.holes.reverse();
                p
            })
            .collect()
    }
}

/// Concatenate ring segments into a closed point ring.
///
/// Each segment's last point is the next segment's first, so it is
/// skipped; the ring is closed by repeating its first point.
#[must_use]
pub fn flatten(graph: &crate::graph::Graph, ring: &[RingEntry]) -> Vec<Point> {
    let mut points = Vec::new();
    for entry in ring {
        let mut segment: Vec<Point> = graph.points(entry.segment).collect();
        segment.pop();
        points.extend(segment);
    }
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

/// The same closed ring walked the other way.
#[must_use]
pub fn reverse_ring(mut ring: Vec<Point>) -> Vec<Point> {
    ring.reverse();
    ring
}

impl Tracer<'_> {
    /// Heading to leave a node by after arriving in `arrival`, keeping
    /// `color` on the right.
    ///
    /// Prefers the rightmost boundary so that rings hug their region.
    pub(crate) fn continue_direction(&self, at: Point, arrival: Direction, color: Color) -> Direction {
        let (ahead_left, ahead_right) = arrival.flanking_pixels(at);
        if self.color(ahead_right) != color {
            arrival.rotate_right()
        } else if self.color(ahead_left) != color {
            arrival
        } else {
            arrival.rotate_left()
        }
    }

    /// Walk the ring that leaves `start` in `heading`, resolving segments
    /// on demand, until it returns to the same slot.
    ///
    /// Returns the ring's colour (the pixel right of its first edge) and
    /// its entries.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::BrokenTopology`] if a slot is missing or is
    /// entered twice before the ring closes, and
    /// [`TraceError::UnknownNode`] if a link names a node not in the graph.
    pub fn trace_from_node(
        &mut self,
        start: NodeId,
        heading: Direction,
    ) -> Result<(Color, Vec<RingEntry>), TraceError> {
        let origin = self
            .graph
            .point(start)
            .ok_or(TraceError::UnknownNode { node: start })?;
        let (_, right) = heading.flanking_pixels(origin);
        let color = self.color(right);

        let mut ring = Vec::new();
        let mut node = start;
        let mut leaving = heading;
        loop {
            let at = self
                .graph
                .point(node)
                .ok_or(TraceError::UnknownNode { node })?;
            match self.graph.mark_visited(node, leaving) {
                Some(false) => {}
                Some(true) | None => return Err(TraceError::broken_at(at)),
            }
            if self.graph.slot(node, leaving).and_then(|s| s.link).is_none() {
                self.trace_edge(node, leaving)?;
            }
            let link = self
                .graph
                .slot(node, leaving)
                .and_then(|s| s.link)
                .ok_or(TraceError::broken_at(at))?;
            ring.push(RingEntry {
                node,
                segment: link.segment,
            });

            let arrival = link.back.invert();
            let next_at = self
                .graph
                .point(link.node)
                .ok_or(TraceError::broken_at(at))?;
            node = link.node;
            leaving = self.continue_direction(next_at, arrival, color);
            if node == start && leaving == heading {
                return Ok((color, ring));
            }
        }
    }

    /// Trace a ring from every slot of `id` not yet walked.
    ///
    /// # Errors
    ///
    /// Propagates [`TraceError::BrokenTopology`] from ring tracing.
    pub fn visit_node(&mut self, id: NodeId) -> Result<(), TraceError> {
        let directions: Vec<Direction> = self
            .graph
            .node(id)
            .map(|n| {
                n.slots()
                    .iter()
                    .filter(|s| !s.visited)
                    .map(|s| s.direction)
                    .collect()
            })
            .unwrap_or_default();
        for direction in directions {
            let walked = self
                .graph
                .slot(id, direction)
                .is_none_or(|s| s.visited);
            if walked {
                continue;
            }
            let (color, ring) = self.trace_from_node(id, direction)?;
            self.store_top_level(color, &ring);
        }
        Ok(())
    }

    /// Visit pending nodes until none remain, then forget them.
    ///
    /// Tracing a ring may create nodes; they join the queue.
    ///
    /// # Errors
    ///
    /// Propagates [`TraceError::BrokenTopology`] from ring tracing.
    pub fn assemble(&mut self) -> Result<(), TraceError> {
        while let Some(id) = self.cache.pop() {
            self.visit_node(id)?;
        }
        // Anything traced later is disconnected from these nodes.
        self.cache.clear();
        log::debug!(
            "assembled {} polygons from {} nodes and {} segments",
            self.store.len(),
            self.graph.nodes().len(),
            self.graph.segment_count(),
        );
        Ok(())
    }

    /// Store a region ring as a top-level polygon that later islands may
    /// nest in.
    pub(crate) fn store_top_level(&mut self, color: Color, ring: &[RingEntry]) {
        let polygon = Polygon {
            color,
            ring: flatten(&self.graph, ring),
            holes: Vec::new(),
        };
        self.stats.top_level_polygons += 1;
        self.store.push(polygon, None, true);
    }
}

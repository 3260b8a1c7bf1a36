//! Boundary tracing: the perimeter walk and the interior wall-follower.
//!
//! Boundaries run along pixel edges on the corner lattice. An edge is a
//! boundary when the pixels on either side differ in colour (the frame
//! counts, since samples outside the image are [`Color::OUTSIDE`]).
//! Along a run of boundary the left and right colours stay fixed; the
//! run ends at a corner where three or four boundary edges meet, which
//! becomes a graph [`Node`](crate::graph::Node).
//!
//! # Interior walk
//!
//! [`Tracer::walk`] is an explicit state machine. After each unit step
//! the two pixels ahead are compared with the colours flanking the run:
//!
//! | ahead left | ahead right | state        |
//! |------------|-------------|--------------|
//! | left       | right       | `Straight`   |
//! | left       | left        | `TurnRight`  |
//! | right      | right       | `TurnLeft`   |
//! | otherwise  |             | `NodeFound`  |

use std::collections::{BTreeMap, HashMap};

use crate::direction::Direction;
use crate::graph::{DirectedSegment, Graph, NodeId, SegmentId, Slots};
use crate::raster::{Raster, VisitedMap};
use crate::types::{Color, Point, TraceConfig, TraceError, TraceResult};

/// Classification of a corner reached by the interior walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Straight,
    TurnLeft,
    TurnRight,
    NodeFound,
}

impl WalkState {
    fn classify(left: Color, right: Color, ahead_left: Color, ahead_right: Color) -> Self {
        match (ahead_left == left, ahead_right == right, ahead_right == left, ahead_left == right) {
            (true, true, _, _) => Self::Straight,
            (true, _, true, _) => Self::TurnRight,
            (_, true, _, true) => Self::TurnLeft,
            _ => Self::NodeFound,
        }
    }
}

/// A traced run of boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    /// Start corner, turning corners, and end corner.
    pub points: Vec<Point>,
    /// Corner the walk stopped at.
    pub end: Point,
    /// Heading when `end` was reached.
    pub arrival: Direction,
    /// `false` when the walk came back to its start without meeting a
    /// junction.
    pub junction: bool,
}

/// Pending nodes keyed by position.
///
/// `index` remembers every node created during the trace so a walk that
/// returns to an already visited node reuses it; `pending` holds the
/// nodes still waiting for [`Tracer::visit_node`] and is drained in
/// position order so the output is deterministic.
#[derive(Debug, Default)]
pub struct NodeCache {
    index: HashMap<Point, NodeId>,
    pending: BTreeMap<Point, NodeId>,
}

impl NodeCache {
    /// Node at `point`, if one was created.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<NodeId> {
        self.index.get(&point).copied()
    }

    fn insert(&mut self, point: Point, id: NodeId) {
        self.index.insert(point, id);
        self.pending.insert(point, id);
    }

    /// Remove and return the pending node with the smallest position.
    pub fn pop(&mut self) -> Option<NodeId> {
        self.pending.pop_first().map(|(_, id)| id)
    }

    /// Whether no nodes are waiting to be visited.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every node.
    pub fn clear(&mut self) {
        self.index.clear();
        self.pending.clear();
    }
}

/// Counters gathered while tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub one_way_nodes: usize,
    pub three_way_nodes: usize,
    pub four_way_nodes: usize,
    pub segments: usize,
    pub top_level_polygons: usize,
    pub holes: usize,
    pub pure_loops: usize,
    pub orphaned_holes: usize,
    /// Pixels with a colour change on their west edge that no walk marked
    /// before the island sweep reached them. Zero for a complete trace.
    pub unwalked_boundary_pixels: usize,
}

/// Tracing context for one raster.
///
/// Owns the visited overlay, the boundary graph, the node cache, and the
/// polygons produced so far. Run the stages in order:
/// [`trace_image_edges`](Self::trace_image_edges),
/// [`assemble`](Self::assemble),
/// [`resolve_islands`](Self::resolve_islands), then
/// [`finish`](Self::finish).
pub struct Tracer<'a> {
    pub(crate) raster: &'a Raster,
    pub(crate) config: TraceConfig,
    pub(crate) visited: VisitedMap,
    pub(crate) graph: Graph,
    pub(crate) cache: NodeCache,
    pub(crate) store: crate::assemble::PolygonStore,
    pub(crate) stats: TraceStats,
}

impl<'a> Tracer<'a> {
    /// Prepare a trace of `raster`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::NoTransitions`] if the raster is a single
    /// colour: there is no boundary to trace and no defined output.
    pub fn new(raster: &'a Raster, config: &TraceConfig) -> Result<Self, TraceError> {
        if !raster.has_transitions() {
            return Err(TraceError::NoTransitions);
        }
        Ok(Self {
            raster,
            config: config.clone(),
            visited: VisitedMap::new(raster.width(), raster.height()),
            graph: Graph::default(),
            cache: NodeCache::default(),
            store: crate::assemble::PolygonStore::default(),
            stats: TraceStats::default(),
        })
    }

    /// The visited-pixel overlay.
    #[must_use]
    pub const fn visited(&self) -> &VisitedMap {
        &self.visited
    }

    /// The boundary graph built so far.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Counters gathered so far.
    #[must_use]
    pub const fn stats(&self) -> TraceStats {
        self.stats
    }

    /// Nest every hole in its parent and hand back the polygon tree.
    #[must_use]
    pub fn finish(self) -> TraceResult {
        if self.stats.unwalked_boundary_pixels > 0 {
            log::warn!(
                "{} boundary pixels were reached only by the island sweep",
                self.stats.unwalked_boundary_pixels,
            );
        }
        if !self.visited.is_complete() {
            log::warn!(
                "{} of {} pixels were never visited",
                self.raster.width() * self.raster.height() - self.visited.count(),
                self.raster.width() * self.raster.height(),
            );
        }
        TraceResult {
            polygons: self.store.into_polygons(),
            dimensions: self.raster.dimensions(),
        }
    }

    pub(crate) fn color(&self, p: Point) -> Color {
        self.raster.color_at(p)
    }

    /// Whether the unit edge leaving `corner` in `direction` separates
    /// two colours.
    fn is_boundary(&self, corner: Point, direction: Direction) -> bool {
        let (left, right) = direction.flanking_pixels(corner);
        self.color(left) != self.color(right)
    }

    /// Record that a unit edge has been walked.
    fn mark_edge(&mut self, from: Point, heading: Direction) {
        if let Some(p) = heading.east_pixel(from) {
            self.visited.mark(p.x, p.y);
        }
    }

    /// Node at `corner`, created (and queued) if new.
    pub(crate) fn node_at(&mut self, corner: Point) -> NodeId {
        if let Some(id) = self.cache.get(corner) {
            return id;
        }
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&d| self.is_boundary(corner, d))
            .collect();
        let slots = match open.as_slice() {
            &[a, b, c] => {
                self.stats.three_way_nodes += 1;
                Slots::three_way([a, b, c])
            }
            _ => {
                self.stats.four_way_nodes += 1;
                Slots::four_way()
            }
        };
        let id = self.graph.add_node(corner, slots);
        self.cache.insert(corner, id);
        id
    }

    /// Store a boundary loop that meets no other boundary behind a
    /// one-way node at its first point, already marked visited.
    ///
    /// Returns the loop read forward from its node.
    pub(crate) fn add_loop(
        &mut self,
        points: Vec<Point>,
        leaving: Direction,
    ) -> Result<crate::assemble::RingEntry, TraceError> {
        let corner = *points.first().ok_or(TraceError::EmptyLoop)?;
        self.stats.one_way_nodes += 1;
        let node = self.graph.add_node(corner, Slots::one_way(leaving));
        let segment = self.add_segment(points);
        if !self.graph.close_loop(node, leaving, segment) {
            return Err(TraceError::broken_at(corner));
        }
        self.graph.mark_visited(node, leaving);
        Ok(crate::assemble::RingEntry {
            node,
            segment: DirectedSegment {
                segment,
                forward: true,
            },
        })
    }

    pub(crate) fn add_segment(&mut self, points: Vec<Point>) -> SegmentId {
        self.stats.segments += 1;
        self.graph.add_segment(points)
    }

    pub(crate) fn link(
        &mut self,
        a: NodeId,
        a_dir: Direction,
        b: NodeId,
        b_dir: Direction,
        segment: SegmentId,
    ) -> Result<(), TraceError> {
        if self.graph.link(a, a_dir, b, b_dir, segment) {
            Ok(())
        } else {
            Err(self
                .graph
                .point(a)
                .map_or(TraceError::UnknownNode { node: a }, TraceError::broken_at))
        }
    }

    /// Follow the boundary leaving `start` heading `heading` until it
    /// reaches a junction or comes back to `start`.
    ///
    /// Marks the pixel east of every vertical edge walked.
    pub fn walk(&mut self, start: Point, heading: Direction) -> Walk {
        let (left_px, right_px) = heading.flanking_pixels(start);
        let left = self.color(left_px);
        let right = self.color(right_px);

        let mut points = vec![start];
        let mut corner = start;
        let mut heading = heading;
        loop {
            self.mark_edge(corner, heading);
            corner = heading.step(corner).to;

            let (ahead_left, ahead_right) = heading.flanking_pixels(corner);
            let state = WalkState::classify(
                left,
                right,
                self.color(ahead_left),
                self.color(ahead_right),
            );
            if state == WalkState::NodeFound {
                points.push(corner);
                return Walk {
                    points,
                    end: corner,
                    arrival: heading,
                    junction: true,
                };
            }
            if corner == start {
                points.push(corner);
                return Walk {
                    points,
                    end: corner,
                    arrival: heading,
                    junction: false,
                };
            }
            match state {
                WalkState::TurnRight => {
                    points.push(corner);
                    heading = heading.rotate_right();
                }
                WalkState::TurnLeft => {
                    points.push(corner);
                    heading = heading.rotate_left();
                }
                WalkState::Straight | WalkState::NodeFound => {}
            }
        }
    }

    /// Resolve the slot of `from` leaving in `heading` by walking to the
    /// next node, storing the segment and linking both ends.
    ///
    /// Returns the node reached and the slot on it that leads back.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnknownNode`] if `from` is not in the graph and
    /// [`TraceError::BrokenTopology`] if the node reached has no slot for
    /// the arriving edge.
    pub fn trace_edge(
        &mut self,
        from: NodeId,
        heading: Direction,
    ) -> Result<(NodeId, Direction), TraceError> {
        let start = self
            .graph
            .point(from)
            .ok_or(TraceError::UnknownNode { node: from })?;
        let walk = self.walk(start, heading);
        let to = self.node_at(walk.end);
        let back = walk.arrival.invert();
        let segment = self.add_segment(walk.points);
        self.link(from, heading, to, back, segment)?;
        Ok((to, back))
    }

    /// Walk the image frame clockwise from pixel `(0, 0)`, creating a node
    /// wherever the perimeter colour changes and linking consecutive
    /// nodes with frame segments.
    ///
    /// Slots facing out of the image are marked visited so no polygon is
    /// ever traced around the outside. If the perimeter is a single
    /// colour the frame is a loop and its polygon is emitted directly.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::BrokenTopology`] if linking frame nodes fails.
    pub fn trace_image_edges(&mut self) -> Result<(), TraceError> {
        let frame = frame_edges(self.raster.width(), self.raster.height());
        for &(corner, heading) in &frame {
            let (_, inside) = heading.flanking_pixels(corner);
            self.visited.mark(inside.x, inside.y);
        }

        let Some(first) = frame
            .iter()
            .position(|&(corner, _)| self.is_frame_node(corner))
        else {
            return self.emit_frame_loop(&frame);
        };

        let (start_corner, _) = frame[first];
        let start = self.node_at(start_corner);
        let mut current = start;
        let mut leaving = frame[first].1;
        let mut points = vec![start_corner];

        let count = frame.len();
        for offset in 0..count {
            let (corner, heading) = frame[(first + offset) % count];
            let (next_corner, next_heading) = frame[(first + offset + 1) % count];
            let to = heading.step(corner).to;
            debug_assert_eq!(to, next_corner);

            if self.is_frame_node(next_corner) {
                points.push(next_corner);
                let node = self.node_at(next_corner);
                let back = heading.invert();
                let segment = self.add_segment(std::mem::take(&mut points));
                self.link(current, leaving, node, back, segment)?;
                // The reciprocal slot runs counter-clockwise with the
                // outside on its right.
                self.graph.mark_visited(node, back);
                points.push(next_corner);
                current = node;
                leaving = next_heading;
            } else if next_heading != heading {
                points.push(next_corner);
            }
        }
        debug_assert_eq!(current, start);
        Ok(())
    }

    /// Whether a boundary edge runs into the image from this frame corner.
    ///
    /// Frame corners always have their two frame edges as boundaries and
    /// never the outward one, so a third boundary makes a junction.
    fn is_frame_node(&self, corner: Point) -> bool {
        Direction::ALL
            .into_iter()
            .filter(|&d| self.is_boundary(corner, d))
            .count()
            > 2
    }

    /// Emit the frame itself as a polygon when the perimeter never
    /// changes colour.
    fn emit_frame_loop(&mut self, frame: &[(Point, Direction)]) -> Result<(), TraceError> {
        let origin = Point::new(0, 0);
        let mut points = vec![origin];
        for (i, &(corner, heading)) in frame.iter().enumerate() {
            let to = heading.step(corner).to;
            let next_heading = frame.get(i + 1).map_or(Direction::East, |&(_, h)| h);
            if to == origin || next_heading != heading {
                points.push(to);
            }
        }
        let entry = self.add_loop(points, Direction::East)?;
        let color = self.color(origin);
        self.store_top_level(color, &[entry]);
        Ok(())
    }
}

/// Unit edges of the image frame, clockwise from corner `(0, 0)`: each is
/// its start corner and heading. The inside pixel is on the right.
fn frame_edges(width: usize, height: usize) -> Vec<(Point, Direction)> {
    let w = i32::try_from(width).unwrap_or(i32::MAX);
    let h = i32::try_from(height).unwrap_or(i32::MAX);
    let top = (0..w).map(|x| (Point::new(x, 0), Direction::East));
    let right = (0..h).map(move |y| (Point::new(w, y), Direction::South));
    let bottom = (0..w).map(move |i| (Point::new(w - i, h), Direction::West));
    let left = (0..h).map(move |i| (Point::new(0, h - i), Direction::North));
    top.chain(right).chain(bottom).chain(left).collect()
}

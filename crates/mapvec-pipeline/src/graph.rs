//! Planar boundary graph: nodes where region boundaries meet and the
//! segments running between them.
//!
//! Nodes and segments live in index arenas; linking two nodes writes
//! indices into their slot arrays, so the graph never holds owning
//! references in both directions.

use crate::direction::Direction;
use crate::types::Point;

pub type NodeId = usize;
pub type SegmentId = usize;

/// A polyline between two nodes, stored once.
///
/// Holds the endpoints and every corner where the boundary turns; the
/// unit steps between consecutive points are collinear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    points: Vec<Point>,
}

impl Segment {
    /// Stored points, from the node the segment was traced from.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// A segment plus the direction it is read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectedSegment {
    pub segment: SegmentId,
    pub forward: bool,
}

impl DirectedSegment {
    /// The same segment read the other way.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            segment: self.segment,
            forward: !self.forward,
        }
    }
}

/// Where a resolved slot leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Node at the far end.
    pub node: NodeId,
    /// Slot on the far node that leads back here.
    pub back: Direction,
    /// Segment read from this node towards `node`.
    pub segment: DirectedSegment,
}

/// One half-edge on a node: the boundary leaving it in `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub direction: Direction,
    pub link: Option<Link>,
    pub visited: bool,
}

impl Slot {
    const fn open(direction: Direction) -> Self {
        Self {
            direction,
            link: None,
            visited: false,
        }
    }
}

/// Node slots, sized by arity.
///
/// One-way nodes only mark a boundary loop that meets nothing else;
/// three-way nodes sit where three regions meet; four-way nodes where
/// four edges cross.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slots {
    OneWay([Slot; 1]),
    ThreeWay([Slot; 3]),
    FourWay([Slot; 4]),
}

impl Slots {
    /// A loop marker leaving in `direction`.
    #[must_use]
    pub const fn one_way(direction: Direction) -> Self {
        Self::OneWay([Slot::open(direction)])
    }

    /// A junction of three boundary edges.
    #[must_use]
    pub const fn three_way(directions: [Direction; 3]) -> Self {
        let [a, b, c] = directions;
        Self::ThreeWay([Slot::open(a), Slot::open(b), Slot::open(c)])
    }

    /// A crossing of all four boundary edges.
    #[must_use]
    pub const fn four_way() -> Self {
        Self::FourWay([
            Slot::open(Direction::North),
            Slot::open(Direction::East),
            Slot::open(Direction::South),
            Slot::open(Direction::West),
        ])
    }

    /// Number of slots.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Self::OneWay(_) => 1,
            Self::ThreeWay(_) => 3,
            Self::FourWay(_) => 4,
        }
    }

    fn as_slice(&self) -> &[Slot] {
        match self {
            Self::OneWay(s) => s,
            Self::ThreeWay(s) => s,
            Self::FourWay(s) => s,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [Slot] {
        match self {
            Self::OneWay(s) => s,
            Self::ThreeWay(s) => s,
            Self::FourWay(s) => s,
        }
    }
}

/// A graph vertex at a lattice corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub point: Point,
    slots: Slots,
}

impl Node {
    /// Slot arity (1, 3 or 4).
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.slots.arity()
    }

    /// All slots.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        self.slots.as_slice()
    }

    /// Slot leaving in `direction`, if the node has one.
    #[must_use]
    pub fn slot(&self, direction: Direction) -> Option<&Slot> {
        self.slots().iter().find(|s| s.direction == direction)
    }

    fn slot_mut(&mut self, direction: Direction) -> Option<&mut Slot> {
        self.slots
            .as_mut_slice()
            .iter_mut()
            .find(|s| s.direction == direction)
    }
}

/// Node and segment arenas.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    segments: Vec<Segment>,
}

impl Graph {
    /// Add a node; its arity is fixed by `slots`.
    pub fn add_node(&mut self, point: Point, slots: Slots) -> NodeId {
        self.nodes.push(Node { point, slots });
        self.nodes.len() - 1
    }

    /// Store a segment read forward from its first point.
    pub fn add_segment(&mut self, points: Vec<Point>) -> SegmentId {
        self.segments.push(Segment { points });
        self.segments.len() - 1
    }

    /// Node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Position of a node.
    #[must_use]
    pub fn point(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(|n| n.point)
    }

    /// Slot of a node by direction.
    #[must_use]
    pub fn slot(&self, id: NodeId, direction: Direction) -> Option<&Slot> {
        self.node(id)?.slot(direction)
    }

    /// All nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of segments stored.
    #[must_use]
    pub const fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Points of a directed segment in reading order.
    pub fn points(&self, directed: DirectedSegment) -> impl Iterator<Item = Point> + '_ {
        let points = self
            .segments
            .get(directed.segment)
            .map_or(&[][..], |s| s.points());
        let (forward, backward) = if directed.forward {
            (Some(points.iter()), None)
        } else {
            (None, Some(points.iter().rev()))
        };
        forward
            .into_iter()
            .flatten()
            .chain(backward.into_iter().flatten())
            .copied()
    }

    /// Join `a` (leaving in `a_dir`) and `b` (leaving in `b_dir`) with
    /// `segment`, read forward from `a`.
    ///
    /// Returns `false` if either slot does not exist.
    pub fn link(
        &mut self,
        a: NodeId,
        a_dir: Direction,
        b: NodeId,
        b_dir: Direction,
        segment: SegmentId,
    ) -> bool {
        let forward = DirectedSegment {
            segment,
            forward: true,
        };
        let wrote_a = self.set_link(
            a,
            a_dir,
            Link {
                node: b,
                back: b_dir,
                segment: forward,
            },
        );
        let wrote_b = self.set_link(
            b,
            b_dir,
            Link {
                node: a,
                back: a_dir,
                segment: forward.reversed(),
            },
        );
        wrote_a && wrote_b
    }

    /// Close a one-way loop: the slot leaving in `direction` runs along
    /// `segment` and comes back to the same slot.
    pub fn close_loop(&mut self, id: NodeId, direction: Direction, segment: SegmentId) -> bool {
        self.set_link(
            id,
            direction,
            Link {
                node: id,
                back: direction,
                segment: DirectedSegment {
                    segment,
                    forward: true,
                },
            },
        )
    }

    fn set_link(&mut self, id: NodeId, direction: Direction, link: Link) -> bool {
        match self.nodes.get_mut(id).and_then(|n| n.slot_mut(direction)) {
            Some(slot) => {
                slot.link = Some(link);
                true
            }
            None => false,
        }
    }

    /// Mark a slot visited, returning whether it was already visited.
    /// `None` if the slot does not exist.
    pub fn mark_visited(&mut self, id: NodeId, direction: Direction) -> Option<bool> {
        let slot = self.nodes.get_mut(id)?.slot_mut(direction)?;
        Some(std::mem::replace(&mut slot.visited, true))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tee(graph: &mut Graph, x: i32, y: i32) -> NodeId {
        graph.add_node(
            Point::new(x, y),
            Slots::three_way([Direction::East, Direction::South, Direction::West]),
        )
    }

    #[test]
    fn arity_is_fixed_by_variant() {
        assert_eq!(Slots::one_way(Direction::South).arity(), 1);
        assert_eq!(
            Slots::three_way([Direction::North, Direction::East, Direction::South]).arity(),
            3
        );
        assert_eq!(Slots::four_way().arity(), 4);
    }

    #[test]
    fn missing_slot_is_none() {
        let mut graph = Graph::default();
        let a = tee(&mut graph, 0, 0);
        assert!(graph.slot(a, Direction::North).is_none());
        assert!(graph.slot(a, Direction::East).is_some());
        assert_eq!(graph.mark_visited(a, Direction::North), None);
    }

    #[test]
    fn link_writes_reciprocal_slots() {
        let mut graph = Graph::default();
        let a = tee(&mut graph, 0, 0);
        let b = tee(&mut graph, 3, 0);
        let s = graph.add_segment(vec![Point::new(0, 0), Point::new(3, 0)]);
        assert!(graph.link(a, Direction::East, b, Direction::West, s));

        let a_link = graph.slot(a, Direction::East).unwrap().link.unwrap();
        assert_eq!(a_link.node, b);
        assert_eq!(a_link.back, Direction::West);
        assert!(a_link.segment.forward);

        let b_link = graph.slot(b, Direction::West).unwrap().link.unwrap();
        assert_eq!(b_link.node, a);
        assert_eq!(b_link.back, Direction::East);
        assert!(!b_link.segment.forward);
    }

    #[test]
    fn link_fails_for_missing_slot() {
        let mut graph = Graph::default();
        let a = tee(&mut graph, 0, 0);
        let b = tee(&mut graph, 0, 3);
        let s = graph.add_segment(vec![Point::new(0, 0), Point::new(0, 3)]);
        assert!(!graph.link(a, Direction::South, b, Direction::North, s));
    }

    #[test]
    fn directed_points_read_both_ways() {
        let mut graph = Graph::default();
        let pts = vec![Point::new(0, 0), Point::new(2, 0), Point::new(2, 5)];
        let s = graph.add_segment(pts.clone());
        let forward = DirectedSegment {
            segment: s,
            forward: true,
        };
        assert_eq!(graph.points(forward).collect::<Vec<_>>(), pts);
        let mut reversed = pts;
        reversed.reverse();
        assert_eq!(
            graph.points(forward.reversed()).collect::<Vec<_>>(),
            reversed
        );
    }

    #[test]
    fn loop_links_slot_to_itself() {
        let mut graph = Graph::default();
        let a = graph.add_node(Point::new(2, 2), Slots::one_way(Direction::South));
        let s = graph.add_segment(vec![
            Point::new(2, 2),
            Point::new(2, 3),
            Point::new(3, 3),
            Point::new(3, 2),
            Point::new(2, 2),
        ]);
        assert!(graph.close_loop(a, Direction::South, s));
        let link = graph.slot(a, Direction::South).unwrap().link.unwrap();
        assert_eq!(link.node, a);
        assert!(link.segment.forward);
        assert!(!graph.close_loop(a, Direction::East, s));
    }

    #[test]
    fn mark_visited_reports_previous_state() {
        let mut graph = Graph::default();
        let a = graph.add_node(Point::new(1, 1), Slots::four_way());
        assert_eq!(graph.mark_visited(a, Direction::West), Some(false));
        assert_eq!(graph.mark_visited(a, Direction::West), Some(true));
        assert!(graph.slot(a, Direction::West).unwrap().visited);
        assert!(!graph.slot(a, Direction::East).unwrap().visited);
    }
}

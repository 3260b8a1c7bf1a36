//! Cardinal directions over the corner lattice.
//!
//! A boundary walk moves from corner to corner along unit pixel edges.
//! Every unit edge is flanked by one pixel on the walker's left and one
//! on its right; those two pixels are all the tracer ever samples.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// One of the four cardinal directions. `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// The outcome of a single [`Direction::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Corner reached.
    pub to: Point,
    /// Pixel on the walker's left of the edge just walked.
    pub left: Point,
    /// Pixel on the walker's right of the edge just walked.
    pub right: Point,
    /// Whether the edge just walked is vertical.
    pub vertical: bool,
}

impl Direction {
    /// All directions in clockwise order starting north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Quarter turn clockwise.
    #[must_use]
    pub const fn rotate_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Quarter turn counter-clockwise.
    #[must_use]
    pub const fn rotate_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
        }
    }

    /// Half turn.
    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Whether edges walked in this direction are vertical.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    /// Unit offset `(dx, dy)`.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Pixels `(left, right)` flanking the unit edge that leaves `corner`
    /// in this direction.
    #[must_use]
    pub const fn flanking_pixels(self, corner: Point) -> (Point, Point) {
        let Point { x, y } = corner;
        match self {
            Self::North => (Point::new(x - 1, y - 1), Point::new(x, y - 1)),
            Self::East => (Point::new(x, y - 1), Point::new(x, y)),
            Self::South => (Point::new(x, y), Point::new(x - 1, y)),
            Self::West => (Point::new(x - 1, y), Point::new(x - 1, y - 1)),
        }
    }

    /// The pixel east of a vertical edge leaving `corner` in this
    /// direction, or `None` for horizontal edges.
    #[must_use]
    pub const fn east_pixel(self, corner: Point) -> Option<Point> {
        match self {
            Self::South => Some(corner),
            Self::North => Some(Point::new(corner.x, corner.y - 1)),
            Self::East | Self::West => None,
        }
    }

    /// Advance one corner from `from`, reporting the flanking pixels of
    /// the edge walked.
    #[must_use]
    pub const fn step(self, from: Point) -> Step {
        let (dx, dy) = self.delta();
        let (left, right) = self.flanking_pixels(from);
        Step {
            to: from.offset(dx, dy),
            left,
            right,
            vertical: self.is_vertical(),
        }
    }
}

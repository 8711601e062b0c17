// THEORY:
// A `Region` is the spatial summary of one fire-colored shape: the axis-aligned
// box enclosing its outer contour. Like the other data containers in this
// crate it is a "dumb" value. It carries no contour points, no area, and no
// memory of earlier frames.
//
// Coordinates follow the half-open convention: `x1, y1` is the top-left pixel,
// `x2 = x1 + width` and `y2 = y1 + height` lie just past the shape. Regions from
// one frame are merged with `union`, producing the single box the annotator
// draws.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in frame pixels; `x2`/`y2` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Box of a `width x height` rectangle whose top-left pixel is `(x, y)`.
    pub fn from_rect(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// The smallest box covering both regions.
    pub fn union(&self, other: &Region) -> Region {
        Region {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Union of every region, or `None` for an empty input.
    pub fn union_all<'a>(regions: impl IntoIterator<Item = &'a Region>) -> Option<Region> {
        regions
            .into_iter()
            .copied()
            .reduce(|merged, region| merged.union(&region))
    }
}

//! Marker board structure and world coordinates.
//!
//! The board is a 4x4 grid of painted-square corners (ids `0..16`, row-major,
//! `x = id & 3`, `y = id >> 2`, y growing down in the structural frame) plus
//! four yellow corners (ids `16..20`) sitting at the centers of the diagonal
//! cells:
//!
//! ```text
//!  0  1  2  3      blue  blue  black black
//!  4  5  6  7      blue  blue  black black
//!  8  9 10 11      green green red   red
//! 12 13 14 15      green green red   red
//! ```

use groundmark_core::MarkerColor;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Identity of one known board corner (`0..20`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VertexId(u8);

/// Unit directions indexed by `((id & 4) >> 1) | (id & 1)` for grid ids and
/// by `id - 16` for yellow ids.
const OUTGOING: [(i8, i8); 4] = [(1, 0), (0, 1), (0, -1), (-1, 0)];

const COLOR_IDS: [[u8; 4]; MarkerColor::COUNT] = [
    [0, 1, 4, 5],
    [2, 3, 6, 7],
    [10, 11, 14, 15],
    [8, 9, 12, 13],
    [16, 17, 18, 19],
];

const YELLOW_GRID: [(f32, f32); 4] = [(0.5, 0.5), (2.5, 0.5), (0.5, 2.5), (2.5, 2.5)];

impl VertexId {
    pub const COUNT: usize = 20;

    pub fn new(id: u8) -> Option<Self> {
        ((id as usize) < Self::COUNT).then_some(Self(id))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_yellow(self) -> bool {
        self.0 >= 16
    }

    pub fn all() -> impl Iterator<Item = VertexId> {
        (0..Self::COUNT as u8).map(VertexId)
    }

    pub fn color(self) -> MarkerColor {
        MarkerColor::ALL
            .into_iter()
            .find(|c| COLOR_IDS[c.index()].contains(&self.0))
            .unwrap_or(MarkerColor::Yellow)
    }

    /// Position in structural grid units (pixel-like orientation).
    pub fn grid_position(self) -> Point2<f32> {
        if self.is_yellow() {
            let (x, y) = YELLOW_GRID[(self.0 - 16) as usize];
            Point2::new(x, y)
        } else {
            Point2::new((self.0 & 3) as f32, (self.0 >> 2) as f32)
        }
    }

    /// Direction of the edge leaving this corner when its marker contour is
    /// walked clockwise in the pixel frame.
    pub fn outgoing(self) -> Vector2<f32> {
        let reduced = if self.is_yellow() {
            (self.0 - 16) as usize
        } else {
            (((self.0 & 4) >> 1) | (self.0 & 1)) as usize
        };
        let (x, y) = OUTGOING[reduced];
        Vector2::new(x as f32, y as f32)
    }

    /// Direction of the edge arriving at this corner (outgoing turned left).
    pub fn incoming(self) -> Vector2<f32> {
        let out = self.outgoing();
        Vector2::new(out.y, -out.x)
    }
}

impl TryFrom<u8> for VertexId {
    type Error = BoardLayoutError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        VertexId::new(value).ok_or(BoardLayoutError::InvalidVertex(value))
    }
}

impl From<VertexId> for u8 {
    fn from(id: VertexId) -> u8 {
        id.0
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four vertex ids painted in `color`.
pub fn color_ids(color: MarkerColor) -> [VertexId; 4] {
    COLOR_IDS[color.index()].map(VertexId)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BoardLayoutError {
    #[error("vertex id {0} out of range (expected 0..20)")]
    InvalidVertex(u8),
    #[error("non-finite world coordinate for vertex {id}: ({x}, {y})")]
    NonFinite { id: u8, x: f64, y: f64 },
}

/// World coordinates (meters, y up) of every board vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoardLayoutSpec", into = "BoardLayoutSpec")]
pub struct BoardLayout {
    world: [[f64; 2]; VertexId::COUNT],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct BoardLayoutSpec {
    world: [[f64; 2]; VertexId::COUNT],
}

impl TryFrom<BoardLayoutSpec> for BoardLayout {
    type Error = BoardLayoutError;

    fn try_from(spec: BoardLayoutSpec) -> Result<Self, Self::Error> {
        BoardLayout::new(spec.world)
    }
}

impl From<BoardLayout> for BoardLayoutSpec {
    fn from(layout: BoardLayout) -> Self {
        Self {
            world: layout.world,
        }
    }
}

const DEFAULT_WORLD: [[f64; 2]; VertexId::COUNT] = [
    [-1.05, 1.05],
    [-0.10, 1.05],
    [0.10, 1.05],
    [1.05, 1.05],
    [-1.05, 0.10],
    [-0.10, 0.10],
    [0.10, 0.10],
    [1.05, 0.10],
    [-1.05, -0.10],
    [-0.10, -0.10],
    [0.10, -0.10],
    [1.05, -0.10],
    [-1.05, -1.05],
    [-0.10, -1.05],
    [0.10, -1.05],
    [1.05, -1.05],
    [-0.575, 0.575],
    [0.575, 0.575],
    [-0.575, -0.575],
    [0.575, -0.575],
];

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            world: DEFAULT_WORLD,
        }
    }
}

impl BoardLayout {
    pub fn new(world: [[f64; 2]; VertexId::COUNT]) -> Result<Self, BoardLayoutError> {
        for (i, [x, y]) in world.iter().enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(BoardLayoutError::NonFinite {
                    id: i as u8,
                    x: *x,
                    y: *y,
                });
            }
        }
        Ok(Self { world })
    }

    /// Copy of this layout with one vertex moved.
    pub fn with_vertex(mut self, id: VertexId, x: f64, y: f64) -> Result<Self, BoardLayoutError> {
        self.world[id.index()] = [x, y];
        Self::new(self.world)
    }

    #[inline]
    pub fn world(&self, id: VertexId) -> Point2<f64> {
        let [x, y] = self.world[id.index()];
        Point2::new(x, y)
    }
}

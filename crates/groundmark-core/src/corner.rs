use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::MarkerColor;

/// A detected marker corner.
///
/// `incoming` and `outgoing` are the unit directions of the two marker edges
/// meeting at the corner, ordered so that `incoming x outgoing > 0` in the
/// pixel frame (y down).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerPoint {
    pub position: Point2<i32>,
    pub incoming: Vector2<f32>,
    pub outgoing: Vector2<f32>,
}

impl CornerPoint {
    pub fn new(position: Point2<i32>, incoming: Vector2<f32>, outgoing: Vector2<f32>) -> Self {
        Self {
            position,
            incoming,
            outgoing,
        }
    }
}

/// Corners of one frame grouped by marker color.
///
/// The index of a corner within its color list identifies it for the rest of
/// the frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorCorners {
    lists: [Vec<CornerPoint>; MarkerColor::COUNT],
}

impl ColorCorners {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, color: MarkerColor) -> &[CornerPoint] {
        &self.lists[color.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, color: MarkerColor) -> &mut Vec<CornerPoint> {
        &mut self.lists[color.index()]
    }

    pub fn set(&mut self, color: MarkerColor, corners: Vec<CornerPoint>) {
        self.lists[color.index()] = corners;
    }

    pub fn push(&mut self, color: MarkerColor, corner: CornerPoint) {
        self.lists[color.index()].push(corner);
    }

    /// Total number of corners over all colors.
    pub fn total(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn clear(&mut self) {
        for l in &mut self.lists {
            l.clear();
        }
    }

    /// Iterate `(color, index_within_color, corner)` in color order.
    pub fn iter(&self) -> impl Iterator<Item = (MarkerColor, usize, &CornerPoint)> + '_ {
        MarkerColor::ALL.into_iter().flat_map(move |c| {
            self.lists[c.index()]
                .iter()
                .enumerate()
                .map(move |(i, p)| (c, i, p))
        })
    }
}

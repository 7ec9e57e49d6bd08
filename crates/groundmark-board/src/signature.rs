//! Quantized geometric signatures of corner pairs.
//!
//! A signature packs the relative orientation of two corners (their edge
//! directions and the vector joining them) into a small integer used to index
//! the identity tables. The same packing is used when the tables are built
//! from the board structure and when detected corners are looked up, so the
//! two always agree for noise-free input.

use groundmark_core::{cross, MarkerColor};
use nalgebra::Vector2;

/// Tolerance on dot/cross products of unit vectors (about 10 degrees).
pub const DOT_CROSS_EPS: f32 = 0.1736;

/// Two dot products closer than this are treated as equal by the yellow
/// tie-break.
pub const YELLOW_TIE_EPS: f32 = 0.1;

pub const GRID_TABLE_LEN: usize = 1024;
pub const YELLOW_TABLE_LEN: usize = 256;

/// Low bits marking the ambiguous neighboring-color configuration.
const AMBIGUOUS_LOW6: u16 = 0b10_01_01;

/// Edge directions at one end of a corner pair.
#[derive(Clone, Copy, Debug)]
pub struct PairEnd {
    pub incoming: Vector2<f32>,
    pub outgoing: Vector2<f32>,
}

/// Angle between two directions quantized to quarter turns (0, 90, 180, 270).
///
/// Directions that are neither near-parallel nor near-perpendicular map to 0.
pub fn angle_class(a: &Vector2<f32>, b: &Vector2<f32>) -> u16 {
    let dot = a.dot(b);
    let cr = cross(a, b);
    if cr.abs() < DOT_CROSS_EPS {
        if dot > 0.0 {
            0
        } else {
            2
        }
    } else if dot.abs() < DOT_CROSS_EPS {
        if cr > 0.0 {
            1
        } else {
            3
        }
    } else {
        0
    }
}

/// `1` for clearly positive, `2` for clearly negative, `0` otherwise.
///
/// Structural vectors have integer components so their products are either
/// zero or at least one in magnitude, which makes this agree with the exact
/// sign during table construction.
#[inline]
pub fn sign_class(x: f32) -> u16 {
    if x > DOT_CROSS_EPS {
        1
    } else if x < -DOT_CROSS_EPS {
        2
    } else {
        0
    }
}

/// Key into the grid table for a pair of corners of different non-yellow
/// colors. `w` points from the first corner to the second; it need not be
/// normalized.
pub fn grid_pair_key(
    c1: MarkerColor,
    first: &PairEnd,
    c2: MarkerColor,
    second: &PairEnd,
    w: &Vector2<f32>,
) -> u16 {
    let angle = angle_class(&first.outgoing, &second.outgoing);
    let mut key = ((c1.index() as u16) << 8)
        | ((c2.index() as u16) << 6)
        | (angle << 4)
        | (sign_class(cross(&first.outgoing, w)) << 2)
        | sign_class(cross(&first.incoming, w));

    let neighboring = (c1.index() + c2.index()) % 2 == 1;
    if neighboring && (key & 0b11_1111) == AMBIGUOUS_LOW6 {
        let r = -w;
        if second.outgoing.dot(w) > second.incoming.dot(&r) {
            key |= 0b11;
        }
    }
    key
}

/// Orientation part of a yellow/other key; the two low bits are left clear
/// for the tie-break. `w` must be normalized.
pub fn yellow_pair_base(
    c2: MarkerColor,
    yellow: &PairEnd,
    other: &PairEnd,
    w: &Vector2<f32>,
) -> u8 {
    let r = -w;
    let bit = |x: f32| (x > 0.0) as u8;
    ((c2.index() as u8) << 6)
        | (bit(cross(&yellow.incoming, w)) << 5)
        | (bit(cross(&yellow.outgoing, w)) << 4)
        | (bit(cross(&other.incoming, &r)) << 3)
        | (bit(cross(&other.outgoing, &r)) << 2)
}

/// How the non-yellow corner's edges face the joining line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YellowFacing {
    /// Both edges make about the same angle with the line.
    Symmetric,
    /// The outgoing edge is more aligned with the line.
    Outgoing,
    /// The incoming edge is more aligned with the line.
    Incoming,
}

pub fn yellow_facing(other: &PairEnd, w: &Vector2<f32>) -> YellowFacing {
    let r = -w;
    let d_out = other.outgoing.dot(w);
    let d_in = other.incoming.dot(&r);
    if (d_out - d_in).abs() < YELLOW_TIE_EPS {
        YellowFacing::Symmetric
    } else if d_out > d_in {
        YellowFacing::Outgoing
    } else {
        YellowFacing::Incoming
    }
}

/// Tie-break bits for a yellow/other key.
///
/// `near` tells, for the symmetric case, whether the two corners sit about
/// as close as the closest visible yellow/other pair.
pub fn yellow_tiebreak(facing: YellowFacing, near: bool) -> u8 {
    match facing {
        YellowFacing::Symmetric if near => 0b11,
        YellowFacing::Symmetric => 0b01,
        YellowFacing::Outgoing => 0b10,
        YellowFacing::Incoming => 0b00,
    }
}

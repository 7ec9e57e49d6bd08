//! Identity lookup tables.
//!
//! Every structurally possible pair of board corners is rendered in the
//! structural frame, its signature is computed and the pair is stored under
//! that key. At runtime the signature of a detected pair indexes straight
//! into the table.

use std::sync::OnceLock;

use groundmark_core::{normalize_or_none, MarkerColor};

use crate::layout::{color_ids, VertexId};
use crate::signature::{
    grid_pair_key, yellow_facing, yellow_pair_base, yellow_tiebreak, PairEnd, GRID_TABLE_LEN,
    YELLOW_TABLE_LEN,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// `(first, second)` vertex ids resolved for a corner pair.
pub type VertexPair = (VertexId, VertexId);

/// Yellow/other pairs that see each other symmetrically at about the minimal
/// yellow/other distance of this layout. They collide with a farther pair on
/// every other signature bit and are told apart by distance at runtime.
const NEAR_MINIMAL_YELLOW_PAIRS: [(u8, u8); 12] = [
    (16, 5),
    (17, 6),
    (18, 9),
    (19, 10),
    (19, 14),
    (18, 13),
    (17, 2),
    (16, 1),
    (19, 11),
    (18, 8),
    (17, 7),
    (16, 4),
];

/// Precomputed pair-to-identity lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityTables {
    grid: Vec<Option<VertexPair>>,
    yellow: Vec<Option<VertexPair>>,
}

static SHARED: OnceLock<IdentityTables> = OnceLock::new();

fn structural_end(id: VertexId) -> PairEnd {
    PairEnd {
        incoming: id.incoming(),
        outgoing: id.outgoing(),
    }
}

/// Grid-table key of a noise-free structural pair.
pub(crate) fn structural_grid_key(v1: VertexId, v2: VertexId) -> u16 {
    let w = v2.grid_position() - v1.grid_position();
    grid_pair_key(
        v1.color(),
        &structural_end(v1),
        v2.color(),
        &structural_end(v2),
        &w,
    )
}

/// Yellow-table base key and full key of a structural yellow/other pair.
pub(crate) fn structural_yellow_key(yellow: VertexId, other: VertexId) -> (u8, u8) {
    let raw = other.grid_position() - yellow.grid_position();
    let w = normalize_or_none(raw).unwrap_or(raw);
    let other_end = structural_end(other);
    let base = yellow_pair_base(other.color(), &structural_end(yellow), &other_end, &w);
    let near = NEAR_MINIMAL_YELLOW_PAIRS.contains(&(yellow.get(), other.get()));
    let tie = yellow_tiebreak(yellow_facing(&other_end, &w), near);
    (base, base | tie)
}

impl IdentityTables {
    /// Build both tables from the board structure.
    ///
    /// Later pairs overwrite earlier ones that share a key; iteration order
    /// is ascending over colors and then vertex ids.
    #[cfg_attr(feature = "tracing", instrument(level = "debug"))]
    pub fn build() -> Self {
        let mut grid = vec![None; GRID_TABLE_LEN];
        for c1 in MarkerColor::NON_YELLOW {
            for c2 in MarkerColor::NON_YELLOW {
                if c1 == c2 {
                    continue;
                }
                for v1 in color_ids(c1) {
                    for v2 in color_ids(c2) {
                        let key = structural_grid_key(v1, v2) as usize;
                        grid[key] = Some((v1, v2));
                    }
                }
            }
        }

        let mut yellow = vec![None; YELLOW_TABLE_LEN];
        for c2 in MarkerColor::NON_YELLOW {
            for v1 in color_ids(MarkerColor::Yellow) {
                for v2 in color_ids(c2) {
                    let (base, key) = structural_yellow_key(v1, v2);
                    let base = base as usize;
                    for slot in &mut yellow[base..base + 4] {
                        if slot.is_none() {
                            *slot = Some((v1, v2));
                        }
                    }
                    yellow[key as usize] = Some((v1, v2));
                }
            }
        }

        let tables = Self { grid, yellow };
        log::debug!(
            "identity tables built: {} grid slots, {} yellow slots",
            tables.grid_entries().count(),
            tables.yellow_entries().count()
        );
        tables
    }

    /// Process-wide tables, built on first use.
    pub fn shared() -> &'static IdentityTables {
        SHARED.get_or_init(IdentityTables::build)
    }

    #[inline]
    pub fn grid(&self, key: u16) -> Option<VertexPair> {
        self.grid.get(key as usize).copied().flatten()
    }

    #[inline]
    pub fn yellow(&self, key: u8) -> Option<VertexPair> {
        self.yellow.get(key as usize).copied().flatten()
    }

    /// Non-empty grid slots as `(key, pair)`.
    pub fn grid_entries(&self) -> impl Iterator<Item = (u16, VertexPair)> + '_ {
        self.grid
            .iter()
            .enumerate()
            .filter_map(|(k, e)| e.map(|p| (k as u16, p)))
    }

    /// Non-empty yellow slots as `(key, pair)`.
    pub fn yellow_entries(&self) -> impl Iterator<Item = (u8, VertexPair)> + '_ {
        self.yellow
            .iter()
            .enumerate()
            .filter_map(|(k, e)| e.map(|p| (k as u8, p)))
    }
}

/// `aa|bb|cc|dd|ee` rendering of a grid key.
pub fn format_grid_key(key: u16) -> String {
    format!(
        "{:02b}|{:02b}|{:02b}|{:02b}|{:02b}",
        (key >> 8) & 3,
        (key >> 6) & 3,
        (key >> 4) & 3,
        (key >> 2) & 3,
        key & 3
    )
}

/// `cc|i|o|i|o|tt` rendering of a yellow key.
pub fn format_yellow_key(key: u8) -> String {
    format!(
        "{:02b}|{}|{}|{}|{}|{:02b}",
        (key >> 6) & 3,
        (key >> 5) & 1,
        (key >> 4) & 1,
        (key >> 3) & 1,
        (key >> 2) & 1,
        key & 3
    )
}

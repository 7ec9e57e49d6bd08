//! Corner identification by pairwise voting.

use groundmark_core::{dist_sqr, normalize_or_none, ColorCorners, CornerPoint, MarkerColor};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::layout::VertexId;
use crate::signature::{grid_pair_key, yellow_facing, yellow_pair_base, yellow_tiebreak, PairEnd};
use crate::tables::{IdentityTables, VertexPair};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Frame-dependent inputs of the yellow tie-break.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdentifyParams {
    /// Yellow/other pairs closer than this (pixels) are ignored when looking
    /// for the minimal distance.
    pub min_corner_distance: f32,
    /// Minimal distance used when no yellow/other pair qualifies.
    pub fallback_min_distance: f32,
    /// `distance / min_distance` below this counts as "near".
    pub near_ratio: f32,
}

impl Default for IdentifyParams {
    fn default() -> Self {
        Self {
            min_corner_distance: 0.0,
            fallback_min_distance: f32::MAX,
            near_ratio: 1.3,
        }
    }
}

/// Votes collected by one detected corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    votes: [u16; VertexId::COUNT],
}

impl VoteTally {
    #[inline]
    pub fn add(&mut self, id: VertexId) {
        self.votes[id.index()] = self.votes[id.index()].saturating_add(1);
    }

    pub fn count(&self, id: VertexId) -> u16 {
        self.votes[id.index()]
    }

    /// The id with the strictly highest count; the lowest id wins ties.
    pub fn winner(&self) -> Option<VertexId> {
        let mut best: Option<(VertexId, u16)> = None;
        for id in VertexId::all() {
            let n = self.votes[id.index()];
            if n > best.map_or(0, |(_, m)| m) {
                best = Some((id, n));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Resolved vertex id per detected corner, indexed like [`ColorCorners`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    ids: [Vec<Option<VertexId>>; MarkerColor::COUNT],
}

impl Identification {
    pub fn get(&self, color: MarkerColor, index: usize) -> Option<VertexId> {
        self.ids[color.index()].get(index).copied().flatten()
    }

    pub fn ids(&self, color: MarkerColor) -> &[Option<VertexId>] {
        &self.ids[color.index()]
    }

    pub fn resolved_count(&self) -> usize {
        self.ids.iter().flatten().filter(|id| id.is_some()).count()
    }

    /// Iterate `(color, index, id)` over resolved corners in color order.
    pub fn resolved(&self) -> impl Iterator<Item = (MarkerColor, usize, VertexId)> + '_ {
        MarkerColor::ALL.into_iter().flat_map(move |c| {
            self.ids[c.index()]
                .iter()
                .enumerate()
                .filter_map(move |(i, id)| id.map(|id| (c, i, id)))
        })
    }
}

fn runtime_end(p: &CornerPoint) -> PairEnd {
    PairEnd {
        incoming: normalize_or_none(p.incoming).unwrap_or(p.incoming),
        outgoing: normalize_or_none(p.outgoing).unwrap_or(p.outgoing),
    }
}

fn joining(p1: &CornerPoint, p2: &CornerPoint) -> (Vector2<f32>, f32) {
    let raw = Vector2::new(
        (p2.position.x - p1.position.x) as f32,
        (p2.position.y - p1.position.y) as f32,
    );
    let len = raw.norm();
    (normalize_or_none(raw).unwrap_or(raw), len)
}

impl IdentityTables {
    /// Resolve a pair of corners of two different non-yellow colors.
    pub fn identify_grid_pair(
        &self,
        c1: MarkerColor,
        p1: &CornerPoint,
        c2: MarkerColor,
        p2: &CornerPoint,
    ) -> Option<VertexPair> {
        let (w, _) = joining(p1, p2);
        let key = grid_pair_key(c1, &runtime_end(p1), c2, &runtime_end(p2), &w);
        let res = self.grid(key);
        log::trace!(
            "grid pair {c1}@{:?} {c2}@{:?} key={} -> {:?}",
            p1.position,
            p2.position,
            crate::tables::format_grid_key(key),
            res
        );
        res
    }

    /// Resolve a yellow corner against a corner of color `c2`.
    ///
    /// `min_distance` is the smallest yellow/other pixel distance seen in the
    /// frame; pairs within `near_ratio` of it count as near.
    pub fn identify_yellow_pair(
        &self,
        yellow: &CornerPoint,
        c2: MarkerColor,
        other: &CornerPoint,
        min_distance: f32,
        near_ratio: f32,
    ) -> Option<VertexPair> {
        let (w, dist) = joining(yellow, other);
        let other_end = runtime_end(other);
        let base = yellow_pair_base(c2, &runtime_end(yellow), &other_end, &w);
        let near = dist / min_distance < near_ratio;
        let key = base | yellow_tiebreak(yellow_facing(&other_end, &w), near);
        let res = self.yellow(key);
        log::trace!(
            "yellow pair @{:?} {c2}@{:?} key={} dist={dist:.1} min={min_distance:.1} -> {:?}",
            yellow.position,
            other.position,
            crate::tables::format_yellow_key(key),
            res
        );
        res
    }
}

/// Smallest yellow/other distance that is at least `min_corner_distance`.
pub fn min_yellow_distance(corners: &ColorCorners, params: &IdentifyParams) -> f32 {
    let mut min = params.fallback_min_distance;
    for y in corners.get(MarkerColor::Yellow) {
        for c in MarkerColor::NON_YELLOW {
            for o in corners.get(c) {
                let len = (dist_sqr(&y.position, &o.position) as f32).sqrt();
                if len < min && len >= params.min_corner_distance {
                    min = len;
                }
            }
        }
    }
    min
}

/// Resolve every detected corner to a board vertex by pairwise voting.
///
/// Each pair of corners of different non-yellow colors, and each yellow
/// corner against every non-yellow corner, votes for one id on both ends.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(corners, tables), fields(corners = corners.total()))
)]
pub fn identify(
    corners: &ColorCorners,
    tables: &IdentityTables,
    params: &IdentifyParams,
) -> Identification {
    let mut tallies: [Vec<VoteTally>; MarkerColor::COUNT] =
        MarkerColor::ALL.map(|c| vec![VoteTally::default(); corners.get(c).len()]);
    let mut unresolved = 0usize;

    for (k, &c1) in MarkerColor::NON_YELLOW.iter().enumerate() {
        for &c2 in &MarkerColor::NON_YELLOW[k + 1..] {
            for (i, p1) in corners.get(c1).iter().enumerate() {
                for (j, p2) in corners.get(c2).iter().enumerate() {
                    match tables.identify_grid_pair(c1, p1, c2, p2) {
                        Some((a, b)) => {
                            tallies[c1.index()][i].add(a);
                            tallies[c2.index()][j].add(b);
                        }
                        None => unresolved += 1,
                    }
                }
            }
        }
    }

    let yellows = corners.get(MarkerColor::Yellow);
    if !yellows.is_empty() {
        let min_distance = min_yellow_distance(corners, params);
        for c2 in MarkerColor::NON_YELLOW {
            for (i, y) in yellows.iter().enumerate() {
                for (j, o) in corners.get(c2).iter().enumerate() {
                    match tables.identify_yellow_pair(y, c2, o, min_distance, params.near_ratio)
                    {
                        Some((a, b)) => {
                            tallies[MarkerColor::Yellow.index()][i].add(a);
                            tallies[c2.index()][j].add(b);
                        }
                        None => unresolved += 1,
                    }
                }
            }
        }
    }

    if unresolved > 0 {
        log::debug!("{unresolved} corner pairs did not match any board pair");
    }

    let ids = tallies.map(|list| list.iter().map(VoteTally::winner).collect::<Vec<_>>());
    let out = Identification { ids };
    log::debug!(
        "identified {}/{} corners",
        out.resolved_count(),
        corners.total()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{structural_grid_key, structural_yellow_key};
    use nalgebra::Point2;

    fn structural_corner(id: VertexId) -> CornerPoint {
        let g = id.grid_position();
        CornerPoint::new(
            Point2::new((50.0 + 100.0 * g.x) as i32, (50.0 + 100.0 * g.y) as i32),
            id.incoming(),
            id.outgoing(),
        )
    }

    #[test]
    fn tally_prefers_lowest_id_on_ties() {
        let mut t = VoteTally::default();
        assert_eq!(t.winner(), None);
        let a = VertexId::new(7).unwrap();
        let b = VertexId::new(3).unwrap();
        t.add(a);
        t.add(b);
        assert_eq!(t.winner(), Some(b));
        t.add(a);
        assert_eq!(t.winner(), Some(a));
        assert_eq!(t.count(a), 2);
    }

    #[test]
    fn structural_grid_pairs_resolve_to_table_entry() {
        let tables = IdentityTables::build();
        for (key, (a, b)) in tables.grid_entries() {
            assert_eq!(structural_grid_key(a, b), key);
            let got = tables.identify_grid_pair(
                a.color(),
                &structural_corner(a),
                b.color(),
                &structural_corner(b),
            );
            assert_eq!(got, Some((a, b)), "pair ({a}, {b})");
        }
    }

    #[test]
    fn structural_yellow_pairs_resolve_to_table_entry() {
        let tables = IdentityTables::build();
        for (key, (y, o)) in tables.yellow_entries() {
            if structural_yellow_key(y, o).1 != key {
                continue;
            }
            let py = structural_corner(y);
            let po = structural_corner(o);
            let dist = (dist_sqr(&py.position, &po.position) as f32).sqrt();
            // near pairs are compared against themselves, far ones against half
            let min_distance = if key & 0b11 == 0b11 { dist } else { dist / 2.0 };
            let got = tables.identify_yellow_pair(&py, o.color(), &po, min_distance, 1.3);
            assert_eq!(got, Some((y, o)), "pair ({y}, {o})");
        }
    }

    #[test]
    fn min_yellow_distance_skips_close_pairs() {
        let mut cc = ColorCorners::new();
        let dir = Vector2::new(1.0, 0.0);
        cc.push(
            MarkerColor::Yellow,
            CornerPoint::new(Point2::new(100, 100), dir, dir),
        );
        cc.push(
            MarkerColor::Blue,
            CornerPoint::new(Point2::new(103, 104), dir, dir),
        );
        cc.push(
            MarkerColor::Red,
            CornerPoint::new(Point2::new(130, 140), dir, dir),
        );
        let params = IdentifyParams {
            min_corner_distance: 10.0,
            fallback_min_distance: 1000.0,
            near_ratio: 1.3,
        };
        assert!((min_yellow_distance(&cc, &params) - 50.0).abs() < 1e-4);

        let far = IdentifyParams {
            min_corner_distance: 60.0,
            ..params
        };
        assert_eq!(min_yellow_distance(&cc, &far), 1000.0);
    }

    #[test]
    fn empty_input_gives_empty_identification() {
        let out = identify(
            &ColorCorners::new(),
            IdentityTables::shared(),
            &IdentifyParams::default(),
        );
        assert_eq!(out.resolved_count(), 0);
    }
}

//! Marker corner extraction from binary color masks.
//!
//! Every mask polygon is cut into long straight segments; consecutive
//! non-parallel segments meet at a corner candidate. The two borders of a
//! painted stripe (outer contour and hole contour) produce candidates a few
//! pixels apart; those are merged, and merged candidates are preferred over
//! single ones.

use groundmark_core::{
    cross, dist_sqr, normalize_or_none, ColorCorners, CornerPoint, MarkerColor,
};
use image::GrayImage;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::contour::{mask_polygons, Polygon};
use crate::profile::{DeviceBounds, DeviceProfile, ExtractorScale, ScaleFractions};
use crate::segment::ColorSegmenter;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Corner extractor parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorParams {
    /// Douglas-Peucker tolerance in pixels.
    pub polygon_epsilon: f64,
    /// Consecutive segments with `|u x v|` below this are treated as one
    /// straight edge.
    pub parallel_cross_max: f32,
    /// Line intersection is rejected when `|u x v|` is below this.
    pub intersection_min_cross: f32,
    /// Corners must lie this many pixels inside the valid bounds.
    pub border_margin: i32,
    /// Unmerged candidates are dropped once at least this many merged ones
    /// exist in a mask.
    pub min_reliable: usize,
    /// Fraction of the valid extent trimmed on each side to get the
    /// reasonable bounds.
    pub reasonable_border_frac: f32,
    /// Edge corners are trimmed only while more than this many remain.
    pub min_corners_after_trim: usize,
    pub scale: ScaleFractions,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            polygon_epsilon: 10.0,
            parallel_cross_max: 0.86,
            intersection_min_cross: 0.15,
            border_margin: 5,
            min_reliable: 3,
            reasonable_border_frac: 0.025,
            min_corners_after_trim: 3,
            scale: ScaleFractions::default(),
        }
    }
}

/// Corner candidate before deduplication.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerCandidate {
    pub position: Point2<i32>,
    pub incoming: Vector2<f32>,
    pub outgoing: Vector2<f32>,
    pub merged: bool,
}

impl CornerCandidate {
    fn perpendicularity(&self) -> f32 {
        self.incoming.dot(&self.outgoing).abs()
    }
}

/// Segment as a pair of vertex indices into its polygon.
type Segment = (usize, usize);

/// Corners and (optionally) polygons of one mask.
#[derive(Clone, Debug, Default)]
pub struct MaskCorners {
    pub corners: Vec<CornerPoint>,
    pub polygons: Vec<Polygon>,
}

/// Corners of all five masks of a frame.
#[derive(Clone, Debug, Default)]
pub struct FrameCorners {
    pub corners: ColorCorners,
    /// Simplified polygons per color, filled only when requested.
    pub polygons: [Vec<Polygon>; MarkerColor::COUNT],
    /// Corners removed for lying outside the reasonable bounds.
    pub trimmed: usize,
}

/// Device-bound corner extractor.
#[derive(Clone, Debug)]
pub struct CornerExtractor {
    params: ExtractorParams,
    bounds: DeviceBounds,
    scale: ExtractorScale,
}

fn direction(poly: &Polygon, seg: Segment) -> Vector2<f32> {
    let d = poly[seg.1] - poly[seg.0];
    let v = Vector2::new(d.x as f32, d.y as f32);
    normalize_or_none(v).unwrap_or(v)
}

impl CornerExtractor {
    pub fn new(params: ExtractorParams, profile: &DeviceProfile) -> Self {
        Self {
            params,
            bounds: profile.bounds(params.reasonable_border_frac),
            scale: profile.scale(&params.scale),
        }
    }

    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    pub fn bounds(&self) -> &DeviceBounds {
        &self.bounds
    }

    pub fn scale(&self) -> &ExtractorScale {
        &self.scale
    }

    /// Long segments of a polygon, including the closing one. Polygons with
    /// fewer than two long segments yield nothing.
    fn long_segments(&self, poly: &Polygon) -> Vec<Segment> {
        let n = poly.len();
        if n < 3 {
            return Vec::new();
        }
        let mut segs = Vec::new();
        let mut last = n - 1;
        for j in 0..n {
            if dist_sqr(&poly[last], &poly[j]) >= self.scale.min_segment_len_sqr {
                segs.push((last, j));
            }
            last = j;
        }
        if segs.len() < 2 {
            segs.clear();
        }
        segs
    }

    /// Intersect the incoming segment `ab` with the outgoing segment `cd`.
    fn intersect(&self, poly: &Polygon, ab: Segment, cd: Segment) -> Option<CornerCandidate> {
        let a = poly[ab.0];
        let u = direction(poly, ab);
        let v = direction(poly, cd);
        let denom = cross(&u, &v);
        if denom.abs() < self.params.intersection_min_cross {
            return None;
        }
        let c = poly[cd.0];
        let w = Vector2::new((a.x - c.x) as f32, (a.y - c.y) as f32);
        let t = cross(&v, &w) / denom;
        let position = Point2::new(
            a.x + (0.5 + t * u.x) as i32,
            a.y + (0.5 + t * u.y) as i32,
        );
        Some(CornerCandidate {
            position,
            incoming: u,
            outgoing: v,
            merged: false,
        })
    }

    /// Corner candidates of one polygon, oriented so that
    /// `incoming x outgoing > 0`.
    pub fn polygon_candidates(&self, poly: &Polygon) -> Vec<CornerCandidate> {
        let segs = self.long_segments(poly);
        let Some(&first_last) = segs.last() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut prev = first_last;
        for &cur in &segs {
            let c = cross(&direction(poly, prev), &direction(poly, cur));
            if c.abs() >= self.params.parallel_cross_max {
                let (incoming, outgoing) = if c > 0.0 {
                    (prev, cur)
                } else {
                    ((cur.1, cur.0), (prev.1, prev.0))
                };
                if let Some(cand) = self.intersect(poly, incoming, outgoing) {
                    let p = cand.position;
                    if self
                        .bounds
                        .is_inside_valid(p.x, p.y, self.params.border_margin)
                    {
                        out.push(cand);
                    }
                }
            }
            prev = cur;
        }
        out
    }

    /// Corners of one binary mask.
    pub fn extract(&self, mask: &GrayImage, keep_polygons: bool) -> MaskCorners {
        let polygons = mask_polygons(mask, self.params.polygon_epsilon);
        let mut cands: Vec<CornerCandidate> = polygons
            .iter()
            .flat_map(|p| self.polygon_candidates(p))
            .collect();
        let raw = cands.len();
        merge_duplicates(
            &mut cands,
            self.scale.merge_distance_sqr,
            self.params.min_reliable,
        );
        log::debug!(
            "{} polygons, {raw} candidates, {} corners",
            polygons.len(),
            cands.len()
        );
        MaskCorners {
            corners: cands
                .into_iter()
                .map(|c| CornerPoint::new(c.position, c.incoming, c.outgoing))
                .collect(),
            polygons: if keep_polygons { polygons } else { Vec::new() },
        }
    }

    /// Extract corners from all five masks of `segmenter` and drop edge
    /// corners.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, segmenter))
    )]
    pub fn extract_frame(&self, segmenter: &ColorSegmenter, keep_polygons: bool) -> FrameCorners {
        let mut out = FrameCorners::default();
        for color in MarkerColor::ALL {
            log::debug!("extracting {color} corners");
            let mc = self.extract(segmenter.mask(color), keep_polygons);
            out.corners.set(color, mc.corners);
            out.polygons[color.index()] = mc.polygons;
        }
        out.trimmed = self.trim_unreasonable(&mut out.corners);
        out
    }

    /// Remove non-yellow corners outside the reasonable bounds while more
    /// than `min_corners_after_trim` corners remain. Returns how many were
    /// removed.
    pub fn trim_unreasonable(&self, corners: &mut ColorCorners) -> usize {
        let keep = self.params.min_corners_after_trim;
        let mut total = corners.total();
        let mut removed = 0;
        'colors: for color in MarkerColor::NON_YELLOW {
            let list = corners.get_mut(color);
            let mut j = 0;
            while j < list.len() {
                if total <= keep {
                    break 'colors;
                }
                let p = list[j].position;
                if self.bounds.is_reasonable(p.x, p.y) {
                    j += 1;
                } else {
                    log::debug!("dropping {color} corner {p:?} near the frame edge");
                    list.remove(j);
                    total -= 1;
                    removed += 1;
                }
            }
        }
        removed
    }
}

/// Merge candidates that lie within `merge_distance_sqr` of each other.
///
/// Each candidate is absorbed by the first later one close enough: that one
/// moves to the midpoint, keeps whichever direction pair is closer to
/// perpendicular and is flagged merged. When at least `min_reliable` merged
/// candidates remain, the unmerged ones are dropped.
pub fn merge_duplicates(
    cands: &mut Vec<CornerCandidate>,
    merge_distance_sqr: i64,
    min_reliable: usize,
) {
    let mut i = 0;
    while i < cands.len() {
        let ci = cands[i];
        let partner = (i + 1..cands.len())
            .find(|&j| dist_sqr(&ci.position, &cands[j].position) <= merge_distance_sqr);
        match partner {
            Some(j) => {
                let cj = &mut cands[j];
                cj.position = Point2::new(
                    midpoint(ci.position.x, cj.position.x),
                    midpoint(ci.position.y, cj.position.y),
                );
                if ci.perpendicularity() < cj.perpendicularity() {
                    cj.incoming = ci.incoming;
                    cj.outgoing = ci.outgoing;
                }
                cj.merged = true;
                cands.remove(i);
            }
            None => i += 1,
        }
    }

    let reliable = cands.iter().filter(|c| c.merged).count();
    if reliable >= min_reliable {
        cands.retain(|c| c.merged);
    }
}

#[inline]
fn midpoint(a: i32, b: i32) -> i32 {
    ((a as f64 + b as f64 + 0.5) / 2.0).floor() as i32
}

//! Contour tracing and polygon simplification.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use nalgebra::Point2;

/// Closed polygon, first vertex not repeated at the end.
pub type Polygon = Vec<Point2<i32>>;

/// Trace every border (outer and hole) of the set pixels in `mask` and
/// simplify it with Douglas-Peucker at tolerance `epsilon` pixels.
///
/// Polygons with fewer than three distinct vertices are dropped.
pub fn mask_polygons(mask: &GrayImage, epsilon: f64) -> Vec<Polygon> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter_map(|contour| {
            let poly = simplify_closed(&contour.points, epsilon);
            (poly.len() >= 3).then_some(poly)
        })
        .collect()
}

fn farthest_from(points: &[Point<i32>], from: Point<i32>) -> usize {
    let mut best = (0usize, -1i64);
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - from.x) as i64;
        let dy = (p.y - from.y) as i64;
        let d = dx * dx + dy * dy;
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// Simplify a closed curve by splitting it at two mutually far points and
/// running Douglas-Peucker on both open halves.
fn simplify_closed(points: &[Point<i32>], epsilon: f64) -> Polygon {
    let n = points.len();
    if n < 3 || epsilon <= 0.0 {
        return dedup_closed(points.iter().copied());
    }
    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    let rotated: Vec<Point<i32>> = points[a..].iter().chain(&points[..a]).copied().collect();
    let k = (b + n - a) % n;
    if k == 0 {
        return dedup_closed(rotated.into_iter());
    }

    let mut first = approximate_polygon_dp(&rotated[..=k], epsilon, false);
    let mut closing = rotated[k..].to_vec();
    closing.push(rotated[0]);
    let second = approximate_polygon_dp(&closing, epsilon, false);
    first.pop();
    first.extend(second);
    dedup_closed(first.into_iter())
}

fn dedup_closed(points: impl Iterator<Item = Point<i32>>) -> Polygon {
    let mut out: Polygon = Vec::new();
    for p in points {
        let q = Point2::new(p.x, p.y);
        if out.last() != Some(&q) {
            out.push(q);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_rect(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if x >= x0 && x <= x1 && y >= y0 && y <= y1 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn rectangle_simplifies_to_four_vertices() {
        let mask = filled_rect(200, 150, 40, 30, 159, 119);
        let polys = mask_polygons(&mask, 10.0);
        assert_eq!(polys.len(), 1);
        let poly = &polys[0];
        assert_eq!(poly.len(), 4, "{poly:?}");
        for corner in [(40, 30), (159, 30), (159, 119), (40, 119)] {
            assert!(
                poly.contains(&Point2::new(corner.0, corner.1)),
                "missing {corner:?} in {poly:?}"
            );
        }
    }

    #[test]
    fn empty_mask_has_no_polygons() {
        let mask = GrayImage::new(50, 50);
        assert!(mask_polygons(&mask, 10.0).is_empty());
    }

    #[test]
    fn tiny_blobs_are_dropped() {
        let mask = filled_rect(50, 50, 10, 10, 11, 10);
        assert!(mask_polygons(&mask, 10.0).is_empty());
    }
}

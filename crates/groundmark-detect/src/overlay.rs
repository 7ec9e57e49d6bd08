//! Debug drawing of polygons and corners on top of a visualization image.

use groundmark_core::{ColorCorners, MarkerColor};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};

use crate::contour::Polygon;

/// Drawing color per marker color.
pub fn overlay_color(color: MarkerColor) -> Rgb<u8> {
    match color {
        MarkerColor::Blue => Rgb([64, 128, 255]),
        MarkerColor::Black => Rgb([255, 255, 255]),
        MarkerColor::Red => Rgb([255, 64, 64]),
        MarkerColor::Green => Rgb([64, 255, 64]),
        MarkerColor::Yellow => Rgb([255, 255, 0]),
    }
}

/// Draw closed polygon outlines.
pub fn draw_polygons(canvas: &mut RgbImage, polygons: &[Polygon], color: Rgb<u8>) {
    for poly in polygons {
        let n = poly.len();
        for i in 0..n {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            draw_line_segment_mut(
                canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            );
        }
    }
}

/// Mark every corner with a cross and a short stroke along each direction.
pub fn draw_corners(canvas: &mut RgbImage, corners: &ColorCorners, stroke: f32) {
    for (color, _, c) in corners.iter() {
        let rgb = overlay_color(color);
        let (x, y) = (c.position.x as f32, c.position.y as f32);
        draw_cross_mut(canvas, rgb, c.position.x, c.position.y);
        draw_line_segment_mut(
            canvas,
            (x, y),
            (x - c.incoming.x * stroke, y - c.incoming.y * stroke),
            rgb,
        );
        draw_line_segment_mut(
            canvas,
            (x, y),
            (x + c.outgoing.x * stroke, y + c.outgoing.y * stroke),
            rgb,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundmark_core::CornerPoint;
    use nalgebra::{Point2, Vector2};

    #[test]
    fn draws_polygon_edges() {
        let mut img = RgbImage::new(20, 20);
        let square = vec![
            Point2::new(2, 2),
            Point2::new(12, 2),
            Point2::new(12, 12),
            Point2::new(2, 12),
        ];
        draw_polygons(&mut img, &[square], Rgb([1, 2, 3]));
        assert_eq!(img.get_pixel(7, 2), &Rgb([1, 2, 3]));
        assert_eq!(img.get_pixel(2, 7), &Rgb([1, 2, 3]));
        assert_eq!(img.get_pixel(7, 7), &Rgb([0, 0, 0]));
    }

    #[test]
    fn marks_corner_positions() {
        let mut img = RgbImage::new(30, 30);
        let mut corners = ColorCorners::new();
        corners.push(
            MarkerColor::Red,
            CornerPoint::new(Point2::new(15, 15), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)),
        );
        draw_corners(&mut img, &corners, 8.0);
        let red = overlay_color(MarkerColor::Red);
        assert_eq!(img.get_pixel(15, 15), &red);
        assert_eq!(img.get_pixel(15, 22), &red);
        assert_eq!(img.get_pixel(9, 15), &red);
    }
}

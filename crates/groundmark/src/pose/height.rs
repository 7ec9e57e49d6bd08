use nalgebra::distance;

use super::IdentifiedCorner;
use crate::camera::CameraModel;

/// Height samples from every identified pair at least `min_pixel_distance`
/// apart in the image: `f * world_dist / (pixel_dist * pixel_size)`.
pub fn height_samples(
    corners: &[IdentifiedCorner],
    camera: &CameraModel,
    min_pixel_distance: f64,
) -> Vec<f64> {
    let mut out = Vec::new();
    for (i, a) in corners.iter().enumerate() {
        for b in &corners[i + 1..] {
            let pixel_dist = distance(&a.pixel.cast::<f64>(), &b.pixel.cast::<f64>());
            if pixel_dist < min_pixel_distance || pixel_dist <= 0.0 {
                log::trace!("height pair {}-{} too close ({pixel_dist:.1} px)", a.id, b.id);
                continue;
            }
            let world_dist = distance(&a.world, &b.world);
            out.push(camera.focal_length * world_dist / (pixel_dist * camera.pixel_size));
        }
    }
    out
}

/// Mean height after dropping samples that deviate from the mean of the
/// others by more than `tolerance` (relative) while at least three remain.
pub fn estimate_height(samples: &[f64], tolerance: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut alive = samples.to_vec();
    let mut sum: f64 = alive.iter().sum();

    while alive.len() >= 3 {
        let rest = (alive.len() - 1) as f64;
        let mut worst = (0usize, 0.0f64);
        for (i, &h) in alive.iter().enumerate() {
            let others = (sum - h) / rest;
            if others > 1e-6 {
                let rate = (h - others).abs() / others;
                if rate > worst.1 {
                    worst = (i, rate);
                }
            }
        }
        if worst.1 <= tolerance {
            break;
        }
        let dropped = alive.swap_remove(worst.0);
        log::debug!("dropping height outlier {dropped:.3} ({:.0}% off)", worst.1 * 100.0);
        sum -= dropped;
    }

    Some(sum / alive.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use groundmark_board::VertexId;
    use groundmark_core::MarkerColor;
    use nalgebra::Point2;

    fn camera() -> CameraModel {
        CameraModel {
            focal_length: 0.0067,
            pixel_size: 0.000_007_5,
            center: Point2::new(0, 0),
        }
    }

    fn corner(id: u8, pixel: (i32, i32), world: (f64, f64)) -> IdentifiedCorner {
        IdentifiedCorner {
            color: MarkerColor::Blue,
            index: 0,
            id: VertexId::new(id).unwrap(),
            pixel: Point2::new(pixel.0, pixel.1),
            world: Point2::new(world.0, world.1),
        }
    }

    #[test]
    fn pinhole_height_formula() {
        let corners = [corner(0, (0, 0), (0.0, 0.0)), corner(1, (100, 0), (2.0, 0.0))];
        let samples = height_samples(&corners, &camera(), 10.0);
        assert_eq!(samples.len(), 1);
        assert_relative_eq!(samples[0], 0.0067 * 2.0 / (100.0 * 0.000_007_5), epsilon = 1e-9);
        assert_relative_eq!(estimate_height(&samples, 0.15).unwrap(), samples[0]);
    }

    #[test]
    fn close_pairs_are_skipped() {
        let corners = [corner(0, (0, 0), (0.0, 0.0)), corner(1, (5, 0), (2.0, 0.0))];
        assert!(height_samples(&corners, &camera(), 10.0).is_empty());
        assert_eq!(estimate_height(&[], 0.15), None);
    }

    #[test]
    fn drops_relative_outliers() {
        let h = estimate_height(&[2.0, 2.1, 1.9, 4.0], 0.15).unwrap();
        assert_relative_eq!(h, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn converged_heights_are_untouched() {
        let samples = [2.0, 2.1, 1.95, 2.05];
        let h = estimate_height(&samples, 0.15).unwrap();
        assert_relative_eq!(h, samples.iter().sum::<f64>() / 4.0, epsilon = 1e-12);
    }
}

use nalgebra::{Point2, Rotation2, Vector2};

use super::IdentifiedCorner;
use crate::camera::CameraModel;

/// One camera position estimate per identified corner.
///
/// The vector from the corner's pixel to the optical center is scaled to the
/// ground by `height / focal_length`, rotated by `yaw` and added to the
/// corner's world position.
pub fn position_estimates(
    corners: &[IdentifiedCorner],
    camera: &CameraModel,
    yaw: f64,
    height: f64,
) -> Vec<Point2<f64>> {
    let rot = Rotation2::new(yaw);
    let scale = height / camera.focal_length;
    corners
        .iter()
        .map(|c| c.world + rot * camera.sensor_offset(&c.pixel) * scale)
        .collect()
}

/// Mean of `estimates` after dropping the one farthest from the mean of the
/// others while that distance exceeds `tolerance` and at least three remain.
pub fn estimate_position(estimates: &[Point2<f64>], tolerance: f64) -> Option<Point2<f64>> {
    if estimates.is_empty() {
        return None;
    }
    let mut alive = estimates.to_vec();
    let mut sum: Vector2<f64> = alive.iter().map(|p| p.coords).sum();

    while alive.len() >= 3 {
        let rest = (alive.len() - 1) as f64;
        let mut worst = (0usize, 0.0f64);
        for (i, p) in alive.iter().enumerate() {
            let others = (sum - p.coords) / rest;
            let err = (p.coords - others).norm();
            if err > worst.1 {
                worst = (i, err);
            }
        }
        if worst.1 <= tolerance {
            break;
        }
        let dropped = alive.remove(worst.0);
        log::debug!(
            "dropping position outlier ({:.3}, {:.3}), {:.3} m off",
            dropped.x,
            dropped.y,
            worst.1
        );
        sum -= dropped.coords;
    }

    Some(Point2::from(sum / alive.len() as f64))
}

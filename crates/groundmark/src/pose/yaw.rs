use groundmark_core::wrap_angle;

use super::IdentifiedCorner;

/// One heading sample per identified pair of different colors: the angle of
/// the pair on the ground minus its angle in the image (image y flipped).
pub fn yaw_samples(corners: &[IdentifiedCorner]) -> Vec<f64> {
    let mut out = Vec::new();
    for (i, a) in corners.iter().enumerate() {
        for b in &corners[i + 1..] {
            if a.color == b.color {
                continue;
            }
            let cam_x = (b.pixel.x - a.pixel.x) as f64;
            let cam_y = -((b.pixel.y - a.pixel.y) as f64);
            let ground = b.world - a.world;
            let sample = ground.y.atan2(ground.x) - cam_y.atan2(cam_x);
            log::trace!("yaw sample {}-{}: {:.2} deg", a.id, b.id, sample.to_degrees());
            out.push(sample);
        }
    }
    out
}

/// Circular mean of `samples` after dropping outliers.
///
/// While at least three samples remain, the one with the largest wrapped
/// distance to the circular mean of the others is dropped if that distance
/// exceeds `tolerance` (radians). A single sample is returned wrapped to
/// `(-pi, pi]`; no samples give `None`.
pub fn estimate_yaw(samples: &[f64], tolerance: f64) -> Option<f64> {
    match samples {
        [] => return None,
        [only] => return Some(wrap_angle(*only)),
        _ => {}
    }

    let mut alive = samples.to_vec();
    let mut sum_cos: f64 = alive.iter().map(|s| s.cos()).sum();
    let mut sum_sin: f64 = alive.iter().map(|s| s.sin()).sum();

    while alive.len() >= 3 {
        let rest = (alive.len() - 1) as f64;
        let mut worst = (0usize, 0.0f64);
        for (i, s) in alive.iter().enumerate() {
            let others = ((sum_sin - s.sin()) / rest).atan2((sum_cos - s.cos()) / rest);
            let err = wrap_angle(s - others).abs();
            if err > worst.1 {
                worst = (i, err);
            }
        }
        if worst.1 <= tolerance {
            break;
        }
        let dropped = alive.swap_remove(worst.0);
        log::debug!(
            "dropping yaw outlier {:.2} deg ({:.2} deg off)",
            dropped.to_degrees(),
            worst.1.to_degrees()
        );
        sum_cos -= dropped.cos();
        sum_sin -= dropped.sin();
    }

    Some(sum_sin.atan2(sum_cos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use groundmark_board::VertexId;
    use groundmark_core::MarkerColor;
    use nalgebra::Point2;
    use std::f64::consts::PI;

    fn corner(color: MarkerColor, id: u8, pixel: (i32, i32), world: (f64, f64)) -> IdentifiedCorner {
        IdentifiedCorner {
            color,
            index: 0,
            id: VertexId::new(id).unwrap(),
            pixel: Point2::new(pixel.0, pixel.1),
            world: Point2::new(world.0, world.1),
        }
    }

    #[test]
    fn single_pair_gives_its_angle() {
        // ground direction +x, image direction up (-y in pixels) -> 90 deg in
        // the flipped frame; yaw = 0 - 90 deg
        let corners = [
            corner(MarkerColor::Blue, 5, (100, 200), (0.0, 0.0)),
            corner(MarkerColor::Red, 10, (100, 100), (1.0, 0.0)),
        ];
        let samples = yaw_samples(&corners);
        assert_eq!(samples.len(), 1);
        assert_relative_eq!(estimate_yaw(&samples, 0.1).unwrap(), -PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn same_color_pairs_give_no_sample() {
        let corners = [
            corner(MarkerColor::Blue, 0, (0, 0), (0.0, 0.0)),
            corner(MarkerColor::Blue, 1, (10, 0), (1.0, 0.0)),
        ];
        assert!(yaw_samples(&corners).is_empty());
        assert_eq!(estimate_yaw(&[], 0.1), None);
    }

    #[test]
    fn single_sample_is_wrapped() {
        let yaw = estimate_yaw(&[1.5 * PI], 0.1).unwrap();
        assert_relative_eq!(yaw, -0.5 * PI, epsilon = 1e-12);
    }

    #[test]
    fn converged_samples_keep_their_mean() {
        let samples = [0.10, 0.12, 0.08, 0.11, 0.09];
        let yaw = estimate_yaw(&samples, 10f64.to_radians()).unwrap();
        assert_relative_eq!(yaw, 0.10, epsilon = 1e-4);
    }

    #[test]
    fn drops_outlier_and_handles_wraparound() {
        let samples = [PI - 0.01, -PI + 0.01, PI, 1.0];
        let yaw = estimate_yaw(&samples, 10f64.to_radians()).unwrap();
        assert!(wrap_angle(yaw - PI).abs() < 1e-6, "yaw = {yaw}");
    }
}

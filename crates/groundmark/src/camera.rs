//! Pinhole camera constants and the per-device camera model.

use groundmark_detect::{DeviceBounds, DeviceProfile};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Camera constants. Focal length and pixel size are supplied, not estimated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Focal length in meters.
    pub focal_length: f64,
    /// Physical size of one sensor pixel in meters.
    pub pixel_size: f64,
    /// Usable width (pixels) at which `pixel_size` holds. Frames with a
    /// different usable width rescale the pixel size accordingly.
    pub reference_width: Option<f64>,
    /// Optical center in pixels; defaults to the screen center.
    pub optical_center: Option<[i32; 2]>,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            focal_length: 0.0067,
            pixel_size: 0.000_007_5,
            reference_width: Some(1185.0),
            optical_center: None,
        }
    }
}

impl CameraParams {
    /// Camera model for one device.
    pub fn model(&self, profile: &DeviceProfile, bounds: &DeviceBounds) -> CameraModel {
        let pixel_size = match self.reference_width {
            Some(reference) => self.pixel_size * reference / bounds.valid_width() as f64,
            None => self.pixel_size,
        };
        let center = match self.optical_center {
            Some([x, y]) => Point2::new(x, y),
            None => {
                let (x, y) = profile.center();
                Point2::new(x, y)
            }
        };
        CameraModel {
            focal_length: self.focal_length,
            pixel_size,
            center,
        }
    }
}

/// Resolved camera model for the current device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    pub focal_length: f64,
    pub pixel_size: f64,
    pub center: Point2<i32>,
}

impl CameraModel {
    /// Vector from pixel `p` to the optical center on the sensor, in meters,
    /// with y pointing up.
    pub fn sensor_offset(&self, p: &Point2<i32>) -> Vector2<f64> {
        Vector2::new(
            (self.center.x - p.x) as f64 * self.pixel_size,
            -((self.center.y - p.y) as f64) * self.pixel_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_width_rescales_pixel_size() {
        let profile = DeviceProfile::builtin(2).unwrap();
        let bounds = profile.bounds(0.025);
        let model = CameraParams::default().model(&profile, &bounds);
        // device 2 is the reference device
        assert_relative_eq!(model.pixel_size, 0.000_007_5, epsilon = 1e-12);
        assert_eq!(model.center, Point2::new(698, 333));

        let profile = DeviceProfile::builtin(1).unwrap();
        let model = CameraParams::default().model(&profile, &profile.bounds(0.025));
        assert_relative_eq!(model.pixel_size, 0.000_007_5 * 1185.0 / 1770.0, epsilon = 1e-12);
    }

    #[test]
    fn explicit_center_and_plain_pixel_size() {
        let params = CameraParams {
            reference_width: None,
            optical_center: Some([10, 20]),
            ..CameraParams::default()
        };
        let profile = DeviceProfile::new(100, 50, 0, 0).unwrap();
        let model = params.model(&profile, &profile.bounds(0.0));
        assert_eq!(model.pixel_size, 0.000_007_5);
        assert_eq!(model.center, Point2::new(10, 20));

        let off = model.sensor_offset(&Point2::new(12, 16));
        assert_relative_eq!(off.x, -2.0 * 0.000_007_5, epsilon = 1e-15);
        assert_relative_eq!(off.y, -4.0 * 0.000_007_5, epsilon = 1e-15);
    }
}

//! Camera pose from identified ground corners.
//!
//! The estimate is cascaded: yaw first (from the direction between pairs of
//! corners of different colors), then height (from pairwise distances), then
//! the ground position (one estimate per corner). Every stage drops outliers
//! against the mean of the remaining samples, and when filters are supplied
//! each stage's result is filtered before the next stage consumes it.

mod height;
mod position;
mod yaw;

use groundmark_board::{BoardLayout, Identification, VertexId};
use groundmark_core::{ColorCorners, MarkerColor};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::camera::CameraModel;
use crate::error::LocalizeError;
use crate::filter::PoseFilters;

pub use height::{estimate_height, height_samples};
pub use position::{estimate_position, position_estimates};
pub use yaw::{estimate_yaw, yaw_samples};

/// Camera pose above the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    /// Height above the ground in meters.
    pub height: f64,
    /// Heading in radians.
    pub yaw: f64,
}

impl Pose {
    /// Flattened value reported when no pose is available.
    pub const UNKNOWN_SENTINEL: [f32; 4] = [999.0; 4];

    /// `[x, y, height, yaw]`.
    pub fn to_array(&self) -> [f32; 4] {
        [
            self.x as f32,
            self.y as f32,
            self.height as f32,
            self.yaw as f32,
        ]
    }

    pub fn yaw_degrees(&self) -> f64 {
        self.yaw.to_degrees()
    }
}

/// Flatten a localization result to `[x, y, height, yaw]`, or
/// [`Pose::UNKNOWN_SENTINEL`] on failure.
pub fn pose_or_sentinel<E>(result: &Result<Pose, E>) -> [f32; 4] {
    match result {
        Ok(pose) => pose.to_array(),
        Err(_) => Pose::UNKNOWN_SENTINEL,
    }
}

/// Outlier tolerances of the three estimation stages.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseParams {
    /// Yaw samples farther than this from the mean of the others are dropped.
    pub yaw_outlier_deg: f64,
    /// Relative deviation above which a height sample is dropped.
    pub height_outlier_ratio: f64,
    /// Position estimates farther than this (meters) are dropped.
    pub position_outlier: f64,
}

impl Default for PoseParams {
    fn default() -> Self {
        Self {
            yaw_outlier_deg: 10.0,
            height_outlier_ratio: 0.15,
            position_outlier: 0.3,
        }
    }
}

/// Detected corner with a resolved board vertex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedCorner {
    pub color: MarkerColor,
    /// Index within its color list.
    pub index: usize,
    pub id: VertexId,
    pub pixel: Point2<i32>,
    pub world: Point2<f64>,
}

/// Resolved corners in color order, then detection order.
pub fn identified_corners(
    corners: &ColorCorners,
    ids: &Identification,
    layout: &BoardLayout,
) -> Vec<IdentifiedCorner> {
    ids.resolved()
        .filter_map(|(color, index, id)| {
            corners.get(color).get(index).map(|c| IdentifiedCorner {
                color,
                index,
                id,
                pixel: c.position,
                world: layout.world(id),
            })
        })
        .collect()
}

/// Final pose plus the unfiltered stage outputs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub pose: Pose,
    /// Stage outputs before jump filtering.
    pub unfiltered: Pose,
}

/// Run the yaw, height and position stages.
///
/// `min_pixel_distance` excludes close corner pairs from height estimation.
/// When `filters` is given, each stage output is passed through its jump
/// filter and the filtered yaw and height feed the later stages.
pub fn estimate_pose(
    corners: &[IdentifiedCorner],
    camera: &CameraModel,
    params: &PoseParams,
    min_pixel_distance: f64,
    mut filters: Option<&mut PoseFilters>,
) -> Result<PoseEstimate, LocalizeError> {
    let samples = yaw_samples(corners);
    let raw_yaw = estimate_yaw(&samples, params.yaw_outlier_deg.to_radians())
        .ok_or(LocalizeError::NoYawSamples)?;
    let yaw = match filters.as_deref_mut() {
        Some(f) => f.yaw.apply(raw_yaw),
        None => raw_yaw,
    };
    log::debug!(
        "yaw {:.2} deg from {} samples (filtered {:.2} deg)",
        raw_yaw.to_degrees(),
        samples.len(),
        yaw.to_degrees()
    );

    if corners.len() < 2 {
        return Err(LocalizeError::TooFewIdentified {
            found: corners.len(),
        });
    }

    let heights = height_samples(corners, camera, min_pixel_distance);
    let raw_height = estimate_height(&heights, params.height_outlier_ratio)
        .ok_or(LocalizeError::NoHeightSamples)?;
    let height = match filters.as_deref_mut() {
        Some(f) => f.height.apply(raw_height),
        None => raw_height,
    };
    log::debug!(
        "height {raw_height:.3} from {} samples (filtered {height:.3})",
        heights.len()
    );

    let estimates = position_estimates(corners, camera, yaw, height);
    let raw_position = estimate_position(&estimates, params.position_outlier).ok_or(
        LocalizeError::TooFewIdentified {
            found: corners.len(),
        },
    )?;
    let position = match filters {
        Some(f) => f.position.apply(raw_position),
        None => raw_position,
    };
    log::debug!(
        "position ({:.3}, {:.3}) (filtered ({:.3}, {:.3}))",
        raw_position.x,
        raw_position.y,
        position.x,
        position.y
    );

    Ok(PoseEstimate {
        pose: Pose {
            x: position.x,
            y: position.y,
            height,
            yaw,
        },
        unfiltered: Pose {
            x: raw_position.x,
            y: raw_position.y,
            height: raw_height,
            yaw: raw_yaw,
        },
    })
}

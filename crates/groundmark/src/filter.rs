//! Temporal jump filters for yaw, height and position.
//!
//! A sample that jumps too far from the last accepted value is held back and
//! the last value is repeated instead. A run of more than `max_blocked`
//! consecutive jumps means the scene really moved: the jump is accepted.

use groundmark_core::wrap_angle;
use nalgebra::{distance, Point2};
use serde::{Deserialize, Serialize};

/// Parameters of one [`JumpFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JumpFilterParams {
    /// Largest accepted change between consecutive samples.
    pub max_jump: f64,
    /// Consecutive rejected samples tolerated before a jump is accepted.
    pub max_blocked: u32,
}

/// Parameters of the three pose filters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Yaw filter; `max_jump` in radians.
    pub yaw: JumpFilterParams,
    /// Height filter; `max_jump` in meters.
    pub height: JumpFilterParams,
    /// Position filter; `max_jump` is a Euclidean distance in meters.
    pub position: JumpFilterParams,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            yaw: JumpFilterParams {
                max_jump: 35f64.to_radians(),
                max_blocked: 6,
            },
            height: JumpFilterParams {
                max_jump: 0.45,
                max_blocked: 6,
            },
            position: JumpFilterParams {
                max_jump: 0.35,
                max_blocked: 6,
            },
        }
    }
}

/// Hysteresis filter over a stream of samples.
#[derive(Clone, Debug)]
pub struct JumpFilter<T> {
    params: JumpFilterParams,
    distance: fn(&T, &T) -> f64,
    last: Option<T>,
    blocked: u32,
}

impl<T: Copy> JumpFilter<T> {
    pub fn new(params: JumpFilterParams, distance: fn(&T, &T) -> f64) -> Self {
        Self {
            params,
            distance,
            last: None,
            blocked: 0,
        }
    }

    /// Feed a sample and get the value to report.
    pub fn apply(&mut self, sample: T) -> T {
        let Some(last) = self.last else {
            self.last = Some(sample);
            return sample;
        };
        if (self.distance)(&sample, &last) <= self.params.max_jump {
            self.last = Some(sample);
            self.blocked /= 2;
            return sample;
        }
        self.blocked += 1;
        if self.blocked > self.params.max_blocked {
            log::debug!("accepting jump after {} blocked samples", self.blocked - 1);
            self.blocked = 0;
            self.last = Some(sample);
            return sample;
        }
        last
    }

    pub fn last(&self) -> Option<T> {
        self.last
    }

    pub fn blocked(&self) -> u32 {
        self.blocked
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.blocked = 0;
    }
}

/// Wrapped angular distance in radians.
pub fn angular_distance(a: &f64, b: &f64) -> f64 {
    wrap_angle(a - b).abs()
}

pub fn linear_distance(a: &f64, b: &f64) -> f64 {
    (a - b).abs()
}

pub fn planar_distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    distance(a, b)
}

/// The three filters applied to each pose.
#[derive(Clone, Debug)]
pub struct PoseFilters {
    pub yaw: JumpFilter<f64>,
    pub height: JumpFilter<f64>,
    pub position: JumpFilter<Point2<f64>>,
}

impl PoseFilters {
    pub fn new(params: &FilterParams) -> Self {
        Self {
            yaw: JumpFilter::new(params.yaw, angular_distance),
            height: JumpFilter::new(params.height, linear_distance),
            position: JumpFilter::new(params.position, planar_distance),
        }
    }

    pub fn reset(&mut self) {
        self.yaw.reset();
        self.height.reset();
        self.position.reset();
    }
}

impl Default for PoseFilters {
    fn default() -> Self {
        Self::new(&FilterParams::default())
    }
}

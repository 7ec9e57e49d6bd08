//! Core types and utilities for colored ground-marker localization.
//!
//! This crate is intentionally small. It holds the value types passed between
//! the detector, the board model and the pose estimator, plus a couple of 2D
//! vector helpers and the logging setup shared by the workspace binaries.

mod color;
mod corner;
mod geometry;
mod image;
mod logger;

pub use color::MarkerColor;
pub use corner::{ColorCorners, CornerPoint};
pub use geometry::{cross, dist_sqr, normalize_or_none, wrap_angle, NORMALIZE_EPS};
pub use image::{FrameError, FrameView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

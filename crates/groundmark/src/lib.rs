//! Camera localization over colored ground markers.
//!
//! A downward-looking camera sees part of a painted board: a 4x4 grid of
//! blue, black, red and green squares plus four yellow marks. Each frame is
//! segmented by color, marker corners are extracted and identified against
//! the twenty known board corners, and the camera's ground position, height
//! and heading are triangulated from them.
//!
//! ## Quickstart
//!
//! ```no_run
//! use groundmark::{Localizer, LocalizerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("frame.png")?.into_rgb8();
//! let mut localizer = Localizer::new(LocalizerConfig::default())?;
//!
//! match localizer.localize_rgb(&img, 2) {
//!     Ok(pose) => println!("x={:.2} y={:.2} z={:.2} yaw={:.1}", pose.x, pose.y, pose.height, pose.yaw_degrees()),
//!     Err(err) => println!("no pose: {err}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `groundmark::core`: colors, corners, frame views and logging setup.
//! - `groundmark::board`: board layout, lookup tables and corner identification.
//! - `groundmark::detect`: device profiles, color segmentation and corner extraction.
//! - [`Localizer`]: the per-session pipeline with jump filters and diagnostics.
//! - [`pose`]: yaw, height and position estimation from identified corners.
//! - `groundmark::image_io` (feature `image`): helpers for `image` buffers.

pub use groundmark_board as board;
pub use groundmark_core as core;
pub use groundmark_detect as detect;

mod camera;
mod config;
mod diagnostics;
mod error;
mod filter;
mod localizer;
pub mod pose;

#[cfg(feature = "image")]
pub mod image_io;

pub use camera::{CameraModel, CameraParams};
pub use config::{ConfigError, LocalizerConfig};
pub use diagnostics::{Diagnostics, DiagnosticsConfig};
pub use error::LocalizeError;
pub use filter::{
    angular_distance, linear_distance, planar_distance, FilterParams, JumpFilter,
    JumpFilterParams, PoseFilters,
};
pub use localizer::{FrameReport, Localizer, ModeSettings};
pub use pose::{pose_or_sentinel, IdentifiedCorner, Pose, PoseParams};

pub use groundmark_core::{FrameView, MarkerColor};
pub use groundmark_detect::{ColorThresholds, DeviceProfile, VisualizationMode};

//! Image side of ground-marker localization.
//!
//! A frame goes through three stages:
//!
//! 1. [`ColorSegmenter`] classifies every pixel inside the device's valid
//!    area into five binary masks (blue, black, red, green, yellow).
//! 2. [`mask_polygons`] traces the mask borders and simplifies them.
//! 3. [`CornerExtractor`] intersects long consecutive polygon edges into
//!    corners with incoming/outgoing directions, merges the pairs produced
//!    by the two borders of a painted stripe and trims corners near the
//!    frame edge.
//!
//! All pixel thresholds of stage 3 scale with the usable width of the
//! [`DeviceProfile`].

mod contour;
mod corners;
mod overlay;
mod profile;
mod segment;

pub use contour::{mask_polygons, Polygon};
pub use image::{GrayImage, RgbImage};
pub use corners::{
    merge_duplicates, CornerCandidate, CornerExtractor, ExtractorParams, FrameCorners,
    MaskCorners,
};
pub use overlay::{draw_corners, draw_polygons, overlay_color};
pub use profile::{DeviceBounds, DeviceProfile, ExtractorScale, ProfileError, ScaleFractions};
pub use segment::{
    brightness, classify, ColorSegmenter, ColorThresholds, PixelClass, SegmentStats,
    VisualizationMode, MASK_ON,
};

//! Helpers for `image` buffers.

use std::path::Path;

use groundmark_core::FrameView;
use image::{DynamicImage, RgbImage, RgbaImage};

use crate::error::LocalizeError;
use crate::localizer::{FrameReport, Localizer};
use crate::pose::Pose;

/// Borrow an `image::RgbImage` as a frame.
pub fn rgb_view(img: &RgbImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: 3,
        data: img.as_raw(),
    }
}

/// Borrow an `image::RgbaImage` as a frame; alpha is ignored.
pub fn rgba_view(img: &RgbaImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: 4,
        data: img.as_raw(),
    }
}

/// Decode an image file into an RGB frame buffer.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, image::ImageError> {
    Ok(image::open(path)?.into_rgb8())
}

impl Localizer {
    /// Localize an RGB image.
    pub fn localize_rgb(&mut self, img: &RgbImage, device_id: u8) -> Result<Pose, LocalizeError> {
        self.localize(&rgb_view(img), device_id)
    }

    /// Localize any decoded image, converting to RGB when needed.
    pub fn localize_image(&mut self, img: &DynamicImage, device_id: u8) -> FrameReport {
        match img {
            DynamicImage::ImageRgb8(rgb) => self.localize_with_report(&rgb_view(rgb), device_id),
            DynamicImage::ImageRgba8(rgba) => {
                self.localize_with_report(&rgba_view(rgba), device_id)
            }
            other => {
                let rgb = other.to_rgb8();
                self.localize_with_report(&rgb_view(&rgb), device_id)
            }
        }
    }
}

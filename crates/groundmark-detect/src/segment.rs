//! Per-pixel color classification into five binary masks.

use groundmark_core::{FrameError, FrameView, MarkerColor};
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::profile::DeviceBounds;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub const MASK_ON: u8 = 255;

/// Classification thresholds (8-bit intensity units).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    /// Upper bound of `max(R, G) + B` for black.
    pub black_max_rgb: u8,
    /// Upper bound of the chroma measure for black.
    pub black_chroma: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub yellow: u8,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            black_max_rgb: 151,
            black_chroma: 90,
            red: 63,
            green: 48,
            blue: 48,
            yellow: 25,
        }
    }
}

/// Which intermediate planes the debug image shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    Off,
    /// Red, green and blue masks as the three channels.
    Rgb,
    /// Brightness test, chroma test and black mask.
    Black,
    /// Yellow mask twice plus the raw blue channel.
    Yellow,
}

impl VisualizationMode {
    /// Map the numeric mode codes `0..=3`; unknown codes switch it off.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Rgb,
            2 => Self::Black,
            3 => Self::Yellow,
            _ => Self::Off,
        }
    }
}

/// Classification of a single pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelClass {
    pub black: bool,
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub yellow: bool,
    /// `max(R, G) + B <= black_max_rgb`
    pub dark: bool,
    /// chroma measure `<= black_chroma`
    pub achromatic: bool,
}

/// Saturating `max(R, G) + B`.
#[inline]
pub fn brightness(r: u8, g: u8, b: u8) -> u8 {
    r.max(g).saturating_add(b)
}

/// Classify one pixel (saturating 8-bit arithmetic throughout).
#[inline]
pub fn classify(r: u8, g: u8, b: u8, t: &ColorThresholds) -> PixelClass {
    let max_rg = r.max(g);
    let max_rb = r.max(b);
    let max_gb = g.max(b);
    let min_rg = r.min(g);
    let min_rgb = min_rg.min(b);

    let yellow_raw = min_rg.saturating_sub(max_rg - min_rg).saturating_sub(b);
    let bright = max_rg.saturating_add(b);
    let chroma = bright.saturating_sub(min_rgb).saturating_add(b);

    let dark = bright <= t.black_max_rgb;
    let achromatic = chroma <= t.black_chroma;
    PixelClass {
        black: dark && achromatic,
        red: r.saturating_sub(max_gb) > t.red,
        green: g.saturating_sub(max_rb) > t.green,
        blue: b.saturating_sub(max_rg) > t.blue,
        yellow: yellow_raw > t.yellow,
        dark,
        achromatic,
    }
}

/// Summary of one segmentation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    /// Mean of `max(R, G) + B` over the whole frame.
    pub mean_brightness: f64,
    /// Set pixels per mask, indexed by [`MarkerColor::index`].
    pub mask_pixels: [usize; MarkerColor::COUNT],
}

/// Reusable segmentation buffers.
///
/// The masks are reallocated only when the frame size changes.
#[derive(Debug)]
pub struct ColorSegmenter {
    thresholds: ColorThresholds,
    masks: [GrayImage; MarkerColor::COUNT],
    dark: GrayImage,
    achromatic: GrayImage,
    blue_channel: GrayImage,
}

impl Default for ColorSegmenter {
    fn default() -> Self {
        Self::new(ColorThresholds::default())
    }
}

impl ColorSegmenter {
    pub fn new(thresholds: ColorThresholds) -> Self {
        Self {
            thresholds,
            masks: std::array::from_fn(|_| GrayImage::new(0, 0)),
            dark: GrayImage::new(0, 0),
            achromatic: GrayImage::new(0, 0),
            blue_channel: GrayImage::new(0, 0),
        }
    }

    pub fn thresholds(&self) -> &ColorThresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: ColorThresholds) {
        self.thresholds = thresholds;
    }

    pub fn mask(&self, color: MarkerColor) -> &GrayImage {
        &self.masks[color.index()]
    }

    fn ensure_size(&mut self, width: u32, height: u32) {
        if self.dark.dimensions() == (width, height) {
            return;
        }
        log::debug!("segmenter buffers resized to {width}x{height}");
        for m in &mut self.masks {
            *m = GrayImage::new(width, height);
        }
        self.dark = GrayImage::new(width, height);
        self.achromatic = GrayImage::new(width, height);
        self.blue_channel = GrayImage::new(width, height);
    }

    /// Classify every pixel of `frame`; pixels outside the valid bounds are
    /// left clear in every mask.
    ///
    /// The letterbox is neutral for all five colors, not only for black, so
    /// no marker edge can be traced along a screen border.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame, bounds), fields(w = frame.width, h = frame.height))
    )]
    pub fn segment(
        &mut self,
        frame: &FrameView<'_>,
        bounds: &DeviceBounds,
    ) -> Result<SegmentStats, FrameError> {
        frame.validate()?;
        let (w, h) = (frame.width as u32, frame.height as u32);
        self.ensure_size(w, h);

        let t = self.thresholds;
        let mut sum = 0u64;
        let mut counts = [0usize; MarkerColor::COUNT];
        for y in 0..frame.height {
            for (x, [r, g, b]) in frame.row(y).enumerate() {
                sum += brightness(r, g, b) as u64;
                let (px, py) = (x as u32, y as u32);
                self.blue_channel.put_pixel(px, py, Luma([b]));

                let class = if bounds.is_valid(x as i32, y as i32) {
                    classify(r, g, b, &t)
                } else {
                    PixelClass::default()
                };
                let flags = [class.blue, class.black, class.red, class.green, class.yellow];
                for (i, on) in flags.into_iter().enumerate() {
                    counts[i] += on as usize;
                    self.masks[i].put_pixel(px, py, Luma([if on { MASK_ON } else { 0 }]));
                }
                self.dark
                    .put_pixel(px, py, Luma([if class.dark { MASK_ON } else { 0 }]));
                self.achromatic
                    .put_pixel(px, py, Luma([if class.achromatic { MASK_ON } else { 0 }]));
            }
        }

        let mean_brightness = sum as f64 / (frame.width * frame.height) as f64;
        log::debug!("mean brightness {mean_brightness:.2}, mask pixels {counts:?}");
        Ok(SegmentStats {
            mean_brightness,
            mask_pixels: counts,
        })
    }

    /// Render the intermediate planes of the last frame for `mode`.
    pub fn render(&self, mode: VisualizationMode) -> Option<RgbImage> {
        let planes: [&GrayImage; 3] = match mode {
            VisualizationMode::Off => return None,
            VisualizationMode::Rgb => [
                self.mask(MarkerColor::Red),
                self.mask(MarkerColor::Green),
                self.mask(MarkerColor::Blue),
            ],
            VisualizationMode::Black => [&self.dark, &self.achromatic, self.mask(MarkerColor::Black)],
            VisualizationMode::Yellow => [
                self.mask(MarkerColor::Yellow),
                self.mask(MarkerColor::Yellow),
                &self.blue_channel,
            ],
        };
        let (w, h) = self.dark.dimensions();
        Some(RgbImage::from_fn(w, h, |x, y| {
            Rgb([
                planes[0].get_pixel(x, y)[0],
                planes[1].get_pixel(x, y)[0],
                planes[2].get_pixel(x, y)[0],
            ])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DeviceProfile;

    #[test]
    fn classifies_pure_colors() {
        let t = ColorThresholds::default();
        let red = classify(200, 20, 20, &t);
        assert!(red.red && !red.green && !red.blue && !red.black && !red.yellow);
        let green = classify(20, 200, 20, &t);
        assert!(green.green && !green.red && !green.blue);
        let blue = classify(20, 20, 200, &t);
        assert!(blue.blue && !blue.black);
        let yellow = classify(220, 220, 20, &t);
        assert!(yellow.yellow && !yellow.red && !yellow.green);
        let black = classify(30, 30, 30, &t);
        assert!(black.black && !black.blue);
        let white = classify(240, 240, 240, &t);
        assert_eq!(
            white,
            PixelClass {
                achromatic: false,
                ..PixelClass::default()
            }
        );
    }

    #[test]
    fn dark_blue_is_not_black() {
        // the extra +B in the chroma measure pushes saturated dark blue out
        let c = classify(10, 10, 100, &ColorThresholds::default());
        assert!(c.dark);
        assert!(!c.achromatic);
        assert!(c.blue);
        assert!(!c.black);
    }

    #[test]
    fn brightness_saturates() {
        assert_eq!(brightness(200, 100, 100), 255);
        assert_eq!(brightness(10, 20, 30), 50);
    }

    #[test]
    fn border_pixels_are_neutral() {
        // 20x10 black frame, 4 px letterbox on each side
        let data = vec![0u8; 20 * 10 * 3];
        let frame = FrameView::rgb(20, 10, &data).unwrap();
        let bounds = DeviceProfile::new(20, 10, 4, 0).unwrap().bounds(0.0);
        let mut seg = ColorSegmenter::default();
        let stats = seg.segment(&frame, &bounds).unwrap();

        let black = seg.mask(MarkerColor::Black);
        assert_eq!(black.get_pixel(3, 5)[0], 0);
        assert_eq!(black.get_pixel(4, 5)[0], MASK_ON);
        assert_eq!(black.get_pixel(15, 5)[0], MASK_ON);
        assert_eq!(black.get_pixel(16, 5)[0], 0);
        assert_eq!(stats.mask_pixels[MarkerColor::Black.index()], 12 * 10);
        assert_eq!(stats.mean_brightness, 0.0);
    }

    #[test]
    fn letterbox_clears_every_color() {
        // red left half, blue right half, 4 px letterbox on each side
        let mut data = vec![0u8; 20 * 10 * 3];
        for (i, rgb) in data.chunks_exact_mut(3).enumerate() {
            let color: [u8; 3] = if i % 20 < 10 { [220, 10, 10] } else { [10, 10, 220] };
            rgb.copy_from_slice(&color);
        }
        let frame = FrameView::rgb(20, 10, &data).unwrap();
        let bounds = DeviceProfile::new(20, 10, 4, 0).unwrap().bounds(0.0);
        let mut seg = ColorSegmenter::default();
        let stats = seg.segment(&frame, &bounds).unwrap();

        assert_eq!(stats.mask_pixels[MarkerColor::Red.index()], 6 * 10);
        assert_eq!(stats.mask_pixels[MarkerColor::Blue.index()], 6 * 10);
        assert_eq!(seg.mask(MarkerColor::Red).get_pixel(0, 0)[0], 0);
        assert_eq!(seg.mask(MarkerColor::Red).get_pixel(4, 0)[0], MASK_ON);
        assert_eq!(seg.mask(MarkerColor::Blue).get_pixel(19, 9)[0], 0);
        assert_eq!(seg.mask(MarkerColor::Blue).get_pixel(15, 9)[0], MASK_ON);
    }

    #[test]
    fn renders_requested_planes() {
        let mut data = vec![0u8; 4 * 4 * 3];
        for px in data.chunks_exact_mut(3) {
            px.copy_from_slice(&[200, 20, 20]);
        }
        let frame = FrameView::rgb(4, 4, &data).unwrap();
        let bounds = DeviceProfile::new(4, 4, 0, 0).unwrap().bounds(0.0);
        let mut seg = ColorSegmenter::default();
        seg.segment(&frame, &bounds).unwrap();

        assert!(seg.render(VisualizationMode::Off).is_none());
        let rgb = seg.render(VisualizationMode::Rgb).unwrap();
        assert_eq!(rgb.get_pixel(1, 1), &Rgb([MASK_ON, 0, 0]));
        let yellow = seg.render(VisualizationMode::Yellow).unwrap();
        assert_eq!(yellow.get_pixel(2, 2), &Rgb([0, 0, 20]));
    }

    #[test]
    fn mode_codes() {
        assert_eq!(VisualizationMode::from_code(2), VisualizationMode::Black);
        assert_eq!(VisualizationMode::from_code(9), VisualizationMode::Off);
    }
}

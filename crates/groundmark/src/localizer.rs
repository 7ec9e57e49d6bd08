//! Per-session localization context.

use std::path::Path;

use groundmark_board::{identify, Identification, IdentifyParams, IdentityTables};
use groundmark_core::{ColorCorners, FrameView, MarkerColor};
use groundmark_detect::{
    draw_corners, draw_polygons, overlay_color, ColorSegmenter, ColorThresholds,
    CornerExtractor, DeviceProfile, FrameCorners, Polygon, RgbImage, VisualizationMode,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::camera::CameraModel;
use crate::config::{ConfigError, LocalizerConfig};
use crate::diagnostics::Diagnostics;
use crate::error::LocalizeError;
use crate::filter::PoseFilters;
use crate::pose::{estimate_pose, identified_corners, pose_or_sentinel, Pose};

/// Debug switches that may change between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSettings {
    pub visualization: VisualizationMode,
    /// Keep simplified polygons and draw polygons and corners on the
    /// visualization image.
    pub show_contours: bool,
    /// Write pipeline messages to the trace log.
    pub debug_logging: bool,
    /// Write every reported pose to the position log.
    pub position_logging: bool,
}

impl ModeSettings {
    fn wants_image(&self) -> bool {
        self.visualization != VisualizationMode::Off || self.show_contours
    }
}

/// Everything known about one processed frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameReport {
    pub device_id: u8,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub mean_brightness: Option<f64>,
    pub corners: ColorCorners,
    #[serde(default)]
    pub identification: Option<Identification>,
    /// Simplified mask polygons per color, kept when `show_contours` is on.
    #[serde(default)]
    pub polygons: Option<[Vec<Polygon>; MarkerColor::COUNT]>,
    #[serde(default)]
    pub pose: Option<Pose>,
    /// Stage outputs before jump filtering.
    #[serde(default)]
    pub unfiltered: Option<Pose>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FrameReport {
    /// Record the outcome of the frame.
    pub fn set_result(&mut self, result: &Result<Pose, LocalizeError>) {
        match result {
            Ok(pose) => {
                self.pose = Some(*pose);
                self.error = None;
            }
            Err(err) => {
                self.pose = None;
                self.error = Some(err.to_string());
            }
        }
    }

    /// `[x, y, height, yaw]` or the unknown sentinel.
    pub fn pose_array(&self) -> [f32; 4] {
        self.pose.map_or(Pose::UNKNOWN_SENTINEL, |p| p.to_array())
    }
}

#[derive(Debug)]
struct DeviceState {
    id: u8,
    extractor: CornerExtractor,
    camera: CameraModel,
}

/// Localization context: owns the segmentation buffers, the current device
/// geometry, the jump filters and the diagnostics logs.
///
/// `localize` takes `&mut self`, so calls on one context are serialized and
/// settings changes land between frames.
#[derive(Debug)]
pub struct Localizer {
    config: LocalizerConfig,
    tables: &'static IdentityTables,
    segmenter: ColorSegmenter,
    device: Option<DeviceState>,
    filters: PoseFilters,
    diagnostics: Diagnostics,
    visualization: Option<RgbImage>,
}

impl Localizer {
    pub fn new(config: LocalizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let diagnostics = Diagnostics::open(
            &config.diagnostics,
            config.mode.debug_logging,
            config.mode.position_logging,
        );
        Ok(Self {
            tables: IdentityTables::shared(),
            segmenter: ColorSegmenter::new(config.thresholds),
            device: None,
            filters: PoseFilters::new(&config.filters),
            diagnostics,
            visualization: None,
            config,
        })
    }

    /// Build a context from a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::new(LocalizerConfig::load_json(path)?)
    }

    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    pub fn mode(&self) -> ModeSettings {
        self.config.mode
    }

    /// Change the debug switches. Logs are reopened accordingly.
    pub fn set_mode(&mut self, mode: ModeSettings) {
        self.config.mode = mode;
        self.diagnostics.reconfigure(
            &self.config.diagnostics,
            mode.debug_logging,
            mode.position_logging,
        );
        if !mode.wants_image() {
            self.visualization = None;
        }
    }

    pub fn set_color_thresholds(&mut self, thresholds: ColorThresholds) {
        self.config.thresholds = thresholds;
        self.segmenter.set_thresholds(thresholds);
    }

    /// Forget the filter history.
    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }

    pub fn filters(&self) -> &PoseFilters {
        &self.filters
    }

    /// Debug image of the last frame, when a visualization mode or contour
    /// drawing is active.
    pub fn visualization(&self) -> Option<&RgbImage> {
        self.visualization.as_ref()
    }

    /// Id of the device used by the last frame.
    pub fn device_id(&self) -> Option<u8> {
        self.device.as_ref().map(|d| d.id)
    }

    /// Localize the camera in one frame.
    pub fn localize(
        &mut self,
        frame: &FrameView<'_>,
        device_id: u8,
    ) -> Result<Pose, LocalizeError> {
        let mut report = FrameReport::default();
        self.process(frame, device_id, &mut report)
    }

    /// [`Localizer::localize`] flattened to `[x, y, height, yaw]` or the
    /// unknown sentinel.
    pub fn localize_flat(&mut self, frame: &FrameView<'_>, device_id: u8) -> [f32; 4] {
        pose_or_sentinel(&self.localize(frame, device_id))
    }

    /// Localize and keep the intermediate results.
    pub fn localize_with_report(&mut self, frame: &FrameView<'_>, device_id: u8) -> FrameReport {
        let mut report = FrameReport::default();
        let result = self.process(frame, device_id, &mut report);
        report.set_result(&result);
        report
    }

    fn ensure_device(&mut self, id: u8) -> Result<(), LocalizeError> {
        if self.device.as_ref().is_some_and(|d| d.id == id) {
            return Ok(());
        }
        let profile: DeviceProfile = self
            .config
            .profile(id)
            .ok_or(LocalizeError::UnknownDevice(id))?;
        let extractor = CornerExtractor::new(self.config.extractor, &profile);
        let camera = self.config.camera.model(&profile, extractor.bounds());
        log::info!(
            "device {id}: {}x{} px, borders ({}, {}), pixel size {:.3e} m",
            profile.screen_width,
            profile.screen_height,
            profile.border_horizontal,
            profile.border_vertical,
            camera.pixel_size
        );
        self.device = Some(DeviceState {
            id,
            extractor,
            camera,
        });
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame, report), fields(w = frame.width, h = frame.height))
    )]
    fn process(
        &mut self,
        frame: &FrameView<'_>,
        device_id: u8,
        report: &mut FrameReport,
    ) -> Result<Pose, LocalizeError> {
        report.device_id = device_id;
        report.width = frame.width;
        report.height = frame.height;
        let result = self.run(frame, device_id, report);
        if let Err(err) = &result {
            log::debug!("no pose: {err}");
            self.diagnostics.trace(format_args!("no pose: {err}"));
        }
        result
    }

    fn run(
        &mut self,
        frame: &FrameView<'_>,
        device_id: u8,
        report: &mut FrameReport,
    ) -> Result<Pose, LocalizeError> {
        frame.validate()?;
        self.ensure_device(device_id)?;
        let Self {
            config,
            tables,
            segmenter,
            device,
            filters,
            diagnostics,
            visualization,
        } = self;
        let device = device.as_ref().ok_or(LocalizeError::UnknownDevice(device_id))?;
        let bounds = *device.extractor.bounds();
        let mode = config.mode;

        let stats = segmenter.segment(frame, &bounds)?;
        report.mean_brightness = Some(stats.mean_brightness);

        let FrameCorners {
            corners,
            polygons,
            trimmed,
        } = device.extractor.extract_frame(segmenter, mode.show_contours);
        *visualization = if mode.wants_image() {
            Some(render_debug_image(segmenter, frame, mode, &corners, &polygons))
        } else {
            None
        };
        if mode.show_contours {
            report.polygons = Some(polygons);
        }

        let total = corners.total();
        diagnostics.trace(format_args!(
            "frame {}x{}: brightness {:.1}, corners {:?}, {trimmed} trimmed",
            frame.width,
            frame.height,
            stats.mean_brightness,
            MarkerColor::ALL.map(|c| corners.get(c).len())
        ));
        if total < 2 {
            report.corners = corners;
            return Err(LocalizeError::TooFewCorners { found: total });
        }

        let min_corner_distance = device.extractor.scale().min_corner_distance;
        let params = IdentifyParams {
            min_corner_distance: min_corner_distance as f32,
            fallback_min_distance: (bounds.valid_max_x + bounds.valid_max_y) as f32,
            near_ratio: config.yellow_near_ratio,
        };
        let ids = identify(&corners, tables, &params);
        let identified = identified_corners(&corners, &ids, &config.board);
        diagnostics.trace(format_args!(
            "identified {}/{total}: {:?}",
            identified.len(),
            identified.iter().map(|c| c.id.get()).collect::<Vec<_>>()
        ));
        report.corners = corners;
        report.identification = Some(ids);

        let estimate = estimate_pose(
            &identified,
            &device.camera,
            &config.pose,
            min_corner_distance as f64,
            Some(filters),
        )?;
        report.unfiltered = Some(estimate.unfiltered);

        let pose = estimate.pose;
        diagnostics.trace(format_args!(
            "pose x={:.3} y={:.3} z={:.3} yaw={:.1} deg",
            pose.x,
            pose.y,
            pose.height,
            pose.yaw_degrees()
        ));
        diagnostics.position(&pose);
        Ok(pose)
    }
}

fn render_debug_image(
    segmenter: &ColorSegmenter,
    frame: &FrameView<'_>,
    mode: ModeSettings,
    corners: &ColorCorners,
    polygons: &[Vec<Polygon>; MarkerColor::COUNT],
) -> RgbImage {
    let mut canvas = segmenter
        .render(mode.visualization)
        .unwrap_or_else(|| RgbImage::new(frame.width as u32, frame.height as u32));
    if mode.show_contours {
        for color in MarkerColor::ALL {
            draw_polygons(&mut canvas, &polygons[color.index()], overlay_color(color));
        }
        draw_corners(&mut canvas, corners, 12.0);
    }
    canvas
}

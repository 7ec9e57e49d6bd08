//! Per-device screen geometry and the pixel bounds derived from it.

use serde::{Deserialize, Serialize};

/// Screen size and black letterbox borders of one capture device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Width of the unusable band on the left and on the right.
    pub border_horizontal: u32,
    /// Height of the unusable band at the top and at the bottom.
    pub border_vertical: u32,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    #[error(
        "device profile {width}x{height} with borders ({border_horizontal}, {border_vertical}) leaves no usable area"
    )]
    EmptyUsableArea {
        width: u32,
        height: u32,
        border_horizontal: u32,
        border_vertical: u32,
    },
}

const BUILTIN: [(u8, DeviceProfile); 6] = [
    (1, DeviceProfile::const_new(2014, 996, 122, 0)),
    (2, DeviceProfile::const_new(1397, 667, 106, 0)),
    (3, DeviceProfile::const_new(1980, 996, 105, 0)),
    (4, DeviceProfile::const_new(1133, 664, 0, 13)),
    (5, DeviceProfile::const_new(2079, 966, 181, 0)),
    (6, DeviceProfile::const_new(2014, 996, 122, 0)),
];

impl DeviceProfile {
    const fn const_new(w: u32, h: u32, bh: u32, bv: u32) -> Self {
        Self {
            screen_width: w,
            screen_height: h,
            border_horizontal: bh,
            border_vertical: bv,
        }
    }

    pub fn new(
        screen_width: u32,
        screen_height: u32,
        border_horizontal: u32,
        border_vertical: u32,
    ) -> Result<Self, ProfileError> {
        let p = Self::const_new(
            screen_width,
            screen_height,
            border_horizontal,
            border_vertical,
        );
        p.validate()?;
        Ok(p)
    }

    /// Built-in profile for device ids `1..=6`.
    pub fn builtin(id: u8) -> Option<Self> {
        BUILTIN.iter().find(|(i, _)| *i == id).map(|(_, p)| *p)
    }

    pub fn builtin_ids() -> impl Iterator<Item = u8> {
        BUILTIN.iter().map(|(i, _)| *i)
    }

    /// Check that the borders leave at least two pixels on each axis.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let ux = self.screen_width as i64 - 2 * self.border_horizontal as i64;
        let uy = self.screen_height as i64 - 2 * self.border_vertical as i64;
        if ux < 2 || uy < 2 {
            return Err(ProfileError::EmptyUsableArea {
                width: self.screen_width,
                height: self.screen_height,
                border_horizontal: self.border_horizontal,
                border_vertical: self.border_vertical,
            });
        }
        Ok(())
    }

    /// Width between the horizontal borders.
    pub fn usable_width(&self) -> u32 {
        self.screen_width
            .saturating_sub(self.border_horizontal.saturating_mul(2))
    }

    /// Screen center, integer division.
    pub fn center(&self) -> (i32, i32) {
        (
            (self.screen_width / 2) as i32,
            (self.screen_height / 2) as i32,
        )
    }

    /// Valid and "reasonable" pixel bounds.
    ///
    /// The reasonable box is the valid box shrunk on each side by
    /// `reasonable_frac` of the valid extent along that axis.
    pub fn bounds(&self, reasonable_frac: f32) -> DeviceBounds {
        let valid_min_x = self.border_horizontal as i32;
        let valid_max_x = self.screen_width as i32 - self.border_horizontal as i32 - 1;
        let valid_min_y = self.border_vertical as i32;
        let valid_max_y = self.screen_height as i32 - self.border_vertical as i32 - 1;
        let dx = ((valid_max_x - valid_min_x) as f32 * reasonable_frac) as i32;
        let dy = ((valid_max_y - valid_min_y) as f32 * reasonable_frac) as i32;
        DeviceBounds {
            valid_min_x,
            valid_max_x,
            valid_min_y,
            valid_max_y,
            reasonable_min_x: valid_min_x + dx,
            reasonable_max_x: valid_max_x - dx,
            reasonable_min_y: valid_min_y + dy,
            reasonable_max_y: valid_max_y - dy,
        }
    }

    /// Pixel thresholds proportional to the usable width.
    pub fn scale(&self, fractions: &ScaleFractions) -> ExtractorScale {
        let usable = self.usable_width() as f32;
        let seg = (fractions.min_segment * usable) as i64;
        let merge = (fractions.merge_distance * usable) as i64;
        ExtractorScale {
            min_segment_len_sqr: seg * seg,
            merge_distance_sqr: merge * merge,
            min_corner_distance: (fractions.min_corner_distance * usable) as i32,
        }
    }
}

/// Inclusive pixel bounds derived from a [`DeviceProfile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBounds {
    pub valid_min_x: i32,
    pub valid_max_x: i32,
    pub valid_min_y: i32,
    pub valid_max_y: i32,
    pub reasonable_min_x: i32,
    pub reasonable_max_x: i32,
    pub reasonable_min_y: i32,
    pub reasonable_max_y: i32,
}

impl DeviceBounds {
    #[inline]
    pub fn is_valid(&self, x: i32, y: i32) -> bool {
        x >= self.valid_min_x && x <= self.valid_max_x && y >= self.valid_min_y && y <= self.valid_max_y
    }

    /// At least `margin` pixels inside the valid box on every side.
    pub fn is_inside_valid(&self, x: i32, y: i32, margin: i32) -> bool {
        x >= self.valid_min_x + margin
            && x <= self.valid_max_x - margin
            && y >= self.valid_min_y + margin
            && y <= self.valid_max_y - margin
    }

    pub fn is_reasonable(&self, x: i32, y: i32) -> bool {
        x >= self.reasonable_min_x
            && x <= self.reasonable_max_x
            && y >= self.reasonable_min_y
            && y <= self.reasonable_max_y
    }

    /// Width of the valid box in pixels.
    pub fn valid_width(&self) -> i32 {
        self.valid_max_x - self.valid_min_x + 1
    }
}

/// Fractions of the usable width used to derive [`ExtractorScale`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleFractions {
    pub min_segment: f32,
    pub merge_distance: f32,
    pub min_corner_distance: f32,
}

impl Default for ScaleFractions {
    fn default() -> Self {
        Self {
            min_segment: 0.12,
            merge_distance: 0.072,
            min_corner_distance: 0.02,
        }
    }
}

/// Device-dependent pixel thresholds of the corner extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorScale {
    pub min_segment_len_sqr: i64,
    pub merge_distance_sqr: i64,
    pub min_corner_distance: i32,
}

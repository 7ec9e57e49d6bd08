//! JSON configuration of a [`crate::Localizer`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use groundmark_board::BoardLayout;
use groundmark_detect::{ColorThresholds, DeviceProfile, ExtractorParams, ProfileError};
use serde::{Deserialize, Serialize};

use crate::camera::CameraParams;
use crate::diagnostics::DiagnosticsConfig;
use crate::filter::FilterParams;
use crate::localizer::ModeSettings;
use crate::pose::PoseParams;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("device {id}: {source}")]
    Profile {
        id: u8,
        #[source]
        source: ProfileError,
    },
}

/// Everything a [`crate::Localizer`] needs besides the frames.
///
/// All fields are optional in JSON and fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
    pub thresholds: ColorThresholds,
    pub camera: CameraParams,
    pub extractor: ExtractorParams,
    /// Yellow/other distance ratio below which a pair counts as near.
    pub yellow_near_ratio: f32,
    pub pose: PoseParams,
    pub filters: FilterParams,
    pub mode: ModeSettings,
    pub diagnostics: DiagnosticsConfig,
    pub board: BoardLayout,
    /// Profiles added to, or overriding, the built-in device table.
    pub devices: BTreeMap<u8, DeviceProfile>,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            thresholds: ColorThresholds::default(),
            camera: CameraParams::default(),
            extractor: ExtractorParams::default(),
            yellow_near_ratio: 1.3,
            pose: PoseParams::default(),
            filters: FilterParams::default(),
            mode: ModeSettings::default(),
            diagnostics: DiagnosticsConfig::default(),
            board: BoardLayout::default(),
            devices: BTreeMap::new(),
        }
    }
}

impl LocalizerConfig {
    /// Load and validate a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check the custom device profiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (&id, profile) in &self.devices {
            profile
                .validate()
                .map_err(|source| ConfigError::Profile { id, source })?;
        }
        Ok(())
    }

    /// Profile for `id`: custom profiles first, then the built-in table.
    pub fn profile(&self, id: u8) -> Option<DeviceProfile> {
        self.devices
            .get(&id)
            .copied()
            .or_else(|| DeviceProfile::builtin(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let cfg: LocalizerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, LocalizerConfig::default());
        assert_eq!(cfg.yellow_near_ratio, 1.3);
    }

    #[test]
    fn custom_profiles_override_builtin() {
        let mut cfg = LocalizerConfig::default();
        let custom = DeviceProfile::new(640, 480, 0, 0).unwrap();
        cfg.devices.insert(2, custom);
        cfg.devices.insert(42, custom);
        assert_eq!(cfg.profile(2), Some(custom));
        assert_eq!(cfg.profile(42), Some(custom));
        assert_eq!(cfg.profile(1), DeviceProfile::builtin(1));
        assert_eq!(cfg.profile(7), None);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: LocalizerConfig = serde_json::from_str(
            r#"{"thresholds": {"red": 80}, "devices": {"9": {"screen_width": 800, "screen_height": 600, "border_horizontal": 10, "border_vertical": 0}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.thresholds.red, 80);
        assert_eq!(cfg.thresholds.green, 48);
        assert_eq!(cfg.profile(9).unwrap().usable_width(), 780);
        cfg.validate().unwrap();
    }
}

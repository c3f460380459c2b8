//! Bridge settings, loadable from JSON.
//!
//! ```json
//! {
//!   "profile": "vga",
//!   "mode": "full_refill",
//!   "connect": "start_with_recording",
//!   "storage_path": "/sdcard/Android/data/com.example/files"
//! }
//! ```
//!
//! `rgb` and `disparity` override the profile's plane sizes when present.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    types::{ConnectVariant, Dimensions, OperatingMode, Plane, Profile},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeConfig {
    pub rgb: Dimensions,
    pub disparity: Dimensions,
    pub mode: OperatingMode,
    pub connect: ConnectVariant,
    pub storage_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    profile: Profile,
    rgb: Option<Dimensions>,
    disparity: Option<Dimensions>,
    mode: OperatingMode,
    connect: ConnectVariant,
    storage_path: Option<PathBuf>,
}

impl BridgeConfig {
    pub fn from_profile(profile: Profile) -> Self {
        BridgeConfig {
            rgb: profile.rgb(),
            disparity: profile.disparity(),
            mode: OperatingMode::default(),
            connect: ConnectVariant::default(),
            storage_path: PathBuf::from("."),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_raw(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        Self::from_raw(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("loading bridge config from {}", path.display());
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_mode(mut self, mode: OperatingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_connect(mut self, connect: ConnectVariant) -> Self {
        self.connect = connect;
        self
    }

    pub fn with_storage_path(mut self, storage_path: impl Into<PathBuf>) -> Self {
        self.storage_path = storage_path.into();
        self
    }

    /// Both planes must be non-empty and addressable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for &(plane, dims) in &[(Plane::Rgb, self.rgb), (Plane::Disparity, self.disparity)] {
            if dims.pixel_count().is_none() {
                return Err(ConfigError::Dimensions { plane, dims });
            }
        }
        Ok(())
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let config = BridgeConfig {
            rgb: raw.rgb.unwrap_or_else(|| raw.profile.rgb()),
            disparity: raw.disparity.unwrap_or_else(|| raw.profile.disparity()),
            mode: raw.mode,
            connect: raw.connect,
            storage_path: raw.storage_path.unwrap_or_else(|| PathBuf::from(".")),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from_profile(Profile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = BridgeConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.rgb, Dimensions::new(1920, 1080));
        assert_eq!(config.disparity, Dimensions::new(1280, 720));
        assert_eq!(config.mode, OperatingMode::FullRefill);
        assert_eq!(config.connect, ConnectVariant::StartWithRecording);
    }

    #[test]
    fn profile_and_overrides() {
        let config = BridgeConfig::from_json_str(
            r#"{
                "profile": "vga",
                "disparity": { "width": 320, "height": 200 },
                "mode": "frozen_counter",
                "connect": "start",
                "storage_path": "/sdcard"
            }"#,
        )
        .unwrap();
        assert_eq!(config.rgb, Dimensions::new(640, 480));
        assert_eq!(config.disparity, Dimensions::new(320, 200));
        assert_eq!(config.mode, OperatingMode::FrozenCounter);
        assert_eq!(config.connect, ConnectVariant::Start);
        assert_eq!(config.storage_path, PathBuf::from("/sdcard"));
    }

    #[test]
    fn serialized_config_loads_back() {
        let config = BridgeConfig::from_profile(Profile::Vga)
            .with_mode(OperatingMode::FrozenCounter)
            .with_storage_path("/data/local/tmp");
        let json = config.to_json_string().unwrap();
        assert_eq!(BridgeConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            BridgeConfig::from_json_str(r#"{ "rgb": { "width": 0, "height": 480 } }"#),
            Err(ConfigError::Dimensions {
                plane: Plane::Rgb,
                ..
            })
        ));
        assert!(matches!(
            BridgeConfig::from_json_str(r#"{ "mode": "sometimes" }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json_str(r#"{ "fps": 30 }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            BridgeConfig::from_path("/nonexistent/depthai-bridge.json"),
            Err(ConfigError::Io(_))
        ));
    }
}

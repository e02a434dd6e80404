//! Session configuration file handling for picam-console.
//!
//! Settings are stored as a flat JSON object next to the executable (or at a
//! custom path via `--config`). Loading is all-or-nothing: any problem with
//! the file leaves every setting at its compiled-in default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::settings::{OutOfRange, RawSettings, Settings};

/// File name used when no `--config` path is given.
pub const CONFIG_FILE_NAME: &str = "camera_config.json";

/// On-disk layout of the config file. Every key is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub exposure_index: usize,
    pub image_effect_index: usize,
    pub awb_index: usize,
    pub meter_index: usize,
    pub brightness: i32,
    pub saturation: i32,
    pub iso_index: usize,
    pub contrast: i32,
    pub sharpness: i32,
    pub exposure_compensation: i32,
}

impl From<RawSettings> for ConfigFile {
    fn from(r: RawSettings) -> Self {
        Self {
            exposure_index: r.exposure_index,
            image_effect_index: r.image_effect_index,
            awb_index: r.awb_index,
            meter_index: r.meter_index,
            brightness: r.brightness,
            saturation: r.saturation,
            iso_index: r.iso_index,
            contrast: r.contrast,
            sharpness: r.sharpness,
            exposure_compensation: r.exposure_compensation,
        }
    }
}

impl From<ConfigFile> for RawSettings {
    fn from(c: ConfigFile) -> Self {
        Self {
            exposure_index: c.exposure_index,
            image_effect_index: c.image_effect_index,
            awb_index: c.awb_index,
            meter_index: c.meter_index,
            brightness: c.brightness,
            saturation: c.saturation,
            iso_index: c.iso_index,
            contrast: c.contrast,
            sharpness: c.sharpness,
            exposure_compensation: c.exposure_compensation,
        }
    }
}

/// Errors that can occur when reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid value in config file '{}': {source}", path.display())]
    Invalid { path: PathBuf, source: OutOfRange },
    #[error("Failed to write config file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read settings from `path`, reporting exactly why the file was rejected.
pub fn try_load(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file: ConfigFile = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    Settings::from_raw(file.into()).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load settings from `path`, falling back to defaults on any failure.
///
/// A missing file, malformed JSON, a missing key, and an out-of-range value
/// are all treated the same way. The reason is only visible at debug level.
pub fn load_or_default(path: &Path) -> Settings {
    match try_load(path) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            log::debug!("Using default settings: {}", e);
            Settings::default()
        }
    }
}

/// Write settings to `path`, replacing any previous file atomically.
pub fn save(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let write_err = |e: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let file = ConfigFile::from(settings.to_raw());
    let json = serde_json::to_string_pretty(&file).map_err(|e| write_err(e.into()))?;

    let tmp = temp_path(path);
    std::fs::write(&tmp, json).map_err(write_err)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(e));
    }

    log::info!("Saved settings to {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| CONFIG_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Get the default config file path: alongside the running executable.
pub fn default_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full_json() -> serde_json::Value {
        serde_json::json!({
            "exposure_index": 3,
            "image_effect_index": 5,
            "awb_index": 4,
            "meter_index": 2,
            "brightness": 75,
            "saturation": -20,
            "iso_index": 7,
            "contrast": 10,
            "sharpness": -100,
            "exposure_compensation": 25
        })
    }

    #[test]
    fn test_load_reproduces_stored_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, full_json().to_string()).unwrap();

        let settings = try_load(&path).unwrap();
        let raw = settings.to_raw();
        assert_eq!(raw.exposure_index, 3);
        assert_eq!(raw.image_effect_index, 5);
        assert_eq!(raw.awb_index, 4);
        assert_eq!(raw.meter_index, 2);
        assert_eq!(raw.brightness, 75);
        assert_eq!(raw.saturation, -20);
        assert_eq!(raw.iso_index, 7);
        assert_eq!(raw.contrast, 10);
        assert_eq!(raw.sharpness, -100);
        assert_eq!(raw.exposure_compensation, 25);
    }

    #[test]
    fn test_missing_key_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let keys = [
            "exposure_index",
            "image_effect_index",
            "awb_index",
            "meter_index",
            "brightness",
            "saturation",
            "iso_index",
            "contrast",
            "sharpness",
            "exposure_compensation",
        ];
        for key in keys {
            let mut json = full_json();
            json.as_object_mut().unwrap().remove(key);
            let path = dir.path().join(format!("{}.json", key));
            std::fs::write(&path, json.to_string()).unwrap();

            assert!(matches!(try_load(&path), Err(ConfigError::Parse { .. })));
            assert_eq!(load_or_default(&path), Settings::default());
        }
    }

    #[test]
    fn test_invalid_json_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ \"brightness\": 60,").unwrap();
        assert_eq!(load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(try_load(&path), Err(ConfigError::Read { .. })));
        assert_eq!(load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_out_of_range_value_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut json = full_json();
        json["exposure_index"] = serde_json::json!(4);
        std::fs::write(&path, json.to_string()).unwrap();

        assert!(matches!(try_load(&path), Err(ConfigError::Invalid { .. })));
        assert_eq!(load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_negative_index_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut json = full_json();
        json["iso_index"] = serde_json::json!(-1);
        std::fs::write(&path, json.to_string()).unwrap();
        assert_eq!(load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut settings = Settings::default();
        settings.exposure.advance();
        settings.iso.advance();
        settings.saturation.decrement();
        settings.sharpness.increment();

        save(&path, &settings).unwrap();
        assert_eq!(try_load(&path).unwrap(), settings);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "garbage").unwrap();

        save(&path, &Settings::default()).unwrap();
        assert_eq!(try_load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join(CONFIG_FILE_NAME);
        assert!(matches!(
            save(&path, &Settings::default()),
            Err(ConfigError::Write { .. })
        ));
    }

    #[test]
    fn test_default_path_file_name() {
        assert_eq!(
            default_path().file_name().unwrap(),
            std::ffi::OsStr::new(CONFIG_FILE_NAME)
        );
    }

    #[test]
    fn test_saved_file_uses_expected_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        save(&path, &Settings::default()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 10);
        assert_eq!(obj["exposure_index"], 2);
        assert_eq!(obj["brightness"], 50);
        assert_eq!(obj["awb_index"], 1);
    }
}

//! Application settings

use std::path::{Path, PathBuf};

use flap_codec::{
    ParseError, PowerFields, RequestDefaults, DEFAULT_DATA_RATE, DEFAULT_MAX_GAP_US, DEFAULT_REPEAT,
};
use flap_sim::VirtualRadioConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid rf settings: {0}")]
    Power(#[from] ParseError),
}

/// Defaults for capture decoding and request fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureSettings {
    /// Repetitions when the source does not say
    pub repeat: u32,
    /// Chip rate for capture decoding and default modem data rate
    pub data_rate: u32,
    /// Which `RAW_Data` line of a capture to replay
    pub raw_index: usize,
    /// Treat negative durations as high
    pub invert_level: bool,
    /// Pack chips most significant bit first
    pub msb_first: bool,
    /// Longest single level in microseconds
    pub max_gap_us: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            repeat: DEFAULT_REPEAT,
            data_rate: DEFAULT_DATA_RATE,
            raw_index: 0,
            invert_level: false,
            msb_first: true,
            max_gap_us: DEFAULT_MAX_GAP_US,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Default power fields, used when a source sets no `tx_power_mode`
    pub rf: PowerFields,
    /// Capture and request defaults
    pub capture: CaptureSettings,
    /// Simulated radio used for dry runs
    pub radio: VirtualRadioConfig,
}

impl Settings {
    /// Get the XDG config directory for catflap
    /// Uses $XDG_CONFIG_HOME/catflap, falls back to ~/.config/catflap
    fn config_dir() -> Option<PathBuf> {
        config_dir_from(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
    }

    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings
    ///
    /// An explicit path must exist and parse. Without one the default
    /// location is tried, and a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => {
                tracing::debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from JSON text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Request defaults derived from these settings
    pub fn request_defaults(&self) -> Result<RequestDefaults, SettingsError> {
        let base = RequestDefaults::default();
        Ok(RequestDefaults {
            repeat_count: self.capture.repeat,
            data_rate_baud: self.capture.data_rate,
            raw_index: self.capture.raw_index,
            invert_level: self.capture.invert_level,
            msb_first: self.capture.msb_first,
            max_gap_us: self.capture.max_gap_us,
            power: self.rf.resolve(&base.power)?,
        })
    }
}

fn config_dir_from(xdg_config: Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(xdg_config) = xdg_config {
        let path = PathBuf::from(xdg_config);
        if path.is_absolute() {
            return Some(path.join("catflap"));
        }
    }
    home.map(|h| h.join(".config").join("catflap"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flap_codec::{PatableSpec, PowerSpec};

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        let defaults = settings.request_defaults().unwrap();
        assert_eq!(defaults, RequestDefaults::default());
        assert!(settings.radio.register_access);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"capture": {"repeat": 5}}"#).unwrap();
        assert_eq!(settings.capture.repeat, 5);
        assert_eq!(settings.capture.data_rate, 3333);
        assert!(settings.capture.msb_first);
        assert_eq!(settings.rf, PowerFields::default());
    }

    #[test]
    fn test_rf_section_becomes_default_power() {
        let settings = Settings::from_json(
            r#"{
                "rf": {
                    "tx_power_mode": "manual",
                    "frend0_pa_power": 2,
                    "frend0_lodiv_buf_current_tx": 1,
                    "patable": "0x00,0x60,0x60"
                },
                "capture": {"data_rate": 4800, "invert_level": true}
            }"#,
        )
        .unwrap();
        let defaults = settings.request_defaults().unwrap();
        assert_eq!(defaults.data_rate_baud, 4800);
        assert!(defaults.invert_level);
        assert_eq!(
            defaults.power,
            PowerSpec::Manual {
                pa_power: 2,
                lodiv: Some(1),
                patable: PatableSpec::List(vec![0x00, 0x60, 0x60]),
            }
        );
    }

    #[test]
    fn test_rf_power_fields_accept_any_integer() {
        let settings = Settings::from_json(
            r#"{"rf": {"tx_power_mode": "manual", "frend0_pa_power": 300, "patable": 96}}"#,
        )
        .unwrap();
        assert_eq!(
            settings.request_defaults().unwrap().power,
            PowerSpec::Manual {
                pa_power: 300,
                lodiv: None,
                patable: PatableSpec::Single(0x60),
            }
        );
    }

    #[test]
    fn test_bad_rf_mode_is_an_error() {
        let settings = Settings::from_json(r#"{"rf": {"tx_power_mode": "loud"}}"#).unwrap();
        assert!(matches!(
            settings.request_defaults(),
            Err(SettingsError::Power(ParseError::InvalidPowerMode(_)))
        ));
    }

    #[test]
    fn test_config_dir_resolution() {
        assert_eq!(
            config_dir_from(Some("/xdg".into()), Some("/home/u".into())),
            Some(PathBuf::from("/xdg/catflap"))
        );
        assert_eq!(
            config_dir_from(Some("relative".into()), Some("/home/u".into())),
            Some(PathBuf::from("/home/u/.config/catflap"))
        );
        assert_eq!(config_dir_from(None, None), None);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = std::env::temp_dir().join(format!("catflap-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        std::fs::write(&path, r#"{"radio": {"id": "bench", "power_code": true}}"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.radio.id, "bench");
        assert!(settings.radio.power_code);

        let missing = dir.join("missing.json");
        assert!(matches!(
            Settings::load(Some(&missing)),
            Err(SettingsError::Read { .. })
        ));

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Settings::load(Some(&path)), Err(SettingsError::Parse { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

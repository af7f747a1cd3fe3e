use chrono::NaiveTime;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "brightness_config.json";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse configuration file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

mod clock_time {
    use super::*;

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

mod zipcode_text {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(zipcode: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        zipcode.serialize(s)
    }

    /// Accepts `"10001"` as well as `10001`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
            Raw::Text(text) => text,
            Raw::Number(number) => number.to_string(),
        }))
    }
}

/// A clock-time window with an associated brightness. `start > end` wraps past midnight.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeWindow {
    #[serde(rename = "start_time", with = "clock_time")]
    pub start: NaiveTime,
    #[serde(rename = "end_time", with = "clock_time")]
    pub end: NaiveTime,
    pub brightness: u8,
}

impl TimeWindow {
    pub fn contains(&self, now: NaiveTime) -> bool {
        if self.start > self.end {
            now >= self.start || now < self.end
        } else {
            self.start <= now && now < self.end
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ZipcodeConfig {
    pub use_sunrise_sunset: bool,
    #[serde(with = "zipcode_text")]
    pub zipcode: Option<String>,
    pub sunrise_brightness: u8,
    pub sunset_brightness: u8,
    pub min_brightness_modifier: f64,
    pub max_brightness_modifier: f64,
}

impl Default for ZipcodeConfig {
    fn default() -> Self {
        Self {
            use_sunrise_sunset: false,
            zipcode: None,
            sunrise_brightness: 40,
            sunset_brightness: 20,
            min_brightness_modifier: 1.0,
            max_brightness_modifier: 100.0,
        }
    }
}

impl ZipcodeConfig {
    /// The configured zipcode, if sunrise/sunset mode is on and one is set.
    pub fn active_zipcode(&self) -> Option<&str> {
        if !self.use_sunrise_sunset {
            return None;
        }
        self.zipcode
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty())
    }

    /// Lower and upper clamp bounds, swapped if configured backwards.
    pub fn bounds(&self) -> (f64, f64) {
        let (lo, hi) = (self.min_brightness_modifier, self.max_brightness_modifier);
        if lo > hi {
            (hi, lo)
        } else {
            (lo, hi)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BrightnessFunction {
    #[serde(rename = "type")]
    pub function_type: String,
    pub amplitude: f64,
    pub midpoint: f64,
    /// Hours.
    pub period: f64,
    /// Hours.
    pub phase_shift: f64,
}

impl Default for BrightnessFunction {
    fn default() -> Self {
        Self {
            function_type: "sinusoidal".to_string(),
            amplitude: 25.0,
            midpoint: 50.0,
            period: 24.0,
            phase_shift: 0.0,
        }
    }
}

impl BrightnessFunction {
    pub fn is_usable(&self) -> bool {
        self.function_type == "sinusoidal" && self.period.is_normal() && self.period > 0.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration_seconds: f64,
    pub steps: u32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 3.0,
            steps: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Configuration {
    pub time_presets: Vec<TimeWindow>,
    pub zipcode_config: ZipcodeConfig,
    pub brightness_function: Option<BrightnessFunction>,
    pub poll_interval_seconds: u64,
    pub change_threshold: u8,
    pub transition: TransitionConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            time_presets: Vec::new(),
            zipcode_config: ZipcodeConfig::default(),
            brightness_function: None,
            poll_interval_seconds: 60,
            change_threshold: 5,
            transition: TransitionConfig::default(),
        }
    }
}

impl Configuration {
    pub fn from_json(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(path, &raw)?;
        debug!("Loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

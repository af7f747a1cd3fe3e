use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

pub mod mock;

pub const DEFAULT_BACKLIGHT_DIR: &str = "/sys/class/backlight";

#[derive(thiserror::Error, Debug)]
pub enum DisplayError {
    #[error("No displays found.")]
    NoDisplays,
    #[error("Unknown display '{0}'.")]
    UnknownDisplay(String),
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unreadable value in '{0}'.")]
    BadValue(PathBuf),
    #[error("{0}")]
    Driver(String),
}

/// OS-level brightness control, in percent.
pub trait BrightnessControl: Send + Sync {
    fn list_displays(&self) -> Result<Vec<String>, DisplayError>;

    /// Brightness of every display, in `list_displays` order.
    fn get_brightness(&self) -> Result<Vec<u8>, DisplayError>;

    /// Set one display, or all of them when `display` is `None`.
    fn set_brightness(&self, level: u8, display: Option<&str>) -> Result<(), DisplayError>;

    /// The first display's brightness, used as the representative value.
    fn current_brightness(&self) -> Result<u8, DisplayError> {
        let levels = self.get_brightness()?;
        let current = levels.first().copied().ok_or(DisplayError::NoDisplays)?;
        debug!("Current screen brightness: {}%", current);
        Ok(current)
    }

    fn reset(&self) -> Result<usize, DisplayError> {
        let displays = self.list_displays()?;
        for display in &displays {
            self.set_brightness(100, Some(display))?;
        }
        info!("Screen brightness reset to 100% for {} display(s)", displays.len());
        Ok(displays.len())
    }
}

/// Linux backlight devices under `/sys/class/backlight`.
pub struct SysfsBacklight {
    root: PathBuf,
}

fn read_value(path: &Path) -> Result<u32, DisplayError> {
    let raw = fs::read_to_string(path).map_err(|source| DisplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| DisplayError::BadValue(path.to_path_buf()))
}

pub fn raw_to_percent(raw: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    let pct = (raw.min(max) as f64 * 100.0 / max as f64).round();
    pct as u8
}

pub fn percent_to_raw(level: u8, max: u32) -> u32 {
    (level.min(100) as f64 * max as f64 / 100.0).round() as u32
}

impl SysfsBacklight {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn device(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn percent(&self, name: &str) -> Result<u8, DisplayError> {
        let dir = self.device(name);
        let max = read_value(&dir.join("max_brightness"))?;
        let raw = read_value(&dir.join("brightness"))?;
        Ok(raw_to_percent(raw, max))
    }

    fn write_percent(&self, name: &str, level: u8) -> Result<(), DisplayError> {
        let dir = self.device(name);
        if !dir.is_dir() {
            return Err(DisplayError::UnknownDisplay(name.to_string()));
        }
        let max = read_value(&dir.join("max_brightness"))?;
        let raw = percent_to_raw(level, max);
        let path = dir.join("brightness");
        fs::write(&path, raw.to_string()).map_err(|source| DisplayError::Io { path, source })?;
        debug!("Set {} to {}% (raw {}/{})", name, level, raw, max);
        Ok(())
    }
}

impl Default for SysfsBacklight {
    fn default() -> Self {
        Self::new(DEFAULT_BACKLIGHT_DIR)
    }
}

impl BrightnessControl for SysfsBacklight {
    fn list_displays(&self) -> Result<Vec<String>, DisplayError> {
        let entries = fs::read_dir(&self.root).map_err(|source| DisplayError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().join("max_brightness").is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        if names.is_empty() {
            return Err(DisplayError::NoDisplays);
        }
        Ok(names)
    }

    fn get_brightness(&self) -> Result<Vec<u8>, DisplayError> {
        self.list_displays()?
            .iter()
            .map(|name| self.percent(name))
            .collect()
    }

    fn set_brightness(&self, level: u8, display: Option<&str>) -> Result<(), DisplayError> {
        match display {
            Some(name) => self.write_percent(name, level),
            None => {
                for name in self.list_displays()? {
                    self.write_percent(&name, level)?;
                }
                Ok(())
            }
        }
    }
}

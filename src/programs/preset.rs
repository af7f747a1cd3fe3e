use std::f64::consts::PI;

use chrono::{NaiveTime, Timelike};

use crate::configuration::{BrightnessFunction, Configuration};
use crate::suntimes::SunTimes;

/// Brightness used when no strategy yields a value.
pub const DEFAULT_BRIGHTNESS: u8 = 50;

/// Which rule produced a brightness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Daytime,
    Nighttime,
    Sinusoidal,
    /// Index into `time_presets`.
    Preset(usize),
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub strategy: Strategy,
    /// Value before clamping and rounding.
    pub base: f64,
    pub level: u8,
}

/// Fractional hours since midnight, ignoring seconds.
pub fn hours(now: NaiveTime) -> f64 {
    now.hour() as f64 + now.minute() as f64 / 60.0
}

pub fn sinusoid(function: &BrightnessFunction, hours: f64) -> f64 {
    function.midpoint
        + function.amplitude * (2.0 * PI * (hours + function.phase_shift) / function.period).sin()
}

/// Clamp to `[lo, hi]` and `[0, 100]`, then round. NaN takes the lower bound.
pub fn clamp_level(base: f64, (lo, hi): (f64, f64)) -> u8 {
    let base = if base.is_nan() { lo } else { base };
    base.clamp(lo, hi).clamp(0.0, 100.0).round() as u8
}

fn base_brightness(
    config: &Configuration,
    now: NaiveTime,
    sun: Option<&SunTimes>,
) -> (Strategy, f64) {
    let zipcode = &config.zipcode_config;
    if let Some(sun) = sun.filter(|_| zipcode.use_sunrise_sunset) {
        return if sun.is_daytime(now) {
            (Strategy::Daytime, zipcode.sunrise_brightness as f64)
        } else {
            (Strategy::Nighttime, zipcode.sunset_brightness as f64)
        };
    }

    if let Some(function) = config.brightness_function.as_ref().filter(|f| f.is_usable()) {
        return (Strategy::Sinusoidal, sinusoid(function, hours(now)));
    }

    config
        .time_presets
        .iter()
        .position(|window| window.contains(now))
        .map(|i| (Strategy::Preset(i), config.time_presets[i].brightness as f64))
        .unwrap_or((Strategy::Fallback, DEFAULT_BRIGHTNESS as f64))
}

/// Target brightness for `now`.
///
/// Precedence: sunrise/sunset (when enabled and `sun` is known), then the
/// sinusoidal curve, then the first matching preset window, then
/// `DEFAULT_BRIGHTNESS`. The result is clamped to the configured modifiers.
pub fn resolve(config: &Configuration, now: NaiveTime, sun: Option<&SunTimes>) -> Resolution {
    let (strategy, base) = base_brightness(config, now, sun);
    Resolution {
        strategy,
        base,
        level: clamp_level(base, config.zipcode_config.bounds()),
    }
}

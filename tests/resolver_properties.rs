use brightness_scheduler::configuration::{
    BrightnessFunction, Configuration, TimeWindow, ZipcodeConfig,
};
use brightness_scheduler::display::mock::MockDisplay;
use brightness_scheduler::mode::CancelToken;
use brightness_scheduler::programs::preset::{hours, resolve};
use brightness_scheduler::programs::transition::{plan, transition};
use chrono::NaiveTime;
use proptest::prelude::*;
use std::time::Duration;

fn minute_of_day(m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap()
}

/// Sorted, distinct minute boundaries splitting the day into consecutive windows.
fn boundaries_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::btree_set(0u32..1440, 2..8).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn time_inside_one_window_gets_its_brightness(
        bounds in boundaries_strategy(),
        levels in prop::collection::vec(1u8..=100, 8),
        pick in any::<prop::sample::Index>(),
        offset in any::<prop::sample::Index>(),
    ) {
        let windows: Vec<TimeWindow> = bounds
            .windows(2)
            .zip(levels.iter())
            .map(|(pair, &brightness)| TimeWindow {
                start: minute_of_day(pair[0]),
                end: minute_of_day(pair[1]),
                brightness,
            })
            .collect();
        let i = pick.index(windows.len());
        let (lo, hi) = (bounds[i], bounds[i + 1]);
        let minute = lo + offset.index((hi - lo) as usize) as u32;
        let config = Configuration {
            time_presets: windows.clone(),
            ..Default::default()
        };
        prop_assert_eq!(resolve(&config, minute_of_day(minute), None).level, windows[i].brightness);
    }

    #[test]
    fn wrapping_window_covers_both_sides_of_midnight(
        start in 720u32..1440,
        end in 0u32..720,
        brightness in 1u8..=100,
        minute in 0u32..1440,
    ) {
        let config = Configuration {
            time_presets: vec![TimeWindow {
                start: minute_of_day(start),
                end: minute_of_day(end),
                brightness,
            }],
            ..Default::default()
        };
        let expected = if minute >= start || minute < end { brightness } else { 50 };
        prop_assert_eq!(resolve(&config, minute_of_day(minute), None).level, expected);
    }

    #[test]
    fn sinusoid_extremes(
        midpoint in 0.0f64..100.0,
        amplitude in 0.0f64..60.0,
        quarter in 1u32..=6,
    ) {
        // period = 4 * quarter hours, so the peak lands on a whole hour.
        let period = 4.0 * quarter as f64;
        let config = Configuration {
            brightness_function: Some(BrightnessFunction {
                midpoint,
                amplitude,
                period,
                phase_shift: 0.0,
                ..Default::default()
            }),
            zipcode_config: ZipcodeConfig {
                min_brightness_modifier: 0.0,
                max_brightness_modifier: 100.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let peak = minute_of_day(quarter * 60);
        let trough = minute_of_day(3 * quarter * 60);
        prop_assert_eq!(hours(peak), period / 4.0);
        let high = (midpoint + amplitude).clamp(0.0, 100.0).round() as u8;
        let low = (midpoint - amplitude).clamp(0.0, 100.0).round() as u8;
        prop_assert!(resolve(&config, peak, None).level.abs_diff(high) <= 1);
        prop_assert!(resolve(&config, trough, None).level.abs_diff(low) <= 1);
    }

    #[test]
    fn result_is_clamped_to_bounds(
        brightness in 0u8..=100,
        min in 0.0f64..50.0,
        max in 50.0f64..100.0,
    ) {
        let config = Configuration {
            time_presets: vec![TimeWindow {
                start: minute_of_day(0),
                end: minute_of_day(1439),
                brightness,
            }],
            zipcode_config: ZipcodeConfig {
                min_brightness_modifier: min,
                max_brightness_modifier: max,
                ..Default::default()
            },
            ..Default::default()
        };
        let level = resolve(&config, minute_of_day(600), None).level as f64;
        let b = brightness as f64;
        if b < min {
            prop_assert_eq!(level, min.round());
        } else if b > max {
            prop_assert_eq!(level, max.round());
        } else {
            prop_assert_eq!(level, b);
        }
    }

    #[test]
    fn transition_is_monotonic_and_lands_on_target(
        start in 0u8..=100,
        target in 0u8..=100,
        steps in 1u32..40,
    ) {
        let levels = plan(start, target, steps);
        prop_assert_eq!(levels.len(), steps as usize + 1);
        prop_assert_eq!(*levels.last().unwrap(), target);
        if start <= target {
            prop_assert!(levels.windows(2).all(|w| w[0] <= w[1]));
        } else {
            prop_assert!(levels.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn equal_levels_write_steps_plus_one_times(level in 0u8..=100, steps in 0u32..30) {
        let display = MockDisplay::at(level);
        transition(&display, level, level, Duration::ZERO, steps, &CancelToken::never()).unwrap();
        prop_assert_eq!(display.writes(), vec![level; steps as usize + 1]);
    }
}

#[test]
fn midpoint_step_is_halfway() {
    let levels = plan(20, 80, 10);
    assert_eq!(levels[5], 50);
    let levels = plan(0, 99, 2);
    assert!(levels[1].abs_diff(49) <= 1);
}

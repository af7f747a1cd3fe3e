use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::display::{BrightnessControl, DisplayError};
use crate::mode::CancelToken;

#[derive(thiserror::Error, Debug)]
pub enum TransitionError {
    #[error("Stepping failed ({step}) and the direct write of {target}% failed too ({fallback}).")]
    FallbackFailed {
        target: u8,
        step: DisplayError,
        fallback: DisplayError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Every step was written; the display is at the target.
    Completed,
    /// A step failed but the direct write of the target succeeded.
    Recovered,
    /// The mode changed mid-way; `last` is the last level written, if any.
    Cancelled { last: Option<u8> },
}

/// Quadratic ease-in-out on `[0, 1]`.
pub fn ease_in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -2.0 * t * t + 4.0 * t - 1.0
    }
}

/// The `steps + 1` levels a transition writes. The last one is always `target`.
pub fn plan(start: u8, target: u8, steps: u32) -> Vec<u8> {
    let (start, target) = (start.min(100), target.min(100));
    if steps == 0 {
        return vec![target];
    }
    let span = target as f64 - start as f64;
    let mut levels: Vec<u8> = (0..steps)
        .map(|step| {
            let t = step as f64 / steps as f64;
            (start as f64 + span * ease_in_out_quad(t)) as u8
        })
        .collect();
    levels.push(target);
    levels
}

/// Step the display from `start` to `target` over `duration`, blocking the caller.
///
/// On a failed write the stepping stops and one direct write of `target` is
/// attempted. A cancelled token stops the stepping without that fallback.
pub fn transition(
    display: &dyn BrightnessControl,
    start: u8,
    target: u8,
    duration: Duration,
    steps: u32,
    cancel: &CancelToken,
) -> Result<TransitionOutcome, TransitionError> {
    let levels = plan(start, target, steps);
    let target = target.min(100);
    let delay = duration / steps.max(1);
    info!(
        "Transitioning brightness from {}% to {}%",
        start.min(100),
        target
    );

    let mut last = None;
    for (i, level) in levels.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            info!("Transition to {}% cancelled at step {}.", target, i);
            return Ok(TransitionOutcome::Cancelled { last });
        }
        if let Err(step) = display.set_brightness(level, None) {
            warn!("Error during brightness transition at step {}: {}", i, step);
            return match display.set_brightness(target, None) {
                Ok(()) => {
                    info!("Set brightness directly to {}%.", target);
                    Ok(TransitionOutcome::Recovered)
                }
                Err(fallback) => Err(TransitionError::FallbackFailed {
                    target,
                    step,
                    fallback,
                }),
            };
        }
        debug!("Step {}: {}%", i, level);
        last = Some(level);
        if i + 1 < levels.len() && !delay.is_zero() {
            thread::sleep(delay);
        }
    }
    Ok(TransitionOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::mock::MockDisplay;
    use crate::mode::{Mode, ModeCell};
    use std::thread;

    #[test]
    fn easing_shape() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(0.25), 0.125);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert_eq!(ease_in_out_quad(0.75), 0.875);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
    }

    #[test]
    fn plan_upwards() {
        assert_eq!(
            plan(20, 80, 10),
            vec![20, 21, 24, 30, 39, 50, 60, 69, 75, 78, 80]
        );
    }

    #[test]
    fn plan_downwards_ends_on_target() {
        let levels = plan(90, 10, 4);
        assert_eq!(levels, vec![90, 80, 50, 20, 10]);
        assert!(levels.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn plan_without_steps_writes_target() {
        assert_eq!(plan(10, 70, 0), vec![70]);
    }

    #[test]
    fn plan_clamps_inputs() {
        let levels = plan(250, 200, 2);
        assert_eq!(levels, vec![100, 100, 100]);
    }

    #[test]
    fn same_level_writes_every_step() {
        let display = MockDisplay::at(50);
        let outcome =
            transition(&display, 50, 50, Duration::ZERO, 6, &CancelToken::never()).unwrap();
        assert_eq!(outcome, TransitionOutcome::Completed);
        assert_eq!(display.writes(), vec![50; 7]);
    }

    #[test]
    fn writes_planned_levels() {
        let display = MockDisplay::at(20);
        transition(&display, 20, 80, Duration::ZERO, 10, &CancelToken::never()).unwrap();
        assert_eq!(display.writes(), plan(20, 80, 10));
        assert_eq!(display.level(), 80);
    }

    #[test]
    fn failed_step_falls_back_to_one_direct_write() {
        // Two steps succeed, the third fails, the fallback is refused too.
        let display = MockDisplay::failing_after(20, 2);
        let err = transition(&display, 20, 80, Duration::ZERO, 10, &CancelToken::never())
            .unwrap_err();
        assert!(matches!(err, TransitionError::FallbackFailed { target: 80, .. }));
        assert_eq!(display.writes(), vec![20, 21]);
        assert_eq!(display.attempts(), 4);
    }

    #[test]
    fn failed_step_recovers_with_direct_write() {
        let display = MockDisplay {
            fail_attempt: Some(4),
            ..MockDisplay::at(20)
        };
        let outcome =
            transition(&display, 20, 80, Duration::ZERO, 10, &CancelToken::never()).unwrap();
        assert_eq!(outcome, TransitionOutcome::Recovered);
        assert_eq!(display.writes(), vec![20, 21, 24, 80]);
        assert_eq!(display.attempts(), 5);
    }

    #[test]
    fn mode_change_stops_a_running_transition() {
        let display = MockDisplay::at(20);
        let cell = ModeCell::default();
        let token = cell.token();
        let switcher = {
            let cell = cell.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(250));
                cell.set(Mode::Manual(10));
            })
        };

        // 100ms between steps: the switch lands around the third write.
        let outcome =
            transition(&display, 20, 80, Duration::from_millis(1000), 10, &token).unwrap();
        switcher.join().unwrap();

        let writes = display.writes();
        assert!(matches!(outcome, TransitionOutcome::Cancelled { last: Some(_) }));
        assert_eq!(outcome, TransitionOutcome::Cancelled { last: writes.last().copied() });
        assert!(!writes.is_empty() && writes.len() < 11);
        assert_eq!(writes[..], plan(20, 80, 10)[..writes.len()]);
        // No fallback write of the target.
        assert!(!writes.contains(&80));
        assert_eq!(display.attempts(), writes.len());
    }

    #[test]
    fn cancelled_before_start_writes_nothing() {
        let display = MockDisplay::at(20);
        let cell = ModeCell::default();
        let token = cell.token();
        cell.set(Mode::Manual(30));
        let outcome = transition(&display, 20, 80, Duration::ZERO, 10, &token).unwrap();
        assert_eq!(outcome, TransitionOutcome::Cancelled { last: None });
        assert!(display.writes().is_empty());
    }
}

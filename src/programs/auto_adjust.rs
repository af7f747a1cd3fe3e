use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, error, info};
use reqwest::Client;
use tokio::sync::{watch, Notify};
use tokio::time::sleep;

use crate::configuration::{ConfigError, Configuration, TransitionConfig};
use crate::display::{BrightnessControl, DisplayError};
use crate::mode::{Mode, ModeCell};
use crate::programs::preset::{resolve, Strategy};
use crate::programs::transition::{transition, TransitionError, TransitionOutcome};
use crate::suntimes::SunTimesResolver;

#[derive(thiserror::Error, Debug)]
pub enum CycleError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("Could not read display brightness: {0}")]
    Display(#[from] DisplayError),
    #[error("{0}")]
    Transition(#[from] TransitionError),
    #[error("Transition task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What one polling cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleReport {
    Paused(Mode),
    WithinThreshold {
        current: u8,
        target: u8,
    },
    Adjusted {
        from: u8,
        to: u8,
        outcome: TransitionOutcome,
    },
}

pub fn needs_adjustment(current: u8, target: u8, threshold: u8) -> bool {
    current.abs_diff(target) > threshold
}

pub fn transition_duration(config: &TransitionConfig) -> Duration {
    Duration::try_from_secs_f64(config.duration_seconds).unwrap_or(Duration::ZERO)
}

/// Periodically re-evaluates the target brightness while the mode is `AUTO`.
pub struct AutoAdjustProgram {
    config_path: PathBuf,
    display: Arc<dyn BrightnessControl>,
    mode: ModeCell,
    client: Client,
    suntimes: SunTimesResolver,
    interval: Duration,
}

impl AutoAdjustProgram {
    pub fn new(
        config_path: PathBuf,
        display: Arc<dyn BrightnessControl>,
        mode: ModeCell,
        client: Client,
    ) -> Self {
        Self::with_suntimes(config_path, display, mode, client, SunTimesResolver::default())
    }

    pub fn with_suntimes(
        config_path: PathBuf,
        display: Arc<dyn BrightnessControl>,
        mode: ModeCell,
        client: Client,
        suntimes: SunTimesResolver,
    ) -> Self {
        Self {
            config_path,
            display,
            mode,
            client,
            suntimes,
            interval: Duration::from_secs(Configuration::default().poll_interval_seconds),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn run_once(&mut self, now: DateTime<Local>) -> Result<CycleReport, CycleError> {
        // Taken before the mode check so a switch in between still cancels.
        let token = self.mode.token();
        let mode = self.mode.get();
        if mode != Mode::Auto {
            debug!("Mode is {} - skipping automatic adjustment.", mode);
            return Ok(CycleReport::Paused(mode));
        }

        let config = Configuration::load(&self.config_path)?;
        self.interval = Duration::from_secs(config.poll_interval_seconds.max(1));

        let sun = self
            .suntimes
            .sun_times(&self.client, &config.zipcode_config, now.date_naive())
            .await;
        let resolution = resolve(&config, now.time(), sun.as_ref());
        match resolution.strategy {
            Strategy::Daytime => info!("Daytime: using sunrise brightness."),
            Strategy::Nighttime => info!("Nighttime: using sunset brightness."),
            Strategy::Sinusoidal => info!("Using sinusoidal curve ({:.1}).", resolution.base),
            Strategy::Preset(i) => info!("Matched time preset #{}.", i),
            Strategy::Fallback => info!("No preset matches {} - using default.", now.time()),
        }
        let target = resolution.level;

        let current = self.display.current_brightness()?;
        if !needs_adjustment(current, target, config.change_threshold) {
            info!(
                "Current brightness of {}% is close to recommended {}%",
                current, target
            );
            return Ok(CycleReport::WithinThreshold { current, target });
        }

        info!("Adjusting brightness from {}% to {}%", current, target);
        let display = self.display.clone();
        let duration = transition_duration(&config.transition);
        let steps = config.transition.steps;
        let outcome = tokio::task::spawn_blocking(move || {
            transition(display.as_ref(), current, target, duration, steps, &token)
        })
        .await??;
        Ok(CycleReport::Adjusted {
            from: current,
            to: target,
            outcome,
        })
    }

    /// Poll until `shutdown` flips. `wake` forces an immediate cycle.
    pub async fn run(mut self, wake: Arc<Notify>, mut shutdown: watch::Receiver<bool>) {
        loop {
            info!("Running adjustment cycle.");
            match self.run_once(Local::now()).await {
                Ok(report) => debug!("Cycle finished: {:?}", report),
                Err(e) => error!("Skipping adjustment cycle: {}", e),
            }
            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = wake.notified() => debug!("Woken for immediate re-evaluation."),
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }
        }
        info!("Poll loop stopped.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        assert!(!needs_adjustment(50, 55, 5));
        assert!(!needs_adjustment(55, 50, 5));
        assert!(needs_adjustment(50, 56, 5));
        assert!(needs_adjustment(56, 50, 5));
        assert!(!needs_adjustment(70, 70, 0));
        assert!(needs_adjustment(70, 71, 0));
    }

    #[test]
    fn duration_from_seconds() {
        let mut config = TransitionConfig::default();
        assert_eq!(transition_duration(&config), Duration::from_secs(3));
        config.duration_seconds = 0.5;
        assert_eq!(transition_duration(&config), Duration::from_millis(500));
        config.duration_seconds = -1.0;
        assert_eq!(transition_duration(&config), Duration::ZERO);
    }
}

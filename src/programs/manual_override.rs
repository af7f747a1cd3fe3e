use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::configuration::TransitionConfig;
use crate::display::BrightnessControl;
use crate::mode::{Command, Mode, ModeCell};
use crate::programs::auto_adjust::transition_duration;
use crate::programs::transition::{transition, TransitionOutcome};

/// Applies menu commands to the shared mode and the display.
pub struct ManualOverrideProgram {
    display: Arc<dyn BrightnessControl>,
    mode: ModeCell,
    wake: Arc<Notify>,
    transition: TransitionConfig,
}

impl ManualOverrideProgram {
    pub fn new(
        display: Arc<dyn BrightnessControl>,
        mode: ModeCell,
        wake: Arc<Notify>,
        transition: TransitionConfig,
    ) -> Self {
        Self {
            display,
            mode,
            wake,
            transition,
        }
    }

    /// Pin the display to `level`. The transition runs in the background and is
    /// cancelled by the next mode change.
    pub fn set_manual(&self, level: u8) -> JoinHandle<Option<TransitionOutcome>> {
        let level = level.min(100);
        self.mode.set(Mode::Manual(level));
        let token = self.mode.token();
        let display = self.display.clone();
        let duration = transition_duration(&self.transition);
        let steps = self.transition.steps;
        tokio::task::spawn_blocking(move || {
            let start = match display.current_brightness() {
                Ok(current) => current,
                Err(e) => {
                    warn!("Could not read brightness ({}) - setting {}% directly.", e, level);
                    level
                }
            };
            match transition(display.as_ref(), start, level, duration, steps, &token) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!("Manual brightness change failed: {}", e);
                    None
                }
            }
        })
    }

    pub fn enable_auto(&self) {
        self.mode.set(Mode::Auto);
        self.wake.notify_one();
    }

    /// Returns `false` once the command asks to exit.
    pub fn handle(&self, command: Command) -> bool {
        info!("Received command: {:?}", command);
        match command {
            Command::SetManual(level) => {
                self.set_manual(level);
                true
            }
            Command::EnableAuto => {
                self.enable_auto();
                true
            }
            Command::Exit => false,
        }
    }
}

//! In-memory display for exercising brightness logic without touching hardware.
//!
//! Every successful write is appended to `writes`, so tests can assert the exact
//! sequence a transition produced. `fail_after` makes writes start failing once
//! that many have succeeded, `fail_attempt` fails only that one (1-based) attempt,
//! and `fail_reads` makes `get_brightness` fail.

use std::sync::Mutex;

use super::{BrightnessControl, DisplayError};

#[derive(Debug, Default)]
pub struct MockDisplay {
    pub level: Mutex<u8>,
    pub writes: Mutex<Vec<u8>>,
    pub attempts: Mutex<usize>,
    pub fail_after: Option<usize>,
    pub fail_attempt: Option<usize>,
    pub fail_reads: bool,
}

impl MockDisplay {
    pub fn at(level: u8) -> Self {
        Self {
            level: Mutex::new(level),
            ..Default::default()
        }
    }

    pub fn failing_after(level: u8, ok_writes: usize) -> Self {
        Self {
            fail_after: Some(ok_writes),
            ..Self::at(level)
        }
    }

    pub fn writes(&self) -> Vec<u8> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn level(&self) -> u8 {
        *self.level.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BrightnessControl for MockDisplay {
    fn list_displays(&self) -> Result<Vec<String>, DisplayError> {
        Ok(vec!["mock0".to_string()])
    }

    fn get_brightness(&self) -> Result<Vec<u8>, DisplayError> {
        if self.fail_reads {
            return Err(DisplayError::Driver("mock read failure".to_string()));
        }
        Ok(vec![self.level()])
    }

    fn set_brightness(&self, level: u8, _display: Option<&str>) -> Result<(), DisplayError> {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        *attempts += 1;
        if self.fail_attempt == Some(*attempts) {
            return Err(DisplayError::Driver("mock write failure".to_string()));
        }
        let mut writes = self.writes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(limit) = self.fail_after {
            if writes.len() >= limit {
                return Err(DisplayError::Driver("mock write failure".to_string()));
            }
        }
        writes.push(level);
        *self.level.lock().unwrap_or_else(|e| e.into_inner()) = level;
        Ok(())
    }
}

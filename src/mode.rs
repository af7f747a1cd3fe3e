use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::info;

/// Who is in charge of the display brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Auto,
    Manual(u8),
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Auto => write!(f, "AUTO"),
            Mode::Manual(level) => write!(f, "MANUAL({}%)", level),
        }
    }
}

/// User requests coming from the menu front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetManual(u8),
    EnableAuto,
    Exit,
}

#[derive(Debug)]
struct Inner {
    mode: Mutex<Mode>,
    generation: AtomicU64,
}

/// Shared mode cell. Every change bumps a generation counter, which is what
/// `CancelToken`s watch.
#[derive(Debug, Clone)]
pub struct ModeCell {
    inner: Arc<Inner>,
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new(Mode::Auto)
    }
}

impl ModeCell {
    pub fn new(mode: Mode) -> Self {
        Self {
            inner: Arc::new(Inner {
                mode: Mutex::new(mode),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn get(&self) -> Mode {
        *self.inner.mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the mode, cancelling every outstanding token. Returns the old mode.
    pub fn set(&self, mode: Mode) -> Mode {
        let mut guard = self.inner.mode.lock().unwrap_or_else(|e| e.into_inner());
        let previous = *guard;
        *guard = mode;
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        drop(guard);
        info!("Mode changed: {} -> {}", previous, mode);
        previous
    }

    pub fn is_auto(&self) -> bool {
        self.get() == Mode::Auto
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            inner: Some(self.inner.clone()),
            generation: self.inner.generation.load(Ordering::SeqCst),
        }
    }
}

/// Cancelled as soon as the mode it was taken from changes.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Option<Arc<Inner>>,
    generation: u64,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self {
            inner: None,
            generation: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.inner {
            Some(inner) => inner.generation.load(Ordering::SeqCst) != self.generation,
            None => false,
        }
    }
}

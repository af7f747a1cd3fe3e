//! Time-of-day display brightness scheduling.
//!
//! A poll loop re-reads the configuration, resolves a target brightness from
//! sunrise/sunset times, a sinusoidal day curve, or fixed time windows, and eases
//! the display towards it. A menu lets the user pin a manual level instead.

pub mod configuration;
pub mod display;
pub mod geocode;
pub mod logging;
pub mod menu;
pub mod mode;
pub mod programs;
pub mod suntimes;

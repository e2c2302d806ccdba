//! # tb-config
//!
//! Configuration loading and logging bootstrap for threadboard.

pub mod settings;
pub mod telemetry;

pub use settings::{DatabaseSettings, LogSettings, MediaSettings, Settings, SettingsError};
pub use telemetry::{init_tracing, TelemetryError};

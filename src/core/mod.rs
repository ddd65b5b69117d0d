//! # Core Module
//!
//! Configuration and tick arithmetic shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add ticks module with period parsing and formatting
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod ticks;

// Re-export commonly used items
pub use config::Config;
pub use ticks::{
    format_ticks, is_hour_boundary, parse_period, ticks_from_now, to_hour_boundary, Tick,
};

//! # Reminder Save Data
//!
//! Ordered-list dump of the scheduler's queue and staging list, written as
//! JSON by the host's save hook and read back on load.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::reminder::Reminder;
use super::scheduler::ReminderScheduler;
use crate::core::Tick;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,

    pub saved_at: DateTime<Utc>,

    /// Host tick at the time of saving
    #[serde(default)]
    pub tick: Tick,

    /// Queued reminders in heap-array order
    #[serde(default)]
    pub queue: Vec<Reminder>,

    /// Reminders waiting for the next load
    #[serde(default)]
    pub staging: Vec<Reminder>,
}

impl SaveData {
    /// Snapshot the scheduler's pending reminders
    pub fn capture(scheduler: &ReminderScheduler, tick: Tick) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            tick,
            queue: scheduler.snapshot_queue(),
            staging: scheduler.snapshot_staging(),
        }
    }

    /// Replace the scheduler's queue and staging list with this save
    pub fn apply(self, scheduler: &mut ReminderScheduler) {
        debug!(
            "Applying save from {} ({} queued, {} staged)",
            self.saved_at,
            self.queue.len(),
            self.staging.len()
        );
        scheduler.restore(self.queue, self.staging);
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize reminders")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write save file {}", path.display()))?;
        info!(
            "💾 Saved {} queued and {} staged reminder(s) to {}",
            self.queue.len(),
            self.staging.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read save file {}", path.display()))?;
        let data: SaveData = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse save file {}", path.display()))?;

        if data.version > SAVE_VERSION {
            return Err(anyhow::anyhow!(
                "Save file {} has version {}, newest supported is {}",
                path.display(),
                data.version,
                SAVE_VERSION
            ));
        }

        Ok(data)
    }
}

//! # Reminder Drafts
//!
//! Edit buffer for a reminder that is being created or changed. The
//! scheduler trusts what it is given, so everything user-facing goes through
//! [`ReminderDraft::into_reminder`] first.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use anyhow::{bail, Result};

use super::reminder::{FireAt, Reminder, ReminderId, Urgency};
use crate::core::{ticks_from_now, Config, Tick};

/// Default recurrence offered by a fresh draft, in hours
pub const DEFAULT_RECUR_HOURS: Tick = 8;

/// When the draft should fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftFire {
    /// Absolute tick
    At(Tick),
    /// Relative to the current tick, snapped to the hour
    In { days: Tick, hours: Tick },
    NextLoad,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    /// Set when editing an existing reminder
    pub editing: Option<ReminderId>,
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
    pub fire: DraftFire,
    pub recur_every: Option<Tick>,
}

impl ReminderDraft {
    /// A blank draft firing eight hours from now
    pub fn new() -> Self {
        Self {
            editing: None,
            title: String::new(),
            body: String::new(),
            urgency: Urgency::Neutral,
            fire: DraftFire::In {
                days: 0,
                hours: DEFAULT_RECUR_HOURS,
            },
            recur_every: None,
        }
    }

    /// Preload a draft from a pending reminder
    pub fn from_reminder(reminder: &Reminder) -> Self {
        let fire = match reminder.fire_at {
            FireAt::At(tick) => DraftFire::At(tick),
            FireAt::NextLoad => DraftFire::NextLoad,
            FireAt::Never => DraftFire::Never,
        };

        Self {
            editing: Some(reminder.id),
            title: reminder.title.clone(),
            body: reminder.body.clone(),
            urgency: reminder.urgency,
            fire,
            recur_every: reminder.recur_every,
        }
    }

    /// The fire time this draft resolves to at `now`
    pub fn resolve_fire_at(&self, now: Tick, config: &Config) -> Result<FireAt> {
        let fire_at = match self.fire {
            DraftFire::At(tick) => FireAt::At(tick),
            DraftFire::In { days, hours } => match ticks_from_now(now, days, hours, config) {
                Some(tick) => FireAt::At(tick),
                None => bail!("Relative time {days}d {hours}h is too far in the future"),
            },
            DraftFire::NextLoad => FireAt::NextLoad,
            DraftFire::Never => FireAt::Never,
        };
        Ok(fire_at)
    }

    /// Reject drafts the scheduler must never see
    pub fn validate(&self, now: Tick, config: &Config) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("Reminder title cannot be empty");
        }

        if let DraftFire::In { days, hours } = self.fire {
            if days < 0 || hours < 0 {
                bail!("Relative time cannot be negative ({days}d {hours}h)");
            }
        }

        if let FireAt::At(tick) = self.resolve_fire_at(now, config)? {
            if tick < now {
                bail!("Reminder time {tick} is in the past (now {now})");
            }
        }

        if let Some(every) = self.recur_every {
            if every <= 0 {
                bail!("Recurrence interval must be positive, got {every}");
            }
        }

        Ok(())
    }

    /// Validate and build the reminder. Edits get a fresh identity; the
    /// caller replaces the old one via `ReminderScheduler::replace`.
    pub fn into_reminder(self, now: Tick, config: &Config) -> Result<Reminder> {
        self.validate(now, config)?;
        let fire_at = self.resolve_fire_at(now, config)?;

        Ok(Reminder {
            id: ReminderId::new(),
            title: self.title,
            body: self.body,
            urgency: self.urgency,
            fire_at,
            recur_every: self.recur_every,
        })
    }
}

impl Default for ReminderDraft {
    fn default() -> Self {
        Self::new()
    }
}

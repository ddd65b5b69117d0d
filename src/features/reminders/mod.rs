//! # Reminders Feature
//!
//! Game-time reminders with recurrence and next-load delivery.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Drafts and save data
//! - 1.1.0: Next-load staging and recurring reminders
//! - 1.0.0: Initial release with lazy-deletion queue and hourly drain

pub mod draft;
pub mod persistence;
pub mod queue;
pub mod reminder;
pub mod scheduler;

pub use draft::{DraftFire, ReminderDraft};
pub use persistence::SaveData;
pub use queue::{Identified, PriorityQueue};
pub use reminder::{FireAt, Reminder, ReminderId, Urgency};
pub use scheduler::{
    DayHourContext, Delivery, DeliverySink, LogSink, ReminderScheduler, TickReport, TimeContext,
};

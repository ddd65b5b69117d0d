//! # Features Layer
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod reminders;

pub use reminders::{
    DayHourContext, Delivery, DeliverySink, DraftFire, FireAt, LogSink, PriorityQueue, Reminder,
    ReminderDraft, ReminderId, ReminderScheduler, SaveData, TickReport, TimeContext, Urgency,
};

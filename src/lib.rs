// Core layer - configuration and tick arithmetic
pub mod core;

// Features layer - reminder queue, scheduler, drafts, save data
pub mod features;

pub use crate::core::{Config, Tick};

pub use features::{
    DayHourContext, Delivery, DeliverySink, DraftFire, FireAt, LogSink, PriorityQueue, Reminder,
    ReminderDraft, ReminderId, ReminderScheduler, SaveData, TickReport, TimeContext, Urgency,
};

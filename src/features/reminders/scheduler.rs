//! # Reminder Scheduler
//!
//! Drives reminder delivery from the host's tick callback. Timed reminders
//! live in a [`PriorityQueue`] and are drained on hour boundaries;
//! next-load reminders sit in a staging list and fire once, shortly after
//! the world is loaded.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Recurring reminders re-queue a successor after delivery
//! - 1.1.0: Next-load staging list with post-load delay
//! - 1.0.0: Initial release with hourly drain loop
//!
//! Everything runs synchronously inside `on_tick`. The scheduler holds no
//! clock, world or mailbox of its own: the host passes them in.

use anyhow::Result;
use log::{debug, info, warn};

use super::queue::PriorityQueue;
use super::reminder::{FireAt, Reminder, ReminderId, Urgency};
use crate::core::{format_ticks, is_hour_boundary, Config, Tick};

/// What the host's mailbox receives for one fired reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub reminder_id: ReminderId,
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
    /// When the reminder was scheduled for, plus its recurrence if any
    pub schedule_description: String,
}

/// Host notification interface
pub trait DeliverySink {
    fn deliver(&mut self, delivery: &Delivery) -> Result<()>;
}

/// Collects deliveries in memory
impl DeliverySink for Vec<Delivery> {
    fn deliver(&mut self, delivery: &Delivery) -> Result<()> {
        self.push(delivery.clone());
        Ok(())
    }
}

/// Writes deliveries to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DeliverySink for LogSink {
    fn deliver(&mut self, delivery: &Delivery) -> Result<()> {
        info!(
            "🔔 [{}] {} ({})",
            delivery.urgency, delivery.title, delivery.schedule_description
        );
        if !delivery.body.is_empty() {
            info!("   {}", delivery.body.replace('\n', " "));
        }
        Ok(())
    }
}

/// Location-dependent time rendering supplied by the host.
///
/// Hour-boundary delivery only happens while a context is available.
pub trait TimeContext {
    fn describe(&self, tick: Tick) -> String;
}

/// Renders ticks as "day D, HHh" using the configured tick lengths
#[derive(Debug, Clone)]
pub struct DayHourContext {
    ticks_per_hour: Tick,
    ticks_per_day: Tick,
}

impl DayHourContext {
    pub fn new(config: &Config) -> Self {
        Self {
            ticks_per_hour: config.ticks_per_hour,
            ticks_per_day: config.ticks_per_day(),
        }
    }
}

impl TimeContext for DayHourContext {
    fn describe(&self, tick: Tick) -> String {
        let day = tick.div_euclid(self.ticks_per_day) + 1;
        let hour = tick.rem_euclid(self.ticks_per_day) / self.ticks_per_hour;
        format!("day {day}, {hour:02}h")
    }
}

/// Outcome of one `on_tick` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Timed reminders delivered from the queue
    pub delivered: usize,
    /// Next-load reminders delivered from staging
    pub staged_delivered: usize,
    /// Successors created for recurring reminders
    pub requeued: usize,
    /// Deliveries the sink rejected
    pub failed: usize,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.staged_delivered == 0
    }
}

/// Owns the timed queue and the next-load staging list
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    queue: PriorityQueue<Reminder>,
    staging: Vec<Reminder>,
    load_tick: Tick,
    config: Config,
}

impl ReminderScheduler {
    pub fn new(config: Config) -> Self {
        Self {
            queue: PriorityQueue::new(),
            staging: Vec::new(),
            load_tick: 0,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_tick(&self) -> Tick {
        self.load_tick
    }

    /// Record the tick at which the world finished loading
    pub fn on_world_loaded(&mut self, current_tick: Tick) {
        self.load_tick = current_tick;
        info!(
            "World loaded at tick {current_tick}: {} queued, {} waiting for load",
            self.queue.len(),
            self.staging.len()
        );
    }

    /// Advance the scheduler by one host tick.
    ///
    /// Must not be re-entered from inside `sink`.
    pub fn on_tick(
        &mut self,
        current_tick: Tick,
        context: Option<&dyn TimeContext>,
        sink: &mut dyn DeliverySink,
    ) -> TickReport {
        let mut report = TickReport::default();

        let staging_tick = self.load_tick.checked_add(self.config.delay_after_load);
        if staging_tick == Some(current_tick) {
            self.drain_staging(sink, &mut report);
        }

        if !is_hour_boundary(current_tick, &self.config) {
            return report;
        }
        let Some(context) = context else {
            debug!("No time context at tick {current_tick}, deferring due reminders");
            return report;
        };
        if self.queue.is_empty() {
            return report;
        }

        self.drain_due(current_tick, context, sink, &mut report);

        if !report.is_empty() {
            info!(
                "Tick {current_tick}: delivered {} reminder(s), {} recurring re-queued",
                report.delivered, report.requeued
            );
        }
        report
    }

    /// Add a reminder to the queue, or to staging if it fires on next load
    pub fn schedule(&mut self, reminder: Reminder) {
        debug!(
            "Scheduling reminder {} ({:?}) '{}'",
            reminder.id, reminder.fire_at, reminder.title
        );
        match reminder.fire_at {
            FireAt::NextLoad => self.staging.push(reminder),
            FireAt::At(_) | FireAt::Never => self.queue.push(reminder),
        }
    }

    /// Remove a reminder wherever it lives. Unknown ids are ignored.
    pub fn cancel(&mut self, id: &ReminderId) -> bool {
        if self.queue.remove(id) {
            debug!("Cancelled queued reminder {id}");
            return true;
        }

        if let Some(pos) = self.staging.iter().position(|r| r.id == *id) {
            self.staging.remove(pos);
            debug!("Cancelled staged reminder {id}");
            return true;
        }

        debug!("Cancel for unknown reminder {id} ignored");
        false
    }

    /// Edit flow: drop the old reminder (if still present) and schedule its
    /// replacement
    pub fn replace(&mut self, old: &ReminderId, reminder: Reminder) {
        self.cancel(old);
        self.schedule(reminder);
    }

    /// Look up a pending reminder, e.g. to preload an edit form
    pub fn get(&self, id: &ReminderId) -> Option<&Reminder> {
        self.reminders().find(|r| r.id == *id)
    }

    /// Staged reminders first, then queued ones in heap order
    pub fn reminders(&self) -> impl Iterator<Item = &Reminder> {
        self.staging.iter().chain(self.queue.iter())
    }

    /// The earliest queued reminder
    pub fn next_due(&self) -> Option<&Reminder> {
        self.queue.peek()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }

    pub fn snapshot_queue(&self) -> Vec<Reminder> {
        self.queue.snapshot()
    }

    pub fn snapshot_staging(&self) -> Vec<Reminder> {
        self.staging.clone()
    }

    /// Replace both containers from a save.
    ///
    /// Entries are routed by fire time, whichever list they were saved in.
    pub fn restore(&mut self, queue: Vec<Reminder>, staging: Vec<Reminder>) {
        self.queue.clear();
        self.staging.clear();
        self.absorb(staging, "staging list");
        self.absorb(queue, "queue");
        debug!(
            "Restored {} queued and {} staged reminder(s)",
            self.queue.len(),
            self.staging.len()
        );
    }

    /// Merge saved queue entries into the current state, in any order
    pub fn restore_queue(&mut self, reminders: Vec<Reminder>) {
        self.absorb(reminders, "queue");
    }

    /// Merge saved staging entries into the current state
    pub fn restore_staging(&mut self, reminders: Vec<Reminder>) {
        self.absorb(reminders, "staging list");
    }

    fn absorb(&mut self, reminders: Vec<Reminder>, source: &str) {
        let (staged, timed): (Vec<_>, Vec<_>) = reminders
            .into_iter()
            .partition(|r| r.fire_at == FireAt::NextLoad);

        let misplaced = if source == "queue" {
            staged.len()
        } else {
            timed.len()
        };
        if misplaced > 0 {
            warn!("Re-routing {misplaced} misplaced reminder(s) found in saved {source}");
        }

        self.staging.extend(staged);
        if self.queue.is_empty() {
            // O(n) heapify for the common fresh-load case
            self.queue = PriorityQueue::from_items(timed);
        } else {
            for reminder in timed {
                self.queue.push(reminder);
            }
        }
    }

    fn drain_staging(&mut self, sink: &mut dyn DeliverySink, report: &mut TickReport) {
        let staged = std::mem::take(&mut self.staging);
        if staged.is_empty() {
            return;
        }
        info!("Sending {} reminder(s) on load", staged.len());

        let mut next_staging = Vec::new();
        for reminder in staged {
            let description = self.describe_schedule(&reminder, None);
            self.deliver(&reminder, description, sink, report);
            report.staged_delivered += 1;

            if let Some(successor) = reminder.successor() {
                next_staging.push(successor);
                report.requeued += 1;
            }
        }

        self.staging = next_staging;
    }

    /// Pop every reminder due at `current_tick`.
    ///
    /// Successors are pushed only after the drain, so each recurring
    /// reminder fires at most once per call even when many intervals were
    /// missed.
    fn drain_due(
        &mut self,
        current_tick: Tick,
        context: &dyn TimeContext,
        sink: &mut dyn DeliverySink,
        report: &mut TickReport,
    ) {
        let mut successors = Vec::new();

        while self
            .queue
            .peek()
            .is_some_and(|next| next.fire_at.is_due(current_tick))
        {
            let Some(reminder) = self.queue.pop() else {
                break;
            };

            let description = self.describe_schedule(&reminder, Some(context));
            self.deliver(&reminder, description, sink, report);
            report.delivered += 1;

            if let Some(successor) = reminder.successor() {
                successors.push(successor);
            }
        }

        report.requeued += successors.len();
        for successor in successors {
            self.queue.push(successor);
        }
    }

    fn deliver(
        &self,
        reminder: &Reminder,
        schedule_description: String,
        sink: &mut dyn DeliverySink,
        report: &mut TickReport,
    ) {
        let delivery = Delivery {
            reminder_id: reminder.id,
            title: reminder.title.clone(),
            body: reminder.body.clone(),
            urgency: reminder.urgency,
            schedule_description,
        };

        if let Err(e) = sink.deliver(&delivery) {
            warn!("Failed to deliver reminder {}: {e:#}", reminder.id);
            report.failed += 1;
        }
    }

    fn describe_schedule(&self, reminder: &Reminder, context: Option<&dyn TimeContext>) -> String {
        let describe = |fire_at: FireAt| match (fire_at, context) {
            (FireAt::At(tick), Some(context)) => context.describe(tick),
            (FireAt::At(tick), None) => format!("tick {tick}"),
            (FireAt::NextLoad, _) => "next load".to_string(),
            (FireAt::Never, _) => "never".to_string(),
        };

        let scheduled_for = describe(reminder.fire_at);
        match (reminder.recur_every, reminder.successor()) {
            (Some(every), Some(next)) => format!(
                "{scheduled_for}, repeats every {} (next: {})",
                format_ticks(every, &self.config),
                describe(next.fire_at)
            ),
            _ => scheduled_for,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Tick = 50;

    fn config() -> Config {
        Config {
            ticks_per_hour: HOUR,
            hours_per_day: 24,
            delay_after_load: 10,
            ..Config::default()
        }
    }

    fn context() -> DayHourContext {
        DayHourContext::new(&config())
    }

    fn timed(title: &str, at: Tick) -> Reminder {
        Reminder::new(title, "", FireAt::At(at))
    }

    struct FailingSink {
        attempts: usize,
    }

    impl DeliverySink for FailingSink {
        fn deliver(&mut self, _delivery: &Delivery) -> Result<()> {
            self.attempts += 1;
            Err(anyhow::anyhow!("mailbox full"))
        }
    }

    #[test]
    fn test_drains_all_due_items_in_order() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(timed("late", 200));
        scheduler.schedule(timed("a", 100));
        scheduler.schedule(timed("mid", 150));
        scheduler.schedule(timed("b", 100));

        let ctx = context();
        let mut sink: Vec<Delivery> = Vec::new();
        let report = scheduler.on_tick(150, Some(&ctx), &mut sink);

        assert_eq!(report.delivered, 3);
        let titles: Vec<&str> = sink.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[2], "mid");
        assert!(titles[..2].contains(&"a") && titles[..2].contains(&"b"));

        assert_eq!(scheduler.queued_len(), 1);
        assert_eq!(scheduler.next_due().unwrap().title, "late");
    }

    #[test]
    fn test_only_hour_boundaries_deliver() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(timed("due", 100));

        let ctx = context();
        let mut sink: Vec<Delivery> = Vec::new();
        for tick in 101..150 {
            scheduler.on_tick(tick, Some(&ctx), &mut sink);
        }
        assert!(sink.is_empty());

        scheduler.on_tick(150, Some(&ctx), &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_missing_context_defers_delivery() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(timed("due", 100));

        let mut sink: Vec<Delivery> = Vec::new();
        let report = scheduler.on_tick(100, None, &mut sink);
        assert_eq!(report, TickReport::default());
        assert_eq!(scheduler.queued_len(), 1);

        let ctx = context();
        scheduler.on_tick(150, Some(&ctx), &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(scheduler.queued_len(), 0);
    }

    #[test]
    fn test_never_reminders_stay_queued() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(Reminder::new("someday", "", FireAt::Never));

        let ctx = context();
        let mut sink: Vec<Delivery> = Vec::new();
        scheduler.on_tick(1_000_000, Some(&ctx), &mut sink);
        assert!(sink.is_empty());
        assert_eq!(scheduler.queued_len(), 1);
    }

    #[test]
    fn test_recurring_reminder_produces_successors() {
        let mut scheduler = ReminderScheduler::new(config());
        let original = timed("water plants", 100).recurring(50);
        let original_id = original.id;
        scheduler.schedule(original);

        let ctx = context();
        let mut sink: Vec<Delivery> = Vec::new();

        let report = scheduler.on_tick(150, Some(&ctx), &mut sink);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.requeued, 1);
        assert_eq!(scheduler.queued_len(), 1);
        let first = scheduler.next_due().unwrap().clone();
        assert_eq!(first.fire_at, FireAt::At(150));
        assert_ne!(first.id, original_id);

        scheduler.on_tick(200, Some(&ctx), &mut sink);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].reminder_id, first.id);
        assert_eq!(scheduler.queued_len(), 1);
        assert_eq!(scheduler.next_due().unwrap().fire_at, FireAt::At(200));
    }

    #[test]
    fn test_recurring_description_mentions_next_occurrence() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(timed("feed", 100).recurring(HOUR * 2));

        let ctx = context();
        let mut sink: Vec<Delivery> = Vec::new();
        scheduler.on_tick(100, Some(&ctx), &mut sink);

        assert_eq!(
            sink[0].schedule_description,
            "day 1, 02h, repeats every 2 hours (next: day 1, 04h)"
        );
    }

    #[test]
    fn test_staged_reminder_fires_once_after_load_delay() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(Reminder::new("welcome back", "", FireAt::NextLoad));
        assert_eq!(scheduler.staged_len(), 1);
        assert_eq!(scheduler.queued_len(), 0);

        scheduler.on_world_loaded(1000);

        let mut sink: Vec<Delivery> = Vec::new();
        for tick in 1000..1100 {
            scheduler.on_tick(tick, None, &mut sink);
        }

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].schedule_description, "next load");
        assert_eq!(scheduler.staged_len(), 0);
        assert_eq!(scheduler.queued_len(), 0);
    }

    #[test]
    fn test_recurring_staged_reminder_waits_for_next_load() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(Reminder::new("check stock", "", FireAt::NextLoad).recurring(HOUR));
        scheduler.on_world_loaded(0);

        let mut sink: Vec<Delivery> = Vec::new();
        let report = scheduler.on_tick(10, None, &mut sink);
        assert_eq!(report.staged_delivered, 1);
        assert_eq!(report.requeued, 1);
        assert_eq!(scheduler.staged_len(), 1);
        assert_eq!(scheduler.queued_len(), 0);

        // not again in this session
        for tick in 11..500 {
            scheduler.on_tick(tick, None, &mut sink);
        }
        assert_eq!(sink.len(), 1);

        scheduler.on_world_loaded(500);
        scheduler.on_tick(510, None, &mut sink);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_cancel_queued_and_staged() {
        let mut scheduler = ReminderScheduler::new(config());
        let queued = timed("queued", 100);
        let staged = Reminder::new("staged", "", FireAt::NextLoad);
        let (queued_id, staged_id) = (queued.id, staged.id);
        scheduler.schedule(queued);
        scheduler.schedule(staged);

        assert!(scheduler.cancel(&queued_id));
        assert!(scheduler.cancel(&staged_id));
        assert!(!scheduler.cancel(&queued_id));
        assert_eq!(scheduler.reminders().count(), 0);

        let ctx = context();
        let mut sink: Vec<Delivery> = Vec::new();
        scheduler.on_world_loaded(90);
        scheduler.on_tick(100, Some(&ctx), &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_cancel_after_delivery_is_noop() {
        let mut scheduler = ReminderScheduler::new(config());
        let reminder = timed("once", 100);
        let id = reminder.id;
        scheduler.schedule(reminder);

        let ctx = context();
        let mut sink: Vec<Delivery> = Vec::new();
        scheduler.on_tick(100, Some(&ctx), &mut sink);

        assert!(!scheduler.cancel(&id));
        assert_eq!(scheduler.queued_len(), 0);
    }

    #[test]
    fn test_replace_moves_between_queue_and_staging() {
        let mut scheduler = ReminderScheduler::new(config());
        let reminder = timed("edit me", 500);
        let id = reminder.id;
        scheduler.schedule(reminder);

        let edited = Reminder::new("edited", "now on load", FireAt::NextLoad);
        let edited_id = edited.id;
        scheduler.replace(&id, edited);

        assert!(scheduler.get(&id).is_none());
        assert_eq!(scheduler.get(&edited_id).unwrap().title, "edited");
        assert_eq!(scheduler.queued_len(), 0);
        assert_eq!(scheduler.staged_len(), 1);
    }

    #[test]
    fn test_sink_failure_does_not_stop_drain() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(timed("a", 50));
        scheduler.schedule(timed("b", 100).recurring(HOUR));

        let ctx = context();
        let mut sink = FailingSink { attempts: 0 };
        let report = scheduler.on_tick(100, Some(&ctx), &mut sink);

        assert_eq!(sink.attempts, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.delivered, 2);
        // the recurring successor is still queued
        assert_eq!(scheduler.queued_len(), 1);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut scheduler = ReminderScheduler::new(config());
        for (i, at) in [400, 100, 300, 100, 250].into_iter().enumerate() {
            scheduler.schedule(timed(&format!("r{i}"), at));
        }
        let dropped = timed("dropped", 50);
        let dropped_id = dropped.id;
        scheduler.schedule(dropped);
        scheduler.cancel(&dropped_id);
        scheduler.schedule(Reminder::new("on load", "", FireAt::NextLoad));

        let queue = scheduler.snapshot_queue();
        let staging = scheduler.snapshot_staging();
        assert_eq!(queue.len(), 5);
        assert!(queue.iter().all(|r| r.id != dropped_id));

        let mut restored = ReminderScheduler::new(config());
        let mut reversed = queue.clone();
        reversed.reverse();
        restored.restore_queue(reversed);
        restored.restore_staging(staging);

        let ctx = context();
        let mut before: Vec<Delivery> = Vec::new();
        let mut after: Vec<Delivery> = Vec::new();
        scheduler.on_tick(1000, Some(&ctx), &mut before);
        restored.on_tick(1000, Some(&ctx), &mut after);

        let order = |d: &Vec<Delivery>| d.iter().map(|d| d.reminder_id).collect::<Vec<_>>();
        assert_eq!(order(&before), order(&after));
        assert_eq!(restored.staged_len(), 1);
    }

    #[test]
    fn test_restore_routes_misplaced_entries_without_losing_any() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.restore(
            vec![
                timed("timed", 100),
                Reminder::new("misplaced next-load", "", FireAt::NextLoad),
            ],
            vec![
                Reminder::new("staged", "", FireAt::NextLoad),
                timed("misplaced timed", 200),
            ],
        );

        assert_eq!(scheduler.queued_len(), 2);
        assert_eq!(scheduler.staged_len(), 2);
        assert!(scheduler
            .snapshot_queue()
            .iter()
            .all(|r| r.fire_at != FireAt::NextLoad));
        assert_eq!(scheduler.reminders().count(), 4);
    }

    #[test]
    fn test_restore_replaces_previous_state() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(timed("stale", 100));
        scheduler.schedule(Reminder::new("stale staged", "", FireAt::NextLoad));

        scheduler.restore(vec![timed("fresh", 300)], Vec::new());

        assert_eq!(scheduler.queued_len(), 1);
        assert_eq!(scheduler.staged_len(), 0);
        assert_eq!(scheduler.next_due().unwrap().title, "fresh");
    }

    #[test]
    fn test_single_list_restores_merge_in_either_order() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.restore_queue(vec![Reminder::new("from queue", "", FireAt::NextLoad)]);
        scheduler.restore_staging(vec![Reminder::new("from staging", "", FireAt::NextLoad)]);
        assert_eq!(scheduler.staged_len(), 2);

        let mut scheduler = ReminderScheduler::new(config());
        scheduler.restore_staging(vec![timed("from staging", 200)]);
        scheduler.restore_queue(vec![timed("from queue", 100)]);
        assert_eq!(scheduler.queued_len(), 2);
        assert_eq!(scheduler.next_due().unwrap().title, "from queue");
    }

    #[test]
    fn test_load_delay_near_tick_limit_does_not_overflow() {
        let mut scheduler = ReminderScheduler::new(config());
        scheduler.schedule(Reminder::new("on load", "", FireAt::NextLoad));
        scheduler.on_world_loaded(Tick::MAX - 5);

        let mut sink: Vec<Delivery> = Vec::new();
        let report = scheduler.on_tick(Tick::MAX, None, &mut sink);
        assert_eq!(report, TickReport::default());
        assert_eq!(scheduler.staged_len(), 1);
    }

    #[test]
    fn test_day_hour_context() {
        let ctx = context();
        assert_eq!(ctx.describe(0), "day 1, 00h");
        assert_eq!(ctx.describe(HOUR * 25), "day 2, 01h");
    }
}

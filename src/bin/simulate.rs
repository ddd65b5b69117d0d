//! # Reminder Simulation Host
//!
//! Stands in for the game engine: advances a tick clock on a timer, feeds
//! the scheduler, delivers reminders to the log and saves on exit.
//!
//! Usage: `cargo run --bin reminders-sim`
//!
//! Environment:
//! - `REMINDERS_SIM_PERIOD`: how long to simulate, e.g. `3d` or `1d12h` (default `3d`)
//! - `REMINDERS_SIM_STEP_MS`: wall-clock milliseconds per simulated hour (default 20)

use anyhow::{Context, Result};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::path::Path;
use std::time::Duration;

use reminders::core::parse_period;
use reminders::{
    Config, DayHourContext, DraftFire, LogSink, ReminderDraft, ReminderScheduler, SaveData, Tick,
    Urgency,
};

/// Seed reminders for a fresh save
fn seed_reminders(scheduler: &mut ReminderScheduler, now: Tick) -> Result<()> {
    let config = scheduler.config().clone();
    let drafts = vec![
        ReminderDraft {
            title: "Welcome back".to_string(),
            body: "Reminders are active for this colony.".to_string(),
            fire: DraftFire::NextLoad,
            ..ReminderDraft::new()
        },
        ReminderDraft {
            title: "Check the freezer".to_string(),
            body: "Power has been flaky.".to_string(),
            urgency: Urgency::Negative,
            fire: DraftFire::In { days: 0, hours: 3 },
            ..ReminderDraft::new()
        },
        ReminderDraft {
            title: "Feed the animals".to_string(),
            urgency: Urgency::Neutral,
            fire: DraftFire::In { days: 0, hours: 6 },
            recur_every: Some(config.ticks_per_hour * 8),
            ..ReminderDraft::new()
        },
        ReminderDraft {
            title: "Trade caravan arrives".to_string(),
            body: "Have silver ready.".to_string(),
            urgency: Urgency::Positive,
            fire: DraftFire::In { days: 1, hours: 12 },
            ..ReminderDraft::new()
        },
    ];

    for draft in drafts {
        let reminder = draft.into_reminder(now, &config)?;
        scheduler.schedule(reminder);
    }
    Ok(())
}

/// Parse an optional environment variable, failing on malformed values
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} {value:?}")),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting reminder simulation...");

    let mut scheduler = ReminderScheduler::new(config.clone());
    let save_path = config.save_path.clone();

    let mut tick: Tick = 0;
    if Path::new(&save_path).exists() {
        match SaveData::load(&save_path) {
            Ok(save) => {
                info!("📄 Loaded save from {save_path} (saved {})", save.saved_at);
                tick = save.tick;
                save.apply(&mut scheduler);
            }
            Err(e) => {
                error!("❌ Failed to load save {save_path}: {e:#}");
                return Err(e);
            }
        }
    } else {
        info!("📄 No save found at {save_path} - seeding demo reminders");
        seed_reminders(&mut scheduler, tick)?;
    }

    scheduler.on_world_loaded(tick);

    let period = std::env::var("REMINDERS_SIM_PERIOD").unwrap_or_else(|_| "3d".to_string());
    let Some(total_ticks) = parse_period(&period, &config) else {
        return Err(anyhow::anyhow!(
            "Invalid REMINDERS_SIM_PERIOD {period:?}. Use formats like `12h`, `3d` or `1d12h`."
        ));
    };
    let step = Duration::from_millis(env_or("REMINDERS_SIM_STEP_MS", 20)?);
    let end_tick = tick
        .checked_add(total_ticks)
        .context("Simulation period runs past the last representable tick")?;
    let context = DayHourContext::new(&config);
    let mut sink = LogSink;

    info!(
        "Simulating {} ticks ({} queued, {} waiting for load)",
        total_ticks,
        scheduler.queued_len(),
        scheduler.staged_len()
    );

    // One interval tick per simulated hour
    let mut interval = tokio::time::interval(step);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let hour_end = tick.saturating_add(config.ticks_per_hour).min(end_tick);
                while tick < hour_end {
                    tick += 1;
                    scheduler.on_tick(tick, Some(&context), &mut sink);
                }
                if tick >= end_tick {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted at tick {tick}, saving");
                break;
            }
        }
    }

    for reminder in scheduler.reminders() {
        info!(
            "⏰ {} - {}",
            reminder.from_now(tick, &config),
            reminder.title
        );
    }

    SaveData::capture(&scheduler, tick).save(&save_path)?;
    Ok(())
}

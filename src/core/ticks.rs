//! Tick arithmetic and human-readable periods
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use super::config::Config;

/// One unit of simulated time. Only ordering and subtraction matter here.
pub type Tick = i64;

/// Parse a period string like "8h", "2d" or "1d12h" into ticks
pub fn parse_period(period: &str, config: &Config) -> Option<Tick> {
    let period = period.trim().to_lowercase();
    let mut total: Tick = 0;
    let mut current_number = String::new();

    for c in period.chars() {
        if c.is_ascii_digit() {
            current_number.push(c);
        } else if !current_number.is_empty() {
            let value: Tick = current_number.parse().ok()?;
            current_number.clear();

            let ticks = match c {
                't' => value,
                'h' => value.checked_mul(config.ticks_per_hour)?,
                'd' => value.checked_mul(config.ticks_per_day())?,
                _ => return None,
            };
            total = total.checked_add(ticks)?;
        } else {
            return None;
        }
    }

    // trailing digits without a unit
    if !current_number.is_empty() {
        return None;
    }

    if total > 0 {
        Some(total)
    } else {
        None
    }
}

/// Format a period in ticks into a human-readable string
pub fn format_ticks(ticks: Tick, config: &Config) -> String {
    let per_hour = config.ticks_per_hour;
    let per_day = config.ticks_per_day();

    if ticks < per_hour {
        format!("{} tick{}", ticks, plural(ticks))
    } else if ticks < per_day {
        let hours = ticks / per_hour;
        format!("{} hour{}", hours, plural(hours))
    } else {
        let days = ticks / per_day;
        let hours = (ticks % per_day) / per_hour;
        if hours > 0 {
            format!(
                "{} day{} {} hour{}",
                days,
                plural(days),
                hours,
                plural(hours)
            )
        } else {
            format!("{} day{}", days, plural(days))
        }
    }
}

/// Round a tick down to the start of its hour
pub fn to_hour_boundary(tick: Tick, config: &Config) -> Tick {
    tick - tick.rem_euclid(config.ticks_per_hour)
}

/// Whether `tick` falls exactly on an hour boundary
pub fn is_hour_boundary(tick: Tick, config: &Config) -> bool {
    tick.rem_euclid(config.ticks_per_hour) == 0
}

/// Fire tick for "in N days and M hours", snapped to the hour.
///
/// Returns `None` if the result does not fit in a [`Tick`].
pub fn ticks_from_now(now: Tick, days: Tick, hours: Tick, config: &Config) -> Option<Tick> {
    let ticks_per_day = config.ticks_per_hour.checked_mul(config.hours_per_day)?;
    let offset = days
        .checked_mul(ticks_per_day)?
        .checked_add(hours.checked_mul(config.ticks_per_hour)?)?;
    Some(to_hour_boundary(now.checked_add(offset)?, config))
}

fn plural(n: Tick) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

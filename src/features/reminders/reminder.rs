//! # Reminder Entity
//!
//! The value type held by the queue and the staging list, plus its
//! recurrence rule.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Recurring reminders via `recur_every`
//! - 1.0.0: Initial release

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use super::queue::Identified;
use crate::core::{format_ticks, Config, Tick};

/// Stable identity of a reminder, independent of its fire time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(Uuid);

impl ReminderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReminderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How loudly a delivered reminder should present itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Urgency {
    ThreatBig,
    ThreatSmall,
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::ThreatBig => write!(f, "threat_big"),
            Urgency::ThreatSmall => write!(f, "threat_small"),
            Urgency::Negative => write!(f, "negative"),
            Urgency::Neutral => write!(f, "neutral"),
            Urgency::Positive => write!(f, "positive"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "threat_big" => Ok(Urgency::ThreatBig),
            "threat_small" => Ok(Urgency::ThreatSmall),
            "negative" => Ok(Urgency::Negative),
            "neutral" => Ok(Urgency::Neutral),
            "positive" => Ok(Urgency::Positive),
            _ => Err(anyhow::anyhow!("Invalid urgency: {}", s)),
        }
    }
}

/// When a reminder fires.
///
/// Variant order is the sort order: `NextLoad` < `At(_)` < `Never`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireAt {
    /// Shortly after the next world load; lives in the staging list only
    NextLoad,
    /// At a specific tick
    At(Tick),
    /// Never fires
    Never,
}

impl FireAt {
    /// Whether this fire time is due at `tick`
    pub fn is_due(&self, tick: Tick) -> bool {
        matches!(self, FireAt::At(at) if *at <= tick)
    }

    pub fn tick(&self) -> Option<Tick> {
        match self {
            FireAt::At(at) => Some(*at),
            _ => None,
        }
    }
}

/// A user-created reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    /// Identity used by cancel and edit flows
    #[serde(default)]
    pub id: ReminderId,

    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub urgency: Urgency,

    pub fire_at: FireAt,

    /// Interval in ticks between occurrences, if recurring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recur_every: Option<Tick>,
}

impl Reminder {
    /// Create a one-shot neutral reminder with a fresh id
    pub fn new(title: impl Into<String>, body: impl Into<String>, fire_at: FireAt) -> Self {
        Self {
            id: ReminderId::new(),
            title: title.into(),
            body: body.into(),
            urgency: Urgency::Neutral,
            fire_at,
            recur_every: None,
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn recurring(mut self, every: Tick) -> Self {
        self.recur_every = Some(every);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recur_every.is_some()
    }

    /// The next occurrence of a recurring reminder, as a new entity.
    ///
    /// Timed reminders move forward by `recur_every`; next-load reminders
    /// stay next-load. `None` for one-shot reminders, `Never`, and
    /// non-positive intervals.
    pub fn successor(&self) -> Option<Reminder> {
        let every = self.recur_every.filter(|every| *every > 0)?;
        let fire_at = match self.fire_at {
            FireAt::At(at) => FireAt::At(at.checked_add(every)?),
            FireAt::NextLoad => FireAt::NextLoad,
            FireAt::Never => return None,
        };

        Some(Reminder {
            id: ReminderId::new(),
            title: self.title.clone(),
            body: self.body.clone(),
            urgency: self.urgency,
            fire_at,
            recur_every: self.recur_every,
        })
    }

    /// Time remaining until this reminder fires, for list views
    pub fn from_now(&self, now: Tick, config: &Config) -> String {
        match self.fire_at {
            FireAt::Never => "never".to_string(),
            FireAt::NextLoad => "next load".to_string(),
            FireAt::At(at) if at > now => format!("in {}", format_ticks(at - now, config)),
            FireAt::At(_) => "overdue".to_string(),
        }
    }
}

impl Identified for Reminder {
    type Id = ReminderId;

    fn identity(&self) -> ReminderId {
        self.id
    }
}

// Ordered by fire time; the id only breaks ties so that Ord agrees with Eq.
impl PartialEq for Reminder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Reminder {}

impl PartialOrd for Reminder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Reminder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_at_ordering() {
        assert!(FireAt::NextLoad < FireAt::At(i64::MIN));
        assert!(FireAt::At(5) < FireAt::At(6));
        assert!(FireAt::At(i64::MAX) < FireAt::Never);
    }

    #[test]
    fn test_fire_at_is_due() {
        assert!(FireAt::At(100).is_due(100));
        assert!(FireAt::At(100).is_due(150));
        assert!(!FireAt::At(100).is_due(99));
        assert!(!FireAt::Never.is_due(i64::MAX));
        assert!(!FireAt::NextLoad.is_due(i64::MAX));
    }

    #[test]
    fn test_successor_of_recurring_reminder() {
        let reminder = Reminder::new("Harvest", "Corn is ready", FireAt::At(100))
            .with_urgency(Urgency::Positive)
            .recurring(50);

        let next = reminder.successor().unwrap();
        assert_eq!(next.fire_at, FireAt::At(150));
        assert_eq!(next.title, "Harvest");
        assert_eq!(next.body, "Corn is ready");
        assert_eq!(next.urgency, Urgency::Positive);
        assert_eq!(next.recur_every, Some(50));
        assert_ne!(next.id, reminder.id);

        let after = next.successor().unwrap();
        assert_eq!(after.fire_at, FireAt::At(200));
    }

    #[test]
    fn test_successor_edge_cases() {
        assert!(Reminder::new("once", "", FireAt::At(10)).successor().is_none());
        assert!(Reminder::new("never", "", FireAt::Never)
            .recurring(10)
            .successor()
            .is_none());
        assert!(Reminder::new("zero", "", FireAt::At(10))
            .recurring(0)
            .successor()
            .is_none());

        let staged = Reminder::new("load", "", FireAt::NextLoad).recurring(10);
        assert_eq!(staged.successor().unwrap().fire_at, FireAt::NextLoad);
    }

    #[test]
    fn test_from_now() {
        let config = Config {
            ticks_per_hour: 100,
            ..Config::default()
        };
        assert_eq!(Reminder::new("a", "", FireAt::Never).from_now(0, &config), "never");
        assert_eq!(Reminder::new("a", "", FireAt::NextLoad).from_now(0, &config), "next load");
        assert_eq!(Reminder::new("a", "", FireAt::At(300)).from_now(100, &config), "in 2 hours");
        assert_eq!(Reminder::new("a", "", FireAt::At(50)).from_now(100, &config), "overdue");
    }

    #[test]
    fn test_urgency_parse() {
        assert_eq!("threat_big".parse::<Urgency>().unwrap(), Urgency::ThreatBig);
        assert_eq!("POSITIVE".parse::<Urgency>().unwrap(), Urgency::Positive);
        assert!("loud".parse::<Urgency>().is_err());
        assert_eq!(Urgency::default(), Urgency::Neutral);
    }

    #[test]
    fn test_reminder_json_shape() {
        let reminder = Reminder::new("Raid", "", FireAt::At(42));
        let json = serde_json::to_string(&reminder).unwrap();
        assert!(json.contains("\"at\":42"));
        assert!(!json.contains("recur_every"));

        let parsed: Reminder = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, reminder.id);
        assert_eq!(parsed.fire_at, FireAt::At(42));
    }
}

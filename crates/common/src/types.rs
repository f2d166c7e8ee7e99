//! Domain types shared across the workspace.

use chrono::{DateTime, Datelike, Local, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Train number — unique per schedule line.
pub type EntityId = u32;

/// Sentinel value for a scheduled arrival that is not yet determined.
pub const TIME_UNKNOWN: &str = "unknown";

/// Canonical "on time" token on the provider wire.
pub const ON_TIME_TOKEN: &str = "Right Time";

/// Substring marking a delay in a free-form delay descriptor.
pub const DELAY_MARKER: &str = "Delayed";

/// Placeholder for an unallocated platform.
pub const NO_PLATFORM: &str = "-";

// ── Day tags ─────────────────────────────────────────────────────────

/// Weekday tag used to scope schedules ("Mon".."Sun").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayTag {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayTag {
    /// Tag for the current wall-clock day at call time.
    pub fn today() -> Self {
        Self::from_weekday(Local::now().weekday())
    }

    pub fn from_weekday(w: Weekday) -> Self {
        match w {
            Weekday::Mon => DayTag::Mon,
            Weekday::Tue => DayTag::Tue,
            Weekday::Wed => DayTag::Wed,
            Weekday::Thu => DayTag::Thu,
            Weekday::Fri => DayTag::Fri,
            Weekday::Sat => DayTag::Sat,
            Weekday::Sun => DayTag::Sun,
        }
    }

    pub const ALL: [DayTag; 7] = [
        DayTag::Mon,
        DayTag::Tue,
        DayTag::Wed,
        DayTag::Thu,
        DayTag::Fri,
        DayTag::Sat,
        DayTag::Sun,
    ];
}

impl fmt::Display for DayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayTag::Mon => "Mon",
            DayTag::Tue => "Tue",
            DayTag::Wed => "Wed",
            DayTag::Thu => "Thu",
            DayTag::Fri => "Fri",
            DayTag::Sat => "Sat",
            DayTag::Sun => "Sun",
        };
        f.write_str(s)
    }
}

// ── Schedule rows ────────────────────────────────────────────────────

/// One master schedule line. Immutable within a day cycle; owned by the
/// master store and read-only to this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Train number.
    pub entity_id: EntityId,
    /// Display name, e.g. "Vikramshila Express".
    pub name: String,
    /// Train category, e.g. "Express", "Rajdhani".
    #[serde(default = "default_category")]
    pub category: String,
    pub origin: String,
    pub destination: String,
    /// Wall-clock "HH:MM", or [`TIME_UNKNOWN`].
    pub scheduled_arrival: String,
    /// Allocated platform, or [`NO_PLATFORM`].
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Weekdays this line runs on.
    pub active_days: Vec<DayTag>,
    /// Route distance in kilometres.
    #[serde(default)]
    pub distance_km: u32,
    #[serde(default)]
    pub priority: Option<String>,
}

fn default_category() -> String {
    "Express".into()
}

fn default_platform() -> String {
    NO_PLATFORM.into()
}

/// Per-current-day working copy of a [`ScheduleEntry`], plus the two
/// mutable enrichment fields written by the refresh scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(flatten)]
    pub schedule: ScheduleEntry,
    /// Reported real arrival, wall-clock "HH:MM".
    pub real_arrival: Option<String>,
    /// Free-form delay descriptor from the provider wire.
    pub delay: Option<String>,
}

impl SnapshotEntry {
    /// Fresh snapshot row with enrichment fields reset.
    pub fn new(schedule: ScheduleEntry) -> Self {
        Self {
            schedule,
            real_arrival: None,
            delay: None,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.schedule.entity_id
    }

    /// Whether any real-time data has been merged onto this row.
    pub fn is_enriched(&self) -> bool {
        self.real_arrival.is_some() || self.delay.is_some()
    }
}

/// The (real arrival, delay descriptor) pair merged onto a snapshot row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub real_arrival: Option<String>,
    pub delay: Option<String>,
}

// ── Delay descriptors ────────────────────────────────────────────────

/// Typed view of the wire-level delay descriptor. The wire keeps its
/// ad hoc string encoding for compatibility; everything downstream
/// matches on this instead of substring-searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayState {
    OnTime,
    /// Delayed, with the minute count when the descriptor carries one.
    Delayed(Option<u32>),
    /// Descriptor present but not recognized.
    Unknown,
}

impl DelayState {
    /// Parse a raw delay descriptor, e.g. "Right Time", "Delayed by 12 mins".
    pub fn from_descriptor(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == ON_TIME_TOKEN {
            return DelayState::OnTime;
        }
        if trimmed.contains(DELAY_MARKER) {
            return DelayState::Delayed(first_number(trimmed));
        }
        DelayState::Unknown
    }
}

/// First run of ASCII digits in `s`, if any.
fn first_number(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// ── Weather ──────────────────────────────────────────────────────────

/// One weather observation from the external weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub fetched_at: DateTime<Utc>,
}

// ── Time parsing ─────────────────────────────────────────────────────

/// Parse a wall-clock "HH:MM" string into minutes since midnight.
///
/// Total over all inputs: the sentinel, empty, malformed, and
/// out-of-range strings all yield `None` (safe-skip, not an error).
pub fn time_to_minutes(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == TIME_UNKNOWN {
        return None;
    }
    let (h, m) = trimmed.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Current wall-clock time as minutes since midnight.
pub fn now_minutes() -> u32 {
    let now = Local::now();
    now.hour() * 60 + now.minute()
}

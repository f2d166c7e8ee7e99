//! Board configuration types.

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Station name used in log banners.
    #[serde(default = "default_station_name")]
    pub station_name: String,

    /// Path to the master schedule seed file (JSON array of entries).
    #[serde(default = "default_schedule_path")]
    pub schedule_path: String,

    /// External script invocation settings.
    #[serde(default)]
    pub scripts: ScriptConfig,

    /// Timing parameters (seconds unless noted).
    #[serde(default)]
    pub timing: TimingConfig,
}

/// How the out-of-process provider scripts are invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Interpreter binary.
    #[serde(default = "default_python_bin")]
    pub python_bin: String,

    /// Per-train real-time lookup script; receives the lookup key as argv[1].
    #[serde(default = "default_realtime_script")]
    pub realtime_script: String,

    /// Weather fetch script; takes no arguments.
    #[serde(default = "default_weather_script")]
    pub weather_script: String,
}

/// Timing knobs for the refresh scheduler and caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Period of the windowed refresh timer.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Windowed refresh looks this many minutes ahead of now.
    #[serde(default = "default_lookahead")]
    pub lookahead_mins: u32,

    /// Concurrent lookups per bulk-refresh batch.
    #[serde(default = "default_bulk_batch")]
    pub bulk_batch_size: usize,

    /// Per-lookup timeout; a timed-out lookup counts as a row error.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// Weather cache TTL.
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_secs: u64,

    /// Heartbeat log period.
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,
}

fn default_station_name() -> String {
    "Barauni Junction".into()
}

fn default_schedule_path() -> String {
    "schedule.json".into()
}

fn default_python_bin() -> String {
    "python3".into()
}

fn default_realtime_script() -> String {
    "py/real_time.py".into()
}

fn default_weather_script() -> String {
    "py/scrape_weather.py".into()
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_lookahead() -> u32 {
    30
}

fn default_bulk_batch() -> usize {
    5
}

fn default_lookup_timeout() -> u64 {
    20
}

fn default_weather_ttl() -> u64 {
    30 * 60
}

fn default_heartbeat() -> u64 {
    30
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            station_name: default_station_name(),
            schedule_path: default_schedule_path(),
            scripts: ScriptConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            python_bin: default_python_bin(),
            realtime_script: default_realtime_script(),
            weather_script: default_weather_script(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            lookahead_mins: default_lookahead(),
            bulk_batch_size: default_bulk_batch(),
            lookup_timeout_secs: default_lookup_timeout(),
            weather_ttl_secs: default_weather_ttl(),
            heartbeat_secs: default_heartbeat(),
        }
    }
}

//! Configuration loader — merges env vars, .env file, and config.toml.

use common::{BoardConfig, Error};
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_positive_u32(raw: &str, env_name: &str) -> Result<u32, Error> {
    u32::try_from(parse_positive_u64(raw, env_name)?)
        .map_err(|_| Error::Config(format!("{env_name} is out of range (max {})", u32::MAX)))
}

fn parse_positive_usize(raw: &str, env_name: &str) -> Result<usize, Error> {
    usize::try_from(parse_positive_u64(raw, env_name)?)
        .map_err(|_| Error::Config(format!("{env_name} is out of range (max {})", usize::MAX)))
}

fn validate_config(config: &BoardConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.schedule_path.trim().is_empty() {
        issues.push("schedule_path must not be empty".into());
    }
    if config.scripts.python_bin.trim().is_empty() {
        issues.push("scripts.python_bin must not be empty".into());
    }
    if config.scripts.realtime_script.trim().is_empty() {
        issues.push("scripts.realtime_script must not be empty".into());
    }
    if config.scripts.weather_script.trim().is_empty() {
        issues.push("scripts.weather_script must not be empty".into());
    }

    if config.timing.refresh_interval_secs == 0 {
        issues.push("timing.refresh_interval_secs must be > 0".into());
    }
    if config.timing.lookahead_mins == 0 {
        issues.push("timing.lookahead_mins must be > 0".into());
    }
    if config.timing.bulk_batch_size == 0 {
        issues.push("timing.bulk_batch_size must be > 0".into());
    }
    if config.timing.lookup_timeout_secs == 0 {
        issues.push("timing.lookup_timeout_secs must be > 0".into());
    }
    if config.timing.weather_ttl_secs == 0 {
        issues.push("timing.weather_ttl_secs must be > 0".into());
    }
    if config.timing.heartbeat_secs == 0 {
        issues.push("timing.heartbeat_secs must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load service configuration from environment and optional config file.
pub fn load_config() -> Result<BoardConfig, Error> {
    // 1. Load .env file if present.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = BoardConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(path) = std::env::var("STATION_SCHEDULE_PATH") {
        config.schedule_path = path;
    }
    if let Ok(name) = std::env::var("STATION_NAME") {
        config.station_name = name;
    }
    if let Ok(bin) = std::env::var("STATION_PYTHON_BIN") {
        config.scripts.python_bin = bin;
    }
    if let Ok(script) = std::env::var("STATION_REALTIME_SCRIPT") {
        config.scripts.realtime_script = script;
    }
    if let Ok(script) = std::env::var("STATION_WEATHER_SCRIPT") {
        config.scripts.weather_script = script;
    }
    if let Ok(raw) = std::env::var("STATION_REFRESH_INTERVAL_SECS") {
        config.timing.refresh_interval_secs =
            parse_positive_u64(&raw, "STATION_REFRESH_INTERVAL_SECS")?;
    }
    if let Ok(raw) = std::env::var("STATION_LOOKAHEAD_MINS") {
        config.timing.lookahead_mins = parse_positive_u32(&raw, "STATION_LOOKAHEAD_MINS")?;
    }
    if let Ok(raw) = std::env::var("STATION_BULK_BATCH_SIZE") {
        config.timing.bulk_batch_size = parse_positive_usize(&raw, "STATION_BULK_BATCH_SIZE")?;
    }
    if let Ok(raw) = std::env::var("STATION_LOOKUP_TIMEOUT_SECS") {
        config.timing.lookup_timeout_secs =
            parse_positive_u64(&raw, "STATION_LOOKUP_TIMEOUT_SECS")?;
    }
    if let Ok(raw) = std::env::var("STATION_WEATHER_TTL_SECS") {
        config.timing.weather_ttl_secs =
            parse_positive_u64(&raw, "STATION_WEATHER_TTL_SECS")?;
    }

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_u64_accepts_and_rejects() {
        assert_eq!(parse_positive_u64("300", "X").unwrap(), 300);
        assert_eq!(parse_positive_u64(" 42 ", "X").unwrap(), 42);
        assert!(parse_positive_u64("0", "X").is_err());
        assert!(parse_positive_u64("-5", "X").is_err());
        assert!(parse_positive_u64("soon", "X").is_err());
    }

    #[test]
    fn positive_u32_rejects_oversized_values() {
        assert_eq!(parse_positive_u32("30", "X").unwrap(), 30);
        assert_eq!(parse_positive_u32("4294967295", "X").unwrap(), u32::MAX);
        // 2^32 + 60 must error out, not wrap to 60.
        let err = parse_positive_u32("4294967356", "X").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn positive_usize_parses() {
        assert_eq!(parse_positive_usize("5", "X").unwrap(), 5);
        assert!(parse_positive_usize("0", "X").is_err());
    }

    #[test]
    fn validate_rejects_empty_paths_and_zero_timings() {
        let mut config = BoardConfig::default();
        assert!(validate_config(&config).is_ok());

        config.schedule_path = String::new();
        config.timing.refresh_interval_secs = 0;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("schedule_path"));
        assert!(err.contains("refresh_interval_secs"));
    }
}

//! Boundary normalization of provider script output.
//!
//! The scripts print Python-repr "JSON" with single quotes. Everything
//! here replaces the quote style, parses, and validates the fields the
//! core cares about, so the refresh logic only ever sees a typed value
//! or an error.

use chrono::Utc;
use serde_json::Value;

use common::{Enrichment, Error, Result, WeatherSample};

/// Swap single quotes for double quotes so `serde_json` can parse the
/// script's Python-repr output. Values themselves never contain quotes
/// on this wire, so a blanket replace is the established contract.
fn normalize_quotes(raw: &str) -> String {
    raw.trim().replace('\'', "\"")
}

fn parse_object(raw: &str) -> Result<serde_json::Map<String, Value>> {
    let value: Value = serde_json::from_str(&normalize_quotes(raw))
        .map_err(|e| Error::MalformedOutput(format!("{} | raw: {}", e, raw.trim())))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::MalformedOutput(format!(
            "expected object, got: {}",
            other
        ))),
    }
}

fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number_field(map: &serde_json::Map<String, Value>, key: &str) -> Result<f64> {
    match map.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| Error::MalformedOutput(format!("field {} is not finite", key))),
        // Scraped values sometimes arrive as numeric strings.
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| Error::MalformedOutput(format!("field {} is not numeric: {}", key, s))),
        _ => Err(Error::MalformedOutput(format!("missing field {}", key))),
    }
}

/// Extract the enrichment pair from a real-time lookup script's stdout.
///
/// Only `real_arrival` and `delay` are taken; both are optional on the
/// wire, and an absent field stays `None` rather than failing the row.
pub fn enrichment_from_output(raw: &str) -> Result<Enrichment> {
    let map = parse_object(raw)?;
    Ok(Enrichment {
        real_arrival: string_field(&map, "real_arrival"),
        delay: string_field(&map, "delay"),
    })
}

/// Extract a weather sample from the weather script's stdout.
pub fn weather_from_output(raw: &str) -> Result<WeatherSample> {
    let map = parse_object(raw)?;
    Ok(WeatherSample {
        temperature: number_field(&map, "temperature")?,
        humidity: number_field(&map, "humidity")?,
        precipitation: number_field(&map, "precipitation")?,
        fetched_at: Utc::now(),
    })
}

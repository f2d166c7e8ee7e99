//! Single-slot TTL cache over the external weather provider.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

use common::{Result, WeatherSample};
use realtime_client::WeatherProvider;

/// A weather sample plus cache provenance.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub sample: WeatherSample,
    /// Whether the sample was served from the slot rather than fetched.
    pub cached: bool,
    /// Set when a fetch failed and a stale sample is being served.
    pub warning: Option<String>,
}

struct Slot {
    sample: WeatherSample,
    stored_at: Instant,
}

pub struct WeatherCache {
    provider: Arc<dyn WeatherProvider>,
    ttl: Duration,
    slot: Mutex<Option<Slot>>,
}

impl WeatherCache {
    pub fn new(provider: Arc<dyn WeatherProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached sample while fresh, otherwise fetch.
    ///
    /// The slot lock is held across the fetch, so concurrent cache-miss
    /// callers collapse into a single provider call. On fetch failure a
    /// stale sample, if any, is served with a warning; with no sample at
    /// all the provider error propagates.
    pub async fn get(&self) -> Result<WeatherReport> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.stored_at.elapsed() < self.ttl {
                return Ok(WeatherReport {
                    sample: cached.sample.clone(),
                    cached: true,
                    warning: None,
                });
            }
        }

        match self.provider.fetch().await {
            Ok(sample) => {
                info!(
                    "Weather fetched: {:.1}°C, {:.0}% humidity",
                    sample.temperature, sample.humidity
                );
                *slot = Some(Slot {
                    sample: sample.clone(),
                    stored_at: Instant::now(),
                });
                Ok(WeatherReport {
                    sample,
                    cached: false,
                    warning: None,
                })
            }
            Err(e) => match slot.as_ref() {
                Some(stale) => {
                    warn!("Weather fetch failed, serving stale sample: {}", e);
                    Ok(WeatherReport {
                        sample: stale.sample.clone(),
                        cached: true,
                        warning: Some(format!("fetch failed, showing cached data: {}", e)),
                    })
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use common::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockWeather {
        fetches: AtomicUsize,
        fail: AtomicBool,
    }

    impl MockWeather {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl WeatherProvider for MockWeather {
        async fn fetch(&self) -> Result<WeatherSample> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Provider("scrape failed".into()));
            }
            Ok(WeatherSample {
                temperature: 30.0 + n as f64,
                humidity: 70.0,
                precipitation: 0.0,
                fetched_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn first_call_fetches_then_serves_cached() {
        let provider = MockWeather::new();
        let cache = WeatherCache::new(provider.clone(), Duration::from_secs(1800));

        let first = cache.get().await.unwrap();
        assert!(!first.cached);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);

        let second = cache.get().await.unwrap();
        assert!(second.cached);
        assert_eq!(second.sample.temperature, first.sample.temperature);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_slot_triggers_a_new_fetch() {
        let provider = MockWeather::new();
        let cache = WeatherCache::new(provider.clone(), Duration::ZERO);

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert!(!second.cached);
        assert_ne!(first.sample.temperature, second.sample.temperature);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_failure_serves_stale_with_warning() {
        let provider = MockWeather::new();
        let cache = WeatherCache::new(provider.clone(), Duration::ZERO);

        let fresh = cache.get().await.unwrap();
        provider.fail.store(true, Ordering::SeqCst);

        let stale = cache.get().await.unwrap();
        assert!(stale.cached);
        assert!(stale.warning.is_some());
        assert_eq!(stale.sample.temperature, fresh.sample.temperature);
    }

    #[tokio::test]
    async fn fetch_failure_with_empty_slot_is_an_error() {
        let provider = MockWeather::new();
        provider.fail.store(true, Ordering::SeqCst);
        let cache = WeatherCache::new(provider, Duration::from_secs(1800));

        assert!(matches!(cache.get().await, Err(Error::Provider(_))));
    }
}

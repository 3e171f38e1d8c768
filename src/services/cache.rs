use crate::core::Predicate;
use crate::models::VehicleId;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Expiry class of a cached value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Chart rows, vehicle lists and details
    Results,
    /// Sidebar choices and range bounds
    Options,
}

/// Time-to-live cache for query results
///
/// Values are stored as serialized JSON keyed by transform name and
/// serialized predicate. Entries are never invalidated explicitly; they
/// expire after the tier's TTL.
pub struct CacheManager {
    results: moka::future::Cache<String, Vec<u8>>,
    options: moka::future::Cache<String, Vec<u8>>,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(max_entries: u64, results_ttl: Duration, options_ttl: Duration) -> Self {
        let results = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(results_ttl)
            .build();
        let options = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(options_ttl)
            .build();

        Self { results, options }
    }

    fn tier(&self, tier: CacheTier) -> &moka::future::Cache<String, Vec<u8>> {
        match tier {
            CacheTier::Results => &self.results,
            CacheTier::Options => &self.options,
        }
    }

    /// Get a value from cache
    pub async fn get<T>(&self, tier: CacheTier, key: &str) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        match self.tier(tier).get(key).await {
            Some(bytes) => {
                tracing::trace!("Cache hit: {}", key);
                Ok(serde_json::from_slice(&bytes)?)
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Err(CacheError::CacheMiss(key.to_string()))
            }
        }
    }

    /// Set a value in cache
    pub async fn set<T>(&self, tier: CacheTier, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.tier(tier).insert(key.to_string(), bytes).await;
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Return the cached value for `key`, or run `load` and cache its result
    ///
    /// Load errors are returned as-is and nothing is cached. Cache failures
    /// only cost a reload.
    pub async fn get_or_load<T, E, F, Fut>(&self, tier: CacheTier, key: &str, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.get::<T>(tier, key).await {
            Ok(value) => return Ok(value),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Discarding unreadable cache entry {}: {}", key, e),
        }

        let value = load().await?;
        if let Err(e) = self.set(tier, key, &value).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        Ok(value)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            results_size: self.results.entry_count(),
            options_size: self.options.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub results_size: u64,
    pub options_size: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn manufacturer_distribution(predicate: &Predicate) -> String {
        format!("manufacturers:{}", predicate.cache_key())
    }

    pub fn avg_price(predicate: &Predicate) -> String {
        format!("avg_price:{}", predicate.cache_key())
    }

    pub fn accident_severity(predicate: &Predicate) -> String {
        format!("accidents:{}", predicate.cache_key())
    }

    pub fn fuel_distribution(predicate: &Predicate) -> String {
        format!("fuel:{}", predicate.cache_key())
    }

    /// The cutoff date is part of the key so the rolling window moves daily
    pub fn service_frequency(predicate: &Predicate, cutoff: DateTime<Utc>) -> String {
        format!("services:{}:{}", cutoff.date_naive(), predicate.cache_key())
    }

    pub fn price_mileage(predicate: &Predicate, limit: usize) -> String {
        format!("price_mileage:{}:{}", limit, predicate.cache_key())
    }

    pub fn vehicle_list(predicate: &Predicate, limit: usize) -> String {
        format!("vehicles:{}:{}", limit, predicate.cache_key())
    }

    pub fn vehicle_detail(id: &VehicleId) -> String {
        format!("vehicle:{}", id)
    }

    pub fn filter_options() -> String {
        "filter_options".to_string()
    }
}

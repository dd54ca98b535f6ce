//! Per-store cache of the sales analysis (summary + features)

use crate::aggregate::SalesSummary;
use crate::features::SeriesFeatures;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Identifies one analysis: a store over a window ending on `as_of`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub store_id: String,
    pub as_of: NaiveDate,
    /// Window length in days
    pub lookback: usize,
}

impl CacheKey {
    pub fn new(store_id: impl Into<String>, as_of: NaiveDate, lookback: usize) -> Self {
        Self {
            store_id: store_id.into(),
            as_of,
            lookback,
        }
    }
}

/// Aggregation and feature extraction output for one window
#[derive(Debug, Clone, PartialEq)]
pub struct SalesAnalysis {
    pub summary: SalesSummary,
    pub features: SeriesFeatures,
}

/// Injected cache for [`SalesAnalysis`] values
///
/// Implementations must never return an entry older than its TTL.
pub trait AnalysisCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<SalesAnalysis>;

    fn set(&self, key: CacheKey, analysis: SalesAnalysis, ttl: Duration);

    fn delete(&self, key: &CacheKey);
}

#[derive(Debug)]
struct Entry {
    analysis: SalesAnalysis,
    expires_at: Instant,
}

/// Process-local [`AnalysisCache`]
#[derive(Debug, Default)]
pub struct InMemoryAnalysisCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
}

impl InMemoryAnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);
        }
    }
}

impl AnalysisCache for InMemoryAnalysisCache {
    fn get(&self, key: &CacheKey) -> Option<SalesAnalysis> {
        let entries = self.entries.read().ok()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(store_id = %key.store_id, as_of = %key.as_of, "analysis cache hit");
                Some(entry.analysis.clone())
            }
            Some(_) => {
                debug!(store_id = %key.store_id, as_of = %key.as_of, "analysis cache entry expired");
                None
            }
            None => None,
        }
    }

    fn set(&self, key: CacheKey, analysis: SalesAnalysis, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                Entry {
                    analysis,
                    expires_at: Instant::now() + ttl,
                },
            );
        }
    }

    fn delete(&self, key: &CacheKey) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::data::RawSaleRecord;
    use crate::features::FeatureExtractor;
    use chrono::{TimeZone, Utc};

    fn analysis() -> SalesAnalysis {
        let records: Vec<RawSaleRecord> = (1..=7)
            .map(|d| {
                let at = Utc.with_ymd_and_hms(2024, 2, d, 12, 0, 0).unwrap();
                RawSaleRecord::new(at, 10.0 * d as f64)
            })
            .collect();
        let summary = Aggregator::default().summarize(&records, None).unwrap();
        let features = FeatureExtractor::default().extract(&summary.daily).unwrap();
        SalesAnalysis { summary, features }
    }

    fn key() -> CacheKey {
        CacheKey::new("store-1", NaiveDate::from_ymd_opt(2024, 2, 7).unwrap(), 7)
    }

    #[test]
    fn test_set_get_delete() {
        let cache = InMemoryAnalysisCache::new();
        assert!(cache.get(&key()).is_none());

        cache.set(key(), analysis(), Duration::from_secs(60));
        assert!(cache.get(&key()).is_some());

        cache.delete(&key());
        assert!(cache.get(&key()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_is_not_served() {
        let cache = InMemoryAnalysisCache::new();
        cache.set(key(), analysis(), Duration::ZERO);
        assert!(cache.get(&key()).is_none());

        cache.purge_expired();
        assert_eq!(cache.len(), 0);
    }
}

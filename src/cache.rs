//! Time-to-live caching of raw ledger results.
//!
//! The cache is owned by whoever constructs it and wraps an injected ledger; it
//! is never a process global. Only successful results are stored, so a failed
//! query is retried on the next request instead of poisoning the entry.

use crate::error::Result;
use crate::ledger::{LedgerQueryService, PeriodQuery};
use crate::schema::{DayRow, EntityRow, MonthRow};
use log::debug;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Default number of cached results per query kind.
pub const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Default time-to-live for cached results (10 minutes).
pub const DEFAULT_TTL_SECS: u64 = 600;

/// A ledger wrapper that remembers query results for a fixed time.
///
/// Two requests for the same [`PeriodQuery`] inside the TTL window share one
/// backend fetch. Simultaneous first requests for a key may each reach the
/// backend; nothing blocks them, the later insert simply wins.
pub struct CachedLedger<L> {
    inner: Arc<L>,
    monthly: Cache<PeriodQuery, Arc<Vec<MonthRow>>>,
    entities: Cache<PeriodQuery, Arc<Vec<EntityRow>>>,
    daily: Cache<PeriodQuery, Arc<Vec<DayRow>>>,
}

impl<L> Clone for CachedLedger<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            monthly: self.monthly.clone(),
            entities: self.entities.clone(),
            daily: self.daily.clone(),
        }
    }
}

impl<L> CachedLedger<L>
where
    L: LedgerQueryService,
{
    /// Wraps `inner` with the default capacity and a 10 minute TTL.
    pub fn new(inner: L) -> Self {
        Self::with_config(inner, DEFAULT_CACHE_CAPACITY, Duration::from_secs(DEFAULT_TTL_SECS))
    }

    pub fn with_config(inner: L, max_capacity: u64, ttl: Duration) -> Self {
        fn build<V: Clone + Send + Sync + 'static>(
            max_capacity: u64,
            ttl: Duration,
        ) -> Cache<PeriodQuery, V> {
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build()
        }

        Self {
            inner: Arc::new(inner),
            monthly: build(max_capacity, ttl),
            entities: build(max_capacity, ttl),
            daily: build(max_capacity, ttl),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn invalidate_all(&self) {
        self.monthly.invalidate_all();
        self.entities.invalidate_all();
        self.daily.invalidate_all();
        self.monthly.run_pending_tasks();
        self.entities.run_pending_tasks();
        self.daily.run_pending_tasks();
    }

    /// Number of cached results across all query kinds.
    ///
    /// Moka updates counts lazily; pending maintenance is run first.
    pub fn entry_count(&self) -> u64 {
        self.monthly.run_pending_tasks();
        self.entities.run_pending_tasks();
        self.daily.run_pending_tasks();
        self.monthly.entry_count() + self.entities.entry_count() + self.daily.entry_count()
    }
}

fn fetch_cached<V>(
    cache: &Cache<PeriodQuery, Arc<Vec<V>>>,
    query: &PeriodQuery,
    kind: &str,
    fetch: impl FnOnce() -> Result<Vec<V>>,
) -> Result<Vec<V>>
where
    V: Clone + Send + Sync + 'static,
{
    if let Some(hit) = cache.get(query) {
        debug!("Cache hit for {} totals {:?}", kind, query);
        return Ok((*hit).clone());
    }

    debug!("Cache miss for {} totals {:?}", kind, query);
    let rows = fetch()?;
    cache.insert(*query, Arc::new(rows.clone()));
    Ok(rows)
}

impl<L> LedgerQueryService for CachedLedger<L>
where
    L: LedgerQueryService,
{
    fn monthly_totals(&self, query: &PeriodQuery) -> Result<Vec<MonthRow>> {
        fetch_cached(&self.monthly, query, "monthly", || {
            self.inner.monthly_totals(query)
        })
    }

    fn entity_totals(&self, query: &PeriodQuery) -> Result<Vec<EntityRow>> {
        fetch_cached(&self.entities, query, "entity", || {
            self.inner.entity_totals(query)
        })
    }

    fn daily_totals(&self, query: &PeriodQuery) -> Result<Vec<DayRow>> {
        fetch_cached(&self.daily, query, "daily", || self.inner.daily_totals(query))
    }
}

//! Cached current-conditions and forecast reads.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::cache::{CachePolicy, QueryCache, QueryState};
use crate::retry::{with_retry, RetryConfig};
use crate::types::{CurrentWeatherResponse, FetchError, ForecastResponse, QueryKey, QueryTarget};

/// Remote weather reads, keyed by target.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(&self, target: &QueryTarget) -> Result<CurrentWeatherResponse, FetchError>;
    async fn forecast(&self, target: &QueryTarget) -> Result<ForecastResponse, FetchError>;
}

/// One cache plus the retry policy used to fill it.
///
/// The lock is never held across an await.
#[derive(Debug)]
pub struct Query<V> {
    cache: Mutex<QueryCache<V>>,
    retry: RetryConfig,
}

impl<V: Clone> Query<V> {
    pub fn new(policy: CachePolicy, retry: RetryConfig) -> Self {
        Self {
            cache: Mutex::new(QueryCache::new(policy)),
            retry,
        }
    }

    /// Current view of `key` without fetching
    pub fn peek(&self, key: &QueryKey) -> QueryState<V> {
        self.cache.lock().state(key, Instant::now())
    }

    /// Return fresh data as-is, otherwise fetch and record the result.
    ///
    /// If another caller is already fetching this key the current state is
    /// returned immediately.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryState<V>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        let ticket = {
            let mut cache = self.cache.lock();
            let now = Instant::now();
            if !cache.needs_fetch(key, now) {
                return cache.state(key, now);
            }
            cache.begin_fetch(key, now)
        };
        let Some(ticket) = ticket else {
            return self.peek(key);
        };

        tracing::debug!("Fetching {}", key);
        let result = with_retry(&self.retry, fetcher).await;

        let mut cache = self.cache.lock();
        let now = Instant::now();
        cache.complete(ticket, result, now);
        cache.state(key, now)
    }

    /// Fetch regardless of freshness
    pub async fn refetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryState<V>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        self.invalidate(key);
        self.fetch(key, fetcher).await
    }

    pub fn invalidate(&self, key: &QueryKey) {
        self.cache.lock().invalidate(key);
    }

    pub fn collect_garbage(&self) -> usize {
        self.cache.lock().collect_garbage(Instant::now())
    }
}

/// Current and forecast caches over one [`WeatherSource`].
///
/// Both queries are disabled while there is no target.
pub struct WeatherQueries {
    source: Arc<dyn WeatherSource>,
    current: Query<CurrentWeatherResponse>,
    forecast: Query<ForecastResponse>,
}

impl WeatherQueries {
    pub fn new(source: Arc<dyn WeatherSource>, policy: CachePolicy, retry: RetryConfig) -> Self {
        Self {
            source,
            current: Query::new(policy, retry.clone()),
            forecast: Query::new(policy, retry),
        }
    }

    pub async fn current(&self, target: Option<&QueryTarget>) -> QueryState<CurrentWeatherResponse> {
        let Some(target) = target else {
            return QueryState::disabled();
        };
        let source = &self.source;
        self.current
            .fetch(&target.key(), move || source.current_weather(target))
            .await
    }

    pub async fn forecast(&self, target: Option<&QueryTarget>) -> QueryState<ForecastResponse> {
        let Some(target) = target else {
            return QueryState::disabled();
        };
        let source = &self.source;
        self.forecast
            .fetch(&target.key(), move || source.forecast(target))
            .await
    }

    /// Both reads for `target`, concurrently
    pub async fn load(
        &self,
        target: Option<&QueryTarget>,
    ) -> (QueryState<CurrentWeatherResponse>, QueryState<ForecastResponse>) {
        tokio::join!(self.current(target), self.forecast(target))
    }

    /// Both reads for `target`, skipping the freshness check.
    ///
    /// Cached data stays visible until the new results land.
    pub async fn refetch(
        &self,
        target: Option<&QueryTarget>,
    ) -> (QueryState<CurrentWeatherResponse>, QueryState<ForecastResponse>) {
        let Some(target) = target else {
            return (QueryState::disabled(), QueryState::disabled());
        };
        let key = target.key();
        let source = &self.source;
        tokio::join!(
            self.current.refetch(&key, move || source.current_weather(target)),
            self.forecast.refetch(&key, move || source.forecast(target)),
        )
    }

    /// Cached views without fetching
    pub fn peek(
        &self,
        target: Option<&QueryTarget>,
    ) -> (QueryState<CurrentWeatherResponse>, QueryState<ForecastResponse>) {
        match target {
            Some(target) => {
                let key = target.key();
                (self.current.peek(&key), self.forecast.peek(&key))
            }
            None => (QueryState::disabled(), QueryState::disabled()),
        }
    }

    /// Mark both entries for `target` stale
    pub fn invalidate(&self, target: &QueryTarget) {
        let key = target.key();
        self.current.invalidate(&key);
        self.forecast.invalidate(&key);
    }

    pub fn collect_garbage(&self) -> usize {
        self.current.collect_garbage() + self.forecast.collect_garbage()
    }
}

impl std::fmt::Debug for WeatherQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherQueries")
            .field("current", &self.current)
            .field("forecast", &self.forecast)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntryStatus;
    use crate::types::CurrentWeatherData;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn current_for(target: &QueryTarget) -> CurrentWeatherResponse {
        CurrentWeatherResponse {
            data: CurrentWeatherData {
                city_name: target.to_string(),
                country_code: "GB".to_string(),
                temp: 12.0,
                feels_like: 10.0,
                humidity: 70,
                wind_speed: 4.0,
                wind_direction: "SW".to_string(),
                description: "light rain".to_string(),
                icon: "10d".to_string(),
                visibility: None,
                pressure: None,
                uv_index: None,
                clouds: None,
                sunrise: None,
                sunset: None,
                aqi: None,
                lat: 51.5,
                lon: -0.12,
            },
            data_source: "live".to_string(),
        }
    }

    #[derive(Default)]
    struct StubSource {
        current_calls: AtomicUsize,
        forecast_calls: AtomicUsize,
        fail: parking_lot::Mutex<Option<FetchError>>,
    }

    #[async_trait]
    impl WeatherSource for StubSource {
        async fn current_weather(
            &self,
            target: &QueryTarget,
        ) -> Result<CurrentWeatherResponse, FetchError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail.lock().clone() {
                return Err(e);
            }
            Ok(current_for(target))
        }

        async fn forecast(&self, target: &QueryTarget) -> Result<ForecastResponse, FetchError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail.lock().clone() {
                return Err(e);
            }
            Ok(ForecastResponse {
                city_name: target.to_string(),
                country_code: "GB".to_string(),
                lat: 51.5,
                lon: -0.12,
                daily: Vec::new(),
                hourly: Vec::new(),
                alerts: Vec::new(),
                data_source: "live".to_string(),
            })
        }
    }

    fn queries(source: Arc<StubSource>) -> WeatherQueries {
        WeatherQueries::new(source, CachePolicy::default(), RetryConfig::none())
    }

    #[tokio::test]
    async fn test_disabled_without_target() {
        let source = Arc::new(StubSource::default());
        let queries = queries(source.clone());

        let (current, forecast) = queries.load(None).await;
        assert!(!current.enabled);
        assert!(!forecast.enabled);
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_data_is_not_refetched() {
        let source = Arc::new(StubSource::default());
        let queries = queries(source.clone());
        let target = QueryTarget::city("London");

        queries.load(Some(&target)).await;
        tokio::time::advance(Duration::from_secs(4 * 60 + 59)).await;
        let (current, _) = queries.load(Some(&target)).await;

        assert_eq!(current.status, EntryStatus::Fresh);
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.forecast_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        queries.load(Some(&target)).await;
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.forecast_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_targets_are_cached_separately() {
        let source = Arc::new(StubSource::default());
        let queries = queries(source.clone());
        let london = QueryTarget::city("London");
        let coords = QueryTarget::coords(51.5074, -0.1278);

        let (a, _) = queries.load(Some(&london)).await;
        let (b, _) = queries.load(Some(&coords)).await;

        assert_eq!(a.data.unwrap().data.city_name, "London");
        assert_eq!(b.data.unwrap().data.city_name, coords.to_string());
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_data() {
        let source = Arc::new(StubSource::default());
        let queries = queries(source.clone());
        let target = QueryTarget::city("London");

        queries.current(Some(&target)).await;
        *source.fail.lock() = Some(FetchError::Timeout);
        tokio::time::advance(Duration::from_secs(6 * 60)).await;

        let state = queries.current(Some(&target)).await;
        assert!(state.data.is_some());
        assert_eq!(state.error, Some(FetchError::Timeout));
        assert!(!state.is_error());
    }

    #[tokio::test]
    async fn test_not_found_is_error_without_data() {
        let source = Arc::new(StubSource::default());
        *source.fail.lock() = Some(FetchError::NotFound("Atlantis".to_string()));
        let queries = queries(source);

        let state = queries.current(Some(&QueryTarget::city("Atlantis"))).await;
        assert!(state.is_error());
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = Arc::new(StubSource::default());
        let queries = queries(source.clone());
        let target = QueryTarget::city("London");

        queries.current(Some(&target)).await;
        queries.invalidate(&target);
        queries.current(Some(&target)).await;
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_ignores_freshness() {
        let source = Arc::new(StubSource::default());
        let queries = queries(source.clone());
        let target = QueryTarget::city("London");

        let (first, _) = queries.load(Some(&target)).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let (second, _) = queries.refetch(Some(&target)).await;

        assert_eq!(source.current_calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.forecast_calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.status, EntryStatus::Fresh);
        assert!(second.updated_at > first.updated_at);

        let (cached, _) = queries.load(Some(&target)).await;
        assert_eq!(cached.updated_at, second.updated_at);
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 2);
    }
}

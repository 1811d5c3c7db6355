//! The signed-in user's saved defaults.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{CachePolicy, QueryState};
use crate::queries::Query;
use crate::retry::RetryConfig;
use crate::types::{FetchError, Preferences, PreferencesUpdate, QueryKey, Units};

fn preferences_key() -> QueryKey {
    QueryKey::named("preferences")
}

#[async_trait]
pub trait PreferenceSource: Send + Sync {
    async fn fetch_preferences(&self) -> Result<Preferences, FetchError>;
    async fn update_preferences(&self, update: &PreferencesUpdate) -> Result<Preferences, FetchError>;
}

/// Preference fetch as seen by the location resolver
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceState {
    Pending,
    Loaded(Preferences),
    Failed(FetchError),
}

impl PreferenceState {
    /// Saved city, if the fetch succeeded and one is set
    pub fn city(&self) -> Option<&str> {
        match self {
            Self::Loaded(prefs) => prefs.city(),
            Self::Pending | Self::Failed(_) => None,
        }
    }

    /// Display units; metric until preferences arrive
    pub fn units(&self) -> Units {
        match self {
            Self::Loaded(prefs) => prefs.units(),
            Self::Pending | Self::Failed(_) => Units::Metric,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<QueryState<Preferences>> for PreferenceState {
    fn from(state: QueryState<Preferences>) -> Self {
        match (state.data, state.error) {
            (Some(prefs), _) => Self::Loaded(prefs),
            (None, Some(e)) => Self::Failed(e),
            (None, None) => Self::Pending,
        }
    }
}

/// Cached preferences read, refreshed on the same schedule as weather data.
pub struct PreferenceFetcher {
    source: Arc<dyn PreferenceSource>,
    query: Query<Preferences>,
}

impl PreferenceFetcher {
    pub fn new(source: Arc<dyn PreferenceSource>, policy: CachePolicy, retry: RetryConfig) -> Self {
        Self {
            source,
            query: Query::new(policy, retry),
        }
    }

    /// Fetch unless a fresh copy is cached
    pub async fn load(&self) -> PreferenceState {
        let source = &self.source;
        self.query
            .fetch(&preferences_key(), move || source.fetch_preferences())
            .await
            .into()
    }

    pub fn state(&self) -> PreferenceState {
        self.query.peek(&preferences_key()).into()
    }

    /// Save changes, then drop the cached copy so the next load refetches.
    pub async fn update(&self, update: &PreferencesUpdate) -> Result<Preferences, FetchError> {
        let saved = self.source.update_preferences(update).await?;
        tracing::info!("Preferences updated (units: {})", saved.units);
        self.query.invalidate(&preferences_key());
        Ok(saved)
    }

    pub fn invalidate(&self) {
        self.query.invalidate(&preferences_key());
    }
}

impl std::fmt::Debug for PreferenceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceFetcher")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPreferences {
        stored: Mutex<Result<Preferences, FetchError>>,
        fetches: AtomicUsize,
    }

    impl StubPreferences {
        fn new(result: Result<Preferences, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                stored: Mutex::new(result),
                fetches: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PreferenceSource for StubPreferences {
        async fn fetch_preferences(&self) -> Result<Preferences, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.stored.lock().clone()
        }

        async fn update_preferences(
            &self,
            update: &PreferencesUpdate,
        ) -> Result<Preferences, FetchError> {
            let mut stored = self.stored.lock();
            let mut prefs = stored.clone()?;
            if let Some(city) = &update.default_city {
                prefs.default_city = Some(city.clone());
            }
            if let Some(units) = &update.units {
                prefs.units = units.clone();
            }
            *stored = Ok(prefs.clone());
            Ok(prefs)
        }
    }

    fn prefs(city: Option<&str>) -> Preferences {
        Preferences {
            default_city: city.map(str::to_string),
            default_country: None,
            default_lat: None,
            default_lon: None,
            units: "metric".to_string(),
        }
    }

    fn fetcher(source: Arc<StubPreferences>) -> PreferenceFetcher {
        PreferenceFetcher::new(source, CachePolicy::default(), RetryConfig::none())
    }

    #[tokio::test]
    async fn test_pending_before_load() {
        let fetcher = fetcher(StubPreferences::new(Ok(prefs(Some("Paris")))));
        assert_eq!(fetcher.state(), PreferenceState::Pending);
        assert_eq!(fetcher.state().city(), None);
    }

    #[tokio::test]
    async fn test_load_exposes_city() {
        let source = StubPreferences::new(Ok(prefs(Some("Paris"))));
        let fetcher = fetcher(source.clone());

        let state = fetcher.load().await;
        assert_eq!(state.city(), Some("Paris"));

        fetcher.load().await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_has_no_city() {
        let fetcher = fetcher(StubPreferences::new(Err(FetchError::Unauthorized)));
        let state = fetcher.load().await;
        assert_eq!(state, PreferenceState::Failed(FetchError::Unauthorized));
        assert!(state.is_settled());
        assert_eq!(state.city(), None);
        assert_eq!(state.units(), Units::Metric);
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let source = StubPreferences::new(Ok(prefs(None)));
        let fetcher = fetcher(source.clone());
        fetcher.load().await;

        let update = PreferencesUpdate {
            default_city: Some("Oslo".to_string()),
            units: Some("imperial".to_string()),
            ..Default::default()
        };
        let saved = fetcher.update(&update).await.unwrap();
        assert_eq!(saved.units(), Units::Imperial);

        let state = fetcher.load().await;
        assert_eq!(state.city(), Some("Oslo"));
        assert_eq!(state.units(), Units::Imperial);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}

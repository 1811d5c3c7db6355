//! Application services container.
//!
//! Builds every shared component from [`Config`] once and hands out `Arc`s.
//! Owns the shutdown token that stops the session listener and any refresh
//! loop.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use skywatch_auth::{AuthEvents, FileSessionStorage, SessionStorage, SessionStore};
use skywatch_core::Config;
use skywatch_services::{ApiClient, WatchlistResponse};
use skywatch_weather::{
    CachePolicy, Coordinates, DeviceLocator, FixedLocation, LocationSource, NoLocation,
    PreferenceFetcher, Query, QueryKey, RetryConfig, SelectionStore, WeatherQueries,
    WeatherSource,
};

pub struct AppServices {
    config: Config,
    events: AuthEvents,
    session: Arc<SessionStore>,
    client: Arc<ApiClient>,
    selection: Arc<SelectionStore>,
    locator: Arc<DeviceLocator>,
    preferences: Arc<PreferenceFetcher>,
    weather: Arc<WeatherQueries>,
    watchlist: Query<WatchlistResponse>,
    /// Current-weather entry whose description was last recorded
    described: Mutex<Option<(QueryKey, Option<Instant>)>>,
    shutdown: CancellationToken,
    session_listener: Mutex<Option<JoinHandle<()>>>,
}

impl AppServices {
    /// Build from config with the on-disk session and the configured
    /// location. Must be called inside a tokio runtime.
    pub fn from_config(config: Config) -> Result<Arc<Self>> {
        let storage = Arc::new(FileSessionStorage::new(config.session_path()));
        let location = location_source(&config);
        Self::build(config, storage, location)
    }

    /// Build with explicit session storage and location source.
    pub fn build(
        config: Config,
        storage: Arc<dyn SessionStorage>,
        location: Arc<dyn LocationSource>,
    ) -> Result<Arc<Self>> {
        Self::build_with(config, storage, location, None)
    }

    /// Like [`build`](Self::build), but weather reads go to `weather`
    /// instead of the API client.
    pub fn build_with_weather_source(
        config: Config,
        storage: Arc<dyn SessionStorage>,
        location: Arc<dyn LocationSource>,
        weather: Arc<dyn WeatherSource>,
    ) -> Result<Arc<Self>> {
        Self::build_with(config, storage, location, Some(weather))
    }

    fn build_with(
        config: Config,
        storage: Arc<dyn SessionStorage>,
        location: Arc<dyn LocationSource>,
        weather: Option<Arc<dyn WeatherSource>>,
    ) -> Result<Arc<Self>> {
        let events = AuthEvents::new();
        let session = Arc::new(SessionStore::new(storage));
        let client = Arc::new(ApiClient::new(&config.api, session.clone(), events.clone())?);
        let weather = weather.unwrap_or_else(|| client.clone() as Arc<dyn WeatherSource>);

        let policy = CachePolicy {
            stale_after: config.weather.stale_after(),
            retain_for: config.weather.retain_for(),
        };
        let retry = RetryConfig::new(1, config.weather.retry_delay());

        let services = Arc::new(Self {
            locator: Arc::new(DeviceLocator::new(location, config.location.timeout())),
            preferences: Arc::new(PreferenceFetcher::new(client.clone(), policy, retry.clone())),
            weather: Arc::new(WeatherQueries::new(weather, policy, retry.clone())),
            watchlist: Query::new(policy, retry),
            described: Mutex::new(None),
            selection: Arc::new(SelectionStore::new()),
            shutdown: CancellationToken::new(),
            session_listener: Mutex::new(None),
            config,
            events,
            session,
            client,
        });

        let listener = services
            .session
            .listen(&services.events, services.shutdown.child_token());
        *services.session_listener.lock() = Some(listener);

        tracing::info!("AppServices initialized (api: {})", services.client.base_url());
        Ok(services)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn selection(&self) -> &Arc<SelectionStore> {
        &self.selection
    }

    pub fn locator(&self) -> &Arc<DeviceLocator> {
        &self.locator
    }

    pub fn preferences(&self) -> &Arc<PreferenceFetcher> {
        &self.preferences
    }

    pub fn weather(&self) -> &Arc<WeatherQueries> {
        &self.weather
    }

    pub fn watchlist(&self) -> &Query<WatchlistResponse> {
        &self.watchlist
    }

    /// Remember `stamp` as the last recorded current-weather entry.
    /// False when it was already the last one.
    pub(crate) fn mark_described(&self, stamp: (QueryKey, Option<Instant>)) -> bool {
        let mut described = self.described.lock();
        if described.as_ref() == Some(&stamp) {
            return false;
        }
        *described = Some(stamp);
        true
    }

    /// Child token cancelled on shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop background tasks and wait for the session listener to exit.
    pub async fn shutdown(&self) {
        tracing::info!("AppServices shutdown initiated");
        self.shutdown.cancel();

        let listener = self.session_listener.lock().take();
        if let Some(handle) = listener {
            if let Err(e) = handle.await {
                tracing::warn!("Session listener ended abnormally: {}", e);
            }
        }
        tracing::info!("AppServices shutdown complete");
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("client", &self.client)
            .field("locator", &self.locator)
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

/// Headless hosts report a configured position or none at all.
fn location_source(config: &Config) -> Arc<dyn LocationSource> {
    match config.location.coordinates() {
        Some((lat, lon)) => {
            tracing::debug!("Using configured location {}, {}", lat, lon);
            Arc::new(FixedLocation(Coordinates::new(lat, lon)))
        }
        None => Arc::new(NoLocation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywatch_auth::MemorySessionStorage;
    use skywatch_weather::{LocatorOutcome, LocatorState};

    fn config() -> Config {
        let dir = std::env::temp_dir().join("skywatch-app-services-test");
        Config {
            config_dir: dir,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_build_starts_signed_out() {
        let services = AppServices::build(
            config(),
            Arc::new(MemorySessionStorage::new()),
            Arc::new(NoLocation),
        )
        .unwrap();

        assert!(!services.session().is_authenticated());
        assert_eq!(services.locator().state(), LocatorState::Pending);
        assert!(services.selection().target().is_none());

        services.shutdown().await;
        assert!(services.is_shutting_down());
    }

    #[tokio::test]
    async fn test_configured_location_is_reported() {
        let mut config = config();
        config.location.latitude = Some(48.85);
        config.location.longitude = Some(2.35);

        let source = location_source(&config);
        let locator = DeviceLocator::new(source, config.location.timeout());
        assert_eq!(
            locator.locate().await,
            LocatorOutcome::Success(Coordinates::new(48.85, 2.35))
        );
    }

    #[tokio::test]
    async fn test_missing_location_is_unsupported() {
        let source = location_source(&config());
        let locator = DeviceLocator::new(source, config().location.timeout());
        assert_eq!(locator.locate().await, LocatorOutcome::Unsupported);
    }
}

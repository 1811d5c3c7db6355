//! Dashboard: settle on a location, then keep its weather current.
//!
//! `bootstrap` runs the preference fetch and the device read concurrently
//! and re-evaluates the resolver as each lands. `refresh` loads both weather
//! queries for whatever target is committed. The refresh loop refetches on
//! the staleness interval and refreshes whenever the selection changes.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use skywatch_weather::{
    evaluate, weather_bg_class, CurrentWeatherResponse, FetchError, ForecastResponse,
    LocationSelection, QueryState, QueryTarget, Resolution, Units,
};

use crate::app_services::AppServices;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("No location selected")]
    NoLocation,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Everything needed to render the dashboard once.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub selection: LocationSelection,
    pub target: Option<QueryTarget>,
    pub units: Units,
    pub current: QueryState<CurrentWeatherResponse>,
    pub forecast: QueryState<ForecastResponse>,
}

impl DashboardView {
    /// Description driving the backdrop
    pub fn description(&self) -> &str {
        if !self.selection.weather_description.is_empty() {
            return &self.selection.weather_description;
        }
        self.current
            .data
            .as_ref()
            .map(|c| c.data.description.as_str())
            .unwrap_or("")
    }

    pub fn backdrop(&self) -> &'static str {
        weather_bg_class(self.description())
    }

    /// True while a first load has nothing to show yet
    pub fn is_loading(&self) -> bool {
        self.current.is_loading() || self.forecast.is_loading()
    }

    /// Problem to surface, if nothing can be shown instead
    pub fn check(&self) -> Result<(), DashboardError> {
        if !self.current.enabled {
            return Err(DashboardError::NoLocation);
        }
        let failed = if self.current.is_error() {
            self.current.error.as_ref()
        } else if self.forecast.is_error() {
            self.forecast.error.as_ref()
        } else {
            None
        };
        match failed {
            Some(e) => Err(e.clone().into()),
            None => Ok(()),
        }
    }
}

/// Settle on a location: saved preference, then device, then the fallback.
///
/// Returns early when a selection already exists. Otherwise returns once
/// both the preference fetch (skipped when signed out) and the device read
/// have finished.
pub async fn bootstrap(services: &AppServices) -> Resolution {
    let store = services.selection();
    let locator = services.locator();
    let preferences = services.preferences();

    let initial = evaluate(store, preferences.state().city(), locator.state());
    if initial == Resolution::AlreadySelected {
        return initial;
    }

    let signed_in = services.session().is_authenticated();
    let preference_pass = async {
        if signed_in {
            let state = preferences.load().await;
            evaluate(store, state.city(), locator.state());
        }
    };
    let device_pass = async {
        locator.locate().await;
        evaluate(store, preferences.state().city(), locator.state());
    };
    tokio::join!(preference_pass, device_pass);

    evaluate(store, preferences.state().city(), locator.state())
}

/// Load weather for the committed target, reusing fresh cache entries.
pub async fn refresh(services: &AppServices) -> DashboardView {
    let target = services.selection().target();
    let (current, forecast) = services.weather().load(target.as_ref()).await;
    loaded(services, target, current, forecast)
}

/// Fetch weather for the committed target even if the cache is fresh.
pub async fn refetch(services: &AppServices) -> DashboardView {
    let target = services.selection().target();
    let (current, forecast) = services.weather().refetch(target.as_ref()).await;
    loaded(services, target, current, forecast)
}

// The description follows current conditions only when new data arrived,
// so a highlighted hour survives reads served from cache.
fn loaded(
    services: &AppServices,
    target: Option<QueryTarget>,
    current: QueryState<CurrentWeatherResponse>,
    forecast: QueryState<ForecastResponse>,
) -> DashboardView {
    if let (Some(target), Some(now)) = (&target, &current.data) {
        if services.mark_described((target.key(), current.updated_at)) {
            services
                .selection()
                .set_weather_description(now.data.description.clone());
        }
    }
    build_view(services, target, current, forecast)
}

/// Cached view without touching the network
pub fn view(services: &AppServices) -> DashboardView {
    let target = services.selection().target();
    let (current, forecast) = services.weather().peek(target.as_ref());
    build_view(services, target, current, forecast)
}

fn build_view(
    services: &AppServices,
    target: Option<QueryTarget>,
    current: QueryState<CurrentWeatherResponse>,
    forecast: QueryState<ForecastResponse>,
) -> DashboardView {
    DashboardView {
        selection: services.selection().snapshot(),
        target,
        units: services.preferences().state().units(),
        current,
        forecast,
    }
}

/// Highlight an hour of the displayed forecast.
pub fn select_hour(services: &AppServices, index: usize) -> bool {
    let target = services.selection().target();
    let (_, forecast) = services.weather().peek(target.as_ref());
    match forecast.data {
        Some(forecast) => services.selection().select_hour(index, &forecast.hourly),
        None => false,
    }
}

/// Refresh once, then refetch on the staleness interval and refresh on
/// every selection change until shutdown. `on_update` receives each view.
pub fn spawn_refresh_loop<F>(services: Arc<AppServices>, on_update: F) -> JoinHandle<()>
where
    F: Fn(DashboardView) + Send + Sync + 'static,
{
    let shutdown = services.shutdown_token();
    let mut selection_rx = services.selection().subscribe();
    let period = services.config().weather.stale_after();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        on_update(refresh(&services).await);

        loop {
            let view = tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    tracing::debug!("Periodic dashboard refetch");
                    refetch(&services).await
                }
                changed = selection_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    tracing::debug!("Selection changed, refreshing dashboard");
                    refresh(&services).await
                }
            };

            services.weather().collect_garbage();
            on_update(view);
        }
        tracing::debug!("Dashboard refresh loop stopped");
    })
}

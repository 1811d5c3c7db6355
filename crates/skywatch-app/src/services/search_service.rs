//! City search.

use skywatch_core::ValidationError;
use skywatch_services::{AddWatchlistRequest, WatchlistItem};
use skywatch_weather::{CurrentWeatherData, FetchError};

use crate::app_services::AppServices;
use crate::services::dashboard_service::{self, DashboardView};
use crate::services::watchlist_service::{self, WatchlistError};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("City not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Fetch(FetchError),
    #[error(transparent)]
    Watchlist(#[from] WatchlistError),
}

/// Commit `query` as the selected city and load its weather.
///
/// Blank input is rejected without touching the selection.
pub async fn search(services: &AppServices, query: &str) -> Result<DashboardView, SearchError> {
    let city = query.trim();
    if city.is_empty() {
        return Err(ValidationError::EmptyCity.into());
    }

    tracing::info!("Searching for {}", city);
    services.selection().set_selected_city(city);
    let view = dashboard_service::refresh(services).await;

    if view.current.is_error() {
        return Err(match view.current.error.clone() {
            Some(FetchError::NotFound(_)) | None => SearchError::NotFound(city.to_string()),
            Some(other) => SearchError::Fetch(other),
        });
    }
    Ok(view)
}

/// Watchlist entry for a search result, carrying its country and position.
pub fn watchlist_request(result: &CurrentWeatherData) -> AddWatchlistRequest {
    AddWatchlistRequest {
        city_name: result.city_name.clone(),
        country_code: Some(result.country_code.clone()).filter(|c| !c.is_empty()),
        latitude: Some(result.lat),
        longitude: Some(result.lon),
    }
}

/// Save the result shown in `view` to the watchlist.
pub async fn save_result(services: &AppServices, view: &DashboardView) -> Result<WatchlistItem, SearchError> {
    let Some(current) = &view.current.data else {
        return Err(SearchError::NotFound(
            view.target.as_ref().map(ToString::to_string).unwrap_or_default(),
        ));
    };
    Ok(watchlist_service::add(services, watchlist_request(&current.data)).await?)
}

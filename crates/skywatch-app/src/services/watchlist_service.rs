//! Saved locations.
//!
//! The list is cached like any other query; every mutation invalidates it.

use skywatch_core::ValidationError;
use skywatch_services::{AddWatchlistRequest, WatchlistItem, WatchlistResponse};
use skywatch_weather::{FetchError, QueryKey};

use crate::app_services::AppServices;
use crate::services::dashboard_service::{self, DashboardView};

#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("No watchlist entry matches {0}")]
    UnknownEntry(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

fn watchlist_key() -> QueryKey {
    QueryKey::named("watchlist")
}

fn require_session(services: &AppServices) -> Result<(), WatchlistError> {
    if services.session().is_authenticated() {
        Ok(())
    } else {
        Err(WatchlistError::NotSignedIn)
    }
}

pub async fn list(services: &AppServices) -> Result<WatchlistResponse, WatchlistError> {
    require_session(services)?;
    let client = services.client();
    let state = services
        .watchlist()
        .fetch(&watchlist_key(), move || client.list_watchlist())
        .await;

    match (state.data, state.error) {
        (Some(list), _) => Ok(list),
        (None, Some(e)) => Err(e.into()),
        (None, None) => Ok(WatchlistResponse {
            items: Vec::new(),
            count: 0,
        }),
    }
}

pub async fn add(services: &AppServices, req: AddWatchlistRequest) -> Result<WatchlistItem, WatchlistError> {
    require_session(services)?;
    let city_name = req.city_name.trim().to_string();
    if city_name.is_empty() {
        return Err(ValidationError::EmptyCity.into());
    }
    let req = AddWatchlistRequest { city_name, ..req };

    let item = services.client().add_to_watchlist(&req).await?;
    services.watchlist().invalidate(&watchlist_key());
    Ok(item)
}

/// Remove by item id or city name
pub async fn remove(services: &AppServices, needle: &str) -> Result<WatchlistItem, WatchlistError> {
    let item = find(services, needle).await?;
    services.client().remove_from_watchlist(&item.id).await?;
    services.watchlist().invalidate(&watchlist_key());
    Ok(item)
}

/// Show an entry's weather; commits its city as the selection.
pub async fn view(services: &AppServices, needle: &str) -> Result<DashboardView, WatchlistError> {
    let item = find(services, needle).await?;
    services.selection().set_selected_city(item.location.city_name.clone());
    Ok(dashboard_service::refresh(services).await)
}

async fn find(services: &AppServices, needle: &str) -> Result<WatchlistItem, WatchlistError> {
    let list = list(services).await?;
    list.find(needle.trim())
        .cloned()
        .ok_or_else(|| WatchlistError::UnknownEntry(needle.to_string()))
}

//! Saved locations.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use skywatch_weather::FetchError;

use crate::client::ApiClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistLocation {
    pub id: String,
    pub city_name: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: String,
    pub location: WatchlistLocation,
    pub added_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistResponse {
    #[serde(default)]
    pub items: Vec<WatchlistItem>,
    #[serde(default)]
    pub count: usize,
}

impl WatchlistResponse {
    /// Find an entry by item id or, failing that, by city name
    pub fn find(&self, needle: &str) -> Option<&WatchlistItem> {
        self.items.iter().find(|item| item.id == needle).or_else(|| {
            self.items
                .iter()
                .find(|item| item.location.city_name.eq_ignore_ascii_case(needle))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddWatchlistRequest {
    pub city_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl AddWatchlistRequest {
    pub fn city(name: impl Into<String>) -> Self {
        Self {
            city_name: name.into(),
            ..Default::default()
        }
    }
}

impl ApiClient {
    pub async fn list_watchlist(&self) -> Result<WatchlistResponse, FetchError> {
        tracing::debug!("Fetching watchlist");
        let list: WatchlistResponse = self.get_json("watchlist", &[]).await?;
        tracing::info!("Fetched {} watchlist entries", list.items.len());
        Ok(list)
    }

    pub async fn add_to_watchlist(&self, req: &AddWatchlistRequest) -> Result<WatchlistItem, FetchError> {
        tracing::debug!("Adding {} to watchlist", req.city_name);
        let item: WatchlistItem = self.send_json(Method::POST, "watchlist", req).await?;
        tracing::info!("Added {} to watchlist ({})", item.location.city_name, item.id);
        Ok(item)
    }

    pub async fn remove_from_watchlist(&self, id: &str) -> Result<(), FetchError> {
        tracing::debug!("Removing watchlist entry {}", id);
        self.delete(&format!("watchlist/{}", id)).await?;
        tracing::info!("Removed watchlist entry {}", id);
        Ok(())
    }
}

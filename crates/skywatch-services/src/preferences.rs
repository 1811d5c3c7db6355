use async_trait::async_trait;
use reqwest::Method;

use skywatch_weather::{FetchError, PreferenceSource, Preferences, PreferencesUpdate};

use crate::client::ApiClient;

impl ApiClient {
    pub async fn get_preferences(&self) -> Result<Preferences, FetchError> {
        tracing::debug!("Fetching preferences");
        self.get_json("preferences", &[]).await
    }

    pub async fn put_preferences(&self, update: &PreferencesUpdate) -> Result<Preferences, FetchError> {
        tracing::debug!("Updating preferences");
        self.send_json(Method::PUT, "preferences", update).await
    }
}

#[async_trait]
impl PreferenceSource for ApiClient {
    async fn fetch_preferences(&self) -> Result<Preferences, FetchError> {
        self.get_preferences().await
    }

    async fn update_preferences(&self, update: &PreferencesUpdate) -> Result<Preferences, FetchError> {
        self.put_preferences(update).await
    }
}

use async_trait::async_trait;

use skywatch_weather::{CurrentWeatherResponse, FetchError, ForecastResponse, QueryTarget, WeatherSource};

use crate::client::ApiClient;

impl ApiClient {
    pub async fn current_weather(&self, target: &QueryTarget) -> Result<CurrentWeatherResponse, FetchError> {
        tracing::debug!("Fetching current weather for {}", target);
        let response: CurrentWeatherResponse =
            self.get_json("weather/current", &target.query_params()).await?;
        tracing::info!(
            "Current weather for {}: {} ({})",
            response.data.city_name,
            response.data.description,
            response.data_source
        );
        Ok(response)
    }

    pub async fn forecast(&self, target: &QueryTarget) -> Result<ForecastResponse, FetchError> {
        tracing::debug!("Fetching forecast for {}", target);
        let response: ForecastResponse =
            self.get_json("weather/forecast", &target.query_params()).await?;
        tracing::info!(
            "Forecast for {}: {} days, {} hours, {} alerts",
            response.city_name,
            response.daily.len(),
            response.hourly.len(),
            response.alerts.len()
        );
        Ok(response)
    }
}

#[async_trait]
impl WeatherSource for ApiClient {
    async fn current_weather(&self, target: &QueryTarget) -> Result<CurrentWeatherResponse, FetchError> {
        ApiClient::current_weather(self, target).await
    }

    async fn forecast(&self, target: &QueryTarget) -> Result<ForecastResponse, FetchError> {
        ApiClient::forecast(self, target).await
    }
}

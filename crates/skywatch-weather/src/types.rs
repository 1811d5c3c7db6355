use serde::{Deserialize, Serialize};

/// Unit system reported by the user's preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Parse the API's unit string; anything but `imperial` is metric
    pub fn from_api(value: &str) -> Self {
        if value.eq_ignore_ascii_case("imperial") {
            Self::Imperial
        } else {
            Self::Metric
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Metric => 'C',
            Self::Imperial => 'F',
        }
    }
}

/// Geographic coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The concrete location a weather fetch is issued for.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    City(String),
    Coords(Coordinates),
}

impl QueryTarget {
    pub fn city(name: impl Into<String>) -> Self {
        Self::City(name.into())
    }

    pub fn coords(lat: f64, lon: f64) -> Self {
        Self::Coords(Coordinates::new(lat, lon))
    }

    /// Cache key: the exact serialized form, so a city and its coordinates
    /// are distinct entries.
    pub fn key(&self) -> QueryKey {
        match self {
            Self::City(city) => QueryKey(format!("city={}", city)),
            Self::Coords(c) => QueryKey(format!("lat={}&lon={}", c.lat, c.lon)),
        }
    }

    /// Query-string parameters for the weather endpoints
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::City(city) => vec![("city", city.clone())],
            Self::Coords(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        }
    }
}

impl std::fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::City(city) => write!(f, "{}", city),
            Self::Coords(c) => write!(f, "{:.4}, {:.4}", c.lat, c.lon),
        }
    }
}

/// Serialized [`QueryTarget`] used as a cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Key for a singleton resource such as preferences
    pub fn named(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current conditions for one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherData {
    pub city_name: String,
    pub country_code: String,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub wind_speed: f64,
    pub wind_direction: String,
    pub description: String,
    pub icon: String,
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub uv_index: Option<f64>,
    #[serde(default)]
    pub clouds: Option<i32>,
    #[serde(default)]
    pub sunrise: Option<String>,
    #[serde(default)]
    pub sunset: Option<String>,
    #[serde(default)]
    pub aqi: Option<f64>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub data: CurrentWeatherData,
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

fn default_data_source() -> String {
    "live".to_string()
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub timestamp: String,
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<i32>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    pub description: String,
    pub icon: String,
    /// Probability of precipitation, 0..=1
    #[serde(default)]
    pub pop: Option<f64>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub temp_high: f64,
    pub temp_low: f64,
    #[serde(default)]
    pub humidity: Option<i32>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    pub description: String,
    pub icon: String,
    #[serde(default)]
    pub pop: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

/// Complete forecast bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub city_name: String,
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub daily: Vec<DailyForecast>,
    #[serde(default)]
    pub hourly: Vec<HourlyForecast>,
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

/// The user's saved defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub default_city: Option<String>,
    #[serde(default)]
    pub default_country: Option<String>,
    #[serde(default)]
    pub default_lat: Option<String>,
    #[serde(default)]
    pub default_lon: Option<String>,
    #[serde(default = "default_units")]
    pub units: String,
}

fn default_units() -> String {
    "metric".to_string()
}

impl Preferences {
    pub fn units(&self) -> Units {
        Units::from_api(&self.units)
    }

    /// Saved default city, ignoring blank values
    pub fn city(&self) -> Option<&str> {
        self.default_city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Partial preferences update
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_lon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Device location errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unsupported,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Failure of a remote fetch, independent of the HTTP stack
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Bearer token rejected (401)
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transient failures worth the single automatic retry
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            Self::Connection(_) | Self::Timeout => true,
            Self::Unauthorized | Self::NotFound(_) | Self::Decode(_) => false,
        }
    }
}

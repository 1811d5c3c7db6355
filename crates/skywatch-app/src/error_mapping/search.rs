use crate::services::SearchError;
use skywatch_core::{AppError, WeatherError};

use super::fetch_error;

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Validation(v) => AppError::Validation(v),
            SearchError::NotFound(city) => AppError::Weather(WeatherError::LocationNotFound(city)),
            SearchError::Fetch(f) => fetch_error(f),
            SearchError::Watchlist(w) => w.into(),
        }
    }
}

use crate::services::WatchlistError;
use skywatch_core::{AppError, AuthError, WeatherError};

use super::fetch_error;

impl From<WatchlistError> for AppError {
    fn from(e: WatchlistError) -> Self {
        match e {
            WatchlistError::Validation(v) => AppError::Validation(v),
            WatchlistError::NotSignedIn => AppError::Auth(AuthError::NotAuthenticated),
            WatchlistError::UnknownEntry(needle) => {
                AppError::Weather(WeatherError::UnknownWatchlistEntry(needle))
            }
            WatchlistError::Fetch(f) => fetch_error(f),
        }
    }
}

use crate::services::PreferencesError;
use skywatch_core::{AppError, AuthError, WeatherError};

use super::fetch_error;

impl From<PreferencesError> for AppError {
    fn from(e: PreferencesError) -> Self {
        match e {
            PreferencesError::NotSignedIn => AppError::Auth(AuthError::NotAuthenticated),
            PreferencesError::Loading => AppError::Weather(WeatherError::PreferencesPending),
            PreferencesError::Fetch(f) => fetch_error(f),
        }
    }
}

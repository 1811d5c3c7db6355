//! `From` impls turning each flow's error into [`skywatch_core::AppError`].

mod auth;
mod dashboard;
mod preferences;
mod search;
mod watchlist;

use skywatch_core::{AppError, AuthError, NetworkError, WeatherError};
use skywatch_weather::FetchError;

/// Shared mapping for raw fetch failures
pub(crate) fn fetch_error(e: FetchError) -> AppError {
    match e {
        FetchError::Unauthorized => AppError::Auth(AuthError::TokenExpired),
        FetchError::NotFound(detail) => AppError::Weather(WeatherError::LocationNotFound(detail)),
        FetchError::Server { status, message } => {
            AppError::Network(NetworkError::ServerError { status, message })
        }
        FetchError::Connection(s) => AppError::Network(NetworkError::ConnectionFailed(s)),
        FetchError::Timeout => AppError::Network(NetworkError::Timeout),
        FetchError::Decode(s) => AppError::Network(NetworkError::InvalidResponse(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AuthServiceError, DashboardError, SearchError, WatchlistError};
    use skywatch_core::ValidationError;

    #[test]
    fn test_unauthorized_is_auth_rejection() {
        let e = fetch_error(FetchError::Unauthorized);
        assert!(e.is_auth_rejection());
    }

    #[test]
    fn test_not_found_maps_to_location() {
        let e: AppError = SearchError::NotFound("Atlantis".into()).into();
        assert!(matches!(e, AppError::Weather(WeatherError::LocationNotFound(_))));
    }

    #[test]
    fn test_invalid_credentials() {
        let e: AppError = AuthServiceError::InvalidCredentials.into();
        assert!(matches!(e, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_validation_passes_through() {
        let e: AppError = WatchlistError::Validation(ValidationError::EmptyCity).into();
        assert!(matches!(e, AppError::Validation(ValidationError::EmptyCity)));
    }

    #[test]
    fn test_timeout_is_network() {
        let e: AppError = DashboardError::Fetch(FetchError::Timeout).into();
        assert!(matches!(e, AppError::Network(NetworkError::Timeout)));
        assert!(!e.user_message().is_empty());
    }
}

//! Application flows. Each returns its own error type; see `error_mapping`
//! for the conversion to `AppError`.

pub mod auth_service;
pub mod dashboard_service;
pub mod preferences_service;
pub mod search_service;
pub mod watchlist_service;

pub use auth_service::AuthServiceError;
pub use dashboard_service::{DashboardError, DashboardView};
pub use preferences_service::PreferencesError;
pub use search_service::SearchError;
pub use watchlist_service::WatchlistError;

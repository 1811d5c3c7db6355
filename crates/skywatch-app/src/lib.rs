//! SkyWatch application layer
//!
//! Wires configuration, session, API client and weather state together in
//! [`AppServices`] and exposes the user-facing flows in [`services`].

pub mod app_services;
mod error_mapping;
pub mod services;

pub use app_services::AppServices;
pub use services::{
    AuthServiceError, DashboardError, DashboardView, PreferencesError, SearchError,
    WatchlistError,
};

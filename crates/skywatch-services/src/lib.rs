//! HTTP client for the SkyWatch API
//!
//! One [`ApiClient`] serves every endpoint and implements the weather and
//! preference source traits consumed by `skywatch-weather`.

pub mod auth;
pub mod client;
pub mod preferences;
pub mod watchlist;
pub mod weather;

pub use auth::{TokenResponse, UserResponse};
pub use client::ApiClient;
pub use watchlist::{AddWatchlistRequest, WatchlistItem, WatchlistLocation, WatchlistResponse};

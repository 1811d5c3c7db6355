//! User-facing error hierarchy.
//!
//! Lower layers keep their own error enums; the app layer maps them into
//! [`AppError`] so every failure has one short message fit for display.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl AppError {
    /// Short, non-technical message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Validation(e) => e.user_message(),
        }
    }

    /// True when the stored session was rejected by the server.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, AppError::Auth(AuthError::TokenExpired))
    }
}

/// Transport and HTTP failures.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to reach the SkyWatch server. Check your connection."
            }
            NetworkError::Timeout => "The server took too long to answer. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The SkyWatch server is having trouble. Please try again later."
            }
            NetworkError::ServerError { .. } => "The server refused the request.",
            NetworkError::InvalidResponse(_) => "The server sent data this client can't read.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "The configuration file has invalid values.",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// A 401 on an authenticated call; the session has been dropped.
    #[error("Session rejected by server")]
    TokenExpired,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Signup refused, carrying the server's reason.
    #[error("Signup failed: {0}")]
    SignupFailed(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::TokenExpired => "Your session has expired. Please sign in again.",
            AuthError::NotAuthenticated => "Sign in to use this feature.",
            AuthError::InvalidCredentials => "Login failed. Check your username and password.",
            AuthError::SignupFailed(_) => "Signup failed. Try a different username.",
        }
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("No location selected")]
    NoLocation,

    #[error("No watchlist entry matches {0}")]
    UnknownWatchlistEntry(String),

    #[error("Preferences are still loading")]
    PreferencesPending,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "City not found. Check the spelling and try again.",
            WeatherError::NoLocation => "No location yet. Search for a city.",
            WeatherError::UnknownWatchlistEntry(_) => "That location isn't on your watchlist.",
            WeatherError::PreferencesPending => "Your preferences are still loading.",
        }
    }
}

/// Client-side form validation failures, raised before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Username must be between 3 and 50 characters")]
    UsernameLength,

    #[error("Username may only contain letters, numbers, and underscores")]
    UsernameCharacters,

    #[error("Password must be between 8 and 128 characters")]
    PasswordLength,

    #[error("Username must be at least 3 characters")]
    UsernameTooShort,

    #[error("Password must be at least 8 characters")]
    PasswordTooShort,

    #[error("{0} is required")]
    Required(&'static str),

    #[error("City name is required")]
    EmptyCity,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::PasswordMismatch => "Passwords do not match",
            ValidationError::UsernameLength => "Username must be 3-50 characters.",
            ValidationError::UsernameCharacters => {
                "Only letters, numbers, and underscores are allowed in a username."
            }
            ValidationError::PasswordLength => "Password must be 8-128 characters.",
            ValidationError::UsernameTooShort => "Username must be at least 3 characters.",
            ValidationError::PasswordTooShort => "Password must be at least 8 characters.",
            ValidationError::Required(_) => "Please fill in all required fields.",
            ValidationError::EmptyCity => "Enter a city name.",
        }
    }
}

/// Classify a reqwest failure.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_decode() {
            return NetworkError::InvalidResponse(self.to_string());
        }
        match self.status() {
            Some(status) if !self.is_connect() => NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            },
            _ => NetworkError::ConnectionFailed(self.to_string()),
        }
    }
}

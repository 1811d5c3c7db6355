//! Sign-in, sign-up and session lifecycle.

use skywatch_auth::{validate_login, validate_signup, Session};
use skywatch_core::ValidationError;
use skywatch_services::UserResponse;
use skywatch_weather::FetchError;

use crate::app_services::AppServices;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Signup failed: {0}")]
    SignupFailed(String),
    #[error("Not signed in")]
    NotSignedIn,
    #[error(transparent)]
    Network(FetchError),
}

/// Validate, authenticate and store the returned credentials.
pub async fn login(services: &AppServices, username: &str, password: &str) -> Result<Session, AuthServiceError> {
    validate_login(username, password)?;
    let username = username.trim();

    let token = services
        .client()
        .login(username, password)
        .await
        .map_err(|e| match e {
            FetchError::Unauthorized => AuthServiceError::InvalidCredentials,
            other => AuthServiceError::Network(other),
        })?;

    services.session().set_credentials(token.into_credentials(username));
    // Preferences belong to the previous identity, if any
    services.preferences().invalidate();
    Ok(services.session().snapshot())
}

/// Create an account. Does not sign in.
pub async fn signup(
    services: &AppServices,
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<UserResponse, AuthServiceError> {
    validate_signup(username, password, confirm_password)?;

    services
        .client()
        .signup(username, password)
        .await
        .map_err(|e| match e {
            FetchError::Server { status, message } if status < 500 => {
                AuthServiceError::SignupFailed(message)
            }
            other => AuthServiceError::Network(other),
        })
}

/// Exchange the refresh token for a new token pair.
pub async fn refresh(services: &AppServices) -> Result<Session, AuthServiceError> {
    let session = services.session().snapshot();
    let (Some(refresh_token), Some(username)) = (session.refresh_token, session.username) else {
        return Err(AuthServiceError::NotSignedIn);
    };

    let token = services
        .client()
        .refresh(&refresh_token)
        .await
        .map_err(|e| match e {
            FetchError::Unauthorized => AuthServiceError::NotSignedIn,
            other => AuthServiceError::Network(other),
        })?;

    services.session().set_credentials(token.into_credentials(username));
    Ok(services.session().snapshot())
}

pub fn logout(services: &AppServices) {
    services.session().logout();
    services.preferences().invalidate();
}

/// Current session, if signed in
pub fn whoami(services: &AppServices) -> Option<Session> {
    let session = services.session().snapshot();
    session.is_authenticated().then_some(session)
}

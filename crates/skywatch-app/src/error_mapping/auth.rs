use crate::services::AuthServiceError;
use skywatch_core::{AppError, AuthError};

use super::fetch_error;

impl From<AuthServiceError> for AppError {
    fn from(e: AuthServiceError) -> Self {
        match e {
            AuthServiceError::Validation(v) => AppError::Validation(v),
            AuthServiceError::InvalidCredentials => AppError::Auth(AuthError::InvalidCredentials),
            AuthServiceError::SignupFailed(s) => AppError::Auth(AuthError::SignupFailed(s)),
            AuthServiceError::NotSignedIn => AppError::Auth(AuthError::NotAuthenticated),
            AuthServiceError::Network(f) => fetch_error(f),
        }
    }
}

//! Account endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use skywatch_auth::Credentials;
use skywatch_weather::FetchError;

use crate::client::ApiClient;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user_id: String,
    pub role: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    /// Token responses omit the username; the caller supplies it.
    pub fn into_credentials(self, username: impl Into<String>) -> Credentials {
        Credentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            username: username.into(),
            user_id: self.user_id,
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ApiClient {
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, FetchError> {
        tracing::debug!("Logging in as {}", username);
        self.send_json(Method::POST, "auth/login", &LoginRequest { username, password })
            .await
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<UserResponse, FetchError> {
        tracing::debug!("Creating account {}", username);
        let user: UserResponse = self
            .send_json(Method::POST, "auth/signup", &SignupRequest { username, password })
            .await?;
        tracing::info!("Created account {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, FetchError> {
        tracing::debug!("Refreshing access token");
        self.send_json(Method::POST, "auth/refresh", &RefreshRequest { refresh_token })
            .await
    }
}

//! HTTP plumbing shared by every SkyWatch endpoint.
//!
//! Attaches the session's bearer token to each request and reports a 401 on
//! the auth event bus, so the session is cleared regardless of which call
//! hit it.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use skywatch_auth::{AuthEvent, AuthEvents, SessionStore};
use skywatch_core::{ApiConfig, NetworkError, ReqwestErrorExt};
use skywatch_weather::FetchError;

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// SkyWatch API client
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Arc<Client>,
    session: Arc<SessionStore>,
    events: AuthEvents,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>, events: AuthEvents) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: normalize_base(&config.base_url)?,
            client: Arc::new(client),
            session,
            events,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::Connection(format!("Invalid URL for {}: {}", path, e)))
    }

    /// Build a request with JSON and auth headers
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, FetchError> {
        let mut req = self
            .client
            .request(method, self.url(path)?)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(bearer) = self.session.snapshot().bearer() {
            req = req.header(header::AUTHORIZATION, bearer);
        }
        Ok(req)
    }

    /// Send and classify the response status
    pub(crate) async fn send(&self, req: RequestBuilder) -> Result<Response, FetchError> {
        let response = req.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = error_detail(response).await;
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Request rejected with 401: {}", detail);
                self.events.emit(AuthEvent::Rejected);
                Err(FetchError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(detail)),
            _ => Err(FetchError::Server {
                status: status.as_u16(),
                message: detail,
            }),
        }
    }

    pub(crate) async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let req = self.request(Method::GET, path)?.query(query);
        let response = self.send(req).await?;
        decode(response).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(method, path)?.json(body);
        let response = self.send(req).await?;
        decode(response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), FetchError> {
        let req = self.request(Method::DELETE, path)?;
        self.send(req).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Parse the base URL and make sure relative joins append to its path.
fn normalize_base(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid API base URL: {}", base))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport_error(e: reqwest::Error) -> FetchError {
    match e.into_network_error() {
        NetworkError::Timeout => FetchError::Timeout,
        NetworkError::ConnectionFailed(msg) => FetchError::Connection(msg),
        NetworkError::InvalidResponse(msg) => FetchError::Decode(msg),
        NetworkError::ServerError { status, message } => FetchError::Server { status, message },
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Pull `detail` out of an error body, falling back to the raw text.
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !text.trim().is_empty() => text,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

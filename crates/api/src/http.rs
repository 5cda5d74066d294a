//! The configured HTTP client adapter.
//!
//! One `Http` instance serves the whole client. Every outgoing request is
//! augmented with a bearer token read from the [`TokenSource`] *at request
//! time*, never at construction time, so a token written after sign-in is
//! picked up on the very next call.

use crate::error::ApiError;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Source of the bearer token attached to outgoing requests.
///
/// Consulted once per request. Returning `None` sends the request
/// unauthenticated (sign-in and invite validation need this).
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A token source with no token. Used before sign-in and in tests.
pub struct NoAuth;

impl TokenSource for NoAuth {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Error body convention of the backend: `{"message": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// The configured HTTP client: fixed base URL, per-request bearer token,
/// optional artificial delay.
///
/// The delay reproduces a development throttle of the source system; it
/// is configurable and off by default, and nothing may depend on it.
#[derive(Clone)]
pub struct Http {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    request_delay: Option<Duration>,
}

// Manual impl: the token source is a trait object and must not leak
// token material into debug output anyway.
impl fmt::Debug for Http {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http")
            .field("base_url", &self.base_url)
            .field("request_delay", &self.request_delay)
            .finish_non_exhaustive()
    }
}

impl Http {
    /// Creates an adapter for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BaseUrl` if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|e| ApiError::BaseUrl(e.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens,
            request_delay: None,
        })
    }

    /// Injects a fixed delay before every request. Development throttle
    /// only.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    /// Starts a request for `path` (which must begin with `/`), attaching
    /// the current bearer token if one exists.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "issuing request");
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.tokens.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Sends the request and decodes a JSON body.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(builder).await?;
        let bytes = response.bytes().await.map_err(ApiError::Transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Sends the request, discarding any response body.
    pub(crate) async fn execute_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.dispatch(builder).await.map(|_| ())
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        if let Some(delay) = self.request_delay {
            tokio::time::sleep(delay).await;
        }
        let response = builder.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::error_for(status, response).await)
    }

    async fn error_for(status: StatusCode, response: Response) -> ApiError {
        let message = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .map(|body| body.message),
            Err(_) => None,
        };
        ApiError::classify(status, message)
    }

    /// The URL at which an attachment's content is addressed: the base
    /// URL plus the attachment identifier.
    pub fn attachment_url(&self, attachment_id: &str) -> String {
        format!("{}/attachments/{}", self.base_url, attachment_id)
    }
}

//! Sign-in. The returned token is persisted by the caller (the store
//! crate owns durability; this wrapper only talks to the endpoint).

use crate::error::ApiError;
use crate::http::Http;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub token: String,
}

/// `POST /auth/login` — exchanges credentials for a bearer token.
pub async fn login(http: &Http, credentials: &Credentials) -> Result<Session, ApiError> {
    http.execute(http.request(Method::POST, "/auth/login").json(credentials))
        .await
}

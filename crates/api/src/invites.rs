//! Invite links for onboarding new psychologists.

use crate::error::ApiError;
use crate::http::Http;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// An invite as returned by `POST /invites`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub hash: String,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response of `GET /invites/:hash/validate`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteValidation {
    pub valid: bool,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /invites` — creates an invite link.
pub async fn create_invite(http: &Http) -> Result<Invite, ApiError> {
    http.execute(http.request(Method::POST, "/invites")).await
}

/// `GET /invites/:hash/validate` — checks an invite before onboarding.
/// Works unauthenticated; the invitee has no session yet.
pub async fn validate_invite(http: &Http, hash: &str) -> Result<InviteValidation, ApiError> {
    http.execute(http.request(Method::GET, &format!("/invites/{hash}/validate")))
        .await
}

//! The signed-in psychologist's own profile.

use crate::error::ApiError;
use crate::http::Http;
use psiclin_types::PhoneNumber;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Profile of the signed-in psychologist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Professional registration number (CRP).
    #[serde(default)]
    pub crp: Option<String>,
    #[serde(default)]
    pub phone_number: Option<PhoneNumber>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Merge-patch payload for `PUT /psychologists/me`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<PhoneNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// `GET /psychologists/me` — the signed-in user's profile.
pub async fn fetch_profile(http: &Http) -> Result<Profile, ApiError> {
    http.execute(http.request(Method::GET, "/psychologists/me"))
        .await
}

/// `PUT /psychologists/me` — merge-patch update of the profile.
pub async fn update_profile(http: &Http, request: &UpdateProfile) -> Result<Profile, ApiError> {
    http.execute(http.request(Method::PUT, "/psychologists/me").json(request))
        .await
}

//! Announcement popups shown to users on sign-in.

use crate::error::ApiError;
use crate::http::Http;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Popup {
    pub id: String,
    pub title: String,
    pub content: String,
    pub active: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPopup {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

/// `GET /popups` — all popups currently configured.
pub async fn list_popups(http: &Http) -> Result<Vec<Popup>, ApiError> {
    http.execute(http.request(Method::GET, "/popups")).await
}

/// `POST /popups` — creates a popup.
pub async fn create_popup(http: &Http, request: &NewPopup) -> Result<Popup, ApiError> {
    http.execute(http.request(Method::POST, "/popups").json(request))
        .await
}

/// `DELETE /popups/:id` — removes a popup.
pub async fn delete_popup(http: &Http, popup_id: &str) -> Result<(), ApiError> {
    http.execute_empty(http.request(Method::DELETE, &format!("/popups/{popup_id}")))
        .await
}

//! Admin approval queue for newly registered psychologists.

use crate::error::ApiError;
use crate::http::Http;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// A registration awaiting approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub crp: Option<String>,
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
}

/// `GET /admin/approvals` — registrations awaiting a decision.
pub async fn list_approvals(http: &Http) -> Result<Vec<Approval>, ApiError> {
    http.execute(http.request(Method::GET, "/admin/approvals"))
        .await
}

/// `PATCH /admin/approvals/:id/approve` — approves a registration.
pub async fn approve(http: &Http, approval_id: &str) -> Result<(), ApiError> {
    http.execute_empty(http.request(
        Method::PATCH,
        &format!("/admin/approvals/{approval_id}/approve"),
    ))
    .await
}

//! The suggestions board: submissions from users, triage by admins.

use crate::error::ApiError;
use crate::http::Http;
use crate::paging::Page;
use chrono::{DateTime, Utc};
use psiclin_types::{NonEmptyText, Pagination};
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub content: String,
    pub status: SuggestionStatus,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /suggestions`. Blank content is rejected at
/// construction of the [`NonEmptyText`], before any request is built.
#[derive(Debug, Clone, Serialize)]
pub struct NewSuggestion {
    pub content: NonEmptyText,
}

#[derive(Serialize)]
struct StatusBody {
    status: SuggestionStatus,
}

/// `GET /suggestions` — one page of the suggestions board.
pub async fn list_suggestions(
    http: &Http,
    pagination: Pagination,
) -> Result<Page<Suggestion>, ApiError> {
    http.execute(
        http.request(Method::GET, "/suggestions")
            .query(&pagination.to_query()),
    )
    .await
}

/// `POST /suggestions` — submits a suggestion.
pub async fn submit_suggestion(
    http: &Http,
    request: &NewSuggestion,
) -> Result<Suggestion, ApiError> {
    http.execute(http.request(Method::POST, "/suggestions").json(request))
        .await
}

/// `PATCH /admin/suggestions/:id/status` — accepts or rejects a
/// suggestion.
pub async fn set_suggestion_status(
    http: &Http,
    suggestion_id: &str,
    status: SuggestionStatus,
) -> Result<Suggestion, ApiError> {
    http.execute(
        http.request(
            Method::PATCH,
            &format!("/admin/suggestions/{suggestion_id}/status"),
        )
        .json(&StatusBody { status }),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submission_serialises_content_as_a_plain_string() {
        let request = NewSuggestion {
            content: NonEmptyText::new("  dark mode for the agenda ").expect("content"),
        };
        let body = serde_json::to_value(&request).expect("serialise");
        assert_eq!(body, json!({ "content": "dark mode for the agenda" }));
    }
}

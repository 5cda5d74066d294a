//! Attachment upload, listing and the historical-shape coalescer.
//!
//! Attachment metadata is the one place where the backend has shipped
//! several field spellings over the years (`filename` / `fileName` /
//! `title`, flat or under a `props` envelope). Coalescing them into one
//! canonical shape is a deliberate contract here, not defensive slop:
//! candidates are tried in a documented priority order, and a record
//! matching none of them fails loudly as a data-integrity error.

use crate::error::ApiError;
use crate::http::Http;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Canonical attachment metadata, after coalescing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Attachment {
    /// Opaque identifier; absent in some legacy records.
    pub id: Option<String>,
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<u64>,
}

/// Filename candidates, in priority order.
const FILENAME_KEYS: [&str; 3] = ["filename", "fileName", "title"];
/// URL candidates, in priority order.
const URL_KEYS: [&str; 3] = ["url", "file_url", "fileUrl"];
const ID_KEYS: [&str; 2] = ["id", "_id"];
const CONTENT_TYPE_KEYS: [&str; 3] = ["contentType", "content_type", "mimetype"];
const SIZE_KEYS: [&str; 3] = ["size", "sizeBytes", "size_bytes"];

/// Normalises one raw attachment record.
///
/// # Errors
///
/// Returns `ApiError::MalformedAttachment` (carrying the keys that were
/// present) when no filename or no URL candidate matches.
pub fn attachment_from_value(value: &Value) -> Result<Attachment, ApiError> {
    let Some(outer) = value.as_object() else {
        return Err(ApiError::MalformedAttachment { keys: Vec::new() });
    };
    // Some backend versions nest the payload under a `props` envelope.
    let body = outer
        .get("props")
        .and_then(Value::as_object)
        .unwrap_or(outer);

    let pick_str = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_owned)
    };

    let filename = pick_str(&FILENAME_KEYS);
    let url = pick_str(&URL_KEYS);
    let (Some(filename), Some(url)) = (filename, url) else {
        let keys: Vec<String> = body.keys().cloned().collect();
        warn!(?keys, "attachment record matches no known shape");
        return Err(ApiError::MalformedAttachment { keys });
    };

    // The identifier sometimes sits outside the `props` envelope.
    let id = pick_str(&ID_KEYS).or_else(|| {
        ID_KEYS
            .iter()
            .find_map(|key| outer.get(*key).and_then(Value::as_str))
            .map(str::to_owned)
    });
    let size_bytes = SIZE_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_u64));

    Ok(Attachment {
        id,
        filename,
        url,
        content_type: pick_str(&CONTENT_TYPE_KEYS),
        size_bytes,
    })
}

/// `GET /attachments/patient/:id` — all attachments of a patient,
/// normalised record by record.
pub async fn list_patient_attachments(
    http: &Http,
    patient_id: &str,
) -> Result<Vec<Attachment>, ApiError> {
    let raw: Vec<Value> = http
        .execute(http.request(Method::GET, &format!("/attachments/patient/{patient_id}")))
        .await?;
    raw.iter().map(attachment_from_value).collect()
}

/// `GET /attachments/:id` — one attachment's metadata.
pub async fn fetch_attachment(http: &Http, attachment_id: &str) -> Result<Attachment, ApiError> {
    let raw: Value = http
        .execute(http.request(Method::GET, &format!("/attachments/{attachment_id}")))
        .await?;
    attachment_from_value(&raw)
}

/// `POST /attachments` — uploads a single file for a patient.
pub async fn upload_attachment(
    http: &Http,
    patient_id: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<Attachment, ApiError> {
    let part = Part::bytes(bytes).file_name(filename.to_owned());
    let form = Form::new()
        .text("patientId", patient_id.to_owned())
        .part("file", part);
    let raw: Value = http
        .execute(http.request(Method::POST, "/attachments").multipart(form))
        .await?;
    attachment_from_value(&raw)
}

/// `DELETE /attachments/:id` — removes an attachment.
pub async fn delete_attachment(http: &Http, attachment_id: &str) -> Result<(), ApiError> {
    http.execute_empty(http.request(Method::DELETE, &format!("/attachments/{attachment_id}")))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalises_the_props_envelope_shape() {
        let raw = json!({
            "props": { "fileName": "x.pdf", "file_url": "http://files.example.test/x.pdf" }
        });
        let attachment = attachment_from_value(&raw).expect("normalise");
        assert_eq!(attachment.filename, "x.pdf");
        assert_eq!(attachment.url, "http://files.example.test/x.pdf");
        assert!(attachment.id.is_none());
    }

    #[test]
    fn normalises_the_flat_modern_shape() {
        let raw = json!({
            "id": "att-9",
            "filename": "exam.png",
            "url": "http://files.example.test/exam.png",
            "contentType": "image/png",
            "size": 2048,
        });
        let attachment = attachment_from_value(&raw).expect("normalise");
        assert_eq!(attachment.id.as_deref(), Some("att-9"));
        assert_eq!(attachment.filename, "exam.png");
        assert_eq!(attachment.content_type.as_deref(), Some("image/png"));
        assert_eq!(attachment.size_bytes, Some(2048));
    }

    #[test]
    fn filename_candidates_are_tried_in_priority_order() {
        let raw = json!({
            "filename": "canonical.pdf",
            "title": "legacy title",
            "url": "http://files.example.test/f.pdf",
        });
        let attachment = attachment_from_value(&raw).expect("normalise");
        assert_eq!(attachment.filename, "canonical.pdf");
    }

    #[test]
    fn title_is_accepted_as_the_last_filename_resort() {
        let raw = json!({
            "title": "scan of referral",
            "fileUrl": "http://files.example.test/r.pdf",
        });
        let attachment = attachment_from_value(&raw).expect("normalise");
        assert_eq!(attachment.filename, "scan of referral");
    }

    #[test]
    fn id_outside_the_props_envelope_is_found() {
        let raw = json!({
            "_id": "att-12",
            "props": { "filename": "x.pdf", "url": "http://files.example.test/x.pdf" }
        });
        let attachment = attachment_from_value(&raw).expect("normalise");
        assert_eq!(attachment.id.as_deref(), Some("att-12"));
    }

    #[test]
    fn unknown_shape_fails_loudly_with_the_keys_present() {
        let raw = json!({ "document": "x.pdf", "href": "http://files.example.test/x.pdf" });
        let err = attachment_from_value(&raw).expect_err("should reject unknown shape");
        match err {
            ApiError::MalformedAttachment { keys } => {
                assert!(keys.contains(&"document".to_owned()));
                assert!(keys.contains(&"href".to_owned()));
            }
            other => panic!("expected MalformedAttachment, got {other}"),
        }
    }

    #[test]
    fn non_object_record_is_malformed() {
        let err = attachment_from_value(&json!("x.pdf")).expect_err("should reject");
        assert!(matches!(err, ApiError::MalformedAttachment { .. }));
    }
}

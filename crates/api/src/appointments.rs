//! Appointment scheduling: listing by date range, booking and status
//! transitions.

use crate::error::ApiError;
use crate::http::Http;
use crate::paging::Page;
use chrono::{DateTime, NaiveDate, Utc};
use psiclin_types::Pagination;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Lifecycle of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// An appointment as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub psychologist_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload for `POST /appointments`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Listing parameters for `GET /appointments`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentsQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl AppointmentsQuery {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.pagination.to_query();
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_string()));
        }
        pairs
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: AppointmentStatus,
}

/// `GET /appointments` — one page of appointments in a date range.
pub async fn list_appointments(
    http: &Http,
    query: &AppointmentsQuery,
) -> Result<Page<Appointment>, ApiError> {
    http.execute(list_appointments_request(http, query)).await
}

/// `POST /appointments` — books an appointment.
pub async fn create_appointment(
    http: &Http,
    request: &NewAppointment,
) -> Result<Appointment, ApiError> {
    http.execute(http.request(Method::POST, "/appointments").json(request))
        .await
}

/// `PATCH /appointments/:id/status` — confirms, cancels or completes an
/// appointment.
pub async fn set_appointment_status(
    http: &Http,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<Appointment, ApiError> {
    http.execute(
        http.request(
            Method::PATCH,
            &format!("/appointments/{appointment_id}/status"),
        )
        .json(&StatusBody { status }),
    )
    .await
}

fn list_appointments_request(http: &Http, query: &AppointmentsQuery) -> reqwest::RequestBuilder {
    http.request(Method::GET, "/appointments")
        .query(&query.to_query())
}

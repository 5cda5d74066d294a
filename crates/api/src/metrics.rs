//! Read-only aggregation endpoints backing the admin dashboards.
//!
//! The backend pre-aggregates every series; the client never computes
//! chart data itself.

use crate::error::ApiError;
use crate::http::Http;
use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// One bucket of the patient age distribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgeBucket {
    /// Human-readable bucket label, e.g. `"25-34"`.
    pub range: String,
    pub count: u64,
}

/// One day of the appointments-over-time series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentPoint {
    pub date: NaiveDate,
    pub total: u64,
}

/// One month of the new-patients series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatientsPoint {
    /// Month label in `YYYY-MM` form.
    pub month: String,
    pub count: u64,
}

/// `GET /admin/metrics/age` — patient age distribution.
pub async fn age_distribution(http: &Http) -> Result<Vec<AgeBucket>, ApiError> {
    http.execute(http.request(Method::GET, "/admin/metrics/age"))
        .await
}

/// `GET /admin/metrics/appointments` — appointment counts per day over a
/// date range.
pub async fn appointment_series(
    http: &Http,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AppointmentPoint>, ApiError> {
    http.execute(
        http.request(Method::GET, "/admin/metrics/appointments")
            .query(&[("from", from.to_string()), ("to", to.to_string())]),
    )
    .await
}

/// `GET /patients/stats/new` — new patients per month.
pub async fn new_patients_series(http: &Http) -> Result<Vec<NewPatientsPoint>, ApiError> {
    http.execute(http.request(Method::GET, "/patients/stats/new"))
        .await
}

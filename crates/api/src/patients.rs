//! Patient records: listing, registration and merge-patch updates.
//!
//! Identifier-like fields go over the wire as bare digit strings — the
//! [`Cpf`] and [`PhoneNumber`] types enforce that at construction, so a
//! formatted `123.456.789-09` typed by a receptionist is transmitted as
//! `12345678909`. Birth dates travel as `YYYY-MM-DD`.

use crate::error::ApiError;
use crate::http::Http;
use crate::paging::Page;
use chrono::{DateTime, NaiveDate, Utc};
use psiclin_types::{Cpf, Pagination, PhoneNumber};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// A patient record as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cpf: Option<Cpf>,
    #[serde(default)]
    pub phone_number: Option<PhoneNumber>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /patient`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatient {
    pub name: String,
    pub email: String,
    pub cpf: Cpf,
    pub phone_number: PhoneNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

/// Merge-patch payload for `PUT /patients/:id`.
///
/// Absent fields are omitted from the body entirely — absence means
/// "do not change", never "clear".
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<Cpf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<PhoneNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

/// Listing parameters for `GET /patients`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatientsQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PatientsQuery {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.pagination.to_query();
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        pairs
    }
}

/// `GET /patients` — one page of patients, optionally filtered by name.
pub async fn list_patients(http: &Http, query: &PatientsQuery) -> Result<Page<Patient>, ApiError> {
    http.execute(list_patients_request(http, query)).await
}

/// `POST /patient` — registers a patient.
pub async fn register_patient(
    http: &Http,
    request: &RegisterPatient,
) -> Result<Patient, ApiError> {
    http.execute(register_patient_request(http, request)).await
}

/// `PUT /patients/:id` — merge-patch update of a patient.
pub async fn update_patient(
    http: &Http,
    patient_id: &str,
    request: &UpdatePatient,
) -> Result<Patient, ApiError> {
    http.execute(update_patient_request(http, patient_id, request))
        .await
}

fn list_patients_request(http: &Http, query: &PatientsQuery) -> reqwest::RequestBuilder {
    http.request(Method::GET, "/patients").query(&query.to_query())
}

fn register_patient_request(http: &Http, request: &RegisterPatient) -> reqwest::RequestBuilder {
    http.request(Method::POST, "/patient").json(request)
}

fn update_patient_request(
    http: &Http,
    patient_id: &str,
    request: &UpdatePatient,
) -> reqwest::RequestBuilder {
    http.request(Method::PUT, &format!("/patients/{patient_id}"))
        .json(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NoAuth;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn http() -> Http {
        Http::new("https://api.example.test", Arc::new(NoAuth)).expect("adapter")
    }

    fn body_json(request: reqwest::Request) -> Value {
        let bytes = request
            .body()
            .and_then(|body| body.as_bytes())
            .expect("buffered body");
        serde_json::from_slice(bytes).expect("json body")
    }

    #[test]
    fn registration_transmits_normalised_fields() {
        let request = RegisterPatient {
            name: "Ana Souza".into(),
            email: "ana@example.test".into(),
            cpf: Cpf::new("123.456.789-09").expect("cpf"),
            phone_number: PhoneNumber::new("(11) 98888-7777").expect("phone"),
            date_of_birth: Some(NaiveDate::from_ymd_opt(1990, 1, 1).expect("date")),
        };

        let built = register_patient_request(&http(), &request)
            .build()
            .expect("build");
        assert_eq!(built.method(), Method::POST);
        assert_eq!(built.url().path(), "/patient");

        let body = body_json(built);
        assert_eq!(
            body,
            json!({
                "name": "Ana Souza",
                "email": "ana@example.test",
                "cpf": "12345678909",
                "phoneNumber": "11988887777",
                "dateOfBirth": "1990-01-01",
            })
        );
    }

    #[test]
    fn registration_omits_an_absent_birth_date() {
        let request = RegisterPatient {
            name: "Ana Souza".into(),
            email: "ana@example.test".into(),
            cpf: Cpf::new("12345678909").expect("cpf"),
            phone_number: PhoneNumber::new("11988887777").expect("phone"),
            date_of_birth: None,
        };

        let body = body_json(
            register_patient_request(&http(), &request)
                .build()
                .expect("build"),
        );
        assert!(body.get("dateOfBirth").is_none());
    }

    #[test]
    fn update_drops_unset_fields_entirely() {
        let request = UpdatePatient {
            email: Some("new@example.test".into()),
            ..UpdatePatient::default()
        };

        let built = update_patient_request(&http(), "p-42", &request)
            .build()
            .expect("build");
        assert_eq!(built.method(), Method::PUT);
        assert_eq!(built.url().path(), "/patients/p-42");

        let body = body_json(built);
        assert_eq!(body, json!({ "email": "new@example.test" }));
    }

    #[test]
    fn listing_applies_pagination_defaults() {
        let built = list_patients_request(&http(), &PatientsQuery::default())
            .build()
            .expect("build");
        assert_eq!(
            built.url().query(),
            Some("page=0&pageSize=10&order=desc")
        );
    }

    #[test]
    fn listing_includes_the_name_filter_when_present() {
        let query = PatientsQuery {
            pagination: Pagination::page(2),
            name: Some("ana".into()),
        };
        let built = list_patients_request(&http(), &query)
            .build()
            .expect("build");
        assert_eq!(
            built.url().query(),
            Some("page=2&pageSize=10&order=desc&name=ana")
        );
    }

    #[test]
    fn patient_response_deserialises() {
        let patient: Patient = serde_json::from_value(json!({
            "id": "p-1",
            "name": "Ana Souza",
            "cpf": "12345678909",
            "phoneNumber": "11988887777",
            "dateOfBirth": "1990-01-01",
            "createdAt": "2026-02-10T14:00:00Z",
        }))
        .expect("deserialise");
        assert_eq!(patient.cpf.expect("cpf").formatted(), "123.456.789-09");
    }
}

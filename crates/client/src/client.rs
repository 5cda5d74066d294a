//! The `PracticeClient` façade: reads through the cache, mutations
//! confirm-then-invalidate, session state in the durable store.

use crate::error::{resource_error, ClientError};
use crate::resources::{self, affected_resources, freshness_for, Domain};
use chrono::{DateTime, NaiveDate, Utc};
use psiclin_api as api;
use psiclin_api::appointments::{
    Appointment, AppointmentStatus, AppointmentsQuery, NewAppointment,
};
use psiclin_api::approvals::Approval;
use psiclin_api::attachments::Attachment;
use psiclin_api::auth::Credentials;
use psiclin_api::invites::{Invite, InviteValidation};
use psiclin_api::metrics::{AgeBucket, AppointmentPoint, NewPatientsPoint};
use psiclin_api::patients::{Patient, PatientsQuery, RegisterPatient, UpdatePatient};
use psiclin_api::popups::{NewPopup, Popup};
use psiclin_api::profile::{Profile, UpdateProfile};
use psiclin_api::suggestions::{NewSuggestion, Suggestion, SuggestionStatus};
use psiclin_api::{Http, Page, TokenSource};
use psiclin_cache::{CacheError, ResourceCache, ResourceKey};
use psiclin_store::{LocalStore, AUTH_TOKEN_SLOT, PENDING_INVITE_SLOT};
use psiclin_types::{NonEmptyText, Pagination};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration resolved once at startup and passed in; nothing in the
/// request path reads environment variables.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Optional artificial delay before every request (development
    /// throttle; off by default).
    pub request_delay: Option<Duration>,
}

/// An invite created but not yet handed out. Persisted so the flow
/// survives a restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingInvite {
    pub hash: String,
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Reads the session token from the durable store, per request.
struct StoreTokens {
    store: LocalStore,
}

impl TokenSource for StoreTokens {
    fn bearer_token(&self) -> Option<String> {
        match self.store.get::<String>(AUTH_TOKEN_SLOT) {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "could not read session token");
                None
            }
        }
    }
}

/// Parameter shapes used only for cache-key identity.
#[derive(Serialize)]
struct PatientScope<'a> {
    patient_id: &'a str,
}

#[derive(Serialize)]
struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

/// The practice client: every page of the product reads and mutates
/// through this object.
pub struct PracticeClient {
    http: Http,
    cache: ResourceCache,
    store: LocalStore,
}

impl PracticeClient {
    /// Builds a client over `store`, which doubles as the token source.
    pub fn new(config: &ClientConfig, store: LocalStore) -> Result<Self, ClientError> {
        let tokens = Arc::new(StoreTokens {
            store: store.clone(),
        });
        let mut http = Http::new(&config.base_url, tokens)?;
        if let Some(delay) = config.request_delay {
            http = http.with_request_delay(delay);
        }
        Ok(Self {
            http,
            cache: ResourceCache::new(),
            store,
        })
    }

    /// The resource cache, for subscriptions, state snapshots and GC.
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// The durable store backing the session and invite slots.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// The URL at which an attachment's content can be fetched or
    /// embedded.
    pub fn attachment_url(&self, attachment_id: &str) -> String {
        self.http.attachment_url(attachment_id)
    }

    /// Marks every resource affected by a mutation in `domain` stale.
    pub fn invalidate(&self, domain: Domain) {
        for name in affected_resources(domain) {
            self.cache.invalidate(name);
        }
    }

    fn key<P: Serialize>(name: &str, params: &P) -> Result<ResourceKey, ClientError> {
        ResourceKey::with_params(name, params)
            .map_err(CacheError::from)
            .map_err(ClientError::from)
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// `POST /auth/login`; on success the token is persisted and every
    /// subsequent request carries it.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let session = api::auth::login(
            &self.http,
            &Credentials {
                email: email.to_owned(),
                password: password.to_owned(),
            },
        )
        .await?;
        self.store.set(AUTH_TOKEN_SLOT, &session.token)?;
        debug!("session established");
        Ok(())
    }

    /// Clears both persisted slots and drops every cached resource.
    pub fn sign_out(&self) -> Result<(), ClientError> {
        self.store.clear(AUTH_TOKEN_SLOT)?;
        self.store.clear(PENDING_INVITE_SLOT)?;
        self.cache.clear();
        debug!("session cleared");
        Ok(())
    }

    /// Whether a session token is currently persisted.
    pub fn is_signed_in(&self) -> Result<bool, ClientError> {
        Ok(self.store.get::<String>(AUTH_TOKEN_SLOT)?.is_some())
    }

    // ------------------------------------------------------------------
    // Cached reads
    // ------------------------------------------------------------------

    pub async fn patients(&self, query: PatientsQuery) -> Result<Arc<Page<Patient>>, ClientError> {
        let key = Self::key(resources::PATIENTS, &query)?;
        let page = self
            .cache
            .fetch(&key, freshness_for(resources::PATIENTS), || async {
                api::patients::list_patients(&self.http, &query)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(page)
    }

    pub async fn appointments(
        &self,
        query: AppointmentsQuery,
    ) -> Result<Arc<Page<Appointment>>, ClientError> {
        let key = Self::key(resources::APPOINTMENTS, &query)?;
        let page = self
            .cache
            .fetch(&key, freshness_for(resources::APPOINTMENTS), || async {
                api::appointments::list_appointments(&self.http, &query)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(page)
    }

    pub async fn profile(&self) -> Result<Arc<Profile>, ClientError> {
        let key = ResourceKey::new(resources::PROFILE);
        let profile = self
            .cache
            .fetch(&key, freshness_for(resources::PROFILE), || async {
                api::profile::fetch_profile(&self.http)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(profile)
    }

    pub async fn suggestions(
        &self,
        pagination: Pagination,
    ) -> Result<Arc<Page<Suggestion>>, ClientError> {
        let key = Self::key(resources::SUGGESTIONS, &pagination)?;
        let page = self
            .cache
            .fetch(&key, freshness_for(resources::SUGGESTIONS), || async {
                api::suggestions::list_suggestions(&self.http, pagination)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(page)
    }

    pub async fn popups(&self) -> Result<Arc<Vec<Popup>>, ClientError> {
        let key = ResourceKey::new(resources::POPUPS);
        let popups = self
            .cache
            .fetch(&key, freshness_for(resources::POPUPS), || async {
                api::popups::list_popups(&self.http)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(popups)
    }

    pub async fn patient_attachments(
        &self,
        patient_id: &str,
    ) -> Result<Arc<Vec<Attachment>>, ClientError> {
        let key = Self::key(resources::ATTACHMENTS, &PatientScope { patient_id })?;
        let attachments = self
            .cache
            .fetch(&key, freshness_for(resources::ATTACHMENTS), || async {
                api::attachments::list_patient_attachments(&self.http, patient_id)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(attachments)
    }

    pub async fn pending_approvals(&self) -> Result<Arc<Vec<Approval>>, ClientError> {
        let key = ResourceKey::new(resources::APPROVALS);
        let approvals = self
            .cache
            .fetch(&key, freshness_for(resources::APPROVALS), || async {
                api::approvals::list_approvals(&self.http)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(approvals)
    }

    pub async fn age_metrics(&self) -> Result<Arc<Vec<AgeBucket>>, ClientError> {
        let key = ResourceKey::new(resources::AGE_METRICS);
        let buckets = self
            .cache
            .fetch(&key, freshness_for(resources::AGE_METRICS), || async {
                api::metrics::age_distribution(&self.http)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(buckets)
    }

    pub async fn appointment_metrics(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Arc<Vec<AppointmentPoint>>, ClientError> {
        let key = Self::key(resources::APPOINTMENT_METRICS, &DateRange { from, to })?;
        let series = self
            .cache
            .fetch(
                &key,
                freshness_for(resources::APPOINTMENT_METRICS),
                || async {
                    api::metrics::appointment_series(&self.http, from, to)
                        .await
                        .map_err(resource_error)
                },
            )
            .await?;
        Ok(series)
    }

    pub async fn new_patient_stats(&self) -> Result<Arc<Vec<NewPatientsPoint>>, ClientError> {
        let key = ResourceKey::new(resources::PATIENT_STATS);
        let series = self
            .cache
            .fetch(&key, freshness_for(resources::PATIENT_STATS), || async {
                api::metrics::new_patients_series(&self.http)
                    .await
                    .map_err(resource_error)
            })
            .await?;
        Ok(series)
    }

    // ------------------------------------------------------------------
    // Mutations (confirm, then invalidate)
    // ------------------------------------------------------------------

    pub async fn register_patient(&self, request: RegisterPatient) -> Result<Patient, ClientError> {
        let created = api::patients::register_patient(&self.http, &request).await?;
        self.invalidate(Domain::Patients);
        Ok(created)
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatient,
    ) -> Result<Patient, ClientError> {
        let updated = api::patients::update_patient(&self.http, patient_id, &request).await?;
        self.invalidate(Domain::Patients);
        Ok(updated)
    }

    pub async fn create_appointment(
        &self,
        request: NewAppointment,
    ) -> Result<Appointment, ClientError> {
        let created = api::appointments::create_appointment(&self.http, &request).await?;
        self.invalidate(Domain::Appointments);
        Ok(created)
    }

    pub async fn set_appointment_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, ClientError> {
        let updated =
            api::appointments::set_appointment_status(&self.http, appointment_id, status).await?;
        self.invalidate(Domain::Appointments);
        Ok(updated)
    }

    pub async fn update_profile(&self, request: UpdateProfile) -> Result<Profile, ClientError> {
        let updated = api::profile::update_profile(&self.http, &request).await?;
        self.invalidate(Domain::Profile);
        Ok(updated)
    }

    pub async fn submit_suggestion(
        &self,
        content: NonEmptyText,
    ) -> Result<Suggestion, ClientError> {
        let created =
            api::suggestions::submit_suggestion(&self.http, &NewSuggestion { content }).await?;
        self.invalidate(Domain::Suggestions);
        Ok(created)
    }

    pub async fn set_suggestion_status(
        &self,
        suggestion_id: &str,
        status: SuggestionStatus,
    ) -> Result<Suggestion, ClientError> {
        let updated =
            api::suggestions::set_suggestion_status(&self.http, suggestion_id, status).await?;
        self.invalidate(Domain::Suggestions);
        Ok(updated)
    }

    pub async fn create_popup(&self, request: NewPopup) -> Result<Popup, ClientError> {
        let created = api::popups::create_popup(&self.http, &request).await?;
        self.invalidate(Domain::Popups);
        Ok(created)
    }

    pub async fn delete_popup(&self, popup_id: &str) -> Result<(), ClientError> {
        api::popups::delete_popup(&self.http, popup_id).await?;
        self.invalidate(Domain::Popups);
        Ok(())
    }

    pub async fn upload_attachment(
        &self,
        patient_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Attachment, ClientError> {
        let uploaded =
            api::attachments::upload_attachment(&self.http, patient_id, filename, bytes).await?;
        self.invalidate(Domain::Attachments);
        Ok(uploaded)
    }

    pub async fn delete_attachment(&self, attachment_id: &str) -> Result<(), ClientError> {
        api::attachments::delete_attachment(&self.http, attachment_id).await?;
        self.invalidate(Domain::Attachments);
        Ok(())
    }

    pub async fn approve_registration(&self, approval_id: &str) -> Result<(), ClientError> {
        api::approvals::approve(&self.http, approval_id).await?;
        self.invalidate(Domain::Approvals);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Invites
    // ------------------------------------------------------------------

    /// Creates an invite and persists it as the pending invite, so an
    /// interrupted hand-out survives a restart.
    pub async fn create_invite(&self) -> Result<Invite, ClientError> {
        let invite = api::invites::create_invite(&self.http).await?;
        self.store.set(
            PENDING_INVITE_SLOT,
            &PendingInvite {
                hash: invite.hash.clone(),
                url: invite.url.clone(),
                created_at: invite.created_at,
            },
        )?;
        Ok(invite)
    }

    /// The invite currently awaiting hand-out, if any.
    pub fn pending_invite(&self) -> Result<Option<PendingInvite>, ClientError> {
        Ok(self.store.get(PENDING_INVITE_SLOT)?)
    }

    pub fn clear_pending_invite(&self) -> Result<(), ClientError> {
        Ok(self.store.clear(PENDING_INVITE_SLOT)?)
    }

    pub async fn validate_invite(&self, hash: &str) -> Result<InviteValidation, ClientError> {
        Ok(api::invites::validate_invite(&self.http, hash).await?)
    }
}

//! Resource names, per-resource freshness policies and the
//! domain → invalidation mapping.
//!
//! Invalidation is deliberately coarse: a successful mutation marks
//! every entry of the affected resource names stale, regardless of
//! pagination or filters. Under-invalidating shows users stale counts;
//! over-invalidating only costs a refetch.

use psiclin_cache::Freshness;
use std::time::Duration;

pub const PATIENTS: &str = "patients";
pub const PATIENT_STATS: &str = "patient-stats";
pub const APPOINTMENTS: &str = "appointments";
pub const APPOINTMENT_METRICS: &str = "appointment-metrics";
pub const AGE_METRICS: &str = "age-metrics";
pub const PROFILE: &str = "profile";
pub const SUGGESTIONS: &str = "suggestions";
pub const POPUPS: &str = "popups";
pub const ATTACHMENTS: &str = "attachments";
pub const APPROVALS: &str = "approvals";

/// The recurring freshness window for listings and dashboard series.
pub const FIVE_MINUTES: Duration = Duration::from_secs(300);

/// The freshness policy applied when reading a resource.
pub fn freshness_for(name: &str) -> Freshness {
    match name {
        // The user's own profile only changes through this client, so an
        // explicit invalidation is the only thing that can stale it.
        PROFILE => Freshness::SessionLong,
        // The approval queue is fed by other people signing up; show it
        // live on every visit.
        APPROVALS => Freshness::AlwaysRevalidate,
        _ => Freshness::FreshFor(FIVE_MINUTES),
    }
}

/// Mutation domains, the unit at which invalidation is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Patients,
    Appointments,
    Suggestions,
    Popups,
    Attachments,
    Approvals,
    Profile,
}

/// Every resource name whose cached entries a mutation in `domain`
/// renders stale.
pub fn affected_resources(domain: Domain) -> &'static [&'static str] {
    match domain {
        // Patient mutations move the dashboard aggregates too.
        Domain::Patients => &[PATIENTS, PATIENT_STATS, AGE_METRICS],
        Domain::Appointments => &[APPOINTMENTS, APPOINTMENT_METRICS],
        Domain::Suggestions => &[SUGGESTIONS],
        Domain::Popups => &[POPUPS],
        Domain::Attachments => &[ATTACHMENTS],
        Domain::Approvals => &[APPROVALS],
        Domain::Profile => &[PROFILE],
    }
}

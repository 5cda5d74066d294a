//! # Psiclin Client
//!
//! The practice client façade. Wires the three lower layers together:
//!
//! - `psiclin-api` endpoint wrappers over the configured HTTP adapter,
//!   with the local store as the per-request token source
//! - `psiclin-cache` as the resource cache coordinator, with one
//!   freshness policy per resource name
//! - `psiclin-store` for the two durable slots (session token, pending
//!   invite)
//!
//! Mutations here are strictly confirm-then-invalidate: the cache is
//! touched only after the endpoint wrapper resolved successfully, and
//! then coarsely, by resource name, across all parameter combinations.

pub mod client;
pub mod error;
pub mod resources;

pub use client::{ClientConfig, PendingInvite, PracticeClient};
pub use error::ClientError;
pub use resources::Domain;

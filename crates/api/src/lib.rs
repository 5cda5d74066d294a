//! # Psiclin API
//!
//! Typed wrappers for the psiclin backend's REST endpoints.
//!
//! Contains:
//! - The configured HTTP adapter ([`Http`]) that attaches the bearer token
//!   from a [`TokenSource`] to every outgoing request
//! - One async function per REST operation, `(typed request) ->
//!   Result<typed response, ApiError>`
//! - The wrapper conventions applied consistently across endpoints:
//!   dates serialise to ISO-8601, identifier-like text is digit-stripped,
//!   partial updates omit absent fields, pagination defaults apply when
//!   the caller is silent
//!
//! Wrappers never retry and never swallow errors; a failed call
//! propagates as an [`ApiError`] and the caller decides what the user
//! sees. Cache policy lives in `psiclin-cache`, not here.

pub mod appointments;
pub mod approvals;
pub mod attachments;
pub mod auth;
pub mod error;
pub mod http;
pub mod invites;
pub mod metrics;
pub mod paging;
pub mod patients;
pub mod popups;
pub mod profile;
pub mod suggestions;

pub use error::ApiError;
pub use http::{Http, NoAuth, TokenSource};
pub use paging::Page;

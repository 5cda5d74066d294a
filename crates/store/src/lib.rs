//! # Psiclin Store
//!
//! Durable, typed key-value slots for client state that must outlive a
//! process restart and is not itself a server resource: the session token
//! and an invite the user has not finished handing out.
//!
//! This store is deliberately distinct from the remote-resource cache in
//! `psiclin-cache`. The two have different lifetime rules: cache entries are
//! ephemeral projections of server data and may be discarded at any time,
//! while store slots hold client-owned state and are cleared only
//! explicitly (clearing a slot removes its file, not just an in-memory
//! copy).

pub mod store;

pub use store::{LocalStore, StoreError, AUTH_TOKEN_SLOT, PENDING_INVITE_SLOT};

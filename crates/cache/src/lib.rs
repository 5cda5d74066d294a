//! # Psiclin Cache
//!
//! The remote-resource cache coordinator. Every page of the client reads
//! server data through this layer: a view names a *resource* (a resource
//! name plus a parameter set), and the coordinator fetches, deduplicates
//! and invalidates it.
//!
//! # Purpose
//!
//! One coordinator instance is shared by every consumer in the process.
//! It guarantees:
//!
//! - **Key identity**: a resource key is the resource name plus a
//!   canonicalised parameter set, so two callers building the same
//!   parameters in different field order share one entry
//! - **Deduplication**: concurrent reads of one key share a single
//!   network call
//! - **Ordering**: a slow, superseded request can never overwrite newer
//!   data; results are applied only while their request sequence is still
//!   the latest issued for the key
//! - **Coarse invalidation**: after a mutation, every entry of the
//!   affected resource name is marked stale regardless of parameters
//!
//! # Design notes
//!
//! The coordinator is an explicit, injectable object — not a process
//! global — so tests instantiate isolated instances. It is cheap to clone
//! and shares its entry map internally. Components never touch entries
//! directly; `fetch`, `state`, `invalidate` and `subscribe` are the whole
//! surface.

pub mod coordinator;
pub mod key;
pub mod state;

pub use coordinator::{CacheError, ResourceCache, Subscription};
pub use key::ResourceKey;
pub use state::{ErrorKind, Freshness, ResourceError, ResourceState};

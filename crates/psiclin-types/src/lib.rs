//! # Psiclin Types
//!
//! Validated scalar types shared across the psiclin client crates.
//!
//! Contains:
//! - [`NonEmptyText`], a trimmed, guaranteed non-empty string wrapper
//! - Digit-normalised identifier types ([`Cpf`], [`PhoneNumber`]) that strip
//!   formatting on construction and re-apply it for display
//! - [`Pagination`] and [`SortOrder`] with the client-wide listing defaults
//!
//! **No transport concerns**: HTTP, caching and persistence belong in the
//! `psiclin-api`, `psiclin-cache` and `psiclin-store` crates.

pub mod digits;
pub mod pagination;
pub mod text;

pub use digits::{Cpf, DigitsError, PhoneNumber};
pub use pagination::{Pagination, SortOrder, DEFAULT_PAGE_SIZE};
pub use text::{NonEmptyText, TextError};

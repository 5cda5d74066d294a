//! Slot-per-file local store implementation.
//!
//! Each slot is one JSON file under the store's root directory. Writes go
//! through a temporary file followed by a rename, so a crash mid-write can
//! never leave a half-written slot behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Slot holding the bearer token for the current session.
pub const AUTH_TOKEN_SLOT: &str = "auth-token";

/// Slot holding an invite the user created but has not yet handed out.
pub const PENDING_INVITE_SLOT: &str = "pending-invite";

/// Errors that can occur during local store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store root is invalid or could not be created
    #[error("invalid store directory: {0}")]
    InvalidRoot(String),
    /// A slot name contains characters unsafe for a filename
    #[error("invalid slot name: {0}")]
    InvalidSlot(String),
    /// Reading a slot file failed
    #[error("failed to read slot `{slot}`: {source}")]
    SlotRead {
        slot: String,
        #[source]
        source: std::io::Error,
    },
    /// Writing a slot file failed
    #[error("failed to write slot `{slot}`: {source}")]
    SlotWrite {
        slot: String,
        #[source]
        source: std::io::Error,
    },
    /// Removing a slot file failed
    #[error("failed to clear slot `{slot}`: {source}")]
    SlotClear {
        slot: String,
        #[source]
        source: std::io::Error,
    },
    /// A slot file exists but does not contain valid JSON for the
    /// requested type. Surfaced loudly rather than treated as an
    /// empty slot, since it indicates local data corruption.
    #[error("slot `{slot}` is corrupt: {source}")]
    Corrupt {
        slot: String,
        #[source]
        source: serde_json::Error,
    },
    /// Serialising a value for storage failed
    #[error("failed to serialise value for slot `{slot}`: {source}")]
    Serialization {
        slot: String,
        #[source]
        source: serde_json::Error,
    },
    /// No user configuration directory could be resolved for the
    /// default store location
    #[error("no user configuration directory available")]
    NoConfigDir,
}

/// Durable key-value store, one JSON file per slot.
///
/// # Design
///
/// - Directory-scoped: each instance is bound to one root directory, so
///   tests can run against isolated temporary stores
/// - Explicit lifetime: a slot exists until [`LocalStore::clear`] removes
///   its file; there is no expiry
/// - Atomic replace: `set` writes a sibling temp file and renames it over
///   the slot file
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRoot` if the path exists but is not a
    /// directory, or if it cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if root.exists() {
            if !root.is_dir() {
                return Err(StoreError::InvalidRoot(format!(
                    "path is not a directory: {}",
                    root.display()
                )));
            }
        } else {
            fs::create_dir_all(&root).map_err(|e| {
                StoreError::InvalidRoot(format!("cannot create {}: {}", root.display(), e))
            })?;
        }
        Ok(Self { root })
    }

    /// Opens the store at its default location under the user's
    /// configuration directory (`<config>/psiclin`).
    pub fn open_default() -> Result<Self, StoreError> {
        let base = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Self::open(base.join("psiclin"))
    }

    /// Reads the value stored in `slot`, or `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// A present-but-unparseable slot file surfaces as
    /// `StoreError::Corrupt`, never as a silent `None`.
    pub fn get<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<T>, StoreError> {
        let path = self.slot_path(slot)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::SlotRead {
                    slot: slot.to_owned(),
                    source: e,
                })
            }
        };
        let value = serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            slot: slot.to_owned(),
            source: e,
        })?;
        Ok(Some(value))
    }

    /// Writes `value` into `slot`, replacing any previous content.
    pub fn set<T: Serialize>(&self, slot: &str, value: &T) -> Result<(), StoreError> {
        let path = self.slot_path(slot)?;
        let json =
            serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialization {
                slot: slot.to_owned(),
                source: e,
            })?;

        // Temp-write-then-rename keeps the slot file whole under crashes.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::SlotWrite {
            slot: slot.to_owned(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::SlotWrite {
            slot: slot.to_owned(),
            source: e,
        })
    }

    /// Clears `slot` by removing its file. Clearing an already empty slot
    /// is not an error.
    pub fn clear(&self, slot: &str) -> Result<(), StoreError> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::SlotClear {
                slot: slot.to_owned(),
                source: e,
            }),
        }
    }

    /// Returns the store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the file backing `slot`, rejecting names that could
    /// escape the root directory.
    fn slot_path(&self, slot: &str) -> Result<PathBuf, StoreError> {
        let ok = !slot.is_empty()
            && slot
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));
        if !ok {
            return Err(StoreError::InvalidSlot(slot.to_owned()));
        }
        Ok(self.root.join(format!("{slot}.json")))
    }
}

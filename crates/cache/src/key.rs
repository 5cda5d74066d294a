//! Resource key identity.
//!
//! A key is a resource name plus a parameter set. Identity must be stable
//! under re-serialisation: the same parameters supplied in a different
//! field order are the same key. Parameters are therefore canonicalised
//! into a JSON form with recursively sorted object keys before being used
//! for equality and hashing.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identity under which cached remote data is filed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    name: String,
    params: String,
}

impl ResourceKey {
    /// A key with no parameters (singleton resources such as a profile).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: String::new(),
        }
    }

    /// A key for `name` parameterised by `params`.
    ///
    /// `params` is serialised and canonicalised; field order in the
    /// source struct or map never affects identity.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if `params` cannot be serialised.
    pub fn with_params<P: Serialize>(
        name: impl Into<String>,
        params: &P,
    ) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(params)?;
        let canonical = canonicalise(value);
        Ok(Self {
            name: name.into(),
            params: canonical.to_string(),
        })
    }

    /// The resource name, the unit of coarse invalidation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical parameter form, for diagnostics.
    pub fn params(&self) -> &str {
        &self.params
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}?{}", self.name, self.params)
        }
    }
}

/// Recursively sorts object keys so that serialisation order cannot leak
/// into key identity.
fn canonicalise(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalise(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalise).collect()),
        other => other,
    }
}

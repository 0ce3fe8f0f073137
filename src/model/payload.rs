//! Raw request payloads.
//!
//! Clients send either a form body or a JSON object. Both are flattened
//! into one mapping of field name to string so validation sees a single
//! shape. JSON `null` counts as absent; booleans and numbers are rendered
//! as strings; nested arrays and objects are dropped.

use crate::error::{Result, TrackerError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field name to candidate value, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPayload {
    fields: BTreeMap<String, String>,
}

impl RawPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs. A later duplicate key wins.
    #[must_use]
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn from_form(body: &[u8]) -> Self {
        Self::from_pairs(
            url::form_urlencoded::parse(body).map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Decode a JSON body. The top level must be an object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if the body is not JSON or not an object.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(body).map_err(|err| TrackerError::InvalidPayload {
                reason: err.to_string(),
            })?;
        let Value::Object(map) = value else {
            return Err(TrackerError::InvalidPayload {
                reason: "expected a JSON object".to_string(),
            });
        };

        let mut fields = BTreeMap::new();
        for (key, value) in map {
            let rendered = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => continue,
                Value::Array(_) | Value::Object(_) => {
                    tracing::debug!(field = %key, "Dropping nested payload value");
                    continue;
                }
            };
            fields.insert(key, rendered);
        }
        Ok(Self { fields })
    }

    /// Raw value for `key`, empty strings included.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value for `key` if present and not the empty string.
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

//! Browser storage-state payloads.
//!
//! A storage state is a JSON object with array fields `cookies` and
//! `origins`. Validation is a shape check only; individual cookies are not
//! inspected beyond their `domain`.

use crate::error::{Result, VaultError};
use serde::Serialize;
use serde_json::Value;
use zeroize::Zeroizing;

/// Summary extracted from a payload for the metadata bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadSummary {
    /// Number of entries in `cookies`
    pub cookie_count: usize,
    /// Number of entries in `origins`
    pub origin_count: usize,
    /// Distinct cookie domains, leading dots stripped, first-seen order
    pub domains: Vec<String>,
}

/// A storage-state payload that passed the shape check.
#[derive(Clone, PartialEq)]
pub struct StorageState(Value);

impl std::fmt::Debug for StorageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.summary();
        f.debug_struct("StorageState")
            .field("cookies", &summary.cookie_count)
            .field("origins", &summary.origin_count)
            .finish()
    }
}

impl StorageState {
    /// Validate a parsed JSON value.
    ///
    /// # Errors
    /// Returns `VaultError::InvalidPayloadShape` describing the first problem.
    pub fn from_value(value: Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(VaultError::InvalidPayloadShape(
                "payload must be a JSON object".to_string(),
            ));
        };

        for field in ["cookies", "origins"] {
            match object.get(field) {
                Some(Value::Array(_)) => {}
                Some(_) => {
                    return Err(VaultError::InvalidPayloadShape(format!(
                        "field '{field}' must be an array"
                    )))
                }
                None => {
                    return Err(VaultError::InvalidPayloadShape(format!(
                        "missing field '{field}'"
                    )))
                }
            }
        }

        Ok(Self(value))
    }

    /// Parse and validate raw JSON bytes.
    ///
    /// # Errors
    /// Returns `VaultError::InvalidPayloadShape` if the bytes are not JSON or
    /// fail the shape check.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::InvalidPayloadShape(format!("payload is not JSON: {e}")))?;
        Self::from_value(value)
    }

    fn array(&self, field: &str) -> &[Value] {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Counts and cookie domains.
    #[must_use]
    pub fn summary(&self) -> PayloadSummary {
        let mut domains: Vec<String> = Vec::new();
        for cookie in self.array("cookies") {
            let Some(domain) = cookie.get("domain").and_then(Value::as_str) else {
                continue;
            };
            let domain = domain.trim_start_matches('.');
            if !domain.is_empty() && !domains.iter().any(|d| d == domain) {
                domains.push(domain.to_string());
            }
        }

        PayloadSummary {
            cookie_count: self.array("cookies").len(),
            origin_count: self.array("origins").len(),
            domains,
        }
    }

    /// Cookie entries.
    #[must_use]
    pub fn cookies(&self) -> &[Value] {
        self.array("cookies")
    }

    /// Borrow the JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serialize for sealing. The buffer is zeroized when dropped.
    ///
    /// # Errors
    /// Returns `VaultError::Encryption` if serialization fails.
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec(&self.0)
            .map(Zeroizing::new)
            .map_err(|e| VaultError::Encryption(format!("serialization failed: {e}")))
    }
}

//! Error types for the assignment core.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field-level validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Failures of the session bag or of the list encoding inside it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored list could not be encoded or decoded.
    #[error("Corrupt attachment list: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The backing session storage failed.
    #[error("Session storage error: {0}")]
    Backend(String),
}

/// Errors surfaced by [`AssignmentService`](super::AssignmentService).
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// Rejected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The file could not be written; no metadata was recorded.
    #[error("Error saving file '{file_name}': {source}")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

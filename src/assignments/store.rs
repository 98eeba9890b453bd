//! Per-session persistence of the attachment list.
//!
//! [`SessionValues`] is the string key/value bag that the session layer
//! provides. [`AssignmentStore`] is the typed view the service works with.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StoreError;
use super::model::Attachment;

/// Fixed key under which the serialized list lives in the session bag.
pub const ASSIGNMENTS_KEY: &str = "assignments";

/// Session-scoped string storage.
#[async_trait]
pub trait SessionValues: Send + Sync + std::fmt::Debug {
    async fn get_value(
        &self,
        session_id: &str,
        key: &str,
    ) -> Result<Option<String>, StoreError>;
    async fn set_value(
        &self,
        session_id: &str,
        key: &str,
        value: String,
    ) -> Result<(), StoreError>;
}

/// In-process session bag. Contents do not survive a restart.
#[derive(Debug, Default)]
pub struct InMemorySessionValues {
    values: DashMap<String, HashMap<String, String>>,
}

impl InMemorySessionValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionValues for InMemorySessionValues {
    async fn get_value(
        &self,
        session_id: &str,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .values
            .get(session_id)
            .and_then(|bag| bag.get(key).cloned()))
    }

    async fn set_value(
        &self,
        session_id: &str,
        key: &str,
        value: String,
    ) -> Result<(), StoreError> {
        self.values
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Typed access to a session's attachment list.
#[async_trait]
pub trait AssignmentStore: Send + Sync + std::fmt::Debug {
    /// `None` when the session has never stored a list.
    async fn get(&self, session_id: &str) -> Result<Option<Vec<Attachment>>, StoreError>;
    async fn set(&self, session_id: &str, attachments: &[Attachment]) -> Result<(), StoreError>;
}

/// [`AssignmentStore`] that keeps the list as JSON in a [`SessionValues`] bag.
#[derive(Debug, Clone)]
pub struct SessionAssignmentStore {
    values: Arc<dyn SessionValues>,
}

impl SessionAssignmentStore {
    pub fn new(values: Arc<dyn SessionValues>) -> Self {
        Self { values }
    }
}

#[async_trait]
impl AssignmentStore for SessionAssignmentStore {
    async fn get(&self, session_id: &str) -> Result<Option<Vec<Attachment>>, StoreError> {
        let Some(raw) = self.values.get_value(session_id, ASSIGNMENTS_KEY).await? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn set(&self, session_id: &str, attachments: &[Attachment]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(attachments)?;
        self.values.set_value(session_id, ASSIGNMENTS_KEY, raw).await
    }
}

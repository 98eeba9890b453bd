//! Attachment records and registry entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for one uploaded file within a session.
///
/// Serialized with camelCase keys (`id`, `name`, `filePath`) because that is
/// the shape clients and the session bag both expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Globally unique, never reused.
    pub id: Uuid,
    /// Description supplied by the client.
    pub name: String,
    /// `<namespace>/<sessionId>/<fileName>`, relative to the storage root.
    pub file_path: String,
}

impl Attachment {
    /// Create an attachment with a fresh v4 id.
    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            file_path: file_path.into(),
        }
    }
}

/// A registry value: the session's attachment list plus its deadline.
///
/// Entries are replaced wholesale on every touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub attachments: Vec<Attachment>,
    pub expires_at: DateTime<Utc>,
}

impl SessionEntry {
    /// An entry is expired once its deadline is reached (inclusive).
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_attachment_serializes_camel_case() {
        let attachment = Attachment::new("Homework", "AssignmentImages/s1/hw.png");
        let json = serde_json::to_value(&attachment).unwrap();

        assert_eq!(json["name"], "Homework");
        assert_eq!(json["filePath"], "AssignmentImages/s1/hw.png");
        assert!(json.get("file_path").is_none());
    }

    #[test]
    fn test_attachment_ids_are_unique() {
        let a = Attachment::new("a", "x/a");
        let b = Attachment::new("a", "x/a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let now = Utc::now();
        let entry = SessionEntry {
            attachments: Vec::new(),
            expires_at: now,
        };

        assert!(entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now - TimeDelta::milliseconds(1)));
    }
}

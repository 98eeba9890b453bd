//! Lazy eviction of expired sessions.
//!
//! Runs only when the aggregate read is requested; there is no timer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::model::{Attachment, SessionEntry};
use super::registry::SessionRegistry;
use super::vault::FileVault;

/// Result of one eviction pass.
#[derive(Debug, Default)]
pub struct Sweep {
    /// Attachments of every session still alive, each session in its own
    /// insertion order. No ordering across sessions.
    pub attachments: Vec<Attachment>,
    /// Sessions removed by this pass.
    pub evicted: Vec<String>,
}

/// Removes expired registry entries together with their directories.
#[derive(Debug, Clone)]
pub struct Evictor {
    registry: Arc<SessionRegistry>,
    vault: FileVault,
}

impl Evictor {
    pub fn new(registry: Arc<SessionRegistry>, vault: FileVault) -> Self {
        Self { registry, vault }
    }

    /// Scan a snapshot, evict what has expired and collect the rest.
    ///
    /// Directory cleanup is best-effort and never stops the scan.
    pub async fn sweep(&self) -> Sweep {
        let now = self.registry.now();
        self.sweep_snapshot(self.registry.snapshot(), now).await
    }

    async fn sweep_snapshot(
        &self,
        snapshot: Vec<(String, SessionEntry)>,
        now: DateTime<Utc>,
    ) -> Sweep {
        let mut sweep = Sweep::default();

        for (session_id, entry) in snapshot {
            if !entry.is_expired_at(now) {
                sweep.attachments.extend(entry.attachments);
                continue;
            }

            // Refreshed since the snapshot: report what it holds now.
            if self.registry.remove_expired(&session_id, now).is_none() {
                if let Some(current) = self.registry.get(&session_id) {
                    sweep.attachments.extend(current.attachments);
                }
                continue;
            }

            self.vault.delete_directory(&session_id).await;
            tracing::info!(
                name: "session.evicted",
                session_id = %session_id,
                attachments = entry.attachments.len(),
                "Evicted expired session"
            );
            sweep.evicted.push(session_id);
        }

        sweep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::clock::{Clock, manual::ManualClock};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        evictor: Evictor,
        registry: Arc<SessionRegistry>,
        vault: FileVault,
        clock: Arc<ManualClock>,
        _tmp: TempDir,
    }

    fn fixture(ttl_secs: u64) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new());
        let registry = Arc::new(SessionRegistry::with_clock(
            Duration::from_secs(ttl_secs),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let vault = FileVault::new(tmp.path(), "AssignmentImages");
        Fixture {
            evictor: Evictor::new(Arc::clone(&registry), vault.clone()),
            registry,
            vault,
            clock,
            _tmp: tmp,
        }
    }

    async fn seed(f: &Fixture, session_id: &str, name: &str) -> Attachment {
        let path = f.vault.save(session_id, name, b"data").await.unwrap();
        let attachment = Attachment::new(name, path);
        let mut list = f
            .registry
            .get(session_id)
            .map(|e| e.attachments)
            .unwrap_or_default();
        list.push(attachment.clone());
        f.registry.upsert(session_id, list);
        attachment
    }

    #[tokio::test]
    async fn test_live_sessions_are_aggregated() {
        let f = fixture(10);
        let a = seed(&f, "s1", "a.png").await;
        let b = seed(&f, "s2", "b.png").await;

        let sweep = f.evictor.sweep().await;

        assert!(sweep.evicted.is_empty());
        assert_eq!(sweep.attachments.len(), 2);
        assert!(sweep.attachments.contains(&a));
        assert!(sweep.attachments.contains(&b));
    }

    #[tokio::test]
    async fn test_per_session_order_is_kept() {
        let f = fixture(10);
        let first = seed(&f, "s1", "1.png").await;
        let second = seed(&f, "s1", "2.png").await;

        let sweep = f.evictor.sweep().await;

        assert_eq!(sweep.attachments, vec![first, second]);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_removed_with_directory() {
        let f = fixture(2);
        seed(&f, "old", "a.png").await;
        f.clock.advance_secs(1);
        let fresh = seed(&f, "new", "b.png").await;
        f.clock.advance_secs(1);

        let sweep = f.evictor.sweep().await;

        assert_eq!(sweep.evicted, vec!["old".to_string()]);
        assert_eq!(sweep.attachments, vec![fresh]);
        assert!(f.registry.get("old").is_none());
        assert!(!f.vault.session_dir("old").exists());
        assert!(f.vault.session_dir("new").exists());
    }

    #[tokio::test]
    async fn test_empty_sessions_are_only_removed_when_expired() {
        let f = fixture(2);
        f.registry.upsert("empty", Vec::new());

        let sweep = f.evictor.sweep().await;
        assert!(sweep.evicted.is_empty());
        assert!(f.registry.get("empty").is_some());

        f.clock.advance_secs(2);
        let sweep = f.evictor.sweep().await;
        assert_eq!(sweep.evicted, vec!["empty".to_string()]);
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn test_session_refreshed_after_snapshot_is_aggregated() {
        let f = fixture(2);
        let first = seed(&f, "s1", "a.png").await;
        f.clock.advance_secs(3);
        let now = f.registry.now();
        let stale = f.registry.snapshot();

        let second = seed(&f, "s1", "b.png").await;
        let sweep = f.evictor.sweep_snapshot(stale, now).await;

        assert!(sweep.evicted.is_empty());
        assert_eq!(sweep.attachments, vec![first, second]);
        assert!(f.registry.get("s1").is_some());
        assert!(f.vault.session_dir("s1").exists());
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_stop_the_scan() {
        let f = fixture(1);
        // ".." is not a usable directory name, so its cleanup fails.
        f.registry.upsert("..", Vec::new());
        seed(&f, "s1", "a.png").await;
        f.clock.advance_secs(1);

        let sweep = f.evictor.sweep().await;

        assert_eq!(sweep.evicted.len(), 2);
        assert!(f.registry.is_empty());
        assert!(!f.vault.session_dir("s1").exists());
    }
}

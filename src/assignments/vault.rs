//! On-disk storage for uploaded files, one directory per session.
//!
//! Layout: `<root>/<namespace>/<sessionId>/<fileName>`. The directory is a
//! pure function of the session id, so cleanup never needs more than the id.

use std::io;
use std::path::{Path, PathBuf};

/// Per-session file storage rooted at `<root>/<namespace>`.
#[derive(Debug, Clone)]
pub struct FileVault {
    root: PathBuf,
    namespace: String,
}

impl FileVault {
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Directory holding every session directory; this is what the static
    /// file server exposes under `/<namespace>`.
    #[must_use]
    pub fn public_dir(&self) -> PathBuf {
        self.root.join(&self.namespace)
    }

    #[must_use]
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.public_dir().join(session_id)
    }

    /// Relative path recorded on an attachment. Always `/`-separated so it
    /// can be used as a URL path as-is.
    #[must_use]
    pub fn relative_path(&self, session_id: &str, file_name: &str) -> String {
        format!("{}/{session_id}/{file_name}", self.namespace)
    }

    /// Write `bytes` into the session's directory, creating it if needed.
    ///
    /// Returns the relative path of the stored file. An existing file with
    /// the same name is overwritten.
    pub async fn save(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> io::Result<String> {
        ensure_segment(session_id)?;
        let file_name = sanitize_file_name(file_name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unusable file name: {file_name:?}"),
            )
        })?;

        let dir = self.session_dir(session_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        tracing::debug!(
            session_id = %session_id,
            file = %file_name,
            size = bytes.len(),
            "Saved session file"
        );

        Ok(self.relative_path(session_id, &file_name))
    }

    /// Recursively delete the session's directory.
    ///
    /// Never fails: a missing directory is fine, anything else is logged so
    /// that eviction of other sessions carries on.
    pub async fn delete_directory(&self, session_id: &str) {
        if let Err(e) = ensure_segment(session_id) {
            tracing::warn!(
                name: "session.cleanup_failed",
                session_id = %session_id,
                error = %e,
                "Refusing to delete session directory"
            );
            return;
        }

        let dir = self.session_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(session_id = %session_id, "Deleted session directory");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    name: "session.cleanup_failed",
                    session_id = %session_id,
                    path = %dir.display(),
                    error = %e,
                    "Failed to delete session directory"
                );
            }
        }
    }

    /// Remove one previously saved file. Best-effort, like
    /// [`Self::delete_directory`].
    pub async fn remove_file(&self, session_id: &str, file_name: &str) {
        let Some(file_name) = sanitize_file_name(file_name) else {
            return;
        };
        if ensure_segment(session_id).is_err() {
            return;
        }

        let path = self.session_dir(session_id).join(&file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(
                    session_id = %session_id,
                    file = %file_name,
                    "Removed session file"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    path = %path.display(),
                    error = %e,
                    "Failed to remove session file"
                );
            }
        }
    }
}

/// Reduce a client-supplied name to its final path component.
///
/// Handles both `/` and `\` separators since browsers on some platforms send
/// full paths. Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

fn ensure_segment(session_id: &str) -> io::Result<()> {
    let valid = !session_id.is_empty()
        && session_id != "."
        && session_id != ".."
        && !session_id.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("session id is not a single path segment: {session_id:?}"),
        ))
    }
}

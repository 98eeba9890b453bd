//! Orchestration of validation, file storage and both metadata layers.

use std::sync::Arc;

use super::error::{AssignmentError, ValidationErrors};
use super::evictor::{Evictor, Sweep};
use super::model::Attachment;
use super::registry::SessionRegistry;
use super::store::AssignmentStore;
use super::vault::FileVault;

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Entry point for the add / get / get-all operations.
///
/// Every read or write of a session goes through [`Self::load_and_touch`],
/// which refreshes the session's TTL in the registry. The session store and
/// the registry are updated together on every write.
#[derive(Debug, Clone)]
pub struct AssignmentService {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn AssignmentStore>,
    vault: FileVault,
    evictor: Evictor,
}

impl AssignmentService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn AssignmentStore>,
        vault: FileVault,
    ) -> Self {
        let evictor = Evictor::new(Arc::clone(&registry), vault.clone());
        Self {
            registry,
            store,
            vault,
            evictor,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn vault(&self) -> &FileVault {
        &self.vault
    }

    /// Store `file` for the session and append an attachment for it.
    ///
    /// Validation happens before anything is written. If the file cannot be
    /// saved, no metadata is recorded. If the session store fails after the
    /// file was saved, the file is removed again (the whole directory when
    /// the session is not registered).
    ///
    /// Two concurrent calls for the same session may both read the same
    /// prior list; the later write then drops the other's attachment.
    ///
    /// An already registered session is refreshed before the file is written,
    /// so an aggregate read cannot evict it mid-upload. An eviction that
    /// removed the entry just before that refresh can still delete the
    /// directory after the save, leaving an attachment without its file.
    pub async fn add_attachment(
        &self,
        session_id: &str,
        description: &str,
        file: Option<UploadedFile>,
    ) -> Result<Attachment, AssignmentError> {
        let file = validate(description, file)?;

        self.registry.touch(session_id);

        let file_path = self
            .vault
            .save(session_id, &file.name, &file.bytes)
            .await
            .map_err(|source| AssignmentError::Io {
                file_name: file.name.clone(),
                source,
            })?;

        match self.record(session_id, description, file_path).await {
            Ok(attachment) => Ok(attachment),
            Err(err) => {
                self.discard_unreferenced(session_id, &file.name).await;
                Err(err)
            }
        }
    }

    /// The session's attachments in insertion order (empty if none yet).
    ///
    /// Starts or refreshes the session's TTL even when nothing is stored.
    pub async fn get_attachments(
        &self,
        session_id: &str,
    ) -> Result<Vec<Attachment>, AssignmentError> {
        self.load_and_touch(session_id).await
    }

    /// Attachments of every live session, after evicting expired ones.
    pub async fn get_all_attachments(&self) -> Vec<Attachment> {
        self.sweep().await.attachments
    }

    /// Same as [`Self::get_all_attachments`] but also reports what was evicted.
    pub async fn sweep(&self) -> Sweep {
        let sweep = self.evictor.sweep().await;
        tracing::debug!(
            live = sweep.attachments.len(),
            evicted = sweep.evicted.len(),
            sessions = self.registry.len(),
            "Aggregate read completed"
        );
        sweep
    }

    /// Append an attachment for an already saved file to both metadata layers.
    async fn record(
        &self,
        session_id: &str,
        description: &str,
        file_path: String,
    ) -> Result<Attachment, AssignmentError> {
        let mut attachments = self.load_and_touch(session_id).await?;
        let attachment = Attachment::new(description, file_path);
        attachments.push(attachment.clone());

        self.store.set(session_id, &attachments).await?;
        let count = attachments.len();
        self.registry.upsert(session_id, attachments);

        tracing::info!(
            name: "assignment.added",
            session_id = %session_id,
            attachment_id = %attachment.id,
            file = %attachment.file_path,
            attachments = count,
            "Assignment added"
        );

        Ok(attachment)
    }

    /// Undo a save whose metadata could not be recorded.
    ///
    /// A file that a registered attachment already points to (same name,
    /// overwritten) is left alone.
    async fn discard_unreferenced(&self, session_id: &str, file_name: &str) {
        let Some(entry) = self.registry.get(session_id) else {
            self.vault.delete_directory(session_id).await;
            return;
        };

        let file_path = super::vault::sanitize_file_name(file_name)
            .map(|name| self.vault.relative_path(session_id, &name));
        let referenced = entry
            .attachments
            .iter()
            .any(|a| Some(&a.file_path) == file_path.as_ref());
        if !referenced {
            self.vault.remove_file(session_id, file_name).await;
        }
    }

    /// Read the stored list and refresh the registry entry with it.
    async fn load_and_touch(
        &self,
        session_id: &str,
    ) -> Result<Vec<Attachment>, AssignmentError> {
        let attachments = self.store.get(session_id).await?.unwrap_or_default();
        self.registry.upsert(session_id, attachments.clone());
        Ok(attachments)
    }
}

fn validate(
    description: &str,
    file: Option<UploadedFile>,
) -> Result<UploadedFile, AssignmentError> {
    let mut errors = ValidationErrors::new();

    if description.trim().is_empty() {
        errors.add("description", "Assignment description must not be empty");
    }
    if file.is_none() {
        errors.add("file", "File must not be empty");
    }

    match file {
        Some(file) if errors.is_empty() => Ok(file),
        _ => Err(AssignmentError::Validation(errors)),
    }
}

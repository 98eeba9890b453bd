//! Session-scoped assignment attachments.
//!
//! Clients upload files with a description; each upload becomes an
//! [`Attachment`] tied to the uploading session. Sessions live in a
//! [`SessionRegistry`] with a sliding TTL and own a directory managed by the
//! [`FileVault`]. Expired sessions are only cleaned up when the aggregate
//! read runs.
//!
//! # Architecture
//!
//! - [`FileVault`]: per-session files on disk
//! - [`AssignmentStore`]: typed view of the session bag
//! - [`SessionRegistry`]: concurrent map with expiry deadlines
//! - [`Evictor`]: removes expired entries and their directories
//! - [`AssignmentService`]: ties the pieces together
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use session_assignments::assignments::{
//!     AssignmentService, FileVault, InMemorySessionValues, SessionAssignmentStore,
//!     SessionRegistry,
//! };
//!
//! let registry = Arc::new(SessionRegistry::new(Duration::from_secs(60)));
//! let store = Arc::new(SessionAssignmentStore::new(Arc::new(InMemorySessionValues::new())));
//! let vault = FileVault::new("data", "AssignmentImages");
//! let service = AssignmentService::new(registry, store, vault);
//!
//! assert!(service.registry().is_empty());
//! ```

pub mod clock;
mod error;
mod evictor;
mod model;
mod registry;
mod service;
mod store;
mod vault;

pub use clock::{Clock, SystemClock};
pub use error::{AssignmentError, StoreError, ValidationErrors};
pub use evictor::{Evictor, Sweep};
pub use model::{Attachment, SessionEntry};
pub use registry::SessionRegistry;
pub use service::{AssignmentService, UploadedFile};
pub use store::{
    ASSIGNMENTS_KEY, AssignmentStore, InMemorySessionValues, SessionAssignmentStore,
    SessionValues,
};
pub use vault::{FileVault, sanitize_file_name};

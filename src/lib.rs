//! Session-scoped assignment attachments service
//!
//! Ephemeral browser sessions upload described files ("assignments") and read
//! back either their own uploads or everything uploaded by sessions that are
//! still alive.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server with cookie-based session identity
//! - **Registry**: concurrent in-memory session map with sliding TTL
//! - **Vault**: one directory per session on disk, served statically
//! - **Eviction**: lazy, triggered by the aggregate read
//!
//! # Modules
//!
//! - [`assignments`]: core model, registry, vault, store, evictor and service
//! - [`api`]: HTTP handlers and error responses
//! - [`session`]: session cookie middleware and extractor
//! - [`config`]: layered configuration
//! - [`server`]: router assembly and server lifecycle

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod assignments;
pub mod config;
pub mod security;
pub mod server;
pub mod session;

use crate::assignments::AssignmentService;
use crate::config::AppConfig;
use crate::security::rate_limit::AppRateLimiter;

use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Assignment operations over the shared session registry.
    pub assignments: Arc<AssignmentService>,
    /// Global Rate Limiter
    pub rate_limiter: Arc<AppRateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

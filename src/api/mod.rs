//! HTTP handlers.
//!
//! - [`assignments`]: the `/api/assignment` routes

pub mod assignments;
mod error;

pub use error::ApiError;

//! Session identity for HTTP clients.
//!
//! Each browser gets an opaque id in a cookie. The [`session_middleware`]
//! issues one when missing and makes it available to handlers through the
//! [`SessionId`] extractor.
//!
//! # Architecture
//!
//! - [`session_middleware`]: reads or issues the session cookie
//! - [`SessionId`]: extractor for the current request's session

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::AppState;

/// The current request's session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionId>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session middleware not installed",
        ))
    }
}

/// Attach a session id to every request, issuing a cookie for new clients.
///
/// Only UUIDs are accepted from the cookie. Anything else is replaced, which
/// keeps the id safe to use as a directory name.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.config.session.cookie_name.clone();

    let existing = jar
        .get(&cookie_name)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let (id, issued) = match existing {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    };
    let session_id = id.to_string();

    if issued {
        tracing::debug!(session_id = %session_id, "Issued new session");
    }

    request.extensions_mut().insert(SessionId(session_id.clone()));
    let response = next.run(request).await;

    if !issued {
        return response;
    }

    let cookie = Cookie::build((cookie_name, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), response).into_response()
}

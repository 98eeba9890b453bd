//! `/api/assignment` routes.
//!
//! GET  /getAssignments    - current session's attachments
//! GET  /getAllAssignments - every live session's attachments (evicts expired)
//! POST /setAssignment     - multipart `description` + `file`

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::AppState;
use crate::api::ApiError;
use crate::assignments::{Attachment, UploadedFile};
use crate::session::SessionId;

/// Build the assignment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/getAssignments", get(get_assignments))
        .route("/getAllAssignments", get(get_all_assignments))
        .route("/setAssignment", post(set_assignment))
}

async fn get_assignments(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<Vec<Attachment>>, ApiError> {
    let attachments = state.assignments.get_attachments(session.as_str()).await?;
    Ok(Json(attachments))
}

async fn get_all_assignments(State(state): State<AppState>) -> Json<Vec<Attachment>> {
    Json(state.assignments.get_all_attachments().await)
}

async fn set_assignment(
    State(state): State<AppState>,
    session: SessionId,
    multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let form = AssignmentForm::read(multipart).await?;

    tracing::info!(
        session_id = %session,
        has_file = form.file.is_some(),
        "Received assignment upload"
    );

    state
        .assignments
        .add_attachment(session.as_str(), &form.description, form.file)
        .await?;
    Ok(StatusCode::OK)
}

/// Parsed `setAssignment` form. Field names match case-insensitively.
#[derive(Debug, Default)]
struct AssignmentForm {
    description: String,
    file: Option<UploadedFile>,
}

impl AssignmentForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_ascii_lowercase);
            match name.as_deref() {
                Some("description") => {
                    form.description = field.text().await?;
                }
                Some("file") => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;

                    // An untouched file input still submits an empty part.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }

                    let file_name = if file_name.is_empty() {
                        format!("file_{}", uuid::Uuid::new_v4())
                    } else {
                        file_name
                    };
                    form.file = Some(UploadedFile {
                        name: file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                _ => {
                    tracing::debug!(field = ?name, "Ignoring unknown form field");
                }
            }
        }

        Ok(form)
    }
}

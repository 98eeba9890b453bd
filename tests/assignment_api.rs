//! HTTP-level tests for the `/api/assignment` routes.
//!
//! Each test gets its own storage root and registry; distinct clients are
//! simulated by carrying distinct session cookies.

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;
use session_assignments::assignments::Attachment;
use session_assignments::config::{
    AppConfig, ResilienceConfig, ServerConfig, SessionConfig, StorageConfig,
};
use session_assignments::server::{build_router, build_state};
use std::sync::Arc;
use tempfile::TempDir;

const COOKIE: &str = "assignment_session";

// =============================================================================
// Test Utilities
// =============================================================================

fn test_config(root: &TempDir, ttl_seconds: u32) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        session: SessionConfig {
            ttl_seconds,
            cookie_name: COOKIE.to_string(),
        },
        storage: StorageConfig {
            root: root.path().to_path_buf(),
            namespace: "AssignmentImages".to_string(),
        },
        resilience: ResilienceConfig {
            rate_limit_enabled: false,
            requests_per_second: 1,
            burst_size: 1,
            timeout_disabled: false,
            request_timeout_seconds: 30,
            max_upload_bytes: 1024 * 1024,
        },
    }
}

fn setup(ttl_seconds: u32) -> (TestServer, TempDir) {
    let root = TempDir::new().expect("Failed to create temp dir");
    let state = build_state(Arc::new(test_config(&root, ttl_seconds)));
    let server = TestServer::new(build_router(state)).expect("Failed to create test server");
    (server, root)
}

fn upload(description: &str, file_name: &str, bytes: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .add_text("description", description.to_string())
        .add_part(
            "file",
            Part::bytes(bytes.to_vec())
                .file_name(file_name.to_string())
                .mime_type("image/png"),
        )
}

/// Open a session and return the cookie that identifies it.
async fn new_client(server: &TestServer) -> axum_test::TestResponse {
    let response = server.get("/api/assignment/getAssignments").await;
    response.assert_status_ok();
    response
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_new_session_gets_cookie_and_empty_list() {
    let (server, _root) = setup(60);

    let response = new_client(&server).await;

    let cookie = response.cookie(COOKIE);
    assert!(uuid::Uuid::parse_str(cookie.value()).is_ok());
    assert_eq!(response.json::<Vec<Attachment>>(), Vec::<Attachment>::new());
}

#[tokio::test]
async fn test_upload_round_trip() {
    let (server, root) = setup(60);
    let cookie = new_client(&server).await.cookie(COOKIE);
    let session_id = cookie.value().to_string();

    server
        .post("/api/assignment/setAssignment")
        .add_cookie(cookie.clone())
        .multipart(upload("desc", "cat.png", b"meow"))
        .await
        .assert_status_ok();

    let list: Vec<Value> = server
        .get("/api/assignment/getAssignments")
        .add_cookie(cookie)
        .await
        .json();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "desc");
    assert_eq!(
        list[0]["filePath"],
        format!("AssignmentImages/{session_id}/cat.png")
    );
    assert!(list[0]["id"].is_string());

    let on_disk = root
        .path()
        .join("AssignmentImages")
        .join(&session_id)
        .join("cat.png");
    assert_eq!(std::fs::read(on_disk).unwrap(), b"meow");
}

#[tokio::test]
async fn test_file_path_is_served_statically() {
    let (server, _root) = setup(60);
    let cookie = new_client(&server).await.cookie(COOKIE);

    server
        .post("/api/assignment/setAssignment")
        .add_cookie(cookie.clone())
        .multipart(upload("pic", "pic.png", b"\x89PNG-bytes"))
        .await
        .assert_status_ok();

    let list: Vec<Attachment> = server
        .get("/api/assignment/getAssignments")
        .add_cookie(cookie)
        .await
        .json();

    let response = server.get(&format!("/{}", list[0].file_path)).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"\x89PNG-bytes");
}

#[tokio::test]
async fn test_validation_errors_are_field_level() {
    let (server, root) = setup(60);
    let cookie = new_client(&server).await.cookie(COOKIE);
    let session_id = cookie.value().to_string();

    let response = server
        .post("/api/assignment/setAssignment")
        .add_cookie(cookie.clone())
        .multipart(MultipartForm::new().add_text("description", "  "))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["description"].is_string());
    assert!(body["fields"]["file"].is_string());

    assert!(!root.path().join("AssignmentImages").join(&session_id).exists());
    let list: Vec<Attachment> = server
        .get("/api/assignment/getAssignments")
        .add_cookie(cookie)
        .await
        .json();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_unusable_file_name_is_io_error() {
    let (server, _root) = setup(60);
    let cookie = new_client(&server).await.cookie(COOKIE);

    let response = server
        .post("/api/assignment/setAssignment")
        .add_cookie(cookie)
        .multipart(upload("desc", "..", b"x"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "IO_ERROR");
    assert!(body.get("fields").is_none());
}

#[tokio::test]
async fn test_aggregate_spans_sessions() {
    let (server, _root) = setup(60);
    let alice = new_client(&server).await.cookie(COOKIE);
    let bob = new_client(&server).await.cookie(COOKIE);
    assert_ne!(alice.value(), bob.value());

    server
        .post("/api/assignment/setAssignment")
        .add_cookie(alice.clone())
        .multipart(upload("from alice", "a.png", b"a"))
        .await
        .assert_status_ok();
    server
        .post("/api/assignment/setAssignment")
        .add_cookie(bob.clone())
        .multipart(upload("from bob", "b.png", b"b"))
        .await
        .assert_status_ok();

    let own: Vec<Attachment> = server
        .get("/api/assignment/getAssignments")
        .add_cookie(alice)
        .await
        .json();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].name, "from alice");

    let all: Vec<Attachment> = server.get("/api/assignment/getAllAssignments").await.json();
    let mut names: Vec<_> = all.iter().map(|a| a.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["from alice", "from bob"]);
}

#[tokio::test]
async fn test_expired_session_is_evicted_on_aggregate_read() {
    let (server, root) = setup(1);
    let cookie = new_client(&server).await.cookie(COOKIE);
    let session_id = cookie.value().to_string();

    server
        .post("/api/assignment/setAssignment")
        .add_cookie(cookie)
        .multipart(upload("A", "f1.png", b"1"))
        .await
        .assert_status_ok();

    let all: Vec<Attachment> = server.get("/api/assignment/getAllAssignments").await.json();
    assert_eq!(all.len(), 1);

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    let all: Vec<Attachment> = server.get("/api/assignment/getAllAssignments").await.json();
    assert!(all.is_empty());
    assert!(!root.path().join("AssignmentImages").join(session_id).exists());
}

#[tokio::test]
async fn test_health() {
    let (server, _root) = setup(60);
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("ok");
}

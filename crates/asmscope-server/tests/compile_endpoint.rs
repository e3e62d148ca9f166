//! Integration tests for the HTTP routes.

#![cfg(unix)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use asmscope_core::{CompilerBinary, Pipeline, PipelineConfig};
use asmscope_server::{AppState, CompileResponse, create_router};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tempfile::TempDir;
use tower::ServiceExt;

const COMPILER: &str = r##"#!/bin/sh
base="${1%.*}"
if grep -q FAIL "$1"; then echo "syntax error" >&2; exit 1; fi
{ echo "# MARK line 1"; cat "$1"; } > "$base.s"
"##;

const ASSEMBLER: &str = r##"#!/bin/sh
{ echo '#!/bin/sh'; sed -n 's/^RUN //p' "$1"; } > "$3"
chmod 755 "$3"
"##;

/// Write an executable script from a child process.
fn write_script(path: &Path, body: &str) {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg("cat > \"$0\" && chmod 755 \"$0\"")
        .arg(path)
        .stdin(Stdio::piped())
        .spawn()
        .expect("Failed to spawn sh");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(body.as_bytes())
        .expect("Failed to write script");
    assert!(child.wait().expect("Failed to wait").success());
}

fn app(temp: &TempDir) -> axum::Router {
    let compiler = temp.path().join("compiler.out");
    let assembler = temp.path().join("fake-gcc");
    write_script(&compiler, COMPILER);
    write_script(&assembler, ASSEMBLER);

    let mut config = PipelineConfig::new(temp.path().join("work"));
    config.assembler = assembler.to_string_lossy().into_owned();
    let pipeline = Pipeline::new(config, CompilerBinary::prebuilt(compiler).unwrap()).unwrap();
    create_router(Arc::new(AppState { pipeline }))
}

async fn post_compile(app: axum::Router, code: &str) -> (StatusCode, CompileResponse) {
    let body = serde_json::json!({ "code": code }).to_string();
    let response = app
        .oneshot(
            Request::post("/compile")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_compile_success() {
    let temp = TempDir::new().unwrap();
    let (status, response) = post_compile(app(&temp), "RUN echo 42").await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.success, "logs: {}", response.logs);
    assert_eq!(response.output, "42\n");
    assert_eq!(response.asm.as_deref(), Some("# MARK line 1\nRUN echo 42"));
    assert_eq!(
        response.asm_by_line.unwrap()[&1],
        vec!["RUN echo 42".to_string()]
    );
    assert!(response.stack.is_empty());
}

#[tokio::test]
async fn test_compile_failure_is_still_200() {
    let temp = TempDir::new().unwrap();
    let (status, response) = post_compile(app(&temp), "FAIL").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!response.success);
    assert_eq!(response.output, "");
    assert!(response.logs.contains("no assembly produced"));
    assert!(response.logs.contains("compiler stderr: syntax error"));
    assert!(response.asm_by_line.is_none());
}

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let response = app(&temp)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let temp = TempDir::new().unwrap();
    let response = app(&temp)
        .oneshot(
            Request::post("/compile")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"source\": 1}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

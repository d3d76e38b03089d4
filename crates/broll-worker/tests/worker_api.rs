//! Worker API integration tests.
//!
//! These exercise the router end to end with a shell script standing in
//! for the Blender binary, so the full submit -> render -> payload path
//! runs without the real renderer.

use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tempfile::TempDir;
use tower::ServiceExt;

use broll_blender::BlenderInvoker;
use broll_worker::download::download_client;
use broll_worker::{create_router, AppState, RenderHandler, TemplateRegistry, WorkerConfig};

const FAKE_RENDERER: &str = r#"#!/bin/sh
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "--output" ]; then out="$a"; fi
  prev="$a"
done
printf 'MP4-BYTES' > "$out"
"#;

fn test_app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let work_dir = dir.path().join("work");
    std::fs::create_dir_all(&work_dir).unwrap();

    let scene = dir.path().join("scene.blend");
    std::fs::write(&scene, b"blend").unwrap();

    let program = dir.path().join("fake_blender");
    std::fs::write(&program, FAKE_RENDERER).unwrap();
    let mut perms = std::fs::metadata(&program).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&program, perms).unwrap();

    let registry = TemplateRegistry::new(
        [("ai_cpu_activation".to_string(), scene)],
        "ai_cpu_activation",
    );
    let invoker = BlenderInvoker::new(dir.path().join("render_blend.py"))
        .with_program(program.to_string_lossy())
        .with_xvfb(false)
        .with_timeout(Duration::from_secs(30));
    let handler = RenderHandler::new(
        registry,
        invoker,
        download_client(Duration::from_secs(5)).unwrap(),
        &work_dir,
    );

    let state = AppState::with_handler(WorkerConfig::default(), handler);
    (dir, create_router(state, None))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_status_unknown_job_is_404() {
    let (_dir, app) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/status/no-such-job")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint_absent_when_disabled() {
    let (_dir, app) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_runsync_completes_with_decodable_artifact() {
    let (_dir, app) = test_app();

    let response = app
        .oneshot(post_json(
            "/runsync",
            serde_json::json!({
                "input": {
                    "template": "ai_cpu_activation",
                    "resolution": [1920, 1080],
                    "samples": 128,
                    "fps": 24
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "COMPLETED");

    let output = &body["output"];
    assert_eq!(output["template"], "ai_cpu_activation");
    assert_eq!(output["resolution"], serde_json::json!([1920, 1080]));
    assert_eq!(output["file_size_bytes"], 9);
    assert!(output["render_time_seconds"].is_number());
    assert!(output["gpu_used"].is_boolean());

    let video = BASE64
        .decode(output["video_base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(video, b"MP4-BYTES");
}

#[tokio::test]
async fn test_runsync_missing_parameter_fails_with_field_name() {
    let (_dir, app) = test_app();

    let response = app
        .oneshot(post_json(
            "/runsync",
            serde_json::json!({
                "input": {
                    "template": "ai_cpu_activation",
                    "resolution": [1920, 1080],
                    "samples": 128
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "FAILED");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Missing required parameter: fps"));
}

#[tokio::test]
async fn test_run_then_poll_to_completion() {
    let (_dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/run",
            serde_json::json!({
                "input": {
                    "template": "ai_cpu_activation",
                    "resolution": [1280, 720],
                    "samples": 32,
                    "fps": 24
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "QUEUED");
    let job_id = body["id"].as_str().unwrap().to_string();

    // Poll until terminal, bounded well under the fake render time.
    let mut last_status = String::new();
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/status/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        last_status = body["status"].as_str().unwrap().to_string();
        if last_status == "COMPLETED" || last_status == "FAILED" {
            assert_eq!(last_status, "COMPLETED");
            assert!(body["execution_time_ms"].is_number());
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job never reached a terminal state, last status: {last_status}");
}

//! HTTP surface tests that wire the real pipeline service through the router.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use corpus_digest::api::create_router;
use corpus_digest::inference::HeuristicInferenceClient;
use corpus_digest::pipeline::{PipelineService, PipelineSettings};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn build_corpus() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.txt"), "hello world").expect("write a.txt");
    std::fs::write(dir.path().join("c.html"), "<p>hi</p>").expect("write c.html");
    dir
}

fn build_app(root: &Path) -> Router {
    let service = Arc::new(PipelineService::new(
        root.to_path_buf(),
        Box::new(HeuristicInferenceClient),
        PipelineSettings::default(),
    ));
    create_router(service)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json body")
}

#[tokio::test]
async fn reload_then_query_round_trip() {
    let corpus = build_corpus();
    let app = build_app(corpus.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/reload")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("reload response");
    assert_eq!(response.status(), StatusCode::OK);
    let reload = body_json(response).await;
    assert_eq!(reload["total_files"], 2);
    assert_eq!(reload["documents_summarized"], 2);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/summaries")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("summaries response");
    let summaries = body_json(response).await;
    assert!(summaries["summaries"]["a.txt"].is_string());
    assert!(summaries["summaries"]["c.html"].is_string());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/ask")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "question": "What is hello?" }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("ask response");
    let ask = body_json(response).await;
    assert!(ask["answer"].as_str().expect("answer").contains("hello"));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("metrics response");
    let metrics = body_json(response).await;
    assert_eq!(metrics["passes_completed"], 1);
    assert_eq!(metrics["documents_summarized"], 2);
}

#[tokio::test]
async fn ask_before_any_pass_returns_null_answer() {
    let corpus = build_corpus();
    let app = build_app(corpus.path());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/ask")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "question": "Anything?" }).to_string()))
                .expect("request"),
        )
        .await
        .expect("ask response");

    let ask = body_json(response).await;
    assert!(ask["answer"].is_null());
}

#[tokio::test]
async fn reload_on_missing_root_is_a_server_error() {
    let app = build_app(Path::new("/no/such/corpus-root"));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/reload")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("reload response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().expect("error").contains("corpus root"));
}

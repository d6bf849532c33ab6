#![cfg(feature = "http")]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures::FutureExt;
use serde_json::{json, Value};
use soul_actions::http::{dispatch, into_handler};
use soul_actions::prelude::*;
use tower::ServiceExt;

fn actions() -> CompiledActions {
    let mut controller = Controller::new(());
    controller
        .action(
            "echo",
            ActionSpec::new(handler_fn(|_: &(), req, _rsp| {
                let view = json!({
                    "method": req.method(),
                    "path": req.path(),
                    "query": Value::Object(req.query().clone()),
                    "body": req.body().clone(),
                });
                async move { Ok(Reply::Structured(view)) }.boxed()
            })),
        )
        .action(
            "text",
            ActionSpec::new(handler_fn(|_: &(), _req, rsp| {
                rsp.insert_header("x-kind", "text");
                async { Ok(Reply::raw("done")) }.boxed()
            })),
        )
        .action(
            "nothing",
            ActionSpec::new(handler_fn(|_: &(), _req, rsp| {
                rsp.set_status(204);
                async { Ok(Reply::Empty) }.boxed()
            })),
        )
        .action(
            "fails",
            ActionSpec::new(handler_fn(|_: &(), _req, _rsp| {
                async { Err(ActionError::internal("disk on fire")) }.boxed()
            })),
        )
        .action(
            "partial",
            ActionSpec::new(handler_fn(|_: &(), _req, rsp| {
                async move {
                    rsp.emit_structured(json!({"saved": true})).await?;
                    Err(ActionError::internal("audit log unavailable"))
                }
                .boxed()
            })),
        )
        .action(
            "guarded",
            ActionSpec::new(handler_fn(|_: &(), _req, _rsp| {
                async { Ok(Reply::raw("secret")) }.boxed()
            }))
            .access_control(access_fn(|_req| false)),
        );
    controller.compile_actions()
}

async fn read_body(response: axum::response::Response) -> (StatusCode, Option<String>, Vec<u8>) {
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, bytes.to_vec())
}

#[tokio::test]
async fn structured_reply_is_json() {
    let actions = actions();
    let request = Request::post("/echo?page=2&q=rust%20lang")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"ada"}"#))
        .unwrap();
    let response = dispatch(actions.get("echo").unwrap(), request, &HttpSettings::default()).await;

    let (status, content_type, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["method"], "POST");
    assert_eq!(body["path"], "/echo");
    assert_eq!(body["query"], json!({"page": "2", "q": "rust lang"}));
    assert_eq!(body["body"], json!({"name": "ada"}));
}

#[tokio::test]
async fn empty_body_reads_as_null() {
    let actions = actions();
    let request = Request::get("/echo").body(Body::empty()).unwrap();
    let response = dispatch(actions.get("echo").unwrap(), request, &HttpSettings::default()).await;
    let (_, _, bytes) = read_body(response).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["body"], Value::Null);
}

#[tokio::test]
async fn raw_and_empty_replies() {
    let actions = actions();
    let settings = HttpSettings::default();

    let request = Request::get("/text").body(Body::empty()).unwrap();
    let response = dispatch(actions.get("text").unwrap(), request, &settings).await;
    assert_eq!(response.headers().get("x-kind").unwrap(), "text");
    let (status, content_type, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(bytes, b"done");

    let request = Request::delete("/nothing").body(Body::empty()).unwrap();
    let response = dispatch(actions.get("nothing").unwrap(), request, &settings).await;
    let (status, _, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected_before_the_pipeline() {
    let actions = actions();
    let request = Request::post("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = dispatch(actions.get("echo").unwrap(), request, &HttpSettings::default()).await;
    let (status, _, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "HTTP.STATUS");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let actions = actions();
    let settings = HttpSettings {
        max_body_bytes: 8,
        ..HttpSettings::default()
    };
    let request = Request::post("/echo")
        .body(Body::from(r#"{"name":"a very long name"}"#))
        .unwrap();
    let response = dispatch(actions.get("echo").unwrap(), request, &settings).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unrecovered_errors_are_masked_unless_exposed() {
    let actions = actions();

    let request = Request::get("/fails").body(Body::empty()).unwrap();
    let response = dispatch(actions.get("fails").unwrap(), request, &HttpSettings::default()).await;
    let (status, _, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({"code": "UNKNOWN.INTERNAL", "message": "Internal error. Please retry later."})
    );

    let exposed = HttpSettings {
        expose_error_details: true,
        ..HttpSettings::default()
    };
    let request = Request::get("/fails").body(Body::empty()).unwrap();
    let response = dispatch(actions.get("fails").unwrap(), request, &exposed).await;
    let (_, _, bytes) = read_body(response).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["details"], "internal error: disk on fire");
}

#[tokio::test]
async fn mounted_on_a_router() {
    let actions = actions();
    let settings = HttpSettings::default();
    let app = Router::new()
        .route(
            "/guarded",
            axum::routing::get(into_handler(actions.get("guarded").unwrap().clone(), settings.clone())),
        )
        .route(
            "/text",
            axum::routing::get(into_handler(actions.get("text").unwrap().clone(), settings)),
        );

    let response = app
        .clone()
        .oneshot(Request::get("/guarded").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, _, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Access denied");

    let response = app
        .oneshot(Request::get("/text").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, _, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"done");
}

#[tokio::test]
async fn payload_written_before_a_failure_is_kept() {
    let actions = actions();
    let request = Request::post("/partial").body(Body::empty()).unwrap();
    let response = dispatch(actions.get("partial").unwrap(), request, &HttpSettings::default()).await;

    let (status, content_type, bytes) = read_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"saved": true}));
}

//! HTTP execution client tests against a stub compiler server.

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use samples_verifier_core::{
    Code, ControlledClient, ExecutionClient, ExecutionConfig, KotlinCompilerClient, KotlinEnv,
    Severity, VerifierError,
};

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Mimics the compiler server: snippets containing `error` fail to compile,
/// snippets containing `throw` raise, everything else echoes its text.
async fn run(Json(body): Json<Value>) -> Json<Value> {
    let text = body["files"][0]["text"].as_str().unwrap_or_default();
    if text.contains("error") {
        return Json(json!({
            "text": "",
            "errors": {"File.kt": [{
                "interval": {"start": {"line": 0, "ch": 0}, "end": {"line": 0, "ch": 5}},
                "message": "Unresolved reference: error",
                "severity": "ERROR",
                "className": "red_wavy_line"
            }]},
            "exception": null
        }));
    }
    if text.contains("throw") {
        return Json(json!({
            "text": "<outStream></outStream>",
            "errors": {"File.kt": []},
            "exception": {
                "message": "thrown from sample",
                "fullName": "java.lang.RuntimeException",
                "stackTrace": [{
                    "className": "FileKt",
                    "methodName": "main",
                    "fileName": "File.kt",
                    "lineNumber": 1
                }],
                "cause": null
            }
        }));
    }
    Json(json!({
        "text": format!("<outStream>{}</outStream>", body["confType"].as_str().unwrap_or("?")),
        "errors": {"File.kt": []},
        "exception": null
    }))
}

async fn translate(Json(_body): Json<Value>) -> Json<Value> {
    Json(json!({"jsCode": "main();", "errors": {}, "exception": null}))
}

fn stub_router() -> Router {
    Router::new()
        .route("/api/compiler/run", post(run))
        .route("/api/compiler/translate", post(translate))
}

fn client(base: &str, env: KotlinEnv) -> KotlinCompilerClient {
    KotlinCompilerClient::new(base, env, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn clean_snippet_returns_output() {
    let base = spawn_server(stub_router()).await;
    let result = client(&base, KotlinEnv::Jvm)
        .execute(&Code::new("fun main() = println(1)"))
        .await
        .unwrap();

    assert!(!result.is_failure());
    assert_eq!(result.output(), "java");
}

#[tokio::test]
async fn compile_errors_are_data_not_errors() {
    let base = spawn_server(stub_router()).await;
    let result = client(&base, KotlinEnv::Jvm)
        .execute(&Code::new("error()"))
        .await
        .unwrap();

    assert!(result.is_failure());
    let errors = &result.errors["File.kt"];
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].severity, Severity::Error);
    assert_eq!(result.diagnostics(), vec!["Unresolved reference: error"]);
}

#[tokio::test]
async fn runtime_exception_is_captured() {
    let base = spawn_server(stub_router()).await;
    let result = client(&base, KotlinEnv::Jvm)
        .execute(&Code::new("throw RuntimeException()"))
        .await
        .unwrap();

    let exception = result.exception.as_ref().unwrap();
    assert_eq!(exception.full_name, "java.lang.RuntimeException");
    assert_eq!(exception.stack_trace[0].method_name, "main");
    assert!(!result.has_diagnostics());
    assert!(result.is_failure());
}

#[tokio::test]
async fn js_env_uses_translate_endpoint() {
    let base = spawn_server(stub_router()).await;
    let result = client(&base, KotlinEnv::Js)
        .execute(&Code::new("fun main() {}"))
        .await
        .unwrap();

    assert_eq!(result.text, "main();");
    assert!(!result.is_failure());
}

#[tokio::test]
async fn server_error_status_is_transport_error() {
    let router = Router::new().route(
        "/api/compiler/run",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "compiler crashed") }),
    );
    let base = spawn_server(router).await;

    let err = client(&base, KotlinEnv::Jvm)
        .execute(&Code::new("x"))
        .await
        .unwrap_err();
    match err {
        VerifierError::Transport(msg) => {
            assert!(msg.contains("500"), "got: {msg}");
            assert!(msg.contains("compiler crashed"));
        }
        other => panic!("expected Transport, got {:?}", other),
    }
}

#[tokio::test]
async fn controlled_client_times_out_slow_backend() {
    let router = Router::new().route(
        "/api/compiler/run",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"text": "late"}))
        }),
    );
    let base = spawn_server(router).await;
    let controlled = ControlledClient::new(
        client(&base, KotlinEnv::Jvm),
        ExecutionConfig {
            timeout_ms: 100,
            max_retries: 1,
            backoff_base_ms: 10,
        },
    );

    let err = controlled.execute(&Code::new("x")).await.unwrap_err();
    assert!(matches!(err, VerifierError::Timeout { limit_ms: 100, .. }));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), KotlinEnv::Jvm)
        .execute(&Code::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, VerifierError::Transport(_)));
}

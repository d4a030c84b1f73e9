use axum::{
    extract::Multipart,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

use finova::backend::{BackendError, BackendGateway, HttpGateway, UploadFile};
use finova::constants::{
    AGENTS_NOT_READY_TEXT, API_UNREACHABLE_TEXT, GENERIC_FAILURE_TEXT, UPLOAD_FAILURE_TEXT,
};
use finova::session::{ConnectivityStatus, SessionController, SessionState, SubmitOutcome, UploadOutcome};
use finova::ServiceTag;

/// Serve `router` on an ephemeral port and return its base URL
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn gateway(base_url: &str) -> Arc<HttpGateway> {
    Arc::new(HttpGateway::new(base_url, None).unwrap())
}

fn connected(gateway: Arc<HttpGateway>) -> SessionController {
    SessionController::with_state(
        gateway,
        SessionState {
            connectivity: ConnectivityStatus::Connected,
            ..SessionState::default()
        },
    )
}

/// Router whose chat endpoint always answers with `status` and `body`
fn chat_router(status: StatusCode, body: Value) -> Router {
    Router::new().route(
        "/api/chat",
        post(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    )
}

#[tokio::test]
async fn health_maps_agent_flag_to_connectivity() {
    let ready = serve(Router::new().route(
        "/api/health",
        get(|| async { Json(json!({"status": "healthy", "agents_initialized": true})) }),
    ))
    .await;
    let idle = serve(Router::new().route(
        "/api/health",
        get(|| async { Json(json!({"status": "healthy", "agents_initialized": false})) }),
    ))
    .await;

    let controller = SessionController::new(gateway(&ready));
    assert_eq!(controller.check_health().await, ConnectivityStatus::Connected);

    let controller = SessionController::new(gateway(&idle));
    assert_eq!(controller.check_health().await, ConnectivityStatus::AgentsNotReady);
}

#[tokio::test]
async fn chat_posts_message_and_service() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let recorder = seen.clone();
    let url = serve(Router::new().route(
        "/api/chat",
        post(move |Json(body): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                *recorder.lock() = Some(body);
                Json(json!({"response": "**INVESTMENT ANALYSIS**\n\n- Stocks: 60%"}))
            }
        }),
    ))
    .await;

    let controller = connected(gateway(&url));
    let outcome = controller
        .submit_query("I want to invest $50,000", ServiceTag::Investment)
        .await;
    assert!(matches!(outcome, SubmitOutcome::Replied(_)));

    assert_eq!(
        seen.lock().clone(),
        Some(json!({"message": "I want to invest $50,000", "service": "investment"}))
    );
    let state = controller.snapshot();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].text, "**INVESTMENT ANALYSIS**\n\n- Stocks: 60%");
    assert!(!state.pending_submission);
}

#[tokio::test]
async fn agents_marker_yields_agents_not_ready_text() {
    let url = serve(chat_router(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "Agents not initialized. Please initialize agents first."}),
    ))
    .await;

    let err = gateway(&url).chat("hi", ServiceTag::All).await.unwrap_err();
    assert!(matches!(err, BackendError::AgentsNotInitialized(_)));

    let controller = connected(gateway(&url));
    controller.submit_query("hi", ServiceTag::All).await;
    let state = controller.snapshot();
    assert_eq!(state.messages[1].text, AGENTS_NOT_READY_TEXT);
    assert!(state.messages[1].is_error());
}

#[tokio::test]
async fn other_http_failures_use_generic_text() {
    let url = serve(chat_router(StatusCode::BAD_REQUEST, json!({"error": "Message is required"}))).await;

    let err = gateway(&url).chat("hi", ServiceTag::All).await.unwrap_err();
    assert_eq!(
        err,
        BackendError::HttpError {
            status: 400,
            message: "Message is required".into()
        }
    );

    let controller = connected(gateway(&url));
    controller.submit_query("hi", ServiceTag::All).await;
    assert_eq!(controller.snapshot().messages[1].text, GENERIC_FAILURE_TEXT);
}

#[tokio::test]
async fn malformed_success_body_is_invalid_response() {
    let url = serve(chat_router(StatusCode::OK, json!({"answer": "wrong field"}))).await;

    let err = gateway(&url).chat("hi", ServiceTag::All).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn upload_sends_every_file_in_one_multipart_request() {
    let parts: Arc<Mutex<Vec<(String, String, Vec<u8>)>>> = Arc::default();
    let recorder = parts.clone();
    let url = serve(Router::new().route(
        "/api/upload",
        post(move |mut multipart: Multipart| {
            let recorder = recorder.clone();
            async move {
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.unwrap().to_vec();
                    recorder.lock().push((name, file_name, bytes));
                }
                Json(json!({
                    "message": "Files uploaded successfully",
                    "uploaded_files": ["q3.pdf", {"filename": "holdings.csv"}]
                }))
            }
        }),
    ))
    .await;

    let controller = connected(gateway(&url));
    let outcome = controller
        .upload_files(vec![
            UploadFile::new("q3.pdf", "quarterly"),
            UploadFile::new("holdings.csv", "AAPL,10"),
        ])
        .await;
    assert_eq!(
        outcome,
        UploadOutcome::Uploaded {
            files: 2,
            records: 2
        }
    );

    assert_eq!(
        parts.lock().clone(),
        vec![
            ("file0".to_string(), "q3.pdf".to_string(), b"quarterly".to_vec()),
            ("file1".to_string(), "holdings.csv".to_string(), b"AAPL,10".to_vec()),
        ]
    );
    let uploads: Vec<String> = controller
        .snapshot()
        .uploads
        .into_iter()
        .map(|r| r.file_name)
        .collect();
    assert_eq!(uploads, vec!["q3.pdf", "holdings.csv"]);
}

#[tokio::test]
async fn rejected_upload_is_a_total_failure() {
    let url = serve(Router::new().route(
        "/api/upload",
        // Read the form before refusing so the client sees the status, not a reset
        post(|_form: axum::body::Bytes| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "File type not allowed"})),
            )
        }),
    ))
    .await;

    let err = gateway(&url)
        .upload(&[UploadFile::new("notes.exe", "x")])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BackendError::HttpError {
            status: 400,
            message: "File type not allowed".into()
        }
    );

    let controller = connected(gateway(&url));
    let outcome = controller
        .upload_files(vec![
            UploadFile::new("q3.pdf", "quarterly"),
            UploadFile::new("notes.exe", "x"),
        ])
        .await;
    assert_eq!(outcome, UploadOutcome::Failed);

    let state = controller.snapshot();
    assert!(state.uploads.is_empty());
    assert!(!state.uploading);
    assert_eq!(state.messages.len(), 1);
    assert!(state.messages[0].is_error());
    assert_eq!(state.messages[0].text, UPLOAD_FAILURE_TEXT);
}

#[tokio::test]
async fn failing_health_endpoint_means_api_down() {
    let url = serve(Router::new().route(
        "/api/health",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;

    let err = gateway(&url).health().await.unwrap_err();
    assert_eq!(
        err,
        BackendError::HttpError {
            status: 503,
            message: "HTTP error! status: 503".into()
        }
    );

    let controller = connected(gateway(&url));
    assert_eq!(controller.check_health().await, ConnectivityStatus::ApiDown);
    assert!(!controller.snapshot().input_enabled());
    assert!(controller.snapshot().messages.is_empty());
}

#[tokio::test]
async fn initialize_success_and_rejection() {
    let ok = serve(Router::new().route(
        "/api/initialize",
        post(|| async { Json(json!({"status": "success", "message": "Agents initialized"})) }),
    ))
    .await;
    let rejected = serve(Router::new().route(
        "/api/initialize",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": "ACP server on 8001 unreachable"})),
            )
        }),
    ))
    .await;

    let controller = SessionController::new(gateway(&ok));
    assert_eq!(controller.initialize_agents().await, ConnectivityStatus::Connected);

    let err = gateway(&rejected).initialize().await.unwrap_err();
    assert_eq!(
        err,
        BackendError::InitializationRejected {
            status: 500,
            message: "ACP server on 8001 unreachable".into()
        }
    );
    let controller = SessionController::new(gateway(&rejected));
    assert_eq!(
        controller.initialize_agents().await,
        ConnectivityStatus::InitializationFailed
    );
}

#[tokio::test]
async fn list_files_reads_knowledge_base() {
    let url = serve(Router::new().route(
        "/api/files",
        get(|| async { Json(json!({"files": ["q3.pdf", "holdings.csv"]})) }),
    ))
    .await;

    let controller = SessionController::new(gateway(&url));
    assert_eq!(
        controller.refresh_files().await.unwrap(),
        vec!["q3.pdf".to_string(), "holdings.csv".to_string()]
    );
    assert!(controller.snapshot().messages.is_empty());
}

#[tokio::test]
async fn unreachable_server_is_network_unavailable() {
    // Grab a free port, then close it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = gateway(&url).health().await.unwrap_err();
    assert!(err.is_transport(), "{:?}", err);

    let controller = connected(gateway(&url));
    controller.submit_query("hello", ServiceTag::All).await;
    assert_eq!(controller.snapshot().messages[1].text, API_UNREACHABLE_TEXT);
    assert_eq!(controller.check_health().await, ConnectivityStatus::ApiDown);
    assert_eq!(controller.initialize_agents().await, ConnectivityStatus::ApiDown);
}

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use batch_mcq_extract::clients::{GenerationBackend, GenerationRequest, RequestClient};
use batch_mcq_extract::error::{AppError, ServiceError, UnavailableReason};
use batch_mcq_extract::models::{ContentKind, Record, Section};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// 假的生成服务
#[derive(Default)]
struct MockServer {
    generate_hits: AtomicUsize,
    reset_hits: AtomicUsize,
    paused: AtomicBool,
    /// 生成接口的响应
    reply: Mutex<Option<(u16, Value)>>,
    last_body: Mutex<Option<Value>>,
}

impl MockServer {
    fn respond(&self, status: u16, body: Value) {
        *self.reply.lock().unwrap() = Some((status, body));
    }

    fn hits(&self) -> usize {
        self.generate_hits.load(Ordering::SeqCst)
    }
}

type Shared = Arc<MockServer>;

fn reply(status: u16, body: Value) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(body),
    )
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "initialized": true}))
}

async fn reset_chat(State(server): State<Shared>) -> Json<Value> {
    server.reset_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true}))
}

async fn pause(State(server): State<Shared>) -> Json<Value> {
    server.paused.store(true, Ordering::SeqCst);
    Json(json!({"success": true, "pausedAt": "2026-01-01T00:00:00Z"}))
}

async fn resume(State(server): State<Shared>) -> Json<Value> {
    server.paused.store(false, Ordering::SeqCst);
    Json(json!({"success": true, "pauseDurationSeconds": 3.5}))
}

async fn pause_status(State(server): State<Shared>) -> Json<Value> {
    Json(json!({"isPaused": server.paused.load(Ordering::SeqCst)}))
}

async fn generate(
    State(server): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    server.generate_hits.fetch_add(1, Ordering::SeqCst);
    *server.last_body.lock().unwrap() = Some(body);
    let (status, body) = server
        .reply
        .lock()
        .unwrap()
        .clone()
        .unwrap_or((200, json!({"success": true, "raw_response": "[]"})));
    reply(status, body)
}

async fn spawn_server() -> (SocketAddr, Shared) {
    let server = Shared::default();
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/reset-chat", post(reset_chat))
        .route("/api/pause", post(pause))
        .route("/api/resume", post(resume))
        .route("/api/pause-status", get(pause_status))
        .route("/api/generate-mcqs", post(generate))
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, server)
}

fn client_for(addr: SocketAddr) -> RequestClient {
    RequestClient::with_timeouts(
        &format!("http://{}/", addr),
        Duration::from_secs(5),
        Duration::from_secs(2),
    )
    .unwrap()
}

fn request(text: &str) -> GenerationRequest<'_> {
    GenerationRequest {
        text,
        section: Section::Mids,
        page_count: 3,
        kind: ContentKind::Mcq,
        dom_delay_seconds: 2,
    }
}

fn mcq_json(question: &str) -> Value {
    json!({
        "question": question,
        "options": ["Alpha", "Beta", "Gamma", "Delta"],
        "correct": "Beta",
        "explanation": "Because.",
        "difficulty": "Hard",
        "importance": 5
    })
}

#[tokio::test]
async fn test_generate_repairs_raw_response() {
    let (addr, server) = spawn_server().await;
    let raw = format!(
        "```json\n{}\n```\nHope this helps!",
        json!([mcq_json("Q1"), mcq_json("Q2"), {"question": "broken"}])
    );
    server.respond(200, json!({"success": true, "raw_response": raw}));

    let client = client_for(addr);
    let records = client.generate(&request("page text")).await.unwrap();

    assert_eq!(records.len(), 2);
    assert!(matches!(&records[0], Record::Mcq(m) if m.question == "Q1"));

    let body = server.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["text"], "page text");
    assert_eq!(body["section"], "mids");
    assert_eq!(body["expected_mcqs"], 6);
    assert_eq!(body["content_type"], "mcq");
    assert_eq!(body["dom_delay_seconds"], 2);

    let stats = client.repair_stats();
    assert_eq!(stats.quick_fix, 1);
    assert_eq!(stats.dropped_records, 1);
    assert_eq!(stats.total_calls(), 1);
}

#[tokio::test]
async fn test_generate_accepts_preparsed_list() {
    let (addr, server) = spawn_server().await;
    server.respond(
        200,
        json!({"success": true, "mcqs": [mcq_json("Q1"), {"question": "no options"}]}),
    );

    let client = client_for(addr);
    let records = client.generate(&request("text")).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(client.repair_stats().dropped_records, 1);
    assert_eq!(client.repair_stats().total_calls(), 0);
}

#[tokio::test]
async fn test_unrecoverable_output_yields_empty_batch() {
    let (addr, server) = spawn_server().await;
    server.respond(
        200,
        json!({"success": true, "raw_response": "I could not find any questions."}),
    );

    let client = client_for(addr);
    let records = client.generate(&request("text")).await.unwrap();

    assert!(records.is_empty());
    assert_eq!(client.repair_stats().failures, 1);
}

#[tokio::test]
async fn test_generation_failure() {
    let (addr, server) = spawn_server().await;
    server.respond(200, json!({"success": false, "error": "model refused"}));

    let err = client_for(addr).generate(&request("text")).await.unwrap_err();
    match err {
        AppError::Service(ServiceError::GenerationFailure { message }) => {
            assert_eq!(message, "model refused")
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_success_without_data_is_failure() {
    let (addr, server) = spawn_server().await;
    server.respond(200, json!({"success": true, "raw_response": "", "mcqs": []}));

    let err = client_for(addr).generate(&request("text")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Service(ServiceError::GenerationFailure { .. })
    ));
}

#[tokio::test]
async fn test_unavailable_reasons() {
    let (addr, server) = spawn_server().await;
    let client = client_for(addr);

    server.respond(503, json!({"error": "not logged in", "code": "NOT_INITIALIZED"}));
    let err = client.generate(&request("one")).await.unwrap_err();
    match err {
        AppError::Service(ServiceError::Unavailable { reason, message }) => {
            assert_eq!(reason, UnavailableReason::NotInitialized);
            assert_eq!(message.as_deref(), Some("not logged in"));
        }
        other => panic!("unexpected error: {}", other),
    }

    server.respond(503, json!({"error": "paused", "code": "PAUSED"}));
    let err = client.generate(&request("two")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Service(ServiceError::Unavailable {
            reason: UnavailableReason::Paused,
            ..
        })
    ));
}

#[tokio::test]
async fn test_timeout_and_bad_status() {
    let (addr, server) = spawn_server().await;
    let client = client_for(addr);

    server.respond(504, json!({"error": "upstream timed out"}));
    let err = client.generate(&request("one")).await.unwrap_err();
    assert!(matches!(err, AppError::Service(ServiceError::Timeout { .. })));

    server.respond(500, json!({"error": "boom"}));
    let err = client.generate(&request("two")).await.unwrap_err();
    match err {
        AppError::Service(ServiceError::BadStatus { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("boom"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    let err = client.generate(&request("text")).await.unwrap_err();
    assert!(err.is_transport());
    assert!(client.health().await.unwrap_err().is_transport());
}

#[tokio::test]
async fn test_duplicate_submission_reuses_result() {
    let (addr, server) = spawn_server().await;
    server.respond(
        200,
        json!({"success": true, "raw_response": json!([mcq_json("Q1")]).to_string()}),
    );
    let client = client_for(addr);

    let first = client.generate(&request("same text")).await.unwrap();
    let second = client.generate(&request("same text")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(server.hits(), 1);

    client.generate(&request("other text")).await.unwrap();
    assert_eq!(server.hits(), 2);

    // 新会话清空缓存
    client.reset_session().await.unwrap();
    assert_eq!(server.reset_hits.load(Ordering::SeqCst), 1);
    client.generate(&request("same text")).await.unwrap();
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn test_failed_request_is_not_cached() {
    let (addr, server) = spawn_server().await;
    let client = client_for(addr);

    server.respond(500, json!({"error": "boom"}));
    assert_err!(client.generate(&request("retry me")).await);

    server.respond(
        200,
        json!({"success": true, "raw_response": json!([mcq_json("Q1")]).to_string()}),
    );
    let records = client.generate(&request("retry me")).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_failure_in_between_invalidates_cached_result() {
    let (addr, server) = spawn_server().await;
    let client = client_for(addr);
    let ok = |question: &str| {
        json!({"success": true, "raw_response": json!([mcq_json(question)]).to_string()})
    };

    server.respond(200, ok("Q1"));
    assert_ok!(client.generate(&request("text a")).await);

    server.respond(500, json!({"error": "boom"}));
    assert_err!(client.generate(&request("text b")).await);

    // 上一次请求是 B，A 必须重新发送
    server.respond(200, ok("Q2"));
    let records = client.generate(&request("text a")).await.unwrap();
    assert_eq!(server.hits(), 3);
    assert!(matches!(&records[0], Record::Mcq(m) if m.question == "Q2"));
}

#[tokio::test]
async fn test_control_endpoints() {
    let (addr, server) = spawn_server().await;
    let client = client_for(addr);

    assert!(client.health().await.unwrap());
    assert!(!client.is_paused().await.unwrap());

    assert_ok!(client.pause().await);
    assert!(server.paused.load(Ordering::SeqCst));
    assert!(client.is_paused().await.unwrap());

    assert_ok!(client.resume().await);
    assert!(!client.is_paused().await.unwrap());
}

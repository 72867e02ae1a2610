//! Gemini client against a local stub service

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use chatvrm_core::{GeminiConfig, RetryConfig};
use chatvrm_llm::{collect_reply, ChatProvider, GeminiClient, LLMError, Message};
use futures_util::StreamExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const SSE_BODY: &str = concat!(
    "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"[happy]こんにちは\"}],\"role\":\"model\"}}]}\r\n\r\n",
    "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"\"}],\"role\":\"model\"}}]}\r\n\r\n",
    "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"。元気？\"}],\"role\":\"model\"}}]}\r\n\r\n",
);

#[derive(Clone)]
struct Stub {
    calls: Arc<AtomicU32>,
    rate_limited: u32,
    fail_status: Option<StatusCode>,
}

async fn stream_handler(State(stub): State<Stub>, headers: HeaderMap) -> impl IntoResponse {
    let n = stub.calls.fetch_add(1, Ordering::SeqCst);
    if headers.get("x-goog-api-key").map(|v| v.as_bytes()) != Some(&b"test-key"[..]) {
        return (StatusCode::FORBIDDEN, [(header::CONTENT_TYPE, "application/json")], "{}").into_response();
    }
    if let Some(status) = stub.fail_status {
        return (status, "boom").into_response();
    }
    if n < stub.rate_limited {
        return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
    }
    ([(header::CONTENT_TYPE, "text/event-stream")], SSE_BODY).into_response()
}

async fn spawn_stub(rate_limited: u32, fail_status: Option<StatusCode>) -> (String, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let stub = Stub {
        calls: calls.clone(),
        rate_limited,
        fail_status,
    };
    let app = Router::new()
        .route("/v1beta/models/*rest", post(stream_handler))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/v1beta", addr), calls)
}

fn client(endpoint: String, key: &str, max_retries: u32) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
        api_key: Some(key.to_string()),
        endpoint,
        retry: RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_jitter_ms: 0,
        },
        ..GeminiConfig::default()
    })
    .unwrap()
}

fn conversation() -> Vec<Message> {
    vec![Message::system("You are a friendly avatar."), Message::user("やあ")]
}

#[tokio::test]
async fn test_streams_non_empty_pieces() {
    let (endpoint, _calls) = spawn_stub(0, None).await;
    let stream = client(endpoint, "test-key", 5)
        .chat_stream(&conversation())
        .await
        .unwrap();

    let pieces: Vec<String> = stream.map(|p| p.unwrap()).collect().await;
    assert_eq!(pieces, vec!["[happy]こんにちは", "。元気？"]);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let (endpoint, calls) = spawn_stub(2, None).await;
    let stream = client(endpoint, "test-key", 5)
        .chat_stream(&conversation())
        .await
        .unwrap();

    assert_eq!(collect_reply(stream).await.unwrap(), "[happy]こんにちは。元気？");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let (endpoint, calls) = spawn_stub(u32::MAX, None).await;
    let err = client(endpoint, "test-key", 2)
        .chat_stream(&conversation())
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::Gemini));
    assert_eq!(err.to_string(), "Something went wrong with Gemini API");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_other_failures_are_not_retried() {
    let (endpoint, calls) = spawn_stub(0, Some(StatusCode::INTERNAL_SERVER_ERROR)).await;
    let err = client(endpoint, "test-key", 5)
        .chat_stream(&conversation())
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::Gemini));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_wrong_key_reported_as_gemini_failure() {
    let (endpoint, _calls) = spawn_stub(0, None).await;
    let err = client(endpoint, "other-key", 5)
        .chat_stream(&conversation())
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::Gemini));
}

#[tokio::test]
async fn test_unreachable_endpoint_reported_as_gemini_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{}/v1beta", addr), "test-key", 5)
        .chat_stream(&conversation())
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::Gemini));
}

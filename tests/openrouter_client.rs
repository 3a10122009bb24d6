//! OpenRouter client behaviour against a mock HTTP server.

use luna_assistant::{
    EnvCredentials, ErrorKind, ModelBackend, OpenRouterClient, OpenRouterConfig,
};
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;

const MODEL: &str = "openai/gpt-oss-20b:free";

async fn client_for(server: &ServerGuard, key: &str) -> OpenRouterClient {
    let config = OpenRouterConfig {
        endpoint_overrides: false,
        ..OpenRouterConfig::default()
    }
    .with_base_url(format!("{}/api/v1/chat/completions", server.url()));
    OpenRouterClient::new(config, Arc::new(EnvCredentials::with_token(key))).unwrap()
}

#[tokio::test]
async fn test_completion_with_bearer_and_request_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_header("x-luna-request-id", Matcher::Regex("^[0-9a-f-]{36}$".into()))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": MODEL,
            "messages": [{"role": "user", "content": "hello"}],
            "max_tokens": 150
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Hi!"}}]}"#)
        .create_async()
        .await;

    let client = client_for(&server, "sk-test").await;
    let text = client.invoke(MODEL, "hello", 150).await.unwrap();
    assert_eq!(text, "Hi!");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_status_codes_are_classified() {
    let cases = [
        (401, r#"{"error":{"message":"No auth credentials found"}}"#, ErrorKind::Auth),
        (403, "{}", ErrorKind::Auth),
        (404, r#"{"error":"No endpoints found"}"#, ErrorKind::NotFound),
        (429, r#"{"error":"slow down"}"#, ErrorKind::RateLimit),
        (400, r#"{"error":"invalid max_tokens"}"#, ErrorKind::BadRequest),
        (503, "Service Unavailable", ErrorKind::Transient),
        (524, "", ErrorKind::Transient),
        (500, "boom", ErrorKind::Unknown),
    ];

    for (status, body, expected) in cases {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;
        let client = client_for(&server, "k").await;
        let err = client.invoke(MODEL, "hello", 10).await.unwrap_err();
        assert_eq!(err.kind, expected, "status {status}");
        assert_eq!(err.status, Some(status as u16));
    }
}

#[tokio::test]
async fn test_paused_body_wins_over_status() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(400)
        .with_body(r#"{"error":{"message":"This endpoint is currently paused by the provider"}}"#)
        .create_async()
        .await;
    let client = client_for(&server, "k").await;
    let err = client.invoke(MODEL, "hello", 10).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Paused);
    assert!(err.message.contains("paused"));
}

#[tokio::test]
async fn test_loading_body_is_transient() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(500)
        .with_body(r#"{"error":"Model is loading, try again"}"#)
        .create_async()
        .await;
    let client = client_for(&server, "k").await;
    let err = client.invoke(MODEL, "hello", 10).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transient);
}

#[tokio::test]
async fn test_blank_completion_is_empty_response() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"  \n "}}]}"#)
        .create_async()
        .await;
    let client = client_for(&server, "k").await;
    let err = client.invoke(MODEL, "hello", 10).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::EmptyResponse);
    assert_eq!(err.status, Some(200));
}

#[tokio::test]
async fn test_missing_key_fails_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let client = client_for(&server, "").await;
    let err = client.invoke(MODEL, "hello", 10).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Auth);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_sends_status_ping() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "messages": [{"role": "user", "content": "status ping"}],
            "max_tokens": 1
        })))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
        .create_async()
        .await;
    let client = client_for(&server, "k").await;
    client.probe(MODEL).await.unwrap();
    mock.assert_async().await;
}

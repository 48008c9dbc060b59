/*!
 * Integration tests for the OpenAI-compatible client against a mock HTTP server
 */

use std::time::Duration;

use doctran::errors::ProviderError;
use doctran::providers::openai::OpenAICompatible;
use doctran::providers::{complete_with_timeout, CompletionClient, CompletionRequest, ResolvedProvider};
use httpmock::prelude::*;
use serde_json::json;

fn provider(server: &MockServer) -> ResolvedProvider {
    ResolvedProvider {
        name: "deepseek".to_string(),
        endpoint: format!("{}/v1/", server.base_url()),
        api_key: "sk-test".to_string(),
        model: "deepseek-chat".to_string(),
    }
}

fn request() -> CompletionRequest {
    CompletionRequest::new("Translate into French.", "Hello", 0.5)
}

fn client() -> OpenAICompatible {
    OpenAICompatible::new(Duration::from_secs(5))
}

#[tokio::test]
async fn test_complete_withSuccessfulResponse_shouldReturnMessageContent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body_partial(
                    r#"{"model":"deepseek-chat","messages":[{"role":"system","content":"Translate into French."},{"role":"user","content":"Hello"}]}"#,
                );
            then.status(200).json_body(json!({
                "id": "chatcmpl-1",
                "choices": [
                    { "index": 0, "message": { "role": "assistant", "content": "Bonjour" }, "finish_reason": "stop" }
                ],
                "usage": { "prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14 }
            }));
        })
        .await;

    let reply = client().complete(&provider(&server), &request()).await.unwrap();

    assert_eq!(reply, "Bonjour");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_withJsonMode_shouldSendResponseFormat() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(r#"{"response_format":{"type":"json_object"}}"#);
            then.status(200).json_body(json!({
                "choices": [ { "message": { "role": "assistant", "content": "{\"terms\":[\"GPU\"]}" } } ]
            }));
        })
        .await;

    let reply = client()
        .complete(&provider(&server), &request().json())
        .await
        .unwrap();

    assert_eq!(reply, r#"{"terms":["GPU"]}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_withUnauthorized_shouldReturnAuthenticationError() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body("invalid api key");
        })
        .await;

    let result = client().complete(&provider(&server), &request()).await;

    assert_eq!(
        result,
        Err(ProviderError::AuthenticationError("invalid api key".to_string()))
    );
}

#[tokio::test]
async fn test_complete_withTooManyRequests_shouldReturnRateLimit() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("slow down");
        })
        .await;

    let result = client().complete(&provider(&server), &request()).await;

    assert!(matches!(result, Err(ProviderError::RateLimitExceeded(_))));
}

#[tokio::test]
async fn test_complete_withServerError_shouldReturnApiError() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(503).body("overloaded");
        })
        .await;

    let result = client().complete(&provider(&server), &request()).await;

    assert_eq!(
        result,
        Err(ProviderError::ApiError {
            status_code: 503,
            message: "overloaded".to_string()
        })
    );
}

#[tokio::test]
async fn test_complete_withNoChoices_shouldReturnParseError() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let result = client().complete(&provider(&server), &request()).await;

    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}

#[tokio::test]
async fn test_completeWithTimeout_withSubSecondBound_shouldReportMilliseconds() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({ "choices": [ { "message": { "content": "late" } } ] }));
        })
        .await;

    let result = complete_with_timeout(
        &client(),
        &provider(&server),
        &request(),
        Duration::from_millis(250),
    )
    .await;

    let error = result.unwrap_err();
    assert_eq!(error, ProviderError::Timeout(Duration::from_millis(250)));
    assert_eq!(error.to_string(), "Request timed out after 250ms");
}

//! Wire-level tests for the Gemini client against a local mock server.

use httpmock::prelude::*;
use serde_json::json;

use studysmith::clients::{ClientError, CompletionClient, EmbeddingClient, GeminiClient};

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key").with_base_url(server.base_url())
}

#[tokio::test]
async fn complete_extracts_the_first_candidate_text() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/gemini-2.0-flash:generateContent")
            .query_param("key", "test-key")
            .json_body_partial(r#"{"contents":[{"parts":[{"text":"Say hi"}]}]}"#);
        then.status(200).json_body(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hi there!"}]}}
            ]
        }));
    });

    let client = client_for(&server);
    let reply = client.complete("Say hi").await.expect("reply");
    assert_eq!(reply, "Hi there!");
    mock.assert();
}

#[tokio::test]
async fn complete_with_no_candidates_is_an_empty_reply() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("generateContent");
        then.status(200).json_body(json!({ "candidates": [] }));
    });

    let client = client_for(&server);
    let err = client.complete("anything").await.expect_err("must fail");
    assert!(matches!(err, ClientError::Empty));
}

#[tokio::test]
async fn non_success_status_surfaces_as_an_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("generateContent");
        then.status(429).body("rate limited");
    });

    let client = client_for(&server);
    let err = client.complete("anything").await.expect_err("must fail");
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 429);
            assert!(message.contains("rate limited"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn embed_returns_the_vector_values() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/text-embedding-004:embedContent")
            .query_param("key", "test-key");
        then.status(200).json_body(json!({
            "embedding": {"values": [0.1, 0.2, 0.3]}
        }));
    });

    let client = client_for(&server);
    let vector = client.embed("some text").await.expect("vector");
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    assert_eq!(client.dimension(), 768);
    mock.assert();
}

#[tokio::test]
async fn embed_with_no_values_is_an_empty_reply() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("embedContent");
        then.status(200).json_body(json!({ "embedding": {"values": []} }));
    });

    let client = client_for(&server);
    let err = client.embed("some text").await.expect_err("must fail");
    assert!(matches!(err, ClientError::Empty));
}

#[tokio::test]
async fn garbage_payloads_are_reported_as_malformed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("generateContent");
        then.status(200).body("<html>not json</html>");
    });

    let client = client_for(&server);
    let err = client.complete("anything").await.expect_err("must fail");
    assert!(matches!(err, ClientError::Malformed(_)));
}

#[tokio::test]
async fn overridden_embed_model_changes_endpoint_and_dimension() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/models/custom-embedder:embedContent");
        then.status(200).json_body(json!({
            "embedding": {"values": [1.0, 2.0]}
        }));
    });

    let client = client_for(&server).with_embed_model("custom-embedder", 2);
    assert_eq!(client.dimension(), 2);
    let vector = client.embed("text").await.expect("vector");
    assert_eq!(vector.len(), 2);
    mock.assert();
}

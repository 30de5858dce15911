use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GeminiClient {
    let config = ProviderConfig {
        gemini_base_url: server.uri(),
        ..ProviderConfig::default()
    };
    GeminiClient::new(&config, "test-google-key").expect("client")
}

async fn generate(client: GeminiClient, prompt: &'static str) -> Result<String, GenerationError> {
    tokio::task::spawn_blocking(move || client.generate(prompt))
        .await
        .expect("blocking task joins")
}

#[tokio::test]
async fn sends_prompt_and_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .and(header("x-goog-api-key", "test-google-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "What is GDPR?" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "The GDPR is " },
                    { "text": "an EU regulation." }
                ]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = generate(client_for(&server), "What is GDPR?")
        .await
        .expect("generation succeeds");
    assert_eq!(answer, "The GDPR is an EU regulation.");
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let result = generate(client_for(&server), "q").await;
    assert!(matches!(result, Err(GenerationError::Status { status: 403 })));
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = generate(client_for(&server), "q").await;
    assert!(matches!(result, Err(GenerationError::Status { status: 500 })));
}

#[tokio::test]
async fn blocked_prompt_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    match generate(client_for(&server), "q").await {
        Err(GenerationError::MalformedResponse(reason)) => assert_eq!(reason, "SAFETY"),
        other => panic!("expected malformed response, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = generate(client_for(&server), "q").await;
    assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
}

#[tokio::test]
async fn candidate_without_text_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let result = generate(client_for(&server), "q").await;
    assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let config = ProviderConfig {
        gemini_base_url: "http://127.0.0.1:1".to_string(),
        ..ProviderConfig::default()
    };
    let client = GeminiClient::new(&config, "key").expect("client");

    assert!(matches!(
        client.generate("q"),
        Err(GenerationError::Transport(_))
    ));
}

#[tokio::test]
async fn base_url_path_prefix_is_preserved() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/google/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Behind a gateway." }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        gemini_base_url: format!("{}/google", server.uri()),
        ..ProviderConfig::default()
    };
    let client = GeminiClient::new(&config, "test-google-key").expect("client");

    let answer = generate(client, "q").await.expect("generation succeeds");
    assert_eq!(answer, "Behind a gateway.");
}

#[test]
fn debug_output_redacts_api_key() {
    let client = GeminiClient::new(&ProviderConfig::default(), "secret-google-key").expect("client");

    let rendered = format!("{client:?}");
    assert!(!rendered.contains("secret-google-key"));
    assert!(rendered.contains("<redacted>"));
    assert!(rendered.contains("gemini-1.5-pro"));
}

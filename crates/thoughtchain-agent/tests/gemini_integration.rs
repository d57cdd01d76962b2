use thoughtchain_agent::{GeminiBackend, GeminiConfig, NodeClassifier, ReplyGenerator, Verdict};
use thoughtchain_core::{Message, Role, ThoughtchainError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> GeminiBackend {
    GeminiBackend::new(GeminiConfig {
        api_key: "test-key".into(),
        model: "gemini-2.5-flash".into(),
        api_base_url: Some(server.uri()),
    })
}

fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] }
        }]
    })
}

#[tokio::test]
async fn classify_parses_strict_json_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            r#"{"createNode": "yes", "title": "Recursion"}"#,
        )))
        .mount(&server)
        .await;

    let verdict = backend_for(&server)
        .classify("Explain recursion", &[])
        .await
        .unwrap();
    assert_eq!(
        verdict,
        Verdict::Create {
            title: Some("Recursion".into())
        }
    );
}

#[tokio::test]
async fn classify_recovers_from_prose_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            "Sure! yes, a new node would help here.",
        )))
        .mount(&server)
        .await;

    let verdict = backend_for(&server).classify("New topic", &[]).await.unwrap();
    assert_eq!(verdict, Verdict::Create { title: None });
}

#[tokio::test]
async fn generate_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("A closure captures…")))
        .mount(&server)
        .await;

    let history = vec![
        Message::new(1, "What is a closure?", Role::User),
        Message::new(2, "A function plus environment.", Role::Bot),
    ];
    let reply = backend_for(&server)
        .generate("Give me an example", &history)
        .await
        .unwrap();
    assert_eq!(reply, "A closure captures…");
}

#[tokio::test]
async fn quota_errors_are_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate("hi", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ThoughtchainError::QuotaExhausted));
}

#[tokio::test]
async fn server_errors_surface_as_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "internal"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server).classify("hi", &[]).await.unwrap_err();
    assert!(matches!(err, ThoughtchainError::Http(_)));
}

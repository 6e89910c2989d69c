use std::time::Duration;

use reg_horizon::config::{ModelTier, Provider, Settings};
use reg_horizon::error::{ProviderError, ToolError};
use reg_horizon::provider::openai::OpenAIClient;
use reg_horizon::provider::{CompletionRequest, ProviderClient};
use reg_horizon::tool::{payload, HttpFetcher, Tool};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(timeout: Duration) -> HttpFetcher {
    let mut settings = Settings::default().fetch;
    settings.timeout = timeout;
    HttpFetcher::new(&settings).expect("fetcher")
}

fn openai(server: &MockServer) -> OpenAIClient {
    OpenAIClient::new(Provider::OpenAI, server.uri(), "sk-test", Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn test_fetcher_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/press"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>BIS</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/press", server.uri());
    let output = fetcher(Duration::from_secs(5))
        .run(&payload([("url", json!(url))]))
        .await
        .unwrap();

    assert_eq!(output["url"], json!(url));
    assert_eq!(output["raw_content"], json!("<html><body>BIS</body></html>"));
}

#[tokio::test]
async fn test_fetcher_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = fetcher(Duration::from_secs(5))
        .fetch_text(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_fetcher_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = fetcher(Duration::from_millis(200))
        .fetch_text(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Timeout(_)));
}

#[tokio::test]
async fn test_fetcher_requires_url() {
    let err = fetcher(Duration::from_secs(1))
        .run(&payload([("raw_content", json!("x"))]))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::MissingInput { ref key, .. } if key == "url"));
}

#[tokio::test]
async fn test_openai_chat_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": { "content": " web " },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 20, "completion_tokens": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CompletionRequest::new("system", "user", ModelTier::Light).with_max_tokens(5);
    let response = openai(&server).execute(&request).await.unwrap();

    assert_eq!(response.content, "web");
    assert_eq!(response.model, "gpt-4o-mini");
    assert_eq!(response.token_usage.total(), 21);

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["model"], json!("gpt-4o-mini"));
    assert_eq!(body["max_tokens"], json!(5));
    assert_eq!(body["messages"][0]["role"], json!("system"));
    assert_eq!(body["messages"][1]["content"], json!("user"));
}

#[tokio::test]
async fn test_openai_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = openai(&server);
    let request = CompletionRequest::new("system", "user", ModelTier::Light);

    let first = client.execute(&request).await.unwrap_err();
    assert!(matches!(first, ProviderError::AuthenticationError(ref body) if body == "invalid key"));

    let second = client.execute(&request).await.unwrap_err();
    assert!(matches!(second, ProviderError::RateLimitExceeded));
}

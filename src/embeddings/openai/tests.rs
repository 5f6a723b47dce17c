use super::*;
use crate::config::OpenAiConfig;

#[test]
fn client_configuration() {
    let config = OpenAiConfig {
        base_url: "https://api.example.com".to_string(),
        model: "text-embedding-3-large".to_string(),
        batch_size: 50,
    };
    let provider = OpenAiEmbeddings::new(config, None).expect("Failed to create provider");

    assert_eq!(provider.model_name(), "text-embedding-3-large");
    assert_eq!(provider.batch_size, 50);
    assert_eq!(
        provider.endpoint.as_str(),
        "https://api.example.com/v1/embeddings"
    );
    assert_eq!(provider.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn model_dimensions() {
    let small = OpenAiEmbeddings::new(OpenAiConfig::default(), None).expect("valid config");
    assert_eq!(small.dimension(), 1536);

    let large = OpenAiEmbeddings::new(
        OpenAiConfig {
            model: "text-embedding-3-large".to_string(),
            ..OpenAiConfig::default()
        },
        None,
    )
    .expect("valid config");
    assert_eq!(large.dimension(), 3072);

    let unknown = OpenAiEmbeddings::new(
        OpenAiConfig {
            model: "text-embedding-future".to_string(),
            ..OpenAiConfig::default()
        },
        None,
    )
    .expect("valid config");
    assert_eq!(unknown.dimension(), 1536);
}

#[test]
fn explicit_api_key_wins() {
    let provider = OpenAiEmbeddings::new(OpenAiConfig::default(), Some("sk-test".to_string()))
        .expect("valid config");
    assert_eq!(provider.api_key().expect("explicit key"), "sk-test");
}

#[test]
#[serial_test::serial]
fn missing_api_key_fails_lazily() {
    // Construction succeeds without credentials; resolution fails
    let saved = std::env::var("OPENAI_API_KEY").ok();
    // SAFETY: serialized test, restored below
    unsafe { std::env::remove_var("OPENAI_API_KEY") };

    let provider = OpenAiEmbeddings::new(OpenAiConfig::default(), None).expect("valid config");
    let result = provider.api_key();
    assert!(matches!(result, Err(crate::RagError::Embedding(_))));

    if let Some(key) = saved {
        // SAFETY: serialized test
        unsafe { std::env::set_var("OPENAI_API_KEY", key) };
    }
}

#[test]
fn rejects_invalid_base_url() {
    let config = OpenAiConfig {
        base_url: "not a url".to_string(),
        ..OpenAiConfig::default()
    };
    assert!(OpenAiEmbeddings::new(config, None).is_err());
}

#[test]
fn builder_methods() {
    let provider = OpenAiEmbeddings::new(OpenAiConfig::default(), None)
        .expect("valid config")
        .with_retry_attempts(5);
    assert_eq!(provider.retry_attempts, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn embeds_against_mock_server() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "embedding": [0.1, 0.2, 0.3], "index": 0 }
            ],
            "model": "text-embedding-3-small"
        })))
        .mount(&server)
        .await;

    let config = OpenAiConfig {
        base_url: server.uri(),
        ..OpenAiConfig::default()
    };
    let provider =
        OpenAiEmbeddings::new(config, Some("sk-test".to_string())).expect("valid config");

    // The client is blocking; keep the mock server's runtime responsive
    let vector = tokio::task::spawn_blocking(move || provider.embed("hello world"))
        .await
        .expect("task should join")
        .expect("embedding should succeed");
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_error_is_not_retried() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let config = OpenAiConfig {
        base_url: server.uri(),
        ..OpenAiConfig::default()
    };
    let provider =
        OpenAiEmbeddings::new(config, Some("sk-bad".to_string())).expect("valid config");

    let result = tokio::task::spawn_blocking(move || provider.embed("hello"))
        .await
        .expect("task should join");
    assert!(matches!(result, Err(crate::RagError::Embedding(_))));
}

use super::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embedder_for(server: &MockServer) -> OllamaEmbedder {
    let base_url = Url::parse(&server.uri()).expect("mock uri should parse");
    OllamaEmbedder::new(&base_url, "test-model", JsonClient::default())
        .expect("embedder should build")
}

#[test]
fn client_configuration() {
    let config = EmbeddingConfig {
        base_url: Some(Url::parse("http://test-host:1234").expect("url should parse")),
        model: Some("test-model".to_string()),
        ..EmbeddingConfig::default()
    };

    let embedder =
        OllamaEmbedder::from_config(&config, JsonClient::default()).expect("should build");

    assert_eq!(embedder.model(), "test-model");
    assert_eq!(embedder.embed_url.as_str(), "http://test-host:1234/api/embed");
}

#[tokio::test]
async fn embed_single_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_json(json!({ "model": "test-model", "input": "hello world" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1, 0.2, 0.3]] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let vector = tokio::task::spawn_blocking(move || embedder.embed("hello world"))
        .await
        .expect("blocking task should finish")
        .expect("embedding should succeed");

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn empty_embedding_list_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [] })))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let result = tokio::task::spawn_blocking(move || embedder.embed("hello"))
        .await
        .expect("blocking task should finish");

    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test]
async fn server_error_surfaces_as_embedding_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let result = tokio::task::spawn_blocking(move || embedder.embed("hello"))
        .await
        .expect("blocking task should finish");

    match result {
        Err(RagError::Embedding(message)) => assert!(message.contains("500")),
        other => panic!("expected embedding error, got {:?}", other),
    }
}

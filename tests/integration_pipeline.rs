#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests for ingestion and question answering
// Providers are served by a mock Ollama instance

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use docs_rag::RagError;
use docs_rag::chat::OllamaChat;
use docs_rag::commands::answer_from_files;
use docs_rag::config::{ChatConfig, Config, EmbeddingConfig};
use docs_rag::database::InMemoryIndex;
use docs_rag::embeddings::OllamaEmbedder;
use docs_rag::http::JsonClient;
use docs_rag::retrieval::{NO_RELEVANT_INFORMATION, Retriever};
use docs_rag::server::{RagServer, Response};

const TOPICS: [&str; 3] = ["rust", "python", "coffee"];

/// Embeds the request input by counting topic words
struct TopicEmbeddings;

impl Respond for TopicEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().expect("embed request is JSON");
        let input = body["input"]
            .as_str()
            .expect("embed input is a string")
            .to_lowercase();
        let vector: Vec<f32> = TOPICS
            .iter()
            .map(|topic| input.matches(topic).count() as f32)
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "model": "nomic-embed-text:latest",
            "embeddings": [vector]
        }))
    }
}

async fn mock_ollama(answer: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(TopicEmbeddings)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:latest",
            "response": answer,
            "done": true
        })))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer, base_dir: &TempDir) -> Config {
    let base_url = Url::parse(&server.uri()).expect("mock uri should parse");
    Config {
        embedding: EmbeddingConfig {
            base_url: Some(base_url.clone()),
            ..EmbeddingConfig::default()
        },
        chat: ChatConfig {
            base_url: Some(base_url),
            ..ChatConfig::default()
        },
        base_dir: base_dir.path().to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn answers_from_ingested_files() {
    let server = mock_ollama("Rust is a systems language.").await;
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = config_for(&server, &temp_dir);

    let rust_doc = temp_dir.path().join("rust.txt");
    let coffee_doc = temp_dir.path().join("coffee.txt");
    fs::write(&rust_doc, "Rust has ownership. Rust has no garbage collector.")
        .expect("should write document");
    fs::write(&coffee_doc, "Coffee is brewed from roasted beans.")
        .expect("should write document");

    let retriever = Retriever::from_config(&config).expect("providers should build");
    let files = vec![rust_doc, coffee_doc];
    let answer = tokio::task::spawn_blocking(move || {
        answer_from_files(&retriever, &files, "Tell me about Rust", Some(1))
    })
    .await
    .expect("blocking task should finish")
    .expect("question should be answered");

    assert_eq!(answer.answer, "Rust is a systems language.");
    assert_eq!(
        answer.sources,
        vec!["Rust has ownership. Rust has no garbage collector."]
    );

    let prompts: Vec<Value> = server
        .received_requests()
        .await
        .expect("requests are recorded")
        .iter()
        .filter(|request| request.url.path() == "/api/generate")
        .map(|request| request.body_json().expect("generate request is JSON"))
        .collect();
    assert_eq!(prompts.len(), 1);
    let prompt = prompts[0]["prompt"].as_str().expect("prompt is a string");
    assert!(prompt.contains("Context:\nRust has ownership. Rust has no garbage collector.\n\n"));
    assert!(prompt.ends_with("Question: Tell me about Rust\n\nAnswer:"));
}

#[tokio::test]
async fn empty_index_never_reaches_chat() {
    let server = mock_ollama("unused").await;
    let temp_dir = TempDir::new().expect("should create temp dir");
    let retriever =
        Retriever::from_config(&config_for(&server, &temp_dir)).expect("providers should build");

    let answer = tokio::task::spawn_blocking(move || retriever.ask("Anything about Rust?"))
        .await
        .expect("blocking task should finish")
        .expect("short-circuit is a success");

    assert_eq!(answer.answer, NO_RELEVANT_INFORMATION);
    let generate_calls = server
        .received_requests()
        .await
        .expect("requests are recorded")
        .iter()
        .filter(|request| request.url.path() == "/api/generate")
        .count();
    assert_eq!(generate_calls, 0);
}

#[tokio::test]
async fn slow_chat_surfaces_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(TopicEmbeddings)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let base_url = Url::parse(&server.uri()).expect("mock uri should parse");
    let client = JsonClient::new(Duration::from_millis(300));
    let chat_config = ChatConfig {
        base_url: Some(base_url.clone()),
        ..ChatConfig::default()
    };
    let retriever = Retriever::new(
        Arc::new(
            OllamaEmbedder::new(&base_url, "nomic-embed-text:latest", client.clone())
                .expect("embedder should build"),
        ),
        Arc::new(OllamaChat::from_config(&chat_config, client).expect("chat should build")),
        Arc::new(InMemoryIndex::new()),
    );

    let result = tokio::task::spawn_blocking(move || {
        retriever.ingest_chunks(&["Rust and more rust.".to_string()], "rust.txt")?;
        retriever.answer("rust?", 3)
    })
    .await
    .expect("blocking task should finish");

    assert!(matches!(
        result,
        Err(RagError::Timeout {
            operation: "generation",
            ..
        })
    ));
}

#[tokio::test]
async fn server_round_trip() {
    let server = mock_ollama("Python is dynamically typed.").await;
    let temp_dir = TempDir::new().expect("should create temp dir");
    let retriever =
        Retriever::from_config(&config_for(&server, &temp_dir)).expect("providers should build");
    let rag_server = RagServer::new(Arc::new(retriever));

    let requests = [
        json!({ "id": 1, "method": "ingest", "params": {
            "document_id": "python.txt",
            "text": "Python is popular. Python uses indentation."
        }}),
        json!({ "id": 2, "method": "ask", "params": { "question": "What about python?" } }),
        json!({ "id": 3, "method": "health" }),
        json!({ "id": 4, "method": "clear" }),
        json!({ "id": 5, "method": "ingest", "params": { "document_id": "empty.txt", "text": "" } }),
    ];
    let mut input = String::new();
    for request in &requests {
        input.push_str(&request.to_string());
        input.push('\n');
    }
    let mut output = Vec::new();

    rag_server
        .serve(tokio::io::BufReader::new(input.as_bytes()), &mut output)
        .await
        .expect("server should stop at EOF");

    let responses: Vec<Response> = String::from_utf8(output)
        .expect("output is UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a response"))
        .collect();
    assert_eq!(responses.len(), 5);

    let ingest = responses[0].result.as_ref().expect("ingest should succeed");
    assert_eq!(ingest["chunk_count"], 1);

    let ask = responses[1].result.as_ref().expect("ask should succeed");
    assert_eq!(ask["answer"], "Python is dynamically typed.");
    assert_eq!(
        ask["sources"],
        json!(["Python is popular. Python uses indentation."])
    );

    let health = responses[2].result.as_ref().expect("health should succeed");
    assert_eq!(health["available"], true);
    assert_eq!(health["records"], 1);

    assert!(responses[3].error.is_none());

    let empty = responses[4].error.as_ref().expect("empty ingest should fail");
    assert_eq!(empty.kind, "empty_content");
    assert_eq!(responses[4].id, Some(json!(5)));
}

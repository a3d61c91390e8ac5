use super::*;
use crate::config::{Config, OllamaConfig};

fn test_config() -> Config {
    Config {
        ollama: OllamaConfig {
            host: "test-host".to_string(),
            port: 1234,
            embedding_model: "test-embed".to_string(),
            chat_model: "test-chat".to_string(),
            batch_size: 128,
            ..OllamaConfig::default()
        },
        ..Config::default()
    }
}

#[test]
fn client_configuration() {
    let client = OllamaClient::new(&test_config()).expect("Failed to create client");

    assert_eq!(client.embedding_model, "test-embed");
    assert_eq!(client.chat_model, "test-chat");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let client = OllamaClient::new(&test_config())
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn empty_batch_is_a_no_op() {
    let client = OllamaClient::new(&test_config()).expect("Failed to create client");

    let result = client
        .generate_embeddings_batch(&[])
        .expect("empty batch should not hit the network");
    assert!(result.is_empty());
}

#[test]
fn chat_request_serialization() {
    let request = ChatRequest {
        model: "llama3:latest".to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: "Answer:".to_string(),
        }],
        stream: false,
    };

    let json = serde_json::to_value(&request).expect("should serialize");
    assert_eq!(json["model"], "llama3:latest");
    assert_eq!(json["stream"], false);
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(json["messages"][0]["content"], "Answer:");
}

#[test]
fn chat_response_deserialization() {
    let body = r#"{
        "model": "llama3:latest",
        "message": {"role": "assistant", "content": "Paris."},
        "done": true
    }"#;

    let response: ChatResponse = serde_json::from_str(body).expect("should parse");
    assert_eq!(response.message.role, "assistant");
    assert_eq!(response.message.content, "Paris.");
}

#[test]
fn batch_embed_request_uses_input_field() {
    let request = BatchEmbedRequest {
        model: "test-embed".to_string(),
        inputs: vec!["a".to_string(), "b".to_string()],
    };

    let json = serde_json::to_value(&request).expect("should serialize");
    assert!(json.get("input").is_some());
    assert!(json.get("inputs").is_none());
}

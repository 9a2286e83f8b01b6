use dailydose::llm::remote::RemoteLlmProvider;
use dailydose::llm::{LlmProvider, LlmRequest};
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    // Mock successful OpenAI response
    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer fake-api-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-3.5-turbo",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "Test prompt"}
            ],
            "max_tokens": 100,
            "temperature": 0.5
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "model": "gpt-3.5-turbo-0125",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "  This is a test response.\n"
                    },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 5,
                    "total_tokens": 15
                }
            }"#,
        )
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let request = LlmRequest {
        system: Some("You are a helpful assistant.".to_string()),
        prompt: "Test prompt".to_string(),
        max_tokens: Some(100),
        temperature: Some(0.5),
        timeout_seconds: Some(10),
    };

    let response = provider.generate(request).await.unwrap();
    assert_eq!(response.content, "This is a test response.");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gpt-3.5-turbo-0125");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_without_system_or_usage() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "user", "content": "Hi"}]
        })))
        .with_status(200)
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "Hello."}}]}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");
    let response = provider
        .generate(LlmRequest {
            system: None,
            prompt: "Hi".to_string(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        })
        .await
        .unwrap();

    assert_eq!(response.content, "Hello.");
    assert_eq!(response.usage.total_tokens, 0);
    assert_eq!(response.model, "gpt-3.5-turbo");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    // Mock API error
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let request = LlmRequest {
        system: None,
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    };

    let err = provider.generate(request).await.unwrap_err();
    assert!(err.to_string().contains("429"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_empty_choices() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");
    let err = provider
        .generate(LlmRequest {
            system: None,
            prompt: "Test".to_string(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no choices"));
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    // Mock slow response
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let request = LlmRequest {
        system: None,
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: Some(1), // 1 second timeout
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("timed out"));
}

//! Snapshot and wire tests for the Gemini client

#[cfg(test)]
mod snapshot_tests {
    use crate::{GeminiClient, GeminiConfig, GenerationConfig};
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = GeminiConfig::new("test_api_key_redacted".to_string());

        assert_yaml_snapshot!(config, @r###"
        api_key: test_api_key_redacted
        api_url: "https://generativelanguage.googleapis.com/v1beta"
        chat_model: gemini-pro
        embedding_model: models/embedding-001
        "###);
    }

    #[test]
    fn test_generation_request_snapshot() {
        let config = GenerationConfig {
            temperature: Some(0.5),
            max_tokens: 1024,
            ..Default::default()
        };
        let request = GeminiClient::build_generation_request("What is bail?", &config);
        let body = serde_json::to_value(&request).unwrap();

        assert_yaml_snapshot!(body, @r###"
        contents:
          - parts:
              - text: What is bail?
            role: user
        generationConfig:
          maxOutputTokens: 1024
          temperature: 0.5
        "###);
    }

    #[test]
    fn test_embed_request_snapshot() {
        let client = GeminiClient::new(GeminiConfig::new("key".to_string())).unwrap();
        let request = client.build_embed_request("section 438", "RETRIEVAL_QUERY");
        let body = serde_json::to_value(&request).unwrap();

        assert_yaml_snapshot!(body, @r###"
        content:
          parts:
            - text: section 438
        model: models/embedding-001
        taskType: RETRIEVAL_QUERY
        "###);
    }
}

#[cfg(test)]
mod wire_tests {
    use crate::{Embedder, Error, GeminiClient, GeminiConfig, LLMProvider};
    use axum::{Json, Router, extract::Query, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    /// Serve a fake Gemini API on an ephemeral port and return its base URL
    async fn spawn_fake_gemini() -> String {
        async fn generate(
            Query(params): Query<HashMap<String, String>>,
            Json(body): Json<Value>,
        ) -> (StatusCode, Json<Value>) {
            if params.get("key").map(String::as_str) != Some("good-key") {
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error": {"message": "API key not valid"}})),
                );
            }
            let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("");
            (
                StatusCode::OK,
                Json(json!({
                    "candidates": [{
                        "content": {"parts": [{"text": format!("echo: {prompt}")}], "role": "model"},
                        "finishReason": "STOP"
                    }]
                })),
            )
        }

        async fn embed(Json(body): Json<Value>) -> Json<Value> {
            let text = body["content"]["parts"][0]["text"].as_str().unwrap_or("");
            Json(json!({"embedding": {"values": [text.len() as f32, 1.0]}}))
        }

        async fn batch_embed(Json(body): Json<Value>) -> Json<Value> {
            let embeddings: Vec<Value> = body["requests"]
                .as_array()
                .map(|requests| {
                    requests
                        .iter()
                        .map(|r| {
                            let text = r["content"]["parts"][0]["text"].as_str().unwrap_or("");
                            json!({"values": [text.len() as f32, 0.0]})
                        })
                        .collect()
                })
                .unwrap_or_default();
            Json(json!({"embeddings": embeddings}))
        }

        let app = Router::new()
            .route("/v1beta/models/{action}", post(
                |axum::extract::Path(action): axum::extract::Path<String>,
                 query: Query<HashMap<String, String>>,
                 body: Json<Value>| async move {
                    if action.ends_with(":generateContent") {
                        generate(query, body).await
                    } else if action.ends_with(":batchEmbedContents") {
                        (StatusCode::OK, batch_embed(body).await)
                    } else {
                        (StatusCode::OK, embed(body).await)
                    }
                },
            ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1beta", addr)
    }

    #[tokio::test]
    async fn test_generate_against_fake_api() {
        let base = spawn_fake_gemini().await;
        let client = GeminiClient::new(GeminiConfig::new("good-key".to_string()).with_api_url(base)).unwrap();

        let result = client.generate("hello").await.unwrap();
        assert_eq!(result.text, "echo: hello");
        assert_eq!(result.finish_reason.as_deref(), Some("STOP"));
    }

    #[tokio::test]
    async fn test_generate_surfaces_http_errors() {
        let base = spawn_fake_gemini().await;
        let client = GeminiClient::new(GeminiConfig::new("bad-key".to_string()).with_api_url(base)).unwrap();

        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, Error::LLMProvider(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_embeddings_against_fake_api() {
        let base = spawn_fake_gemini().await;
        let client = GeminiClient::new(GeminiConfig::new("good-key".to_string()).with_api_url(base)).unwrap();

        let vectors = client
            .embed_documents(&["a".to_string(), "abc".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![3.0, 0.0]]);

        let query = client.embed_query("abcd").await.unwrap();
        assert_eq!(query, vec![4.0, 1.0]);

        assert!(client.embed_documents(&[]).await.unwrap().is_empty());
    }
}

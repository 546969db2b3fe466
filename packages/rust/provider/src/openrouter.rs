//! OpenRouter (and OpenAI-compatible) structured output client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use takeaways_shared::{ProviderConfig, Result, TakeawaysError};

use crate::{Generation, GenerationRequest, TextGenerator, TokenUsage};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("takeaways/", env!("CARGO_PKG_VERSION"));

/// Maximum characters of an error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Connection settings for [`OpenRouterClient`].
#[derive(Debug, Clone)]
pub struct OpenRouterOptions {
    /// API root, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Timeout for a single request, in seconds.
    pub timeout_secs: u64,
}

impl OpenRouterOptions {
    /// Options from config plus a resolved API key.
    pub fn from_config(config: &ProviderConfig, api_key: String) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Chat completions client using `response_format: json_schema`.
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl OpenRouterClient {
    pub fn new(opts: OpenRouterOptions) -> Result<Self> {
        let base = Url::parse(&opts.base_url).map_err(|e| {
            TakeawaysError::config(format!("invalid provider base_url {}: {e}", opts.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| TakeawaysError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base.as_str().trim_end_matches('/')),
            api_key: opts.api_key,
            model: opts.model,
        })
    }

    fn request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.prompt },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                },
            },
        })
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, schema = %request.schema_name))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "takeaways")
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| TakeawaysError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(TakeawaysError::http(
                status.as_u16(),
                format!("{}: {snippet}", self.endpoint),
            ));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| TakeawaysError::parse(format!("invalid chat completion payload: {e}")))?;

        let message = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| TakeawaysError::parse("chat completion has no choices"))?;

        if let Some(refusal) = message.refusal {
            return Err(TakeawaysError::parse(format!("model refused: {refusal}")));
        }

        let content = message
            .content
            .ok_or_else(|| TakeawaysError::parse("chat completion has no content"))?;

        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| TakeawaysError::parse(format!("model output is not JSON: {e}")))?;

        debug!(usage = ?chat.usage, "generation complete");

        Ok(Generation {
            value,
            usage: chat.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerationRequest {
        GenerationRequest {
            schema_name: "takeaways".into(),
            schema: serde_json::json!({ "type": "object", "properties": {} }),
            prompt: "MIME types".into(),
            system_prompt: "You are a technical writer.".into(),
        }
    }

    fn client_for(server: &MockServer) -> OpenRouterClient {
        OpenRouterClient::new(OpenRouterOptions {
            base_url: format!("{}/api/v1", server.uri()),
            api_key: "test-key".into(),
            model: "openai/gpt-4o-mini".into(),
            timeout_secs: 5,
        })
        .expect("build client")
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = OpenRouterClient::new(OpenRouterOptions {
            base_url: "not a url".into(),
            api_key: "k".into(),
            model: "m".into(),
            timeout_secs: 1,
        });
        assert!(matches!(result, Err(TakeawaysError::Config { .. })));
    }

    #[tokio::test]
    async fn parses_structured_content_and_usage() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "openai/gpt-4o-mini",
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "takeaways", "strict": true },
                },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "{\"tldr\":\"short\"}" },
                }],
                "usage": { "prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150 },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generation = client_for(&server).generate(&request()).await.unwrap();
        assert_eq!(generation.value["tldr"], "short");
        assert_eq!(
            generation.usage,
            Some(TokenUsage {
                prompt_tokens: 120,
                completion_tokens: 30,
                total_tokens: 150,
            })
        );
    }

    #[tokio::test]
    async fn partial_usage_still_parses() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "{}" } }],
                "usage": { "prompt_tokens": 120, "completion_tokens": 30 },
            })))
            .mount(&server)
            .await;

        let generation = client_for(&server).generate(&request()).await.unwrap();
        assert_eq!(
            generation.usage,
            Some(TokenUsage {
                prompt_tokens: 120,
                completion_tokens: 30,
                total_tokens: 0,
            })
        );
    }

    #[tokio::test]
    async fn http_error_carries_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        match err {
            TakeawaysError::Http { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_content_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "Sure! Here are the takeaways" } }],
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, TakeawaysError::Parse { .. }));
    }

    #[tokio::test]
    async fn refusal_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": null, "refusal": "nope" } }],
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("refused"));
    }
}

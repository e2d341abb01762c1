//! Gemini client: the only module that talks to the generative-AI service.
//!
//! Each call is retried with exponential backoff (see [`backoff`]). A reply
//! only counts as successful when the status is 2xx, the body is JSON and the
//! body carries no `error` field.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::GeminiConfig;

pub mod backoff;
pub mod types;

use backoff::{with_backoff, RetryPolicy, Sleeper, TokioSleeper};
use types::GenerateContentRequest;

/// Failure of a single attempt. Every variant is retryable.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Gemini API error: {0}")]
    Api(String),
}

/// Raised once every attempt has failed.
#[derive(Debug, Error)]
#[error("Gemini API call failed after {attempts} attempts: {source}")]
pub struct ServiceCallError {
    pub attempts: u32,
    #[source]
    pub source: AttemptError,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: &GeminiConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
            api_key: config.api_key.clone(),
            policy: RetryPolicy::new(config.max_retries),
            sleeper,
        })
    }

    /// Sends the payload, retrying transient failures. Returns the raw JSON
    /// reply of the first successful attempt.
    pub async fn generate_content(
        &self,
        payload: &GenerateContentRequest,
    ) -> Result<Value, ServiceCallError> {
        with_backoff(&self.policy, self.sleeper.as_ref(), |_| self.attempt(payload))
            .await
            .map_err(|exhausted| ServiceCallError {
                attempts: exhausted.attempts,
                source: exhausted.last_error,
            })
    }

    async fn attempt(&self, payload: &GenerateContentRequest) -> Result<Value, AttemptError> {
        // without_url keeps the API key (a query parameter) out of error messages
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .await
            .map_err(|e| AttemptError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(api_error_message)
                .map(str::to_string)
                .unwrap_or(body);
            return Err(AttemptError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AttemptError::Http(e.without_url()))?;

        if let Some(err) = body.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown API Error");
            return Err(AttemptError::Api(message.to_string()));
        }

        debug!("Gemini call succeeded");
        Ok(body)
    }
}

fn api_error_message(body: &Value) -> Option<&str> {
    body.get("error")?.get("message")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::backoff::testing::RecordingSleeper;
    use super::types::{Content, GenerationConfig, Part, SystemInstruction};
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/v1beta/models/test-model:generateContent";

    fn test_config(server: &MockServer) -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            api_base: server.uri(),
            max_retries: 5,
            timeout: Duration::from_secs(5),
        }
    }

    fn test_payload() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::Text("hi".to_string())],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: json!({"type": "OBJECT"}),
            },
            system_instruction: SystemInstruction {
                parts: vec![Part::Text("be strict".to_string())],
            },
        }
    }

    fn client(server: &MockServer, sleeper: &RecordingSleeper) -> GeminiClient {
        GeminiClient::with_sleeper(&test_config(server), Arc::new(sleeper.clone())).unwrap()
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    #[tokio::test]
    async fn test_success_returns_body_and_sends_key_and_payload() {
        let server = MockServer::start().await;
        let reply = json!({"candidates": [{"content": {"parts": [{"text": "{}"}]}}]});
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let body = client(&server, &sleeper)
            .generate_content(&test_payload())
            .await
            .unwrap();

        assert_eq!(body, reply);
        assert!(sleeper.delays().is_empty());

        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent, serde_json::to_value(test_payload()).unwrap());
    }

    #[tokio::test]
    async fn test_server_errors_then_success_backs_off() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let body = client(&server, &sleeper)
            .generate_content(&test_payload())
            .await
            .unwrap();

        assert_eq!(body, json!({"candidates": []}));
        assert_eq!(sleeper.delays(), secs(&[1, 2]));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_error_field_on_every_attempt_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": {"message": "quota exceeded"}})),
            )
            .expect(5)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let err = client(&server, &sleeper)
            .generate_content(&test_payload())
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 5);
        assert_eq!(
            err.to_string(),
            "Gemini API call failed after 5 attempts: Gemini API error: quota exceeded"
        );
        assert_eq!(sleeper.delays(), secs(&[1, 2, 4, 8]));
    }

    #[tokio::test]
    async fn test_error_field_without_message_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": {}})))
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let err = client(&server, &sleeper)
            .generate_content(&test_payload())
            .await
            .unwrap_err();
        assert!(err.to_string().ends_with("Gemini API error: Unknown API Error"));
    }

    #[tokio::test]
    async fn test_non_success_status_uses_service_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"code": 400, "message": "API key not valid"}})),
            )
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let err = client(&server, &sleeper)
            .generate_content(&test_payload())
            .await
            .unwrap_err();

        match &err.source {
            AttemptError::Status { status, message } => {
                assert_eq!(*status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected attempt error: {other:?}"),
        }
        assert_eq!(err.attempts, 5);
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        client(&server, &sleeper)
            .generate_content(&test_payload())
            .await
            .unwrap();
        assert_eq!(sleeper.delays(), secs(&[1]));
    }

    #[tokio::test]
    async fn test_connection_failure_does_not_leak_api_key() {
        // Bind and drop a listener to get a port that refuses connections.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = GeminiConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            api_base: format!("http://127.0.0.1:{port}"),
            max_retries: 2,
            timeout: Duration::from_secs(5),
        };

        let sleeper = RecordingSleeper::default();
        let err = GeminiClient::with_sleeper(&config, Arc::new(sleeper.clone()))
            .unwrap()
            .generate_content(&test_payload())
            .await
            .unwrap_err();

        assert!(matches!(err.source, AttemptError::Http(_)));
        assert!(!err.to_string().contains("test-key"));
        assert_eq!(sleeper.delays(), secs(&[1]));
    }
}

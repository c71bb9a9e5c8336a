use std::env;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Default address of the SugarSense backend.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Matches the backend's own REQUEST_TIMEOUT_SECONDS default.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Health readings submitted for analysis. Any field may be empty;
/// values are sent exactly as the user entered them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthInputs {
    pub sugar: String,
    pub medication: String,
    pub activity: String,
}

impl HealthInputs {
    pub fn is_blank(&self) -> bool {
        self.sugar.trim().is_empty()
            && self.medication.trim().is_empty()
            && self.activity.trim().is_empty()
    }
}

/// Failure at or past the request boundary. The session renders all
/// variants the same way; they are distinguished for logging only.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// The two operations the session needs from the analysis service.
#[async_trait]
pub trait Backend {
    async fn analyze(&self, inputs: &HealthInputs) -> Result<String, BackendError>;

    async fn chat(&self, message: &str) -> Result<String, BackendError>;
}

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    analysis: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

impl BackendClient {
    /// Build a client against `base_url`, falling back to the
    /// SUGARSENSE_API_URL environment variable and then the default.
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url.to_string(),
            None => env::var("SUGARSENSE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("request to {} failed with {}: {}", url, status, body);
            return Err(BackendError::Status { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn analyze(&self, inputs: &HealthInputs) -> Result<String, BackendError> {
        let response = self.post("/analyze", inputs).await?;
        let body: AnalyzeResponse = response.json().await?;
        Ok(body.analysis)
    }

    async fn chat(&self, message: &str) -> Result<String, BackendError> {
        let response = self.post("/chat", &json!({ "message": message })).await?;
        let body: ChatResponse = response.json().await?;
        Ok(body.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(uri: &str) -> BackendClient {
        BackendClient::new(Some(uri)).unwrap()
    }

    #[tokio::test]
    async fn analyze_posts_current_fields_and_decodes_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(json!({
                "sugar": "180",
                "medication": "",
                "activity": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "analysis": "Your glucose is elevated"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let inputs = HealthInputs {
            sugar: "180".to_string(),
            ..Default::default()
        };
        let analysis = client_for(&server.uri()).analyze(&inputs).await.unwrap();
        assert_eq!(analysis, "Your glucose is elevated");
    }

    #[tokio::test]
    async fn chat_posts_message_and_decodes_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({ "message": "What should I eat?" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reply": "Something with a low glycemic index."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server.uri())
            .chat("What should I eat?")
            .await
            .unwrap();
        assert_eq!(reply, "Something with a low glycemic index.");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).chat("hi").await.unwrap_err();
        assert!(
            matches!(err, BackendError::Status { status, .. } if status.as_u16() == 500)
        );
    }

    #[tokio::test]
    async fn connection_failure_maps_to_transport_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let err = client_for(&uri).chat("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[test]
    fn blank_check_ignores_whitespace_only_fields() {
        let mut inputs = HealthInputs::default();
        assert!(inputs.is_blank());

        inputs.medication = "   ".to_string();
        assert!(inputs.is_blank());

        inputs.sugar = "95".to_string();
        assert!(!inputs.is_blank());
    }
}

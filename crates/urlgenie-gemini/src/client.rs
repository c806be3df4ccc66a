use async_trait::async_trait;
use reqwest::Client;
use urlgenie_chat::{ModelClient, ModelError, ModelReply, ModelRequest};
use urlgenie_core::config::ModelConfig;

use crate::error::GeminiError;
use crate::protocol::{GenerateContentRequest, GenerateContentResponse};

/// Gemini REST client.
///
/// One `generateContent` call per request; no retries and no timeout beyond
/// the transport defaults.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        let defaults = ModelConfig::default();
        Self {
            client: Client::new(),
            api_key,
            api_base: defaults.api_base,
            model: defaults.model,
            temperature: defaults.temperature,
        }
    }

    /// Build a client from the `[model]` config section, resolving the API key
    /// from the config or environment.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.resolve_api_key())
            .with_api_base(config.api_base.clone())
            .with_model(config.model.clone())
            .with_temperature(config.temperature)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    /// POST a `generateContent` request and decode the response.
    pub async fn generate_content(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %self.model, "Gemini request failed");
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| GeminiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<ModelReply, ModelError> {
        let body = GenerateContentRequest::from_model_request(&request, self.temperature);
        tracing::debug!(
            model = %self.model,
            contents = body.contents.len(),
            "Sending generateContent request"
        );

        let response = self.generate_content(&body).await?;
        let reply = response.into_reply();
        tracing::debug!(
            has_text = reply.text.is_some(),
            sources = reply.sources.len(),
            "Gemini reply decoded"
        );
        Ok(reply)
    }
}

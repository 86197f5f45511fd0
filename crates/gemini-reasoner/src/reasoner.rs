//! GeminiReasoner implementation using the generateContent REST API.

use async_trait::async_trait;
use reasoner_core::{PromptContext, Reasoner, ReasonerError};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};
use crate::config::GeminiConfig;

/// A reasoner implementation backed by the Gemini API.
///
/// Stateless between calls: the orchestrator supplies all conversational
/// context inside the [`PromptContext`], so the same client can serve
/// routing, code generation, and synthesis.
pub struct GeminiReasoner {
    client: Client,
    config: GeminiConfig,
}

impl GeminiReasoner {
    /// Create a new GeminiReasoner with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, ReasonerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ReasonerError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("GeminiReasoner initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a GeminiReasoner from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for the variables involved.
    pub fn from_env() -> Result<Self, ReasonerError> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ReasonerError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url, self.config.model
        );

        debug!("Sending request to Gemini API: {:?}", request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ReasonerError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(ReasonerError::ProcessingFailed(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            return Err(ReasonerError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: GenerateContentResponse = response.json().await.map_err(|e| {
            ReasonerError::ProcessingFailed(format!("Failed to parse response: {}", e))
        })?;

        debug!("Received response from Gemini API: {:?}", completion);

        Ok(completion)
    }
}

#[async_trait]
impl Reasoner for GeminiReasoner {
    async fn infer(&self, context: &PromptContext) -> Result<String, ReasonerError> {
        let system_instruction = if context.system().is_empty() {
            None
        } else {
            Some(Content::system(context.system()))
        };

        let request = GenerateContentRequest {
            system_instruction,
            contents: vec![Content::user(context.rendered())],
            generation_config: Some(GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            }),
        };

        let completion = self.generate_content(request).await?;

        let text = completion.first_text().ok_or_else(|| {
            warn!("No candidate content in Gemini response");
            ReasonerError::ProcessingFailed("empty response from Gemini API".to_string())
        })?;

        info!("Gemini reply: {} chars", text.len());
        Ok(text)
    }

    fn name(&self) -> &str {
        "GeminiReasoner"
    }
}

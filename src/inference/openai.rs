use super::client::InferenceClient;
use super::error::InferenceError;
use super::preprocess::{prepare_image, ImageOptions};
use crate::config::InferenceSettings;
use base64::Engine;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SYSTEM_PROMPT: &str = "You are an expert driver drowsiness detection system. \
Analyze driver monitoring footage accurately and respond ONLY with valid JSON.";

pub const ANALYSIS_PROMPT: &str = r#"Analyze this image for driver drowsiness detection. Look for:
1. Eye closure/blinking patterns - are eyes open, half-closed, or closed?
2. Head position and orientation - is head upright, tilted, or drooping?
3. Facial expressions - signs of fatigue, stress, or alertness?
4. Mouth - yawning, mouth open, or normal?
5. Overall body language - posture, slouching, or attentive?

Provide a brief analysis in JSON format with these exact fields:
{
    "drowsiness_level": "awake" | "mildly_drowsy" | "moderately_drowsy" | "highly_drowsy",
    "confidence": 0.0 to 1.0,
    "observations": ["list", "of", "specific", "observations"],
    "recommended_action": "what should be done based on this analysis"
}

Criteria:
- "awake": Eyes open, head upright, alert expression, good posture
- "mildly_drowsy": Slight eye closure, minor head nodding, some fatigue signs
- "moderately_drowsy": Frequent eye closure, head dropping, clear fatigue
- "highly_drowsy": Eyes mostly/fully closed, significant head drooping, urgent action needed"#;

/// Vision client for OpenAI-compatible chat-completions APIs
pub struct OpenAiVisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    image: ImageOptions,
}

impl OpenAiVisionClient {
    /// Build a client, reading the API key from the environment variable named
    /// by `settings.api_key_env`
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self, InferenceError> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                InferenceError::Auth(format!(
                    "{} not found in environment variables",
                    settings.api_key_env
                ))
            })?;

        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(
        settings: &InferenceSettings,
        api_key: impl Into<String>,
    ) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()?;

        let endpoint = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
        info!(
            "Inference client ready: model={}, endpoint={}",
            settings.model, endpoint
        );

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            image: ImageOptions {
                max_dimension: settings.max_image_dimension,
                jpeg_quality: settings.jpeg_quality,
            },
        })
    }

    fn request_body(&self, data_url: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": ANALYSIS_PROMPT },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" }
        })
    }
}

#[async_trait::async_trait]
impl InferenceClient for OpenAiVisionClient {
    async fn infer(&self, frame: &[u8]) -> Result<String, InferenceError> {
        let options = self.image;
        let bytes = frame.to_vec();
        let jpeg = tokio::task::spawn_blocking(move || prepare_image(&bytes, &options))
            .await
            .map_err(|e| InferenceError::Internal(e.to_string()))??;

        let data_url = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&jpeg)
        );

        debug!("Submitting frame ({} bytes as JPEG) to {}", jpeg.len(), self.model);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&data_url))
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            warn!("Inference API rate limited (retry_after={:?})", retry_after);
            return Err(InferenceError::Throttled { retry_after });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = api_error_message(response).await;
            return Err(InferenceError::Auth(message));
        }

        if !status.is_success() {
            let message = api_error_message(response).await;
            return Err(InferenceError::Transport(format!(
                "API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            InferenceError::Transport(format!("malformed response envelope: {}", e))
        })?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "openai-vision"
    }
}

async fn api_error_message(response: reqwest::Response) -> String {
    match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => "Unknown error".to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

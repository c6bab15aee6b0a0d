//! Text/image completions from the Gemini `generateContent` endpoint
//!
//! Models are tried in order.  Rate limits and unknown models fall through to the next one, and
//! the whole chain is bounded by a single timeout.  Callers only ever see a reply or `None`.

use crate::log_internal;
use crate::log_warn;
use base64::Engine;
use std::time::Duration;

/// Images at or above this size are not forwarded.
const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
/// Prompt used when a member only posts an image.
const EMPTY_PROMPT: &str = "이거 봐줘.";

#[derive(Clone, Debug)]
pub struct GeminiSettings {
    /// e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub base_url: String,
    pub models: Vec<String>,
    pub persona: String,
    pub max_input_chars: usize,
    pub max_output_chars: usize,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

pub struct Image {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, PartialEq)]
pub struct GeminiReply {
    pub text: String,
    pub model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("rate limited")]
    RateLimited,
    #[error("model not found")]
    ModelNotFound,
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response without text")]
    Empty,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

pub struct GeminiClient {
    api_key: Option<String>,
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, settings: GeminiSettings) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            settings,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask for a reply to `text`, optionally about an image.
    pub async fn reply(&self, text: &str, image: Option<&Image>) -> Option<GeminiReply> {
        let Some(api_key) = self.api_key.as_deref() else {
            log_warn!("Gemini API key is not set");
            return None;
        };

        let request = self.build_request(text, image);
        match tokio::time::timeout(self.settings.timeout, self.try_models(api_key, &request)).await
        {
            Ok(reply) => reply,
            Err(_) => {
                log_warn!(
                    "Gemini did not answer within {}s",
                    self.settings.timeout.as_secs_f32()
                );
                None
            }
        }
    }

    fn build_request(&self, text: &str, image: Option<&Image>) -> GenerateRequest {
        let text = match text.trim() {
            "" => EMPTY_PROMPT,
            text => text,
        };
        let text: String = text.chars().take(self.settings.max_input_chars).collect();
        let prompt = format!(
            "[역할 지시]\n{}\n\n[사용자 말]\n{}",
            self.settings.persona, text
        );

        let mut parts = Vec::new();
        if let Some(image) = image.filter(|image| image.data.len() < MAX_IMAGE_BYTES) {
            parts.push(Part {
                inline_data: Some(InlineData {
                    mime_type: image.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&image.data),
                }),
                text: None,
            });
        }
        parts.push(Part {
            inline_data: None,
            text: Some(prompt),
        });

        GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                max_output_tokens: self.settings.max_output_tokens,
            },
        }
    }

    async fn try_models(&self, api_key: &str, request: &GenerateRequest) -> Option<GeminiReply> {
        for model in &self.settings.models {
            match self.generate(api_key, model, request).await {
                Ok(text) => {
                    log_internal!("Gemini replied using {}", model);
                    return Some(GeminiReply {
                        text,
                        model: model.clone(),
                    });
                }
                Err(err @ (GeminiError::RateLimited | GeminiError::ModelNotFound)) => {
                    log_warn!("Gemini {}: {}, trying next model", model, err);
                }
                Err(err) => log_warn!("Gemini {} failed: {}", model, err),
            }
        }

        None
    }

    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => {}
            429 => return Err(GeminiError::RateLimited),
            404 => return Err(GeminiError::ModelNotFound),
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(GeminiError::Status {
                    status,
                    body: body.chars().take(300).collect(),
                });
            }
        }

        let body = response.bytes().await?;
        let response: GenerateResponse = serde_json::from_slice(&body)
            .map_err(|e| GeminiError::Malformed(e.to_string()))?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .and_then(|part| part.text)
            .map(|text| text.trim().to_owned())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::Empty);
        }
        Ok(text.chars().take(self.settings.max_output_chars).collect())
    }
}

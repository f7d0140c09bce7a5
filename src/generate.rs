//! Ollama answer generator.
//!
//! Sends the "stuff" prompt built by [`build_prompt`] to
//! `POST {url}/api/generate` with streaming disabled and returns the
//! `response` field as the answer text.

use async_trait::async_trait;

use paperchat_core::answer::{build_prompt, Answer, AnswerGenerator};
use paperchat_core::GenerationError;

use crate::config::AnswerConfig;
use crate::http;

pub struct OllamaGenerator {
    url: String,
    temperature: f64,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &AnswerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(
        &self,
        model: &str,
        question: &str,
        context: &[String],
    ) -> Result<Answer, GenerationError> {
        let body = serde_json::json!({
            "model": model,
            "prompt": build_prompt(question, context),
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let json = http::post_json_with_retry(
            &self.client,
            &format!("{}/api/generate", self.url),
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await
        .map_err(|e| GenerationError::Unavailable(format!("{:#}", e)))?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| GenerationError::Malformed("missing `response` field".to_string()))?;

        Ok(Answer {
            text: text.trim().to_string(),
            sources: context.to_vec(),
        })
    }
}

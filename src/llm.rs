use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;

/// Anything that turns a prompt into text. The pipeline only talks to this.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String>;
}

pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
            api_key: config.llm_api_key.clone(),
            temperature: config.llm_temperature,
            max_output_tokens: config.llm_max_output_tokens,
        })
    }

    /// Resolve the generateContent endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let model = self.model.trim_start_matches("models/");
        if base.ends_with("/v1beta") || base.ends_with("/v1") {
            format!("{}/models/{}:generateContent", base, model)
        } else {
            format!("{}/v1beta/models/{}:generateContent", base, model)
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String> {
        let body = request_body(
            prompt,
            system_instruction,
            self.temperature,
            self.max_output_tokens,
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read LLM response")?;
        if !status.is_success() {
            bail!("LLM returned {}: {}", status, text);
        }

        let json: Value = serde_json::from_str(&text).context("Failed to parse LLM JSON")?;
        extract_text(&json)
    }
}

/// Unset sampling knobs are left out so the model defaults apply.
fn request_body(
    prompt: &str,
    system_instruction: Option<&str>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
) -> Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
    });
    if let Some(system) = system_instruction {
        body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
    }

    let mut generation = serde_json::Map::new();
    if let Some(t) = temperature {
        generation.insert("temperature".to_string(), serde_json::json!(t));
    }
    if let Some(n) = max_output_tokens {
        generation.insert("maxOutputTokens".to_string(), serde_json::json!(n));
    }
    if !generation.is_empty() {
        body["generationConfig"] = Value::Object(generation);
    }
    body
}

/// Pull the generated text out of candidates[0].content.parts[*].text.
fn extract_text(json: &Value) -> Result<String> {
    if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
        bail!("Prompt blocked by LLM: {}", reason);
    }

    let parts = json["candidates"]
        .get(0)
        .and_then(|c| c["content"]["parts"].as_array())
        .ok_or_else(|| anyhow!("LLM response missing content"))?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Ok(text.trim().to_string())
}
